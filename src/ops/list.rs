use std::io::Write;

use anyhow::Result;

use crate::io::ReadAt;
use crate::select::MembershipSet;
use crate::zip::{ZipArchive, ratio};

use super::plural;

/// Print a table of the selected entries.
///
/// ```text
/// Archive:  roms.zip
///  Length   Method    Size  Cmpr    Date    Time   CRC-32   Name
/// --------  ------  ------- ---- ---------- ----- --------  ----
///      894  Defl:N      156  83% 09-08-2019 05:45 d370a7a1  track.cue
/// --------          -------  ---                            -------
///      894              156  83%                            1 file
/// ```
pub fn list<R: ReadAt, W: Write>(
    archive: &ZipArchive<R>,
    selected: &MembershipSet,
    archive_name: &str,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Archive:  {archive_name}")?;
    writeln!(
        out,
        " Length   Method    Size  Cmpr    Date    Time   CRC-32   Name"
    )?;
    writeln!(
        out,
        "--------  ------  ------- ---- ---------- ----- --------  ----"
    )?;

    let mut total_size = 0u64;
    let mut total_compressed = 0u64;
    let mut count = 0usize;

    for index in selected.iter() {
        let Some(entry) = archive.entry(index) else {
            continue;
        };
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _) = entry.mod_time();

        writeln!(
            out,
            "{:>8}  {:<6}  {:>7} {:>3}% {:02}-{:02}-{:04} {:02}:{:02} {:08x}  {}",
            entry.uncompressed_size,
            entry.compression_method.to_string(),
            entry.compressed_size,
            entry.compression_ratio(),
            month,
            day,
            year,
            hour,
            minute,
            entry.crc32,
            entry.name
        )?;

        total_size += entry.uncompressed_size;
        total_compressed += entry.compressed_size;
        count += 1;
    }

    writeln!(
        out,
        "--------          -------  ---                            -------"
    )?;
    writeln!(
        out,
        "{:>8}          {:>7} {:>3}%                            {} file{}",
        total_size,
        total_compressed,
        ratio(total_compressed, total_size),
        count,
        plural(count)
    )?;

    Ok(())
}
