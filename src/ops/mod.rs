//! Operations run on the selected entries of an opened archive.
//!
//! Each operation visits marked indices in ascending order and ignores
//! everything else.

pub mod extract;
pub mod list;

pub use extract::{ExtractOptions, ExtractReport, Overwrite, extract};
pub use list::list;
pub use test::{TestReport, test};

/// Plural suffix for entry counts in summaries
fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
