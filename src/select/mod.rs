//! Entry selection.
//!
//! Turns the positional tokens of a command line into the set of archive
//! entries an operation should act on.
//!
//! Each token is either a literal entry name or a glob pattern (it
//! contains `*`, `?` or `[`). Selection runs in two passes:
//!
//! 1. Literal tokens are looked up by exact name; the lowest index with
//!    that name is marked.
//! 2. Every entry is tested against every token in command-line order with
//!    [`fnmatch`]. The first token that matches an entry marks it and is
//!    credited with the match.
//!
//! Tokens that end up matching nothing are reported back to the caller.
//! An empty token list selects the whole archive.

mod bitset;
mod glob;

pub use bitset::MembershipSet;
pub use glob::{GLOB_CHARS, fnmatch, is_glob, unescape};

use std::collections::TryReserveError;
use thiserror::Error;
use tracing::debug;

/// Errors raised while building a selection.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("cannot allocate {what}: {source}")]
    Allocation {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },
}

/// Read-only view of an archive's entry names.
///
/// This is all selection needs from an archive, which keeps it usable
/// with in-memory listings.
pub trait EntryListing {
    /// Number of entries, fixed for the lifetime of the listing.
    fn entry_count(&self) -> usize;

    /// Stored name of the entry at `index`, byte for byte.
    fn name_at(&self, index: usize) -> &[u8];

    /// Lowest index whose name equals `name` exactly.
    fn locate(&self, name: &[u8]) -> Option<usize> {
        (0..self.entry_count()).find(|&i| self.name_at(i) == name)
    }
}

impl<S: AsRef<[u8]>> EntryListing for [S] {
    fn entry_count(&self) -> usize {
        self.len()
    }

    fn name_at(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }
}

/// Bookkeeping for one command-line token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRecord {
    pub token: Vec<u8>,
    pub is_glob: bool,
    pub matched: bool,
}

/// Result of a selection run.
#[derive(Debug)]
pub struct Selection {
    members: MembershipSet,
    records: Vec<SelectionRecord>,
}

impl Selection {
    /// Selected entries.
    pub fn members(&self) -> &MembershipSet {
        &self.members
    }

    /// Per-token records in command-line order. Empty when no tokens
    /// were given.
    pub fn records(&self) -> &[SelectionRecord] {
        &self.records
    }

    /// Tokens that matched no entry, in command-line order.
    pub fn unmatched(&self) -> impl Iterator<Item = &[u8]> {
        self.records
            .iter()
            .filter(|r| !r.matched)
            .map(|r| r.token.as_slice())
    }

    /// Drop the token records and keep the selected entries.
    pub fn into_members(self) -> MembershipSet {
        self.members
    }
}

/// Select the entries of `archive` named or matched by `tokens`.
///
/// A literal token found by exact lookup counts as matched even when an
/// earlier glob token is credited with the same entry in the glob pass.
///
/// # Errors
///
/// Only fails when the membership set or token table cannot be
/// allocated. Tokens that match nothing are not errors; see
/// [`Selection::unmatched`].
pub fn select<A, T>(archive: &A, tokens: &[T]) -> Result<Selection, SelectError>
where
    A: EntryListing + ?Sized,
    T: AsRef<[u8]>,
{
    let count = archive.entry_count();
    let mut members = MembershipSet::try_new(count)?;

    if tokens.is_empty() {
        members.mark_all();
        debug!(entries = count, "no tokens given, selecting whole archive");
        return Ok(Selection {
            members,
            records: Vec::new(),
        });
    }

    let mut records = Vec::new();
    records
        .try_reserve_exact(tokens.len())
        .map_err(|source| SelectError::Allocation {
            what: "pattern table",
            source,
        })?;

    for token in tokens {
        let token = token.as_ref();
        let is_glob = is_glob(token);
        let mut matched = false;

        if !is_glob {
            match archive.locate(&unescape(token)) {
                Some(index) => {
                    debug!(token = %String::from_utf8_lossy(token), index, "literal located");
                    members.mark(index);
                    matched = true;
                }
                None => debug!(
                    token = %String::from_utf8_lossy(token),
                    "literal not found by exact lookup"
                ),
            }
        }

        records.push(SelectionRecord {
            token: token.to_vec(),
            is_glob,
            matched,
        });
    }

    for index in 0..count {
        let name = archive.name_at(index);
        if let Some(record) = records.iter_mut().find(|r| fnmatch(&r.token, name)) {
            record.matched = true;
            members.mark(index);
        }
    }

    debug!(
        entries = count,
        selected = members.count(),
        tokens = records.len(),
        "selection complete"
    );

    Ok(Selection { members, records })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(selection: &Selection) -> Vec<usize> {
        selection.members().iter().collect()
    }

    fn unmatched(selection: &Selection) -> Vec<String> {
        selection
            .unmatched()
            .map(|t| String::from_utf8_lossy(t).into_owned())
            .collect()
    }

    const ARCHIVE: [&str; 3] = ["A.txt", "B.txt", "AB.txt"];

    #[test]
    fn no_tokens_selects_everything() {
        let tokens: [&str; 0] = [];
        let selection = select(&ARCHIVE[..], &tokens).unwrap();
        assert_eq!(marked(&selection), vec![0, 1, 2]);
        assert!(selection.records().is_empty());
    }

    #[test]
    fn no_tokens_on_empty_archive() {
        let archive: [&str; 0] = [];
        let tokens: [&str; 0] = [];
        let selection = select(&archive[..], &tokens).unwrap();
        assert!(selection.members().is_empty());
        assert_eq!(selection.members().count(), 0);
    }

    #[test]
    fn literal_and_glob_together() {
        let selection = select(&ARCHIVE[..], &["A.txt", "*.txt"]).unwrap();
        assert_eq!(marked(&selection), vec![0, 1, 2]);
        assert!(selection.records().iter().all(|r| r.matched));
        assert!(unmatched(&selection).is_empty());
    }

    #[test]
    fn missing_literal_is_reported() {
        let selection = select(&ARCHIVE[..], &["C.txt"]).unwrap();
        assert!(marked(&selection).is_empty());
        assert_eq!(unmatched(&selection), vec!["C.txt"]);
    }

    #[test]
    fn exact_literal_marks_only_its_entry() {
        let selection = select(&ARCHIVE[..], &["A.txt"]).unwrap();
        assert_eq!(marked(&selection), vec![0]);
        assert_eq!(
            selection.records(),
            &[SelectionRecord {
                token: "A.txt".into(),
                is_glob: false,
                matched: true,
            }]
        );
    }

    #[test]
    fn glob_marks_exactly_matching_entries() {
        let archive = ["a.txt", "b.md", "dir/c.txt", "d.TXT"];
        let selection = select(&archive[..], &["*.txt"]).unwrap();
        assert_eq!(marked(&selection), vec![0, 2]);
        assert!(selection.records()[0].is_glob);

        let selection = select(&archive[..], &["[ab].*"]).unwrap();
        assert_eq!(marked(&selection), vec![0, 1]);
    }

    #[test]
    fn unmatched_reported_once_per_token() {
        let selection = select(&ARCHIVE[..], &["*.md", "A.txt", "nope"]).unwrap();
        assert_eq!(marked(&selection), vec![0]);
        assert_eq!(unmatched(&selection), vec!["*.md", "nope"]);
    }

    #[test]
    fn repeated_token_is_reported_per_occurrence() {
        let selection = select(&ARCHIVE[..], &["x", "x"]).unwrap();
        assert_eq!(unmatched(&selection), vec!["x", "x"]);
    }

    #[test]
    fn duplicate_names_exact_marks_lowest() {
        let archive = ["dup", "other", "dup"];
        let selection = select(&archive[..], &["dup"]).unwrap();
        // The glob pass also sees the literal and matches both copies
        assert_eq!(marked(&selection), vec![0, 2]);

        let set = {
            let mut set = MembershipSet::try_new(archive.len()).unwrap();
            set.mark(archive.locate(b"dup").unwrap());
            set
        };
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn duplicate_names_glob_marks_all() {
        let archive = ["dup.txt", "other", "dup.txt"];
        let selection = select(&archive[..], &["d*"]).unwrap();
        assert_eq!(marked(&selection), vec![0, 2]);
    }

    #[test]
    fn selection_is_deterministic() {
        let tokens = ["B*", "A.txt", "zzz"];
        let first = select(&ARCHIVE[..], &tokens).unwrap();
        let second = select(&ARCHIVE[..], &tokens).unwrap();
        assert_eq!(first.members(), second.members());
        assert_eq!(first.records(), second.records());
    }

    #[test]
    fn marking_independent_of_token_order() {
        let forward = select(&ARCHIVE[..], &["A*", "*B*"]).unwrap();
        let backward = select(&ARCHIVE[..], &["*B*", "A*"]).unwrap();
        assert_eq!(forward.members(), backward.members());
        assert_eq!(marked(&forward), vec![0, 1, 2]);
    }

    #[test]
    fn first_listed_token_gets_credit() {
        // Both globs match every entry; only the first is credited
        let selection = select(&ARCHIVE[..], &["*.txt", "*"]).unwrap();
        assert_eq!(marked(&selection), vec![0, 1, 2]);
        assert_eq!(unmatched(&selection), vec!["*"]);

        let selection = select(&ARCHIVE[..], &["*", "*.txt"]).unwrap();
        assert_eq!(unmatched(&selection), vec!["*.txt"]);
    }

    #[test]
    fn located_literal_after_glob_still_matched() {
        let selection = select(&ARCHIVE[..], &["*.txt", "A.txt"]).unwrap();
        assert!(unmatched(&selection).is_empty());
    }

    #[test]
    fn escaped_literal_is_unescaped_for_lookup() {
        let archive = ["plain", "ab"];
        let selection = select(&archive[..], &[r"a\b"]).unwrap();
        assert_eq!(marked(&selection), vec![1]);
        assert!(unmatched(&selection).is_empty());
    }

    #[test]
    fn escaped_glob_char_matches_literally() {
        let archive = ["what?", "whats"];
        let selection = select(&archive[..], &[r"what\?"]).unwrap();
        assert_eq!(marked(&selection), vec![0]);
    }

    #[test]
    fn into_members_keeps_selection() {
        let selection = select(&ARCHIVE[..], &["B.txt"]).unwrap();
        let members = selection.into_members();
        assert_eq!(members.len(), 3);
        assert!(members.is_marked(1));
        assert_eq!(members.count(), 1);
    }

    #[test]
    fn undecodable_names_are_matched_byte_for_byte() {
        let archive: [&[u8]; 2] = [b"a\xff", b"a\xfe"];

        let selection = select(&archive[..], &[b"a\xfe"]).unwrap();
        assert_eq!(marked(&selection), vec![1]);
        assert!(unmatched(&selection).is_empty());

        let selection = select(&archive[..], &["a?"]).unwrap();
        assert_eq!(marked(&selection), vec![0, 1]);
    }
}
