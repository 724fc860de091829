//! Shell-style wildcard matching over archive entry names.
//!
//! Semantics follow `fnmatch(3)` called with no flags:
//! - `*` matches zero or more characters, `/` and leading dots included
//! - `?` matches exactly one character
//! - `[...]` matches one character from a set, `[!...]` or `[^...]` from
//!   its complement, with `a-z` style ranges
//! - `\c` matches `c` literally
//!
//! Names and patterns are byte strings. When both are valid UTF-8 they are
//! matched per character, otherwise per byte. Matching is case-sensitive.

/// Bytes that turn a token into a glob pattern.
pub const GLOB_CHARS: [u8; 3] = *b"*?[";

/// Check if a token contains any glob metacharacter.
pub fn is_glob(token: impl AsRef<[u8]>) -> bool {
    token.as_ref().iter().any(|b| GLOB_CHARS.contains(b))
}

/// Remove backslash escapes from a literal token.
///
/// This is the name a literal token matches under [`fnmatch`]; a trailing
/// lone backslash is kept as is.
pub fn unescape(token: impl AsRef<[u8]>) -> Vec<u8> {
    let token = token.as_ref();
    let mut out = Vec::with_capacity(token.len());
    let mut bytes = token.iter().copied();
    while let Some(b) = bytes.next() {
        if b == b'\\' {
            out.push(bytes.next().unwrap_or(b'\\'));
        } else {
            out.push(b);
        }
    }
    out
}

/// One matchable unit of a name: a byte or a decoded character.
trait Unit: Copy + Ord {
    const STAR: Self;
    const QUESTION: Self;
    const OPEN: Self;
    const CLOSE: Self;
    const BANG: Self;
    const CARET: Self;
    const DASH: Self;
    const ESCAPE: Self;
}

macro_rules! unit {
    ($ty:ty, $conv:ident) => {
        impl Unit for $ty {
            const STAR: Self = $conv(b'*');
            const QUESTION: Self = $conv(b'?');
            const OPEN: Self = $conv(b'[');
            const CLOSE: Self = $conv(b']');
            const BANG: Self = $conv(b'!');
            const CARET: Self = $conv(b'^');
            const DASH: Self = $conv(b'-');
            const ESCAPE: Self = $conv(b'\\');
        }
    };
}

const fn byte(b: u8) -> u8 {
    b
}

const fn ascii(b: u8) -> char {
    b as char
}

unit!(u8, byte);
unit!(char, ascii);

/// Match `name` against the glob `pattern`.
///
/// # Examples
///
/// ```
/// use zippick::select::fnmatch;
///
/// assert!(fnmatch("*.txt", "docs/readme.txt"));
/// assert!(fnmatch("file[0-9].dat", "file1.dat"));
/// assert!(!fnmatch("*.txt", "readme.md"));
/// assert!(fnmatch("a?", b"a\xff"));
/// ```
pub fn fnmatch(pattern: impl AsRef<[u8]>, name: impl AsRef<[u8]>) -> bool {
    let (pattern, name) = (pattern.as_ref(), name.as_ref());
    match (std::str::from_utf8(pattern), std::str::from_utf8(name)) {
        (Ok(pattern), Ok(name)) => {
            let pattern: Vec<char> = pattern.chars().collect();
            let text: Vec<char> = name.chars().collect();
            match_units(&pattern, &text)
        }
        _ => match_units(pattern, name),
    }
}

/// Uses a single backtrack point for the most recent `*`, which is enough
/// because `*` is not stopped by any separator.
fn match_units<T: Unit>(pattern: &[T], text: &[T]) -> bool {
    let mut pi = 0;
    let mut ti = 0;
    // Pattern position just past the last `*`, and the text position it
    // is currently assumed to have consumed up to.
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        if pattern.get(pi) == Some(&T::STAR) {
            pi += 1;
            star = Some((pi, ti));
            continue;
        }

        if pi < pattern.len()
            && let Some(width) = match_one(&pattern[pi..], text[ti])
        {
            pi += width;
            ti += 1;
            continue;
        }

        match star {
            Some((star_pi, star_ti)) => {
                // Let the star swallow one more character and retry
                pi = star_pi;
                ti = star_ti + 1;
                star = Some((star_pi, ti));
            }
            None => return false,
        }
    }

    pattern[pi..].iter().all(|&c| c == T::STAR)
}

/// Match a single non-star pattern element against one unit.
///
/// Returns the number of pattern units the element spans when it
/// matches, `None` otherwise.
fn match_one<T: Unit>(pattern: &[T], c: T) -> Option<usize> {
    let first = pattern[0];
    if first == T::QUESTION {
        Some(1)
    } else if first == T::ESCAPE {
        match pattern.get(1) {
            Some(&escaped) => (escaped == c).then_some(2),
            None => (c == T::ESCAPE).then_some(1),
        }
    } else if first == T::OPEN {
        match match_bracket(pattern, c) {
            Some((true, width)) => Some(width),
            Some((false, _)) => None,
            // Unterminated bracket: the `[` is an ordinary character
            None => (c == T::OPEN).then_some(1),
        }
    } else {
        (first == c).then_some(1)
    }
}

/// Evaluate a bracket expression starting at `pattern[0] == '['`.
///
/// Returns whether `c` is accepted and how many pattern units the
/// expression spans, or `None` when there is no closing `]`.
fn match_bracket<T: Unit>(pattern: &[T], c: T) -> Option<(bool, usize)> {
    let mut i = 1;
    let negate = pattern
        .get(i)
        .is_some_and(|&u| u == T::BANG || u == T::CARET);
    if negate {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    loop {
        let &current = pattern.get(i)?;
        if current == T::CLOSE && !first {
            i += 1;
            break;
        }
        first = false;

        let lo = if current == T::ESCAPE && i + 1 < pattern.len() {
            i += 2;
            pattern[i - 1]
        } else {
            i += 1;
            current
        };

        if pattern.get(i) == Some(&T::DASH) && pattern.get(i + 1).is_some_and(|&h| h != T::CLOSE) {
            let hi = if pattern[i + 1] == T::ESCAPE && i + 2 < pattern.len() {
                i += 3;
                pattern[i - 1]
            } else {
                i += 2;
                pattern[i - 1]
            };
            if lo <= c && c <= hi {
                matched = true;
            }
        } else if lo == c {
            matched = true;
        }
    }

    Some((matched != negate, i))
}
