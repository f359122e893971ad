//! Version parsing and comparison
//!
//! Version strings in the wild follow several incompatible schemes, so
//! comparison is layered:
//!
//! 1. If a native Debian comparator (`dpkg --compare-versions`) is
//!    available and both strings carry Debian-only fields (epoch `:`,
//!    revision `-`, or `~`), defer to it — it knows epoch and revision
//!    semantics the layers below do not.
//! 2. If both strings are strict semver, the `semver` crate decides.
//! 3. Otherwise a documented segment grammar applies: split on `.`, each
//!    segment is a leading numeric run plus a trailing alphabetic suffix,
//!    the shorter sequence is right-padded with zero/empty segments,
//!    numerics compare first and suffixes lexicographically on tie.
//!
//! Suffix policy (deliberate, not accidental): an absent suffix sorts
//! AFTER any present suffix (`2.0.1` > `2.0.1rc1`), and a suffix starting
//! with `~` sorts BEFORE everything including the absent suffix
//! (`1.0~rc1` < `1.0`), matching the Debian semantic. In the fallback
//! grammar `+` is ordinary suffix text and compares lexicographically.
//!
//! Strings with no leading digit in their first segment are outside the
//! grammar and degrade to plain lexical comparison.

use crate::command::{argv, CommandRunner};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// One `.`-separated segment: numeric run plus alphabetic suffix
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    number: u64,
    suffix: String,
}

/// A version value parsed from a string.
///
/// The raw string is retained for display and as the comparison fallback
/// when the string is outside the segment grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    raw: String,
    segments: Vec<Segment>,
}

impl Version {
    /// Parse a version string. Never fails: out-of-grammar input yields a
    /// Version with no segments that compares lexically by its raw string.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let in_grammar = body
            .split('.')
            .next()
            .is_some_and(|first| first.starts_with(|c: char| c.is_ascii_digit()));

        let segments = if in_grammar {
            body.split('.').map(parse_segment).collect()
        } else {
            Vec::new()
        };

        Self {
            raw: trimmed.to_string(),
            segments,
        }
    }

    /// The original string this version was parsed from
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the string fit the segment grammar
    pub fn is_parsed(&self) -> bool {
        !self.segments.is_empty()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(&self.raw, &other.raw)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn parse_segment(seg: &str) -> Segment {
    let digit_end = seg
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(seg.len());

    Segment {
        number: seg[..digit_end].parse().unwrap_or(0),
        suffix: seg[digit_end..].to_string(),
    }
}

/// Suffix ordering rank: `~` before other suffixes before absent
fn suffix_rank(suffix: &str) -> u8 {
    if suffix.starts_with('~') {
        0
    } else if suffix.is_empty() {
        2
    } else {
        1
    }
}

fn cmp_suffix(a: &str, b: &str) -> Ordering {
    match suffix_rank(a).cmp(&suffix_rank(b)) {
        Ordering::Equal => a.cmp(b),
        other => other,
    }
}

/// Compare two version strings under the segment grammar, degrading to
/// lexical comparison when either side is out of grammar. Total and
/// infallible: this function never errors on any input.
pub fn compare(a: &str, b: &str) -> Ordering {
    if let (Ok(sa), Ok(sb)) = (semver::Version::parse(a), semver::Version::parse(b)) {
        return sa.cmp(&sb);
    }

    let va = Version::parse(a);
    let vb = Version::parse(b);

    if !va.is_parsed() || !vb.is_parsed() {
        return va.raw.cmp(&vb.raw);
    }

    let len = va.segments.len().max(vb.segments.len());
    let empty = Segment {
        number: 0,
        suffix: String::new(),
    };

    for i in 0..len {
        let sa = va.segments.get(i).unwrap_or(&empty);
        let sb = vb.segments.get(i).unwrap_or(&empty);

        match sa.number.cmp(&sb.number) {
            Ordering::Equal => {}
            other => return other,
        }
        match cmp_suffix(&sa.suffix, &sb.suffix) {
            Ordering::Equal => {}
            other => return other,
        }
    }

    Ordering::Equal
}

/// Version comparator with an optional native Debian-style backend.
///
/// The native path handles epoch, upstream, and revision fields the
/// segment grammar does not; it is only consulted when both strings carry
/// those fields, so ordinary versions stay on the pure path.
pub struct VersionComparator {
    native: Option<Arc<dyn CommandRunner>>,
}

impl VersionComparator {
    /// Comparator using only the pure comparison layers
    pub fn new() -> Self {
        Self { native: None }
    }

    /// Comparator that defers Debian-style strings to `dpkg`, when the
    /// runner confirms dpkg answers comparison queries at all.
    pub fn with_native_detection(runner: Arc<dyn CommandRunner>) -> Self {
        let probe = argv(&["dpkg", "--compare-versions", "1", "le", "1"]);
        let native = match runner.run(&probe) {
            Ok(out) if out.success() => Some(runner),
            _ => None,
        };
        Self { native }
    }

    /// Whether the native comparator path is active
    pub fn has_native(&self) -> bool {
        self.native.is_some()
    }

    /// Compare two version strings. Never errors; the native path falls
    /// back to the pure grammar if dpkg fails mid-run.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        if let Some(runner) = &self.native {
            if looks_debian(a) && looks_debian(b) {
                if let Some(ordering) = dpkg_compare(runner.as_ref(), a, b) {
                    return ordering;
                }
            }
        }
        compare(a, b)
    }
}

impl Default for VersionComparator {
    fn default() -> Self {
        Self::new()
    }
}

/// Debian-only fields the segment grammar cannot express
fn looks_debian(s: &str) -> bool {
    !s.is_empty()
        && s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().any(|c| matches!(c, ':' | '-' | '~'))
}

fn dpkg_compare(runner: &dyn CommandRunner, a: &str, b: &str) -> Option<Ordering> {
    let relation = |op: &str| -> Option<bool> {
        let cmd = argv(&["dpkg", "--compare-versions", a, op, b]);
        match runner.run(&cmd) {
            Ok(out) if out.exit_code == 0 => Some(true),
            Ok(out) if out.exit_code == 1 => Some(false),
            _ => None,
        }
    };

    if relation("eq")? {
        return Some(Ordering::Equal);
    }
    if relation("lt")? {
        return Some(Ordering::Less);
    }
    Some(Ordering::Greater)
}
