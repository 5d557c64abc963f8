use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid migration version '{raw}': {reason}")]
pub struct ParseVersionError {
    pub raw: String,
    pub reason: &'static str,
}

/// Ordered migration version token.
///
/// Accepts an optional `v`/`V` prefix followed by unsigned integer segments
/// separated by `.` or `_` (`3`, `v3`, `0.40.23.002`, `0_40_23_002`).
/// Segments compare numerically and trailing zero segments are ignored, so
/// `1.0` and `1` are the same version.
#[derive(Debug, Clone)]
pub struct MigrationVersion {
    segments: Vec<u64>,
}

impl MigrationVersion {
    pub fn parse(raw: &str) -> Result<Self, ParseVersionError> {
        raw.parse()
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Segments with trailing zeros removed; the basis for equality and ordering.
    fn significant(&self) -> &[u64] {
        let len = self
            .segments
            .iter()
            .rposition(|s| *s != 0)
            .map_or(0, |idx| idx + 1);
        &self.segments[..len]
    }
}

impl FromStr for MigrationVersion {
    type Err = ParseVersionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let err = |reason| ParseVersionError {
            raw: raw.to_string(),
            reason,
        };

        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        if body.is_empty() {
            return Err(err("empty version"));
        }

        let segments = body
            .split(['.', '_'])
            .map(|segment| {
                if segment.is_empty() {
                    return Err(err("empty segment"));
                }
                if !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(err("segments must be unsigned integers"));
                }
                segment.parse::<u64>().map_err(|_| err("segment out of range"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

impl PartialEq for MigrationVersion {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for MigrationVersion {}

impl Hash for MigrationVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl Ord for MigrationVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        for (x, y) in a.iter().zip(b.iter()) {
            match x.cmp(y) {
                Ordering::Equal => continue,
                non_eq => return non_eq,
            }
        }
        a.len().cmp(&b.len())
    }
}

impl PartialOrd for MigrationVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn v(raw: &str) -> MigrationVersion {
        MigrationVersion::parse(raw).unwrap()
    }

    #[test]
    fn parses_supported_forms() {
        assert_eq!(v("3").segments(), &[3]);
        assert_eq!(v("v3").segments(), &[3]);
        assert_eq!(v("V3").segments(), &[3]);
        assert_eq!(v("0.40.23.002").segments(), &[0, 40, 23, 2]);
        assert_eq!(v("0_40_23_002").segments(), &[0, 40, 23, 2]);
        assert_eq!(v(" 1.2 ").segments(), &[1, 2]);
    }

    #[test]
    fn rejects_malformed_input() {
        for raw in ["", "v", "1..2", "1.", ".1", "1.a", "abc", "1-2", "-1"] {
            assert!(
                MigrationVersion::parse(raw).is_err(),
                "expected parse failure for {raw:?}"
            );
        }
    }

    #[test]
    fn display_is_dotted() {
        assert_eq!(v("v0_40_23_002").to_string(), "0.40.23.2");
        assert_eq!(v("4").to_string(), "4");
    }

    #[test]
    fn trailing_zeros_are_insignificant() {
        assert_eq!(v("1"), v("1.0"));
        assert_eq!(v("1.0.0"), v("v1"));
        assert_eq!(v("0"), v("0.0"));
    }

    #[test]
    fn orders_numerically_not_lexically() {
        assert!(v("2") < v("10"));
        assert!(v("0.9") < v("0.10"));
        assert!(v("1") < v("1.0.1"));
        assert!(v("0") < v("1"));
        assert!(v("0.40.23.002") > v("0.40.23.001"));
        assert!(v("0.40.3.001") < v("0.40.23.001"));
    }

    proptest! {
        #[test]
        fn ordering_matches_segment_comparison(
            a in proptest::collection::vec(1u64..1000, 1..5),
            b in proptest::collection::vec(1u64..1000, 1..5),
        ) {
            let render = |s: &[u64]| s.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
            let va = v(&render(&a));
            let vb = v(&render(&b));
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
            prop_assert_eq!(va == vb, a == b);
        }

        #[test]
        fn display_round_trips_ordering(segments in proptest::collection::vec(0u64..10_000, 1..6)) {
            let rendered = segments.iter().map(u64::to_string).collect::<Vec<_>>().join("_");
            let parsed = v(&rendered);
            let reparsed = v(&parsed.to_string());
            prop_assert_eq!(parsed, reparsed);
        }
    }
}
