// Identifier Allocator
//
// The next identifier is derived from the LAST row of the store by file
// position, not from the numeric maximum. Rows are only ever appended, so the
// last row carries the highest number. A malformed last identifier is an
// error; there is no fall-back scan.

use crate::error::{Error, Result};
use crate::store::RecordStore;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

pub const PREFIX: &str = "REG";

/// Minimum number of digits; larger numbers grow wider, never truncate
pub const WIDTH: usize = 3;

pub const FIRST_IDENTIFIER: &str = "REG001";

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^REG([0-9]+)$").expect("static pattern is valid"))
}

/// `REG` followed by `n` zero-padded to at least three digits
pub fn format_identifier(n: u64) -> String {
    format!("{PREFIX}{n:0width$}", width = WIDTH)
}

/// Sequence number of an identifier shaped `REG<digits>`
pub fn parse_identifier(value: &str) -> Result<u64> {
    identifier_pattern()
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
        .ok_or_else(|| Error::format(value))
}

/// Identifier following `last`
pub fn next_after(last: &str) -> Result<String> {
    let n = parse_identifier(last)?;
    let next = n.checked_add(1).ok_or_else(|| Error::format(last))?;
    Ok(format_identifier(next))
}

/// Next identifier for the given store
pub fn next_identifier(store: &RecordStore) -> Result<String> {
    let next = match store.last_identifier()? {
        None => FIRST_IDENTIFIER.to_string(),
        Some(last) => next_after(&last)?,
    };

    debug!(id = %next, path = %store.path().display(), "allocated identifier");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Registration, FIELD_NAMES};
    use std::fs;
    use tempfile::TempDir;

    fn registration(id: &str) -> Registration {
        Registration {
            id: id.to_string(),
            name: "Student".to_string(),
            mobile: format!("9{:0>9}", id.len()),
            aadhaar: "123412341234".to_string(),
            ..Registration::default()
        }
    }

    #[test]
    fn test_format_identifier() {
        assert_eq!(format_identifier(1), "REG001");
        assert_eq!(format_identifier(42), "REG042");
        assert_eq!(format_identifier(100), "REG100");
        assert_eq!(format_identifier(1000), "REG1000");
    }

    #[test]
    fn test_parse_identifier() {
        assert_eq!(parse_identifier("REG001").unwrap(), 1);
        assert_eq!(parse_identifier("REG0100").unwrap(), 100);
        assert_eq!(parse_identifier("REG1000").unwrap(), 1000);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["XYZ", "REG", "REG12a", "reg001", " REG001", "REG-1", ""] {
            assert!(
                matches!(parse_identifier(bad), Err(Error::Format { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let huge = format!("REG{}", "9".repeat(30));
        assert!(matches!(parse_identifier(&huge), Err(Error::Format { .. })));
    }

    #[test]
    fn test_next_after_widens() {
        assert_eq!(next_after("REG001").unwrap(), "REG002");
        assert_eq!(next_after("REG099").unwrap(), "REG100");
        assert_eq!(next_after("REG999").unwrap(), "REG1000");
    }

    #[test]
    fn test_absent_store_starts_at_one() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("registrations.csv"));
        assert_eq!(next_identifier(&store).unwrap(), "REG001");
    }

    #[test]
    fn test_header_only_store_starts_at_one() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registrations.csv");
        fs::write(&path, format!("{}\r\n", FIELD_NAMES.join(","))).unwrap();

        let store = RecordStore::open(path);
        assert_eq!(next_identifier(&store).unwrap(), "REG001");
    }

    #[test]
    fn test_sequence_over_appends() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("registrations.csv"));

        let mut allocated = Vec::new();
        for _ in 0..12 {
            let id = next_identifier(&store).unwrap();
            store.append(&registration(&id)).unwrap();
            allocated.push(id);
        }

        let expected: Vec<String> = (1..=12).map(format_identifier).collect();
        assert_eq!(allocated, expected);
    }

    #[test]
    fn test_malformed_last_row_fails() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("registrations.csv"));
        store.append(&registration("REG001")).unwrap();
        store.append(&registration("REG002")).unwrap();
        store.append(&registration("XYZ")).unwrap();

        match next_identifier(&store) {
            Err(Error::Format { value }) => assert_eq!(value, "XYZ"),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_uses_last_row_not_maximum() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path().join("registrations.csv"));
        store.append(&registration("REG010")).unwrap();
        store.append(&registration("REG003")).unwrap();

        assert_eq!(next_identifier(&store).unwrap(), "REG004");
    }

    #[test]
    fn test_short_last_row_is_format_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registrations.csv");
        fs::write(&path, format!("{}\r\nXYZ\r\n", FIELD_NAMES.join(","))).unwrap();

        let store = RecordStore::open(path);
        match next_identifier(&store) {
            Err(Error::Format { value }) => assert_eq!(value, "XYZ"),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_short_middle_row_does_not_block_allocation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registrations.csv");
        fs::write(&path, format!("{}\r\nREG001,Asha\r\n", FIELD_NAMES.join(","))).unwrap();

        let store = RecordStore::open(path);
        store.append(&registration("REG002")).unwrap();
        assert_eq!(next_identifier(&store).unwrap(), "REG003");
    }
}
