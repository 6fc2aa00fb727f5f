//! Byte counts: the quota grammar accepted on the command line and the
//! binary-prefix rendering used in usage reports.

use std::fmt;
use std::str::FromStr;

const KIB: u64 = 1024;

/// Suffixes accepted by [`parse_byte_size`], with their binary exponents.
const SUFFIXES: [(&str, u32); 5] = [("KB", 1), ("MB", 2), ("GB", 3), ("TB", 4), ("PB", 5)];

/// Unit letters used by [`humanize_bytes`], smallest first.
const UNITS: [&str; 6] = ["", "K", "M", "G", "T", "P"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ByteSizeError {
    #[error("empty size")]
    Empty,
    #[error("invalid size '{0}': expected an integer optionally suffixed with KB, MB, GB, TB or PB")]
    Invalid(String),
    #[error("size '{0}' does not fit in 64 bits")]
    Overflow(String),
}

/// Parse a size such as `5`, `512KB` or `10GB` into a byte count.
///
/// Multipliers are powers of 1024. Suffixes are case-sensitive.
pub fn parse_byte_size(input: &str) -> Result<u64, ByteSizeError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ByteSizeError::Empty);
    }

    let (digits, exponent) = SUFFIXES
        .iter()
        .find_map(|(suffix, exp)| input.strip_suffix(suffix).map(|rest| (rest, *exp)))
        .unwrap_or((input, 0));

    let digits = digits.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ByteSizeError::Invalid(input.to_string()));
    }

    let value: u64 = digits
        .parse()
        .map_err(|_| ByteSizeError::Overflow(input.to_string()))?;

    KIB.checked_pow(exponent)
        .and_then(|multiplier| value.checked_mul(multiplier))
        .ok_or_else(|| ByteSizeError::Overflow(input.to_string()))
}

/// Render a byte count with one decimal place and a binary unit letter,
/// e.g. `1536` -> `1.5KB`.
pub fn humanize_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{:3.1}{}B", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1}YiB", value)
}

/// An administrator-supplied quota.
///
/// Keeps the text exactly as given so messages can echo it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quota {
    raw: String,
    bytes: u64,
}

impl Quota {
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for Quota {
    type Err = ByteSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            raw: s.to_string(),
            bytes: parse_byte_size(s)?,
        })
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_parse_bare_integers() {
        assert_eq!(parse_byte_size("0").unwrap(), 0);
        assert_eq!(parse_byte_size("5").unwrap(), 5);
        assert_eq!(parse_byte_size(" 42 ").unwrap(), 42);
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(parse_byte_size("1KB").unwrap(), 1024);
        assert_eq!(parse_byte_size("3MB").unwrap(), 3 * 1024 * 1024);
        assert_eq!(parse_byte_size("10GB").unwrap(), 10 * GIB);
        assert_eq!(parse_byte_size("2TB").unwrap(), 2 * GIB * 1024);
        assert_eq!(parse_byte_size("1PB").unwrap(), GIB * 1024 * 1024);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_byte_size(""), Err(ByteSizeError::Empty));
        assert!(matches!(parse_byte_size("10XB"), Err(ByteSizeError::Invalid(_))));
        assert!(matches!(parse_byte_size("GB"), Err(ByteSizeError::Invalid(_))));
        assert!(matches!(parse_byte_size("ten"), Err(ByteSizeError::Invalid(_))));
        assert!(matches!(parse_byte_size("-1"), Err(ByteSizeError::Invalid(_))));
        assert!(matches!(parse_byte_size("10gb"), Err(ByteSizeError::Invalid(_))));
        assert!(matches!(parse_byte_size("1.5GB"), Err(ByteSizeError::Invalid(_))));
    }

    #[test]
    fn test_parse_overflow() {
        assert!(matches!(
            parse_byte_size("99999999999999999999"),
            Err(ByteSizeError::Overflow(_))
        ));
        assert!(matches!(
            parse_byte_size("100000PB"),
            Err(ByteSizeError::Overflow(_))
        ));
    }

    #[test]
    fn test_humanize_units() {
        assert_eq!(humanize_bytes(0), "0.0B");
        assert_eq!(humanize_bytes(5), "5.0B");
        assert_eq!(humanize_bytes(1023), "1023.0B");
        assert_eq!(humanize_bytes(1536), "1.5KB");
        assert_eq!(humanize_bytes(GIB), "1.0GB");
        assert_eq!(humanize_bytes(2 * GIB), "2.0GB");
        assert_eq!(humanize_bytes(3 * GIB), "3.0GB");
        assert_eq!(humanize_bytes(1024 * 1024 * GIB), "1.0PB");
    }

    #[test]
    fn test_humanize_past_petabytes() {
        assert_eq!(humanize_bytes(1024 * 1024 * 1024 * GIB), "1.0YiB");
    }

    #[test]
    fn test_humanize_shifts_one_unit_per_1024() {
        assert_eq!(humanize_bytes(7), "7.0B");
        assert_eq!(humanize_bytes(7 * 1024), "7.0KB");
        assert_eq!(humanize_bytes(7 * 1024 * 1024), "7.0MB");
    }

    #[test]
    fn test_quota_keeps_raw_text() {
        let quota: Quota = "2GB".parse().unwrap();
        assert_eq!(quota.bytes(), 2 * GIB);
        assert_eq!(quota.to_string(), "2GB");
        assert!("2QB".parse::<Quota>().is_err());
    }
}
