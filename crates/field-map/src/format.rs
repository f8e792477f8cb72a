//! Stringification of property values

use chrono::{Datelike, NaiveDate};

/// Format a date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Split a date into unpadded year, month and day strings
pub(crate) fn date_parts(date: NaiveDate) -> [String; 3] {
    [
        date.year().to_string(),
        date.month().to_string(),
        date.day().to_string(),
    ]
}

/// Format a bitmask with its flag variants
///
/// An exact variant match gives its name, a combination gives the set
/// variant names joined by `", "`, and bits no variant covers fall back to
/// the decimal value.
pub fn format_flags(bits: i64, variants: &[(&str, i64)]) -> String {
    if let Some((name, _)) = variants.iter().find(|(_, v)| *v == bits) {
        return (*name).to_string();
    }

    let mut remaining = bits;
    let mut names = Vec::new();
    for (name, v) in variants {
        if *v != 0 && (bits & v) == *v {
            names.push(*name);
            remaining &= !v;
        }
    }

    if remaining != 0 || names.is_empty() {
        bits.to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORS: &[(&str, i64)] = &[("None", 0), ("Red", 1), ("Green", 2), ("Blue", 4)];

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap();
        assert_eq!(format_date(date), "2023-07-04");
    }

    #[test]
    fn test_date_parts_are_unpadded() {
        let date = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap();
        assert_eq!(date_parts(date), ["2023", "7", "4"]);
    }

    #[test]
    fn test_format_flags_exact() {
        assert_eq!(format_flags(2, COLORS), "Green");
        assert_eq!(format_flags(0, COLORS), "None");
    }

    #[test]
    fn test_format_flags_combination() {
        assert_eq!(format_flags(5, COLORS), "Red, Blue");
    }

    #[test]
    fn test_format_flags_uncovered_bits() {
        assert_eq!(format_flags(9, COLORS), "9");
        assert_eq!(format_flags(3, &[]), "3");
    }
}
