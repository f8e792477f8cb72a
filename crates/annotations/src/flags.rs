//! Flag mappings for bitmask properties

use crate::ConfigError;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

/// `Key = 4`: key is the non-whitespace run before `=`, value is the digit run after it
static FLAG_SPEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\S*)\s*=\s*([0-9]+)").expect("flag spec pattern is valid")
});

/// An enum whose variants are independent bits
///
/// Implemented by property types used with `Annotation::EnumFlags` when no
/// explicit mapping is given. Variants with a value of 0 never match.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Copy)]
/// struct Extras(i64);
///
/// impl FlagEnum for Extras {
///     const VARIANTS: &'static [(&'static str, i64)] =
///         &[("Wifi", 1), ("Parking", 2), ("Breakfast", 4)];
///
///     fn bits(&self) -> i64 {
///         self.0
///     }
/// }
/// ```
pub trait FlagEnum {
    /// Variant names with their bit values, in declaration order
    const VARIANTS: &'static [(&'static str, i64)];

    /// Current bitmask
    fn bits(&self) -> i64;
}

/// Ordered mapping from field name to bit value
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "FlagMappingRepr")]
pub struct FlagMapping {
    bits: IndexMap<String, i64>,
}

/// Accepted JSON shapes: `{"A": 1, "B": 4}` or a list of keys / `Key = n` specs
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagMappingRepr {
    Bits(IndexMap<String, i64>),
    Keys(Vec<String>),
}

impl From<FlagMappingRepr> for FlagMapping {
    fn from(repr: FlagMappingRepr) -> Self {
        match repr {
            FlagMappingRepr::Bits(bits) => Self { bits },
            FlagMappingRepr::Keys(keys) => {
                let explicit = keys.iter().any(|k| k.contains('='));
                Self::new(keys, explicit)
            }
        }
    }
}

impl Serialize for FlagMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits.serialize(serializer)
    }
}

impl FlagMapping {
    /// Build a mapping from literal strings
    ///
    /// With `explicit_values` each string is parsed as `Key = <digits>`,
    /// otherwise the strings are keys assigned 1, 2, 4, ... in order.
    pub fn new<I, S>(entries: I, explicit_values: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if explicit_values {
            Self::from_specs(entries)
        } else {
            Self::sequential(entries)
        }
    }

    /// Assign successive powers of two, starting at 1, in input order
    ///
    /// More than 63 keys overflow the bitmask; keeping the key count within
    /// the width of the property's integer is the caller's responsibility.
    pub fn sequential<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bits = IndexMap::new();
        let mut value: i64 = 1;
        for key in keys {
            bits.insert(key.as_ref().to_string(), value);
            value = value.wrapping_shl(1);
        }
        Self { bits }
    }

    /// Parse `Key = <digits>` specs, silently dropping entries that do not parse
    pub fn from_specs<I, S>(specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_specs_with(specs, |_| {})
    }

    /// Parse `Key = <digits>` specs, reporting every dropped entry to `sink`
    pub fn from_specs_with<I, S, F>(specs: I, mut sink: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(ConfigError),
    {
        let mut bits = IndexMap::new();
        for spec in specs {
            match parse_flag_spec(spec.as_ref()) {
                Ok((key, value)) => {
                    if bits.contains_key(&key) {
                        sink(ConfigError::DuplicateFlagKey(key));
                    } else {
                        bits.insert(key, value);
                    }
                }
                Err(err) => sink(err),
            }
        }
        Self { bits }
    }

    /// Mapping made of a flag enum's own variants
    pub fn from_enum<E: FlagEnum>() -> Self {
        Self::from(E::VARIANTS)
    }

    /// Bit value assigned to `key`
    pub fn get(&self, key: &str) -> Option<i64> {
        self.bits.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.bits.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Keys whose bit is set in `value`
    pub fn matching(&self, value: i64) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(move |(_, bit)| bit & value != 0)
            .map(|(key, _)| key)
    }
}

impl From<&[(&str, i64)]> for FlagMapping {
    fn from(variants: &[(&str, i64)]) -> Self {
        Self {
            bits: variants
                .iter()
                .map(|(name, bit)| (name.to_string(), *bit))
                .collect(),
        }
    }
}

/// Parse one `Key = <digits>` spec
fn parse_flag_spec(spec: &str) -> crate::Result<(String, i64)> {
    let captures = FLAG_SPEC
        .captures(spec)
        .ok_or_else(|| ConfigError::MalformedFlagSpec(spec.to_string()))?;

    let key = &captures[1];
    if key.is_empty() {
        return Err(ConfigError::MalformedFlagSpec(spec.to_string()));
    }

    let value = captures[2]
        .parse::<i64>()
        .map_err(|_| ConfigError::FlagValueOutOfRange(spec.to_string()))?;

    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sequential_powers_of_two() {
        let mapping = FlagMapping::sequential(["X", "Y", "Z"]);
        let entries: Vec<_> = mapping.iter().collect();
        assert_eq!(entries, vec![("X", 1), ("Y", 2), ("Z", 4)]);
    }

    #[test]
    fn test_sequential_is_repeatable() {
        let keys = ["Red", "Green", "Blue", "Alpha"];
        assert_eq!(FlagMapping::sequential(keys), FlagMapping::sequential(keys));
        assert_eq!(FlagMapping::sequential(keys).get("Alpha"), Some(8));
    }

    #[test]
    fn test_from_specs_parses_spacing_variants() {
        let mapping = FlagMapping::from_specs(["A = 1", "B=2", "C   =   16"]);
        assert_eq!(mapping.get("A"), Some(1));
        assert_eq!(mapping.get("B"), Some(2));
        assert_eq!(mapping.get("C"), Some(16));
    }

    #[test]
    fn test_from_specs_finds_spec_inside_text() {
        // The pattern is searched, not anchored
        let mapping = FlagMapping::from_specs(["  Other = 32 trailing"]);
        assert_eq!(mapping.get("Other"), Some(32));
    }

    #[test]
    fn test_from_specs_drops_malformed() {
        let mapping = FlagMapping::from_specs(["A = 1", "no value here", "B = x", "C = 4"]);
        let keys: Vec<_> = mapping.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "C"]);
    }

    #[test]
    fn test_from_specs_with_reports_errors() {
        let mut errors = Vec::new();
        let mapping = FlagMapping::from_specs_with(
            ["A = 1", "broken", "= 3", "A = 2", "Big = 99999999999999999999"],
            |err| errors.push(err),
        );

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("A"), Some(1));
        assert_eq!(
            errors,
            vec![
                ConfigError::MalformedFlagSpec("broken".to_string()),
                ConfigError::MalformedFlagSpec("= 3".to_string()),
                ConfigError::DuplicateFlagKey("A".to_string()),
                ConfigError::FlagValueOutOfRange("Big = 99999999999999999999".to_string()),
            ]
        );
    }

    #[test]
    fn test_new_selects_mode() {
        assert_eq!(FlagMapping::new(["A", "B"], false).get("B"), Some(2));
        assert_eq!(FlagMapping::new(["A = 8"], true).get("A"), Some(8));
    }

    #[test]
    fn test_matching_bits() {
        let mapping = FlagMapping::from_specs(["A = 1", "B = 2", "C = 4"]);
        let set: Vec<_> = mapping.matching(5).collect();
        assert_eq!(set, vec!["A", "C"]);
    }

    #[test]
    fn test_zero_bit_never_matches() {
        let mapping = FlagMapping::from_specs(["None = 0", "One = 1"]);
        let set: Vec<_> = mapping.matching(1).collect();
        assert_eq!(set, vec!["One"]);
    }

    #[test]
    fn test_from_enum() {
        struct Size(i64);
        impl FlagEnum for Size {
            const VARIANTS: &'static [(&'static str, i64)] = &[("Small", 1), ("Large", 2)];
            fn bits(&self) -> i64 {
                self.0
            }
        }

        let mapping = FlagMapping::from_enum::<Size>();
        assert_eq!(mapping.get("Large"), Some(2));
        assert_eq!(Size(3).bits(), 3);
    }

    #[test]
    fn test_deserialize_shapes() {
        let bits: FlagMapping = serde_json::from_str(r#"{ "A": 1, "B": 8 }"#).unwrap();
        assert_eq!(bits.get("B"), Some(8));

        let specs: FlagMapping = serde_json::from_str(r#"["A = 2", "B = 16"]"#).unwrap();
        assert_eq!(specs.get("B"), Some(16));

        let keys: FlagMapping = serde_json::from_str(r#"["A", "B", "C"]"#).unwrap();
        assert_eq!(keys.get("C"), Some(4));
    }

    #[test]
    fn test_serialize_as_map() {
        let mapping = FlagMapping::sequential(["A", "B"]);
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"{"A":1,"B":2}"#);
    }
}
