//! # Hardware Address Validation
//!
//! A hardware address is six groups of two hex digits joined by one
//! consistent separator: `aa:bb:cc:dd:ee:ff`, `AA-BB-CC-DD-EE-FF` or
//! `aabbccddeeff`. Mixed separators are rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

const GROUPS: usize = 6;
const BARE_LEN: usize = GROUPS * 2;
const SEPARATED_LEN: usize = GROUPS * 3 - 1;

/// Check whether `candidate` is a canonical hardware address.
///
/// Pure predicate; case-insensitive on the hex digits.
#[must_use]
pub fn is_valid_hardware_address(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();

    match bytes.len() {
        BARE_LEN => bytes.iter().all(u8::is_ascii_hexdigit),
        SEPARATED_LEN => {
            let separator = bytes[2];
            if separator != b':' && separator != b'-' {
                return false;
            }
            bytes.iter().enumerate().all(|(i, b)| {
                if i % 3 == 2 {
                    *b == separator
                } else {
                    b.is_ascii_hexdigit()
                }
            })
        }
        _ => false,
    }
}

/// A validated hardware address.
///
/// Keeps the spelling it was received with: directory lookups and the
/// `options/<address>` reply topic both use it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HardwareAddress(String);

impl HardwareAddress {
    /// Validate and wrap an address.
    ///
    /// Returns `None` when the string is not a canonical hardware address.
    #[must_use]
    pub fn parse(candidate: &str) -> Option<Self> {
        is_valid_hardware_address(candidate).then(|| Self(candidate.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HardwareAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_hardware_address(&value) {
            Ok(Self(value))
        } else {
            Err(format!("invalid hardware address: {value}"))
        }
    }
}

impl From<HardwareAddress> for String {
    fn from(address: HardwareAddress) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_each_separator() {
        assert!(is_valid_hardware_address("aa:bb:cc:dd:ee:ff"));
        assert!(is_valid_hardware_address("AA-BB-CC-DD-EE-FF"));
        assert!(is_valid_hardware_address("aabbccddeeff"));
        assert!(is_valid_hardware_address("0A:1b:2C:3d:4E:5f"));
    }

    #[test]
    fn test_rejects_mixed_separators() {
        assert!(!is_valid_hardware_address("aa:bb-cc:dd:ee:ff"));
        assert!(!is_valid_hardware_address("aa-bb-cc-dd-ee:ff"));
    }

    #[test]
    fn test_rejects_wrong_shape() {
        assert!(!is_valid_hardware_address(""));
        assert!(!is_valid_hardware_address("aa:bb:cc:dd:ee"));
        assert!(!is_valid_hardware_address("aa:bb:cc:dd:ee:ff:00"));
        assert!(!is_valid_hardware_address("aabbccddeef"));
        assert!(!is_valid_hardware_address("aa.bb.cc.dd.ee.ff"));
        assert!(!is_valid_hardware_address("gg:bb:cc:dd:ee:ff"));
        assert!(!is_valid_hardware_address("aa:bb:cc:dd:ee:ff\n"));
        assert!(!is_valid_hardware_address("a:abb:cc:dd:ee:ff"));
    }

    #[test]
    fn test_parse_preserves_spelling() {
        let address = HardwareAddress::parse("AA-bb-CC-dd-EE-ff").unwrap();
        assert_eq!(address.as_str(), "AA-bb-CC-dd-EE-ff");
        assert!(HardwareAddress::parse("not-a-mac").is_none());
    }

    #[test]
    fn test_serde_rejects_invalid() {
        let ok: Result<HardwareAddress, _> = serde_json::from_str("\"aabbccddeeff\"");
        assert!(ok.is_ok());
        let bad: Result<HardwareAddress, _> = serde_json::from_str("\"aabbccddeef\"");
        assert!(bad.is_err());
    }

    fn groups() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[0-9a-fA-F]{2}", GROUPS)
    }

    proptest! {
        #[test]
        fn prop_consistent_separator_is_valid(
            groups in groups(),
            separator in prop::sample::select(vec!["", ":", "-"]),
        ) {
            let candidate = groups.join(separator);
            prop_assert!(is_valid_hardware_address(&candidate));
        }

        #[test]
        fn prop_wrong_group_count_is_invalid(
            groups in prop::collection::vec("[0-9a-f]{2}", 0..12usize),
            separator in prop::sample::select(vec!["", ":", "-"]),
        ) {
            prop_assume!(groups.len() != GROUPS);
            let candidate = groups.join(separator);
            prop_assert!(!is_valid_hardware_address(&candidate));
        }

        #[test]
        fn prop_mixed_separators_are_invalid(groups in groups(), swap in 1..5usize) {
            let mut candidate = String::new();
            for (i, group) in groups.iter().enumerate() {
                if i > 0 {
                    candidate.push(if i == swap { '-' } else { ':' });
                }
                candidate.push_str(group);
            }
            prop_assert!(!is_valid_hardware_address(&candidate));
        }

        #[test]
        fn prop_non_hex_digit_is_invalid(groups in groups(), position in 0..12usize, bad in "[g-zG-Z]") {
            let mut bare: Vec<char> = groups.concat().chars().collect();
            bare[position] = bad.chars().next().unwrap_or('z');
            let candidate: String = bare.into_iter().collect();
            prop_assert!(!is_valid_hardware_address(&candidate));
        }
    }
}
