//! Account addresses.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// A 20-byte account identifier, written `0x` followed by 40 hex digits.
///
/// Parsing accepts any letter case; the canonical rendering is lowercase, so
/// two spellings of the same account compare equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
  pub const fn from_bytes(bytes: [u8; 20]) -> Self { Self(bytes) }

  pub fn as_bytes(&self) -> &[u8; 20] { &self.0 }
}

impl FromStr for Address {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let digits = s
      .strip_prefix("0x")
      .or_else(|| s.strip_prefix("0X"))
      .ok_or_else(|| Error::InvalidAddress(s.to_owned()))?;

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(digits, &mut bytes)
      .map_err(|_| Error::InvalidAddress(s.to_owned()))?;
    Ok(Self(bytes))
  }
}

impl fmt::Display for Address {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "0x{}", hex::encode(self.0))
  }
}

impl fmt::Debug for Address {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Address({self})")
  }
}

impl Serialize for Address {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Address {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_is_case_insensitive() {
    let lower: Address = "0xabcdef0123456789abcdef0123456789abcdef01".parse().unwrap();
    let upper: Address = "0xABCDEF0123456789ABCDEF0123456789ABCDEF01".parse().unwrap();
    assert_eq!(lower, upper);
    assert_eq!(upper.to_string(), "0xabcdef0123456789abcdef0123456789abcdef01");
  }

  #[test]
  fn rejects_missing_prefix_and_bad_length() {
    assert!("abcdef0123456789abcdef0123456789abcdef01".parse::<Address>().is_err());
    assert!("0xabcdef".parse::<Address>().is_err());
    assert!("0xzzcdef0123456789abcdef0123456789abcdef01".parse::<Address>().is_err());
  }

  #[test]
  fn serde_uses_hex_string() {
    let addr = Address::from_bytes([0x11; 20]);
    let json = serde_json::to_string(&addr).unwrap();
    assert_eq!(json, "\"0x1111111111111111111111111111111111111111\"");
    let back: Address = serde_json::from_str(&json).unwrap();
    assert_eq!(back, addr);
  }
}
