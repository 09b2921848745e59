//! Serde helpers for stake amounts.
//!
//! Amounts are `u128` in the smallest currency unit and travel as decimal
//! strings. Bare integers are still accepted on input when they fit in a
//! `u64`.

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.collect_str(amount)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
  Text(String),
  Number(u64),
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
  match Repr::deserialize(deserializer)? {
    Repr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    Repr::Number(n) => Ok(u128::from(n)),
  }
}
