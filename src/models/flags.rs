//! Serde helpers for the `0`/`1` flag columns.

use serde::{de::Error as _, Deserialize, Deserializer};

/// Deserializes a flag column: empty, `0` and `false` are off, `1` and `true` are on.
pub(crate) fn deserialize_flag<'de, D>(d: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(d)?;
    match s.trim() {
        "" | "0" => Ok(false),
        "1" => Ok(true),
        other if other.eq_ignore_ascii_case("false") => Ok(false),
        other if other.eq_ignore_ascii_case("true") => Ok(true),
        other => Err(D::Error::custom(format!("invalid flag value '{}'", other))),
    }
}
