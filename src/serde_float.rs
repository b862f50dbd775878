//! Serde adapter for `f64` that survives JSON.
//!
//! Finite values are written as plain numbers. Infinities and `NaN` are
//! written as the strings `"inf"`, `"-inf"` and `"NaN"`, which serde_json
//! would otherwise turn into an unreadable `null`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

pub(crate) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.collect_str(value)
    }
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Repr::deserialize(deserializer)? {
        Repr::Number(value) => Ok(value),
        Repr::Text(text) => text
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid float: {text:?}"))),
    }
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct Float(#[serde(with = "crate::serde_float")] f64);

/// The same encoding applied to every element of a fixed-size array.
pub(crate) mod array {
    use super::Float;
    use serde::de::Error as _;
    use serde::ser::SerializeTuple;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer, const N: usize>(
        values: &[f64; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(N)?;
        for &value in values {
            tuple.serialize_element(&Float(value))?;
        }
        tuple.end()
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[f64; N], D::Error> {
        let values: Vec<Float> = Vec::deserialize(deserializer)?;
        let len = values.len();
        values
            .into_iter()
            .map(|f| f.0)
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &"one value per objective"))
    }
}
