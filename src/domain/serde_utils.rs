//! Serde utilities for raw message records.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

/// Module to handle message ids that arrive either as JSON numbers or as strings.
pub mod number_or_string {
    use super::{Deserializer, Serializer, Visitor, de, fmt};

    /// Serializes an id as a plain number.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(*value)
    }

    /// Deserializes a finite float from a string or number.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither a number nor a numeric string,
    /// or if it is not finite.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NumberOrStringVisitor;

        impl Visitor<'_> for NumberOrStringVisitor {
            type Value = f64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number or numeric string representing a message id")
            }

            #[allow(clippy::cast_precision_loss)]
            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value as f64)
            }

            #[allow(clippy::cast_precision_loss)]
            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value as f64)
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(de::Error::custom("message id must be finite"))
                }
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let parsed = value.trim().parse::<f64>().map_err(de::Error::custom)?;
                self.visit_f64(parsed)
            }
        }

        deserializer.deserialize_any(NumberOrStringVisitor)
    }
}

/// Module to handle message flags sent as a list of lowercase names,
/// e.g. `["read", "starred"]`.
pub mod flag_names {
    use super::{Deserializer, Serializer, Visitor, fmt};
    use crate::domain::entities::MessageFlags;
    use serde::de::SeqAccess;

    /// Serializes flags as a list of names.
    ///
    /// # Errors
    ///
    /// Returns an error if the serializer fails.
    pub fn serialize<S>(value: &MessageFlags, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(value.names())
    }

    /// Deserializes flags from a list of names. Unknown names are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a sequence of strings.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<MessageFlags, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FlagsVisitor;

        impl<'de> Visitor<'de> for FlagsVisitor {
            type Value = MessageFlags;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of flag names")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut flags = MessageFlags::empty();
                while let Some(name) = seq.next_element::<String>()? {
                    if let Some(flag) = MessageFlags::from_flag_name(&name) {
                        flags |= flag;
                    }
                }
                Ok(flags)
            }
        }

        deserializer.deserialize_seq(FlagsVisitor)
    }
}
