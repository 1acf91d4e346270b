//! Time value type for Slurm JSON responses.
//!
//! Older `squeue --json` output reports timestamps as bare integers, newer
//! releases wrap them in a `{set, infinite, number}` object. [`TimeValue`]
//! accepts both.

use serde::{Deserialize, Deserializer};

/// Slurm time value - represents optional/infinite numeric values from Slurm JSON.
///
/// - `NotSet`: The value was not set in Slurm (set=false)
/// - `Infinite`: The value represents infinity (set=true, infinite=true)
/// - `Value(i64)`: A concrete epoch-seconds value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeValue {
    #[default]
    NotSet,
    Infinite,
    Value(i64),
}

impl TimeValue {
    /// Returns the numeric value if set and not infinite.
    #[must_use]
    pub fn value(&self) -> Option<i64> {
        match self {
            TimeValue::Value(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the numeric value, or 0 if not set or infinite.
    #[must_use]
    pub fn number(&self) -> i64 {
        self.value().unwrap_or(0)
    }

    fn from_fields(set: bool, infinite: bool, number: i64) -> Self {
        if !set {
            TimeValue::NotSet
        } else if infinite {
            TimeValue::Infinite
        } else {
            TimeValue::Value(number)
        }
    }
}

/// Wire shapes accepted for a time value
#[derive(Deserialize)]
#[serde(untagged)]
enum TimeValueRaw {
    Plain(i64),
    Structured {
        #[serde(default)]
        set: bool,
        #[serde(default)]
        infinite: bool,
        #[serde(default)]
        number: i64,
    },
}

impl<'de> Deserialize<'de> for TimeValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match TimeValueRaw::deserialize(deserializer)? {
            TimeValueRaw::Plain(n) => TimeValue::Value(n),
            TimeValueRaw::Structured {
                set,
                infinite,
                number,
            } => TimeValue::from_fields(set, infinite, number),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_value_number() {
        assert_eq!(TimeValue::Value(1704067200).number(), 1704067200);
        assert_eq!(TimeValue::Infinite.number(), 0);
        assert_eq!(TimeValue::NotSet.value(), None);
    }

    #[test]
    fn test_time_value_accepts_plain_integer() {
        let tv: TimeValue = serde_json::from_str("1700000000").unwrap();
        assert_eq!(tv, TimeValue::Value(1700000000));
    }

    #[test]
    fn test_time_value_accepts_structured_object() {
        let tv: TimeValue =
            serde_json::from_str(r#"{"set": true, "infinite": false, "number": 42}"#).unwrap();
        assert_eq!(tv.value(), Some(42));

        let inf: TimeValue =
            serde_json::from_str(r#"{"set": true, "infinite": true, "number": 0}"#).unwrap();
        assert_eq!(inf, TimeValue::Infinite);
        assert_eq!(inf.number(), 0);

        let unset: TimeValue = serde_json::from_str(r#"{"set": false}"#).unwrap();
        assert_eq!(unset, TimeValue::NotSet);
    }
}
