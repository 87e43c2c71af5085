use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::params::RecordKind;
use super::template::FieldType;
use crate::error::{AnalyticsError, Result};

// ---------------------------------------------------------------------------
// Lenient decoders
//
// Query services are loosely typed: decimals arrive as strings, booleans as
// 0/1, dates with a time suffix. Absent and null always decode to `None`.
// ---------------------------------------------------------------------------

fn de_date<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<NaiveDate, D::Error> {
    let raw = String::deserialize(d)?;
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

fn de_opt_f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn de_opt_i64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<i64>, D::Error> {
    Ok(de_opt_f64(d)?.map(|v| v.round() as i64))
}

fn de_i64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i64, D::Error> {
    Ok(de_opt_i64(d)?.unwrap_or(0))
}

fn de_f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    Ok(de_opt_f64(d)?.unwrap_or(0.0))
}

fn de_opt_bool<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<bool>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn de_opt_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Raw bucket records, one struct per (kind, field type) family
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    #[serde(default, deserialize_with = "de_i64")]
    pub total: i64,
    #[serde(default, deserialize_with = "de_i64")]
    pub completed: i64,
    #[serde(default, deserialize_with = "de_i64")]
    pub incomplete: i64,
    /// Fraction in `0..=1`.
    #[serde(default, deserialize_with = "de_f64")]
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskBucket {
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub stats: TaskStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanBucket {
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "de_opt_bool")]
    pub value: Option<bool>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub true_count: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub false_count: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub total_count: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub true_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericBucket {
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub avg: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub sum: Option<f64>,
    #[serde(default, deserialize_with = "de_i64")]
    pub count: i64,
}

/// Bucket shape shared by text/date/time/datetime fields, counters and timers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountBucket {
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub count: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub unique_count: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub most_common_value: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub most_common_count: Option<i64>,
}

// ---------------------------------------------------------------------------
// RawBuckets — homogeneous, typed bucket list
// ---------------------------------------------------------------------------

/// One query result's buckets, decoded according to record kind and field type.
///
/// Every bucket in a list has the same shape, so normalization is one
/// exhaustive match on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBuckets {
    Tasks(Vec<TaskBucket>),
    Boolean(Vec<BooleanBucket>),
    Numeric(Vec<NumericBucket>),
    /// Text, date, time and datetime fields.
    Categorical(Vec<CountBucket>),
    /// Counters and timers.
    Activity(Vec<CountBucket>),
}

impl RawBuckets {
    /// Decode untyped bucket objects. Custom fields need their declared type.
    pub fn decode(
        kind: RecordKind,
        field_type: Option<FieldType>,
        data: &[Value],
    ) -> Result<Self> {
        match kind {
            RecordKind::Tasks => Ok(RawBuckets::Tasks(decode_all(data)?)),
            RecordKind::Counters | RecordKind::Timers => {
                Ok(RawBuckets::Activity(decode_all(data)?))
            }
            RecordKind::Fields => {
                let field_type = field_type.ok_or_else(|| {
                    AnalyticsError::InvalidArgument(
                        "custom field buckets require a field type".to_string(),
                    )
                })?;
                match field_type {
                    FieldType::Boolean => Ok(RawBuckets::Boolean(decode_all(data)?)),
                    FieldType::Number | FieldType::Currency => {
                        Ok(RawBuckets::Numeric(decode_all(data)?))
                    }
                    FieldType::Text | FieldType::Date | FieldType::Time | FieldType::Datetime => {
                        Ok(RawBuckets::Categorical(decode_all(data)?))
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawBuckets::Tasks(b) => b.len(),
            RawBuckets::Boolean(b) => b.len(),
            RawBuckets::Numeric(b) => b.len(),
            RawBuckets::Categorical(b) | RawBuckets::Activity(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(data: &[Value]) -> Result<Vec<T>> {
    data.iter()
        .map(|v| serde_json::from_value(v.clone()).map_err(AnalyticsError::from))
        .collect()
}

// ---------------------------------------------------------------------------
// Service responses
// ---------------------------------------------------------------------------

/// Aggregate fields a query service may send alongside its buckets.
///
/// Which fields are present depends on the kind queried; all are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSummary {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub total: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub completed: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub incomplete: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub completion_rate: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub avg_time_to_complete_minutes: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub total_count: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub unique_count: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub most_common_value: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub most_common_count: Option<i64>,
}

/// One series as returned by a query service: untyped buckets plus an
/// optional service-side summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub summary: Option<RawSummary>,
}

/// Query service response: a single series, or one series per selected key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawResponse {
    Multi {
        #[serde(rename = "fieldKeys", alias = "field_keys")]
        field_keys: Vec<String>,
        fields: HashMap<String, RawSeries>,
    },
    Single(RawSeries),
}
