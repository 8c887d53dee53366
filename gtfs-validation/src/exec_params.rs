//! Parameters of a validation run.
//!
//! Every parameter is a string under a known key. Keys that are not known are refused, and the
//! keys that are not set fall back to their default.
use crate::value_helpers::{format_date, parse_date};
use crate::Error;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Path to the zip archive or the directory of the feed
pub const INPUT: &str = "input";
/// Url of the archive to download
pub const URL: &str = "url";
/// Directory of the report
pub const OUTPUT: &str = "output";
/// `true` to write the protobuf report instead of the JSON one
pub const PROTO: &str = "proto";
/// Comma separated names of the files to skip
pub const EXCLUDE: &str = "exclude";
/// `true` to skip the rules when the ingestion found errors
pub const ABORT_ON_ERROR: &str = "abort_on_error";
/// Lowest `min_transfer_time` that is not suspicious
pub const TRANSFER_MIN_TRANSFER_TIME_RANGE_MIN: &str = "transfer_min_transfer_time_range_min";
/// Highest `min_transfer_time` that is not suspicious
pub const TRANSFER_MIN_TRANSFER_TIME_RANGE_MAX: &str = "transfer_min_transfer_time_range_max";
/// Day of the validation, `YYYYMMDD`
pub const VALIDATION_DATE: &str = "validation_date";
/// Memory budget of the dataset, in megabytes
pub const MAX_DATASET_SIZE_MB: &str = "max_dataset_size_mb";

/// How the value of a parameter is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamType {
    Text,
    Bool,
    Integer,
    Number,
    Date,
}

impl ParamType {
    fn accepts(self, value: &str) -> bool {
        let value = value.trim();
        match self {
            ParamType::Text => true,
            ParamType::Bool => value.parse::<bool>().is_ok(),
            ParamType::Integer => value.parse::<i64>().is_ok(),
            ParamType::Number => value.parse::<f64>().map_or(false, |v| !v.is_nan()),
            ParamType::Date => parse_date(value).is_some(),
        }
    }
}

/// Known keys with their type and default value
const KNOWN_PARAMS: &[(&str, ParamType, Option<&str>)] = &[
    (INPUT, ParamType::Text, Some("input.zip")),
    (URL, ParamType::Text, None),
    (OUTPUT, ParamType::Text, Some("output")),
    (PROTO, ParamType::Bool, Some("false")),
    (EXCLUDE, ParamType::Text, None),
    (ABORT_ON_ERROR, ParamType::Bool, Some("false")),
    (TRANSFER_MIN_TRANSFER_TIME_RANGE_MIN, ParamType::Integer, Some("0")),
    (TRANSFER_MIN_TRANSFER_TIME_RANGE_MAX, ParamType::Integer, Some("86400")),
    // defaults to the current day
    (VALIDATION_DATE, ParamType::Date, None),
    (MAX_DATASET_SIZE_MB, ParamType::Number, Some("4096")),
];

fn known_param(key: &str) -> Result<(ParamType, Option<&'static str>), Error> {
    KNOWN_PARAMS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, param_type, default)| (*param_type, *default))
        .ok_or_else(|| Error::UnknownExecParam(key.to_owned()))
}

fn default_value(key: &str) -> Result<Option<String>, Error> {
    let (_, default) = known_param(key)?;
    Ok(match (key, default) {
        (VALIDATION_DATE, _) => Some(format_date(&chrono::Local::now().date_naive())),
        (_, d) => d.map(str::to_owned),
    })
}

#[derive(Deserialize)]
struct KeyValue {
    key: String,
    value: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonParams {
    List(Vec<KeyValue>),
    Object(BTreeMap<String, serde_json::Value>),
}

fn json_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// The parameters given for a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecParamRepository {
    values: BTreeMap<String, String>,
}

impl ExecParamRepository {
    /// No parameter set, every key has its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, replacing a previous value
    ///
    /// A value that cannot be read as the type of the parameter is refused and the previous value
    /// is kept
    pub fn add(&mut self, key: &str, value: impl Into<String>) -> Result<(), Error> {
        let (param_type, _) = known_param(key)?;
        let value = value.into();
        if !param_type.accepts(&value) {
            return Err(Error::InvalidExecParam {
                key: key.to_owned(),
                value,
            });
        }
        self.values.insert(key.to_owned(), value);
        Ok(())
    }

    /// Reads the parameters from `[{"key": ..., "value": ...}]` or `{"key": "value"}`
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let pairs: Vec<(String, serde_json::Value)> = match serde_json::from_str(json)? {
            JsonParams::List(l) => l.into_iter().map(|kv| (kv.key, kv.value)).collect(),
            JsonParams::Object(o) => o.into_iter().collect(),
        };
        let mut params = Self::new();
        for (key, value) in pairs {
            params.add(&key, json_to_string(value))?;
        }
        Ok(params)
    }

    /// Values of `other` replace the values of `self`
    pub fn merge(&mut self, other: ExecParamRepository) {
        self.values.extend(other.values);
    }

    /// The value of the parameter, or its default
    pub fn get_exec_param_value(&self, key: &str) -> Result<String, Error> {
        let default = default_value(key)?;
        self.values
            .get(key)
            .cloned()
            .or(default)
            .ok_or_else(|| Error::MissingExecParamValue(key.to_owned()))
    }

    /// The parameter has a value, given or by default
    pub fn has_exec_param_value(&self, key: &str) -> bool {
        matches!(self.get_exec_param_value(key), Ok(v) if !v.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &str) -> Result<T, Error> {
        let value = self.get_exec_param_value(key)?;
        value.trim().parse().map_err(|_| Error::InvalidExecParam {
            key: key.to_owned(),
            value,
        })
    }

    /// The parameter as a boolean, `true` or `false`
    pub fn get_bool(&self, key: &str) -> Result<bool, Error> {
        self.parse(key)
    }

    /// The parameter as an integer
    pub fn get_i64(&self, key: &str) -> Result<i64, Error> {
        self.parse(key)
    }

    /// The parameter as a decimal number
    pub fn get_f64(&self, key: &str) -> Result<f64, Error> {
        self.parse(key)
    }

    /// The parameter as a `YYYYMMDD` date
    pub fn get_date(&self, key: &str) -> Result<NaiveDate, Error> {
        let value = self.get_exec_param_value(key)?;
        parse_date(value.trim()).ok_or_else(|| Error::InvalidExecParam {
            key: key.to_owned(),
            value,
        })
    }

    /// The comma separated values of the parameter, none when it is not set
    pub fn get_list(&self, key: &str) -> Result<Vec<String>, Error> {
        if !self.has_exec_param_value(key) {
            return Ok(vec![]);
        }
        Ok(self
            .get_exec_param_value(key)?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect())
    }
}
