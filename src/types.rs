use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FileFailure;

/// Top-level shape of every decoded file
pub type DataMap = BTreeMap<String, Value>;

/// Format-agnostic value tree produced by every decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(DataMap),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&DataMap> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// A nested mapping, or a sequence that actually holds something.
    pub fn is_nested(&self) -> bool {
        match self {
            Value::Mapping(_) => true,
            Value::Sequence(items) => !items.is_empty(),
            _ => false,
        }
    }

    /// Scalar text used when a non-string scalar has to become a mapping key.
    pub fn to_key_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Sequence(_) | Value::Mapping(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DataMap> for Value {
    fn from(m: DataMap) -> Self {
        Value::Mapping(m)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(v: serde_yaml::Value) -> Self {
        match v {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (Value::from(k).to_key_string(), Value::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

impl From<toml::Value> for Value {
    fn from(v: toml::Value) -> Self {
        match v {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            toml::Value::Table(table) => {
                Value::Mapping(table.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// The eight supported configuration formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Yaml,
    Json,
    Toml,
    Ini,
    Properties,
    Env,
    Hcl,
    Xml,
}

impl Format {
    pub const ALL: [Format; 8] = [
        Format::Yaml,
        Format::Json,
        Format::Toml,
        Format::Properties,
        Format::Ini,
        Format::Hcl,
        Format::Xml,
        Format::Env,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Toml => "toml",
            Format::Ini => "ini",
            Format::Properties => "properties",
            Format::Env => "env",
            Format::Hcl => "hcl",
            Format::Xml => "xml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Derived facts about a decoded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub processor: Format,
    pub key_count: usize,
    pub has_nested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirname: Option<String>,
}

impl RecordMetadata {
    pub fn derive(filename: &str, format: Format, data: &DataMap) -> Self {
        let (basename, dirname) = if filename.is_empty() {
            (None, None)
        } else {
            (Some(base_name(filename)), Some(dir_name(filename)))
        };

        Self {
            processor: format,
            key_count: data.len(),
            has_nested: data.values().any(Value::is_nested),
            basename,
            dirname,
        }
    }
}

fn base_name(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string())
}

fn dir_name(filename: &str) -> String {
    match Path::new(filename).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        Some(_) => ".".to_string(),
        None => filename.to_string(),
    }
}

/// One successfully decoded configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub filename: String,
    pub format: Format,
    pub data: DataMap,
    pub metadata: RecordMetadata,
    pub timestamp: DateTime<Utc>,
}

impl NormalizedRecord {
    pub fn new(filename: &str, format: Format, data: DataMap) -> Self {
        let metadata = RecordMetadata::derive(filename, format, &data);
        Self {
            filename: filename.to_string(),
            format,
            data,
            metadata,
            timestamp: Utc::now(),
        }
    }
}

/// Result of pushing one file through the pipeline
#[derive(Debug)]
pub enum FileOutcome {
    Success(NormalizedRecord),
    Failure(FileFailure),
}

impl FileOutcome {
    pub fn filename(&self) -> &str {
        match self {
            FileOutcome::Success(record) => &record.filename,
            FileOutcome::Failure(failure) => &failure.filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success(_))
    }
}

/// Basic file information returned by a file reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub is_dir: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataMap {
        let mut nested = DataMap::new();
        nested.insert("host".to_string(), Value::from("localhost"));

        let mut data = DataMap::new();
        data.insert("name".to_string(), Value::from("svc"));
        data.insert("db".to_string(), Value::Mapping(nested));
        data
    }

    #[test]
    fn test_metadata_counts_top_level_keys() {
        let meta = RecordMetadata::derive("configs/app.yaml", Format::Yaml, &sample());
        assert_eq!(meta.processor, Format::Yaml);
        assert_eq!(meta.key_count, 2);
        assert!(meta.has_nested);
        assert_eq!(meta.basename.as_deref(), Some("app.yaml"));
        assert_eq!(meta.dirname.as_deref(), Some("configs"));
    }

    #[test]
    fn test_metadata_bare_filename_dirname_is_dot() {
        let meta = RecordMetadata::derive("app.env", Format::Env, &DataMap::new());
        assert_eq!(meta.dirname.as_deref(), Some("."));
        assert_eq!(meta.key_count, 0);
        assert!(!meta.has_nested);
    }

    #[test]
    fn test_metadata_omits_path_fields_without_filename() {
        let meta = RecordMetadata::derive("", Format::Json, &sample());
        assert!(meta.basename.is_none());
        assert!(meta.dirname.is_none());
    }

    #[test]
    fn test_empty_sequence_is_not_nested() {
        let mut data = DataMap::new();
        data.insert("items".to_string(), Value::Sequence(Vec::new()));
        assert!(!RecordMetadata::derive("a.json", Format::Json, &data).has_nested);

        data.insert("more".to_string(), Value::Sequence(vec![Value::Integer(1)]));
        assert!(RecordMetadata::derive("a.json", Format::Json, &data).has_nested);
    }

    #[test]
    fn test_yaml_non_string_keys_become_text() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes\n").unwrap();
        let value = Value::from(yaml);
        assert_eq!(value.get("1"), Some(&Value::from("one")));
        assert!(value.get("true").is_some());
    }

    #[test]
    fn test_value_serializes_as_plain_json() {
        let json = serde_json::to_value(Value::Mapping(sample())).unwrap();
        assert_eq!(json["db"]["host"], "localhost");
        assert_eq!(json["name"], "svc");
    }

    #[test]
    fn test_format_display_is_lowercase() {
        assert_eq!(Format::Properties.to_string(), "properties");
        assert_eq!(serde_json::to_string(&Format::Hcl).unwrap(), "\"hcl\"");
    }
}
