//! Format decoders
//!
//! One decoder per supported configuration format. Every decoder turns raw
//! bytes into the same `DataMap` tree so downstream code never has to care
//! which format a file was written in. Decoders are stateless unit structs;
//! the only thing they carry is their fixed extension set.

pub mod env;
pub mod hcl;
pub mod ini;
pub mod json;
pub(crate) mod key_value;
pub mod properties;
pub mod toml;
pub mod xml;
pub mod yaml;

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, Result};
use crate::types::{DataMap, Format, NormalizedRecord, Value};

pub use self::env::EnvDecoder;
pub use self::hcl::HclDecoder;
pub use self::ini::IniDecoder;
pub use self::json::JsonDecoder;
pub use self::properties::PropertiesDecoder;
pub use self::toml::TomlDecoder;
pub use self::xml::XmlDecoder;
pub use self::yaml::YamlDecoder;

/// Core trait that all format decoders implement
pub trait Decoder: Send + Sync {
    /// Tag stamped on every record this decoder produces
    fn format(&self) -> Format;

    /// Extensions this decoder claims, lowercase and without the leading dot
    fn supported_extensions(&self) -> Vec<String>;

    /// Parse non-empty content into a mapping
    fn parse(&self, content: &[u8]) -> Result<DataMap>;

    fn can_process(&self, filename: &str) -> bool {
        if filename.is_empty() {
            return false;
        }
        let ext = file_extension(filename);
        self.supported_extensions().iter().any(|e| *e == ext)
    }

    /// Decode one file into a record.
    ///
    /// `content` is `None` when the caller never obtained any bytes, which is
    /// different from an empty file: empty content decodes to an empty
    /// mapping, missing content is rejected.
    fn decode(
        &self,
        cancel: &CancellationToken,
        filename: &str,
        content: Option<&[u8]>,
    ) -> Result<NormalizedRecord> {
        let content = validate_input(cancel, filename, content)?;
        let data = if content.is_empty() {
            DataMap::new()
        } else {
            self.parse(content)?
        };
        Ok(NormalizedRecord::new(filename, self.format(), data))
    }
}

impl fmt::Debug for dyn Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("format", &self.format())
            .field("extensions", &self.supported_extensions())
            .finish()
    }
}

/// The eight built-in decoders, in registration order
pub fn builtin_decoders() -> Vec<Arc<dyn Decoder>> {
    vec![
        Arc::new(YamlDecoder),
        Arc::new(JsonDecoder),
        Arc::new(TomlDecoder),
        Arc::new(PropertiesDecoder),
        Arc::new(IniDecoder),
        Arc::new(HclDecoder),
        Arc::new(XmlDecoder),
        Arc::new(EnvDecoder),
    ]
}

/// Lowercased text after the last `.` of the final path component.
///
/// Dotfiles count: `.env` has extension `env`.
pub fn file_extension(filename: &str) -> String {
    let name = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);
    match name.rfind('.') {
        Some(idx) => name[idx + 1..].to_lowercase(),
        None => String::new(),
    }
}

/// Lowercase and drop one leading dot.
pub fn normalize_extension(extension: &str) -> String {
    extension
        .strip_prefix('.')
        .unwrap_or(extension)
        .to_lowercase()
}

pub(crate) fn owned_extensions(extensions: &[&str]) -> Vec<String> {
    extensions.iter().map(|e| e.to_string()).collect()
}

fn validate_input<'a>(
    cancel: &CancellationToken,
    filename: &str,
    content: Option<&'a [u8]>,
) -> Result<&'a [u8]> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }
    if filename.is_empty() {
        return Err(PipelineError::InvalidInput("filename cannot be empty".to_string()));
    }
    content.ok_or_else(|| {
        PipelineError::InvalidInput(format!("content for {} was not provided", filename))
    })
}

/// Borrow content as UTF-8 text, failing as a decode error of `format`.
pub(crate) fn utf8_text(format: Format, content: &[u8]) -> Result<&str> {
    std::str::from_utf8(content).map_err(|e| PipelineError::decode(format, e))
}

/// A document root must be a mapping. A null document (blank or
/// comment-only) counts as an empty one.
pub(crate) fn root_mapping(format: Format, root: Value) -> Result<DataMap> {
    match root {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(DataMap::new()),
        other => Err(PipelineError::decode(
            format,
            anyhow::anyhow!("document root must be a mapping, got {}", kind_name(&other)),
        )),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Integer(_) | Value::Float(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_file_extension() {
        let cases = vec![
            ("app.yaml", "yaml"),
            ("configs/app.YML", "yml"),
            ("a.b.json", "json"),
            (".env", "env"),
            ("dir.d/Makefile", ""),
            ("trailing.", ""),
            ("", ""),
        ];
        for (input, expected) in cases {
            assert_eq!(file_extension(input), expected, "Failed for {}", input);
        }
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".YAML"), "yaml");
        assert_eq!(normalize_extension("Json"), "json");
    }

    #[test]
    fn test_every_builtin_decodes_empty_content_to_empty_mapping() {
        let cancel = CancellationToken::new();
        for decoder in builtin_decoders() {
            let ext = decoder.supported_extensions()[0].clone();
            let filename = format!("empty.{}", ext);
            let record = decoder
                .decode(&cancel, &filename, Some(&b""[..]))
                .unwrap_or_else(|e| panic!("{} failed on empty input: {}", ext, e));
            assert!(record.data.is_empty(), "Failed for {}", ext);
            assert_eq!(record.format, decoder.format());
            assert_eq!(record.metadata.key_count, 0);
        }
    }

    #[test]
    fn test_every_builtin_is_case_insensitive_and_rejects_empty_names() {
        for decoder in builtin_decoders() {
            for ext in decoder.supported_extensions() {
                assert!(decoder.can_process(&format!("x.{}", ext.to_uppercase())));
                assert!(decoder.can_process(&format!("dir/x.{}", ext)));
            }
            assert!(!decoder.can_process(""));
            assert!(!decoder.can_process("x.unknown"));
        }
    }

    #[test]
    fn test_decode_rejects_missing_content_and_filename() {
        let cancel = CancellationToken::new();
        for decoder in builtin_decoders() {
            let err = decoder.decode(&cancel, "f.any", None).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidInput);
            let err = decoder.decode(&cancel, "", Some(&b"a=b"[..])).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidInput);
        }
    }

    #[test]
    fn test_decode_rejects_cancelled_token() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        for decoder in builtin_decoders() {
            let err = decoder.decode(&cancel, "f.any", Some(&b""[..])).unwrap_err();
            assert_eq!(err.code(), ErrorCode::Cancelled);
        }
    }
}
