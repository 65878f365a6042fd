use super::{owned_extensions, utf8_text, Decoder};
use crate::error::{PipelineError, Result};
use crate::types::{DataMap, Format, Value};

const EXTENSIONS: &[&str] = &["toml"];

/// TOML decoder; datetimes come through as their RFC 3339 text
pub struct TomlDecoder;

impl Decoder for TomlDecoder {
    fn format(&self) -> Format {
        Format::Toml
    }

    fn supported_extensions(&self) -> Vec<String> {
        owned_extensions(EXTENSIONS)
    }

    fn parse(&self, content: &[u8]) -> Result<DataMap> {
        let text = utf8_text(Format::Toml, content)?;
        let table: ::toml::Table =
            ::toml::from_str(text).map_err(|e| PipelineError::decode(Format::Toml, e))?;
        Ok(table.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
    }
}
