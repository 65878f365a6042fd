use super::{key_value, owned_extensions, utf8_text, Decoder};
use crate::error::Result;
use crate::types::{DataMap, Format};

const EXTENSIONS: &[&str] = &["properties"];

/// Decoder for Java-style `.properties` files.
///
/// Values are always strings; `port=8080` stays `"8080"`.
pub struct PropertiesDecoder;

impl Decoder for PropertiesDecoder {
    fn format(&self) -> Format {
        Format::Properties
    }

    fn supported_extensions(&self) -> Vec<String> {
        owned_extensions(EXTENSIONS)
    }

    fn parse(&self, content: &[u8]) -> Result<DataMap> {
        let text = utf8_text(Format::Properties, content)?;
        Ok(key_value::parse_flat(text))
    }
}
