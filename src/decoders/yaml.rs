use super::{owned_extensions, root_mapping, Decoder};
use crate::error::{PipelineError, Result};
use crate::types::{DataMap, Format, Value};

const EXTENSIONS: &[&str] = &["yaml", "yml"];

pub struct YamlDecoder;

impl Decoder for YamlDecoder {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn supported_extensions(&self) -> Vec<String> {
        owned_extensions(EXTENSIONS)
    }

    fn parse(&self, content: &[u8]) -> Result<DataMap> {
        let doc: serde_yaml::Value =
            serde_yaml::from_slice(content).map_err(|e| PipelineError::decode(Format::Yaml, e))?;
        root_mapping(Format::Yaml, Value::from(doc))
    }
}
