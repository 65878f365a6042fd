use super::{owned_extensions, root_mapping, utf8_text, Decoder};
use crate::error::{PipelineError, Result};
use crate::types::{DataMap, Format, Value};

const EXTENSIONS: &[&str] = &["hcl"];

/// HCL decoder.
///
/// Attributes become keys; blocks become nested mappings keyed by block type
/// and then by each label in order.
pub struct HclDecoder;

impl Decoder for HclDecoder {
    fn format(&self) -> Format {
        Format::Hcl
    }

    fn supported_extensions(&self) -> Vec<String> {
        owned_extensions(EXTENSIONS)
    }

    fn parse(&self, content: &[u8]) -> Result<DataMap> {
        let text = utf8_text(Format::Hcl, content)?;
        let body: ::hcl::Value =
            ::hcl::from_str(text).map_err(|e| PipelineError::decode(Format::Hcl, e))?;
        let json = serde_json::to_value(body).map_err(|e| PipelineError::decode(Format::Hcl, e))?;
        root_mapping(Format::Hcl, Value::from(json))
    }
}
