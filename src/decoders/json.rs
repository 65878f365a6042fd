use super::{owned_extensions, root_mapping, Decoder};
use crate::error::{PipelineError, Result};
use crate::types::{DataMap, Format, Value};

const EXTENSIONS: &[&str] = &["json"];

pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn format(&self) -> Format {
        Format::Json
    }

    fn supported_extensions(&self) -> Vec<String> {
        owned_extensions(EXTENSIONS)
    }

    fn parse(&self, content: &[u8]) -> Result<DataMap> {
        let doc: serde_json::Value =
            serde_json::from_slice(content).map_err(|e| PipelineError::decode(Format::Json, e))?;
        root_mapping(Format::Json, Value::from(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_json_object() {
        let data = JsonDecoder
            .parse(br#"{"name":"svc","limits":{"cpu":2,"mem":1.5},"hosts":["a","b"],"extra":null}"#)
            .unwrap();

        assert_eq!(data.len(), 4);
        assert_eq!(data["limits"].get("cpu"), Some(&Value::Integer(2)));
        assert_eq!(data["limits"].get("mem"), Some(&Value::Float(1.5)));
        assert_eq!(data["extra"], Value::Null);
    }

    #[test]
    fn test_array_root_is_rejected() {
        let err = JsonDecoder.parse(b"[1, 2, 3]").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Decode);
    }

    #[test]
    fn test_literal_null_is_empty() {
        assert!(JsonDecoder.parse(b"null").unwrap().is_empty());
    }

    #[test]
    fn test_truncated_json_is_decode_error() {
        let err = JsonDecoder.parse(b"{\"a\": ").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Decode);
        assert!(err.to_string().starts_with("failed to decode json"));
    }
}
