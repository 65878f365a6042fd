use super::{key_value, owned_extensions, utf8_text, Decoder};
use crate::error::Result;
use crate::types::{DataMap, Format};

const EXTENSIONS: &[&str] = &["env"];

/// Decoder for dotenv-style `KEY=value` files
pub struct EnvDecoder;

impl Decoder for EnvDecoder {
    fn format(&self) -> Format {
        Format::Env
    }

    fn supported_extensions(&self) -> Vec<String> {
        owned_extensions(EXTENSIONS)
    }

    fn parse(&self, content: &[u8]) -> Result<DataMap> {
        let text = utf8_text(Format::Env, content)?;
        Ok(key_value::parse_flat(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_parse_env_file() {
        let content: &[u8] = b"# database\nDB_HOST=localhost\nDB_PORT=5432\nSECRET='s3cr=t'\n";
        let record = EnvDecoder
            .decode(&CancellationToken::new(), ".env", Some(content))
            .unwrap();

        assert_eq!(record.format, Format::Env);
        assert_eq!(record.data["DB_HOST"], Value::from("localhost"));
        assert_eq!(record.data["DB_PORT"], Value::from("5432"));
        assert_eq!(record.data["SECRET"], Value::from("s3cr=t"));
        assert_eq!(record.metadata.basename.as_deref(), Some(".env"));
    }

    #[test]
    fn test_env_skips_every_comment_style() {
        let data = EnvDecoder.parse(b";DISABLED=1\n!LEGACY=2\nKEPT=3\n").unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data["KEPT"], Value::from("3"));
    }

    #[test]
    fn test_env_rejects_invalid_utf8() {
        assert!(EnvDecoder.parse(&[0xff, 0xfe, b'=', b'x']).is_err());
    }
}
