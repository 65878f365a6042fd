use super::{key_value, owned_extensions, utf8_text, Decoder};
use crate::error::Result;
use crate::types::{DataMap, Format, Value};

const EXTENSIONS: &[&str] = &["ini"];

/// Decoder for INI files with optional `[section]` headers.
///
/// Keys before the first header land at the top level; keys after a header
/// land in a nested mapping named after the section. A header that appears
/// again starts its section over.
pub struct IniDecoder;

impl Decoder for IniDecoder {
    fn format(&self) -> Format {
        Format::Ini
    }

    fn supported_extensions(&self) -> Vec<String> {
        owned_extensions(EXTENSIONS)
    }

    fn parse(&self, content: &[u8]) -> Result<DataMap> {
        let text = utf8_text(Format::Ini, content)?;
        Ok(parse_sections(text))
    }
}

fn section_name(line: &str) -> Option<&str> {
    let name = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn parse_sections(text: &str) -> DataMap {
    let mut result = DataMap::new();
    let mut current: Option<String> = None;

    for line in text.lines().map(str::trim) {
        if key_value::is_skippable(line) {
            continue;
        }

        if let Some(name) = section_name(line) {
            result.insert(name.to_string(), Value::Mapping(DataMap::new()));
            current = Some(name.to_string());
            continue;
        }

        let Some((key, value)) = key_value::split_pair(line) else {
            continue;
        };

        match current.as_deref().and_then(|s| result.get_mut(s)) {
            Some(Value::Mapping(section)) => {
                section.insert(key, Value::String(value));
            }
            _ => {
                result.insert(key, Value::String(value));
            }
        }
    }

    result
}
