use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{owned_extensions, utf8_text, Decoder};
use crate::error::{PipelineError, Result};
use crate::types::{DataMap, Format, Value};

const EXTENSIONS: &[&str] = &["xml"];

const ATTRIBUTE_PREFIX: &str = "@";
const TEXT_KEY: &str = "#text";

/// XML decoder.
///
/// The result holds a single key, the root element name. Leaf elements
/// become their text; anything with attributes or children becomes a mapping.
pub struct XmlDecoder;

impl Decoder for XmlDecoder {
    fn format(&self) -> Format {
        Format::Xml
    }

    fn supported_extensions(&self) -> Vec<String> {
        owned_extensions(EXTENSIONS)
    }

    fn parse(&self, content: &[u8]) -> Result<DataMap> {
        let text = utf8_text(Format::Xml, content)?;
        parse_document(text).map_err(|e| PipelineError::decode(Format::Xml, e))
    }
}

struct Element {
    name: String,
    attributes: DataMap,
    children: DataMap,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> anyhow::Result<Self> {
        let mut attributes = DataMap::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = format!(
                "{}{}",
                ATTRIBUTE_PREFIX,
                String::from_utf8_lossy(attr.key.as_ref())
            );
            attributes.insert(key, Value::String(attr.unescape_value()?.into_owned()));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: DataMap::new(),
            text: String::new(),
        })
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.children.remove(&name) {
            None => {
                self.children.insert(name, value);
            }
            Some(Value::Sequence(mut items)) => {
                items.push(value);
                self.children.insert(name, Value::Sequence(items));
            }
            Some(previous) => {
                self.children.insert(name, Value::Sequence(vec![previous, value]));
            }
        }
    }

    fn close(self) -> (String, Value) {
        let text = self.text.trim();
        if self.attributes.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(text.to_string()));
        }

        let mut map = self.attributes;
        map.extend(self.children);
        if !text.is_empty() {
            map.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
        }
        (self.name, Value::Mapping(map))
    }
}

fn parse_document(text: &str) -> anyhow::Result<DataMap> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                ensure_single_root(&stack, &root)?;
                stack.push(Element::open(&start)?);
            }
            Event::Empty(start) => {
                ensure_single_root(&stack, &root)?;
                let (name, value) = Element::open(&start)?.close();
                attach(&mut stack, &mut root, name, value);
            }
            Event::End(end) => {
                let element = stack.pop().ok_or_else(|| {
                    anyhow::anyhow!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(end.name().as_ref())
                    )
                })?;
                let (name, value) = element.close();
                attach(&mut stack, &mut root, name, value);
            }
            Event::Text(chunk) => {
                let chunk = chunk.unescape()?;
                append_text(&mut stack, &chunk)?;
            }
            Event::CData(chunk) => {
                let chunk = String::from_utf8_lossy(&chunk.into_inner()).into_owned();
                append_text(&mut stack, &chunk)?;
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        anyhow::bail!("unclosed element <{}>", open.name);
    }

    let mut result = DataMap::new();
    if let Some((name, value)) = root {
        result.insert(name, value);
    }
    Ok(result)
}

fn ensure_single_root(stack: &[Element], root: &Option<(String, Value)>) -> anyhow::Result<()> {
    if stack.is_empty() {
        if let Some((name, _)) = root {
            anyhow::bail!("multiple root elements (already read <{}>)", name);
        }
    }
    Ok(())
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<(String, Value)>,
    name: String,
    value: Value,
) {
    match stack.last_mut() {
        Some(parent) => parent.add_child(name, value),
        None => *root = Some((name, value)),
    }
}

fn append_text(stack: &mut [Element], chunk: &str) -> anyhow::Result<()> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(chunk);
            Ok(())
        }
        None if chunk.trim().is_empty() => Ok(()),
        None => anyhow::bail!("text outside the root element"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_nested_document() {
        let content = br#"<?xml version="1.0"?>
<!-- service settings -->
<config>
  <name>svc</name>
  <port>8080</port>
  <server host="0.0.0.0">
    <tls>true</tls>
  </server>
  <item>a</item>
  <item>b</item>
  <item>c</item>
  <empty/>
</config>"#;
        let data = XmlDecoder.parse(content).unwrap();

        assert_eq!(data.len(), 1);
        let config = &data["config"];
        assert_eq!(config.get("name"), Some(&Value::from("svc")));
        assert_eq!(config.get("port"), Some(&Value::from("8080")));
        assert_eq!(config.get("empty"), Some(&Value::from("")));

        let server = config.get("server").unwrap();
        assert_eq!(server.get("@host"), Some(&Value::from("0.0.0.0")));
        assert_eq!(server.get("tls"), Some(&Value::from("true")));

        let items = config.get("item").and_then(Value::as_sequence).unwrap();
        assert_eq!(items, &[Value::from("a"), Value::from("b"), Value::from("c")]);
    }

    #[test]
    fn test_mixed_text_goes_under_text_key() {
        let data = XmlDecoder
            .parse(br#"<greeting lang="en">hello &amp; welcome</greeting>"#)
            .unwrap();
        let greeting = &data["greeting"];
        assert_eq!(greeting.get("@lang"), Some(&Value::from("en")));
        assert_eq!(greeting.get("#text"), Some(&Value::from("hello & welcome")));
    }

    #[test]
    fn test_cdata_is_kept_as_text() {
        let data = XmlDecoder.parse(b"<q><![CDATA[a < b]]></q>").unwrap();
        assert_eq!(data["q"], Value::from("a < b"));
    }

    #[test]
    fn test_prolog_only_is_empty() {
        let data = XmlDecoder.parse(b"<?xml version=\"1.0\"?>\n  \n").unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        let cases: Vec<&[u8]> = vec![
            b"<a><b></a>",
            b"<a><b></b>",
            b"<a/><b/>",
            b"stray<a/>",
            b"<a/>trailing",
        ];
        for input in cases {
            let err = XmlDecoder.parse(input).unwrap_err();
            assert_eq!(
                err.code(),
                ErrorCode::Decode,
                "Failed for {}",
                String::from_utf8_lossy(input)
            );
        }
    }
}
