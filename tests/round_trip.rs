use std::collections::BTreeMap;

use confnorm::decoders::{
    EnvDecoder, HclDecoder, IniDecoder, JsonDecoder, PropertiesDecoder, TomlDecoder, XmlDecoder,
    YamlDecoder,
};
use confnorm::{DataMap, Decoder, Value};
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

const KEYWORDS: &[&str] = &["true", "false", "null", "for", "in", "if", "else", "endif", "endfor"];

fn flat_map() -> impl Strategy<Value = BTreeMap<String, String>> {
    let key = "[a-z][a-z0-9_]{0,8}".prop_filter("keyword", |k| !KEYWORDS.contains(&k.as_str()));
    prop::collection::btree_map(key, "[A-Za-z0-9]{0,12}", 1..8)
}

fn expected(map: &BTreeMap<String, String>) -> DataMap {
    map.iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect()
}

fn decode(decoder: &dyn Decoder, filename: &str, content: &[u8]) -> DataMap {
    decoder
        .decode(&CancellationToken::new(), filename, Some(content))
        .unwrap_or_else(|e| panic!("{} failed: {}", filename, e))
        .data
}

fn key_value_lines(map: &BTreeMap<String, String>) -> String {
    map.iter().map(|(k, v)| format!("{}={}\n", k, v)).collect()
}

proptest! {
    #[test]
    fn json_round_trip(map in flat_map()) {
        let content = serde_json::to_vec(&map).unwrap();
        prop_assert_eq!(decode(&JsonDecoder, "rt.json", &content), expected(&map));
    }

    #[test]
    fn yaml_round_trip(map in flat_map()) {
        let content = serde_yaml::to_string(&map).unwrap();
        prop_assert_eq!(decode(&YamlDecoder, "rt.yaml", content.as_bytes()), expected(&map));
    }

    #[test]
    fn toml_round_trip(map in flat_map()) {
        let content = toml::to_string(&map).unwrap();
        prop_assert_eq!(decode(&TomlDecoder, "rt.toml", content.as_bytes()), expected(&map));
    }

    #[test]
    fn key_value_formats_round_trip(map in flat_map()) {
        let content = key_value_lines(&map);
        let want = expected(&map);
        prop_assert_eq!(decode(&PropertiesDecoder, "rt.properties", content.as_bytes()), want.clone());
        prop_assert_eq!(decode(&EnvDecoder, "rt.env", content.as_bytes()), want.clone());
        prop_assert_eq!(decode(&IniDecoder, "rt.ini", content.as_bytes()), want);
    }

    #[test]
    fn hcl_round_trip(map in flat_map()) {
        let content: String = map.iter().map(|(k, v)| format!("{} = \"{}\"\n", k, v)).collect();
        prop_assert_eq!(decode(&HclDecoder, "rt.hcl", content.as_bytes()), expected(&map));
    }

    #[test]
    fn xml_round_trip(map in flat_map()) {
        let body: String = map.iter().map(|(k, v)| format!("<{0}>{1}</{0}>", k, v)).collect();
        let content = format!("<root>{}</root>", body);

        let mut want = DataMap::new();
        want.insert("root".to_string(), Value::Mapping(expected(&map)));
        prop_assert_eq!(decode(&XmlDecoder, "rt.xml", content.as_bytes()), want);
    }
}
