#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_openapi_wire::uri::{SerializerConfiguration, UriNode, UriParser, UriSerializer};

#[derive(Arbitrary, Debug)]
enum FuzzNode {
    Primitive(String),
    Array(Vec<String>),
    Dictionary(Vec<(String, String)>),
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    configuration: u8,
    key: String,
    node: FuzzNode,
}

const CONFIGURATIONS: [SerializerConfiguration; 6] = [
    SerializerConfiguration::FORM_EXPLODE,
    SerializerConfiguration::FORM_UNEXPLODE,
    SerializerConfiguration::SIMPLE_EXPLODE,
    SerializerConfiguration::SIMPLE_UNEXPLODE,
    SerializerConfiguration::FORM_DATA_EXPLODE,
    SerializerConfiguration::FORM_DATA_UNEXPLODE,
];

fuzz_target!(|input: FuzzInput| {
    let configuration = CONFIGURATIONS[usize::from(input.configuration) % CONFIGURATIONS.len()];
    if input.key.is_empty() {
        return;
    }

    let mut serializer = UriSerializer::new(configuration);
    match input.node {
        FuzzNode::Primitive(value) => {
            let encoded = serializer
                .serialize(&UriNode::primitive(value.as_str()), &input.key)
                .expect("primitive must serialize")
                .to_string();
            let parser = UriParser::new(configuration, &encoded);
            assert_eq!(parser.parse_primitive(&input.key).unwrap(), Some(value));
        }
        // simple スタイルでは `[""]` と空の配列がどちらも空文字列になる
        FuzzNode::Array(values) if values.iter().all(|v| !v.is_empty()) => {
            let encoded = serializer
                .serialize(&UriNode::array(values.iter().map(String::as_str)), &input.key)
                .expect("array must serialize")
                .to_string();
            let parser = UriParser::new(configuration, &encoded);
            assert_eq!(parser.parse_array(&input.key).unwrap(), values);
        }
        FuzzNode::Dictionary(entries)
            if entries.iter().all(|(k, v)| !k.is_empty() && !v.is_empty()) =>
        {
            let expected: std::collections::BTreeMap<String, String> =
                entries.iter().cloned().collect();
            let encoded = serializer
                .serialize(&UriNode::dictionary(entries), &input.key)
                .expect("dictionary must serialize")
                .to_string();
            let parser = UriParser::new(configuration, &encoded);
            assert_eq!(parser.parse_dictionary(&input.key).unwrap(), expected);
        }
        _ => {}
    }
});
