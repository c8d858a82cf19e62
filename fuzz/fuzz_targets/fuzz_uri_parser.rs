#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_openapi_wire::uri::{NodeKind, SerializerConfiguration, UriParser};

const CONFIGURATIONS: [SerializerConfiguration; 6] = [
    SerializerConfiguration::FORM_EXPLODE,
    SerializerConfiguration::FORM_UNEXPLODE,
    SerializerConfiguration::SIMPLE_EXPLODE,
    SerializerConfiguration::SIMPLE_UNEXPLODE,
    SerializerConfiguration::FORM_DATA_EXPLODE,
    SerializerConfiguration::FORM_DATA_UNEXPLODE,
];

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // パニックしなければ OK
        for configuration in CONFIGURATIONS {
            let parser = UriParser::new(configuration, s);
            for kind in [NodeKind::Primitive, NodeKind::Array, NodeKind::Dictionary] {
                let _ = parser.parse_node("key", kind);
            }
        }
    }
});
