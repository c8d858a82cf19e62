#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_openapi_wire::accept::{QualityValue, accept_header_value, parse_accept_header};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(quality) = QualityValue::parse(s) {
            assert!(quality.thousandths() <= 1000);
            let _ = quality.double_value();
        }

        if let Ok(entries) = parse_accept_header(s) {
            // 品質値の降順
            for pair in entries.windows(2) {
                assert!(pair[0].quality.thousandths() >= pair[1].quality.thousandths());
            }

            let displayed = accept_header_value(&entries);
            if let Ok(reparsed) = parse_accept_header(&displayed) {
                assert_eq!(reparsed, entries);
            }
        }
    }
});
