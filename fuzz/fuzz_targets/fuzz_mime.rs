#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_openapi_wire::mime::MimeType;
use shiguredo_openapi_wire::negotiation::{best_content_type, is_matching_content_type};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // 先頭行を受信した MIME タイプ、残りを候補として扱う
        let mut lines = s.lines();
        let received = lines.next().and_then(MimeType::parse);
        let options: Vec<&str> = lines.collect();

        if let Some(mime) = &received {
            let _ = mime.media_type();
            let _ = mime.subtype();
            let _ = mime.is_wildcard();

            // ラウンドトリップ
            let displayed = mime.to_string();
            let reparsed = MimeType::parse(&displayed);
            assert_eq!(reparsed.as_ref(), Some(mime));
        }

        let _ = best_content_type(received.as_ref(), &options);
        for option in &options {
            let _ = is_matching_content_type(received.as_ref(), option);
        }
    }
});
