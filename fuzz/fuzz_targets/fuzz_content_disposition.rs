#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_openapi_wire::content_disposition::ContentDisposition;

fuzz_target!(|data: &[u8]| {
    // UTF-8 文字列として解釈できる場合のみテスト
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(cd) = ContentDisposition::parse(s) {
            let _ = cd.disposition_type();
            let _ = cd.name();
            let _ = cd.filename();
            let _ = cd.parameters().count();

            // ラウンドトリップ
            let displayed = cd.to_string();
            if let Ok(reparsed) = ContentDisposition::parse(&displayed) {
                assert_eq!(cd.disposition_type(), reparsed.disposition_type());
                // パラメータ名がトークンの場合のみ全体が一致
                let plain_names = cd
                    .parameters()
                    .all(|(name, _)| name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'*'));
                if plain_names {
                    assert_eq!(reparsed, cd);
                }
            }
        }
    }
});
