//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// トークン生成 (RFC 9110 Section 5.6.2)
// ========================================

/// トークン (1-12 文字)
pub fn token() -> impl Strategy<Value = String> {
    "[A-Za-z0-9!#$&^_.+-]{1,12}".prop_map(|s| s)
}

/// 小文字のトークン (1-12 文字)
pub fn lower_token() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9.+-]{0,11}".prop_map(|s| s)
}

/// `*` を含まないタイプ/サブタイプ
pub fn mime_essence() -> impl Strategy<Value = (String, String)> {
    (lower_token(), lower_token())
}

// ========================================
// 引用符付き文字列
// ========================================

/// 引用符内で使える文字 (qdtext) とエスケープが必要な文字
pub fn quotable_char() -> impl Strategy<Value = char> {
    prop_oneof![
        Just(' '),
        Just('!'),
        Just('"'),
        Just('\\'),
        prop::char::range('#', '['),
        prop::char::range(']', '~'),
    ]
}

/// 引用符付き文字列にできる値 (0-24 文字)
pub fn quotable_string() -> impl Strategy<Value = String> {
    proptest::collection::vec(quotable_char(), 0..24).prop_map(|chars| chars.into_iter().collect())
}

// ========================================
// URI の値
// ========================================

/// 任意の表示可能文字からなる空でない値
pub fn uri_value() -> impl Strategy<Value = String> {
    "\\PC{1,12}".prop_map(|s| s)
}

/// 空白と予約文字を多く含む空でない値
pub fn uri_reserved_value() -> impl Strategy<Value = String> {
    "[a-z &=,+%/?#]{1,12}".prop_map(|s| s)
}

// ========================================
// ボディのチャンク
// ========================================

/// チャンク列 (各チャンク 0-16 バイト)
pub fn byte_chunks() -> impl Strategy<Value = Vec<Vec<u8>>> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..16), 0..8)
}
