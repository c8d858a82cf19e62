//! ヘッダーと URI で共有する字句の処理
//!
//! トークン (RFC 9110)、引用符付き文字列、パーセントエンコーディングを扱う。

use core::fmt;

/// RFC 9110 tchar
pub(crate) fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// 空でない RFC 9110 token
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_char)
}

/// RFC 8187 attr-char
///
/// tchar から `*`、`'`、`%` を除いたもの。
pub(crate) fn is_attr_char(b: u8) -> bool {
    is_token_char(b) && !matches!(b, b'*' | b'\'' | b'%')
}

/// トークンまたは引用符付き文字列の値を取り出す
///
/// 引用符付き文字列は閉じ引用符で終わらなければならない。
pub(crate) fn token_or_quoted(input: &str) -> Option<String> {
    let Some(quoted) = input.strip_prefix('"') else {
        return is_token(input).then(|| input.to_string());
    };
    let mut value = String::with_capacity(quoted.len());
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => value.push(chars.next()?.1),
            '"' => return (i + 1 == quoted.len()).then_some(value),
            _ => value.push(c),
        }
    }
    None
}

/// 引用符付き文字列として書き出す
pub(crate) fn write_quoted(out: &mut impl fmt::Write, value: &str) -> fmt::Result {
    out.write_char('"')?;
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.write_char('\\')?;
        }
        out.write_char(c)?;
    }
    out.write_char('"')
}

/// 引用符の外側にある区切り文字で分割
pub(crate) fn split_unquoted(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
        } else if in_quotes && c == '\\' {
            escaped = true;
        } else if c == '"' {
            in_quotes = !in_quotes;
        } else if c == separator && !in_quotes {
            parts.push(&input[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}

/// パーセントエンコードして追記
///
/// `literal` が `Some` を返したバイトはその文字で、`None` のバイトは `%XX` で出力する。
pub(crate) fn percent_encode_into(
    out: &mut String,
    input: &str,
    literal: impl Fn(u8) -> Option<char>,
) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for byte in input.bytes() {
        match literal(byte) {
            Some(c) => out.push(c),
            None => {
                out.push('%');
                out.push(char::from(HEX[usize::from(byte >> 4)]));
                out.push(char::from(HEX[usize::from(byte & 0x0F)]));
            }
        }
    }
}

/// パーセントデコード
///
/// `%XX` 以外のバイトは `literal` で変換し、`None` なら失敗とする。
/// UTF-8 の検証は呼び出し側で行う。
pub(crate) fn percent_decode(input: &str, literal: impl Fn(u8) -> Option<u8>) -> Option<Vec<u8>> {
    let mut decoded = Vec::with_capacity(input.len());
    let mut bytes = input.bytes();
    while let Some(byte) = bytes.next() {
        if byte == b'%' {
            let high = hex_value(bytes.next()?)?;
            let low = hex_value(bytes.next()?)?;
            decoded.push((high << 4) | low);
        } else {
            decoded.push(literal(byte)?);
        }
    }
    Some(decoded)
}

fn hex_value(b: u8) -> Option<u8> {
    // to_digit(16) は 0..16 を返す
    char::from(b).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_chars() {
        assert!(is_token("form-data"));
        assert!(is_token("a!#$%&'*+-.^_`|~z09"));
        assert!(!is_token(""));
        assert!(!is_token("a b"));
        assert!(!is_token("a/b"));
        assert!(!is_token("\"a\""));
        assert!(!is_token("日本"));
    }

    #[test]
    fn attr_chars_exclude_star_quote_percent() {
        assert!(is_attr_char(b'a'));
        assert!(is_attr_char(b'!'));
        assert!(!is_attr_char(b'*'));
        assert!(!is_attr_char(b'\''));
        assert!(!is_attr_char(b'%'));
        assert!(!is_attr_char(b' '));
    }

    #[test]
    fn token_or_quoted_values() {
        assert_eq!(token_or_quoted("utf-8").as_deref(), Some("utf-8"));
        assert_eq!(token_or_quoted(r#""a \"b\" ;c""#).as_deref(), Some(r#"a "b" ;c"#));
        assert_eq!(token_or_quoted(r#""""#).as_deref(), Some(""));
        assert_eq!(token_or_quoted(r#""unterminated"#), None);
        assert_eq!(token_or_quoted(r#""a"b"#), None);
        assert_eq!(token_or_quoted(r#""a\"#), None);
        assert_eq!(token_or_quoted("a b"), None);
    }

    #[test]
    fn quoted_roundtrip() {
        let mut out = String::new();
        write_quoted(&mut out, r#"say "hi" \o/"#).unwrap();
        assert_eq!(out, r#""say \"hi\" \\o/""#);
        assert_eq!(token_or_quoted(&out).as_deref(), Some(r#"say "hi" \o/"#));
    }

    #[test]
    fn split_respects_quotes() {
        assert_eq!(
            split_unquoted(r#"a; b="x;y"; c="q\";r""#, ';'),
            vec!["a", r#" b="x;y""#, r#" c="q\";r""#]
        );
        assert_eq!(split_unquoted("", ','), vec![""]);
    }

    #[test]
    fn percent_encode_with_literal_table() {
        let mut out = String::new();
        percent_encode_into(&mut out, "a b/日", |b| {
            b.is_ascii_alphanumeric().then(|| char::from(b))
        });
        assert_eq!(out, "a%20b%2F%E6%97%A5");
    }

    #[test]
    fn percent_decode_hex_and_literals() {
        assert_eq!(percent_decode("a%2fb%2F", Some), Some(b"a/b/".to_vec()));
        assert_eq!(percent_decode("%4", Some), None);
        assert_eq!(percent_decode("%G0", Some), None);
        assert_eq!(percent_decode("a b", |b| (b != b' ').then_some(b)), None);
    }
}
