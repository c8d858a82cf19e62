//! Content-Disposition ヘッダー (RFC 6266)
//!
//! ## 概要
//!
//! multipart パートで使う Content-Disposition ヘッダーの生成とパースを提供します。
//!
//! - disposition-type とパラメータ名は大文字小文字を区別しない
//! - パラメータ値は引用符付き文字列で出力する
//! - パラメータは名前の昇順で出力する
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_openapi_wire::content_disposition::{ContentDisposition, DispositionType};
//!
//! let cd = ContentDisposition::parse("form-data; name=\"file\"; filename=\"a.txt\"").unwrap();
//! assert_eq!(cd.disposition_type(), &DispositionType::FormData);
//! assert_eq!(cd.name(), Some("file"));
//!
//! // パラメータは名前の昇順で出力される
//! assert_eq!(cd.to_string(), "form-data; filename=\"a.txt\"; name=\"file\"");
//! ```

use core::fmt;
use std::collections::BTreeMap;

use crate::header_fields::HeaderFields;
use crate::syntax::{
    is_attr_char, is_token, percent_decode, percent_encode_into, split_unquoted, token_or_quoted,
    write_quoted,
};

/// Content-Disposition ヘッダー名
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";

const NAME: &str = "name";
const FILENAME: &str = "filename";
const FILENAME_EXT: &str = "filename*";

/// Content-Disposition パースエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentDispositionError {
    /// 空の入力
    #[error("empty content-disposition")]
    Empty,
    /// 不正な disposition-type
    #[error("invalid disposition-type: {0:?}")]
    InvalidDispositionType(String),
    /// 不正なパラメータ
    #[error("invalid content-disposition parameter: {0:?}")]
    InvalidParameter(String),
    /// 不正な RFC 5987 エンコーディング
    #[error("invalid ext-value encoding: {0:?}")]
    InvalidExtValue(String),
}

/// Disposition タイプ
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DispositionType {
    /// inline
    Inline,
    /// attachment
    Attachment,
    /// form-data: multipart/form-data のパート用
    FormData,
    /// その他のトークン (小文字)
    Other(String),
}

impl DispositionType {
    fn from_token(token: &str) -> Result<Self, ContentDispositionError> {
        if !is_token(token) {
            return Err(ContentDispositionError::InvalidDispositionType(
                token.to_string(),
            ));
        }
        Ok(match token.to_ascii_lowercase().as_str() {
            "inline" => DispositionType::Inline,
            "attachment" => DispositionType::Attachment,
            "form-data" => DispositionType::FormData,
            other => DispositionType::Other(other.to_string()),
        })
    }

    fn as_str(&self) -> &str {
        match self {
            DispositionType::Inline => "inline",
            DispositionType::Attachment => "attachment",
            DispositionType::FormData => "form-data",
            DispositionType::Other(token) => token,
        }
    }
}

impl fmt::Display for DispositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content-Disposition ヘッダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    disposition_type: DispositionType,
    /// 小文字のパラメータ名をキーとするパラメータ
    parameters: BTreeMap<String, String>,
}

impl ContentDisposition {
    /// 新しい ContentDisposition を作成
    pub fn new(disposition_type: DispositionType) -> Self {
        ContentDisposition {
            disposition_type,
            parameters: BTreeMap::new(),
        }
    }

    /// multipart/form-data のパート用 ContentDisposition を作成
    pub fn form_data(name: &str) -> Self {
        Self::new(DispositionType::FormData).with_name(name)
    }

    /// Content-Disposition ヘッダー文字列をパース
    pub fn parse(input: &str) -> Result<Self, ContentDispositionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ContentDispositionError::Empty);
        }

        let mut parts = split_unquoted(input, ';').into_iter();
        let type_str = parts.next().map(str::trim).unwrap_or_default();
        let mut cd = ContentDisposition::new(DispositionType::from_token(type_str)?);

        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (name, value) = part
                .split_once('=')
                .ok_or_else(|| ContentDispositionError::InvalidParameter(part.to_string()))?;
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                return Err(ContentDispositionError::InvalidParameter(part.to_string()));
            }
            let value = if name.ends_with('*') {
                parse_ext_value(value)?
            } else {
                let value = value.trim();
                token_or_quoted(value)
                    .ok_or_else(|| ContentDispositionError::InvalidParameter(value.to_string()))?
            };
            cd.parameters.insert(name, value);
        }

        Ok(cd)
    }

    /// disposition-type を取得
    pub fn disposition_type(&self) -> &DispositionType {
        &self.disposition_type
    }

    /// パラメータを取得
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// すべてのパラメータ (名前の昇順)
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// name パラメータを取得 (form-data 用)
    pub fn name(&self) -> Option<&str> {
        self.parameter(NAME)
    }

    /// filename を取得 (filename* があればそちらを優先)
    pub fn filename(&self) -> Option<&str> {
        self.parameter(FILENAME_EXT).or(self.parameter(FILENAME))
    }

    /// パラメータを設定
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// name を設定
    pub fn with_name(self, name: &str) -> Self {
        self.with_parameter(NAME, name)
    }

    /// filename を設定
    pub fn with_filename(self, filename: &str) -> Self {
        self.with_parameter(FILENAME, filename)
    }

    /// filename* を設定 (UTF-8 でエンコードして出力)
    pub fn with_filename_ext(self, filename: &str) -> Self {
        self.with_parameter(FILENAME_EXT, filename)
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.disposition_type)?;
        for (name, value) in &self.parameters {
            write!(f, "; {}=", name)?;
            if name.ends_with('*') {
                f.write_str("UTF-8''")?;
                write_ext_value(f, value)?;
            } else {
                write_quoted(f, value)?;
            }
        }
        Ok(())
    }
}

impl HeaderFields {
    /// Content-Disposition ヘッダーを取得してパース
    pub fn content_disposition(&self) -> Result<Option<ContentDisposition>, ContentDispositionError> {
        self.get(CONTENT_DISPOSITION)
            .map(ContentDisposition::parse)
            .transpose()
    }

    /// Content-Disposition ヘッダーを設定
    pub fn set_content_disposition(&mut self, content_disposition: &ContentDisposition) {
        self.set(CONTENT_DISPOSITION, &content_disposition.to_string());
    }
}

/// RFC 8187 ext-value をパース
///
/// `charset'language'value-chars` の形式で、charset は UTF-8 のみ受け付ける。
fn parse_ext_value(value: &str) -> Result<String, ContentDispositionError> {
    let value = value.trim();
    let invalid = || ContentDispositionError::InvalidExtValue(value.to_string());

    let mut fields = value.splitn(3, '\'');
    let (Some(charset), Some(_language), Some(encoded)) =
        (fields.next(), fields.next(), fields.next())
    else {
        return Err(invalid());
    };
    if !charset.eq_ignore_ascii_case("UTF-8") {
        return Err(invalid());
    }

    let decoded = percent_decode(encoded, |b| is_attr_char(b).then_some(b)).ok_or_else(invalid)?;
    String::from_utf8(decoded).map_err(|_| invalid())
}

/// RFC 8187 ext-value の value-chars を書き出す
fn write_ext_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    let mut encoded = String::with_capacity(value.len());
    percent_encode_into(&mut encoded, value, |b| is_attr_char(b).then(|| char::from(b)));
    f.write_str(&encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_form_data() {
        let cd = ContentDisposition::parse("form-data; name=\"field1\"").unwrap();
        assert_eq!(cd.disposition_type(), &DispositionType::FormData);
        assert_eq!(cd.name(), Some("field1"));
        assert_eq!(cd.filename(), None);
    }

    #[test]
    fn parse_form_data_with_filename() {
        let cd =
            ContentDisposition::parse("form-data; name=\"file\"; filename=\"image.png\"").unwrap();
        assert_eq!(cd.name(), Some("file"));
        assert_eq!(cd.filename(), Some("image.png"));
    }

    #[test]
    fn parse_case_insensitive() {
        let cd = ContentDisposition::parse("FORM-DATA; NAME=\"Field\"").unwrap();
        assert_eq!(cd.disposition_type(), &DispositionType::FormData);
        // 値は大文字小文字を保持
        assert_eq!(cd.name(), Some("Field"));
        assert_eq!(cd.parameter("Name"), Some("Field"));
    }

    #[test]
    fn parse_token_value() {
        let cd = ContentDisposition::parse("attachment; filename=example.txt").unwrap();
        assert_eq!(cd.disposition_type(), &DispositionType::Attachment);
        assert_eq!(cd.filename(), Some("example.txt"));
    }

    #[test]
    fn parse_quoted_with_escape_and_semicolon() {
        let cd = ContentDisposition::parse(r#"form-data; name="a\"b;c""#).unwrap();
        assert_eq!(cd.name(), Some("a\"b;c"));
    }

    #[test]
    fn parse_filename_ext_preferred() {
        let cd = ContentDisposition::parse(
            "attachment; filename=\"fallback.txt\"; filename*=UTF-8''%E6%97%A5%E6%9C%AC%E8%AA%9E.txt",
        )
        .unwrap();
        assert_eq!(cd.filename(), Some("日本語.txt"));
        assert_eq!(cd.parameter("filename"), Some("fallback.txt"));
    }

    #[test]
    fn parse_other_type() {
        let cd = ContentDisposition::parse("Signal; handling=optional").unwrap();
        assert_eq!(
            cd.disposition_type(),
            &DispositionType::Other("signal".to_string())
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            ContentDisposition::parse("  "),
            Err(ContentDispositionError::Empty)
        );
        assert!(matches!(
            ContentDisposition::parse("form data"),
            Err(ContentDispositionError::InvalidDispositionType(_))
        ));
        assert!(matches!(
            ContentDisposition::parse("form-data; name"),
            Err(ContentDispositionError::InvalidParameter(_))
        ));
        assert!(matches!(
            ContentDisposition::parse("form-data; name=\"unterminated"),
            Err(ContentDispositionError::InvalidParameter(_))
        ));
        assert!(matches!(
            ContentDisposition::parse("attachment; filename*=latin1''x"),
            Err(ContentDispositionError::InvalidExtValue(_))
        ));
        assert!(matches!(
            ContentDisposition::parse("attachment; filename*=UTF-8''%E6%9"),
            Err(ContentDispositionError::InvalidExtValue(_))
        ));
    }

    #[test]
    fn display_sorted_parameters() {
        let cd = ContentDisposition::form_data("file").with_filename("a b.txt");
        assert_eq!(
            cd.to_string(),
            "form-data; filename=\"a b.txt\"; name=\"file\""
        );
    }

    #[test]
    fn display_escapes_quotes() {
        let cd = ContentDisposition::form_data("say \"hi\"");
        assert_eq!(cd.to_string(), r#"form-data; name="say \"hi\"""#);
        assert_eq!(ContentDisposition::parse(&cd.to_string()).unwrap(), cd);
    }

    #[test]
    fn display_filename_ext() {
        let cd = ContentDisposition::new(DispositionType::Attachment)
            .with_filename("fallback.txt")
            .with_filename_ext("日本語.txt");
        assert_eq!(
            cd.to_string(),
            "attachment; filename=\"fallback.txt\"; filename*=UTF-8''%E6%97%A5%E6%9C%AC%E8%AA%9E.txt"
        );
        assert_eq!(ContentDisposition::parse(&cd.to_string()).unwrap(), cd);
    }

    #[test]
    fn header_fields_helpers() {
        let mut fields = HeaderFields::new();
        assert_eq!(fields.content_disposition(), Ok(None));

        fields.set_content_disposition(&ContentDisposition::form_data("avatar"));
        assert_eq!(
            fields.get("content-disposition"),
            Some("form-data; name=\"avatar\"")
        );
        let cd = fields.content_disposition().unwrap().unwrap();
        assert_eq!(cd.name(), Some("avatar"));
    }

    #[test]
    fn ext_value_encodes_excluded_attr_chars() {
        let cd = ContentDisposition::new(DispositionType::Attachment)
            .with_filename_ext("100% 'a*b'.txt");
        assert_eq!(
            cd.to_string(),
            "attachment; filename*=UTF-8''100%25%20%27a%2Ab%27.txt"
        );
        assert_eq!(ContentDisposition::parse(&cd.to_string()).unwrap(), cd);
    }

    #[test]
    fn ext_value_language_ignored_and_raw_chars_rejected() {
        let cd = ContentDisposition::parse("attachment; filename*=utf-8'en'%41b").unwrap();
        assert_eq!(cd.filename(), Some("Ab"));
        assert!(matches!(
            ContentDisposition::parse("attachment; filename*=UTF-8''a b"),
            Err(ContentDispositionError::InvalidExtValue(_))
        ));
        assert!(matches!(
            ContentDisposition::parse("attachment; filename*=UTF-8'x"),
            Err(ContentDispositionError::InvalidExtValue(_))
        ));
    }
}
