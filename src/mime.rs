//! MIME タイプ (RFC 9110 Section 8.3.1)
//!
//! ## 概要
//!
//! Content-Type と Accept の値に現れる `type/subtype[; k=v]*` をパースします。
//!
//! - `*/*` は [`MimeKind::Any`]、`type/*` は [`MimeKind::AnySubtype`] になる
//! - タイプ、サブタイプ、パラメータ名は小文字に正規化する
//! - パラメータ値は大文字小文字を保持し、比較でも区別する
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_openapi_wire::mime::{MimeKind, MimeType};
//!
//! let a = MimeType::parse("Application/JSON; Charset=utf-8").unwrap();
//! let b = MimeType::parse("application/json; charset=utf-8").unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.parameter("charset"), Some("utf-8"));
//!
//! let any = MimeType::parse("*/*").unwrap();
//! assert_eq!(any.kind(), &MimeKind::Any);
//!
//! // パースできない入力は None
//! assert!(MimeType::parse("*/json").is_none());
//! ```

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use crate::syntax::{is_token, split_unquoted, token_or_quoted, write_quoted};

/// MIME タイプのパースエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mime type: {input:?}")]
pub struct MimeTypeError {
    /// パースできなかった入力
    pub input: String,
}

/// タイプとサブタイプの組
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MimeKind {
    /// `*/*`
    Any,
    /// `type/*`
    AnySubtype(String),
    /// `type/subtype`
    Concrete { media_type: String, subtype: String },
}

impl fmt::Display for MimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MimeKind::Any => f.write_str("*/*"),
            MimeKind::AnySubtype(media_type) => write!(f, "{media_type}/*"),
            MimeKind::Concrete {
                media_type,
                subtype,
            } => write!(f, "{media_type}/{subtype}"),
        }
    }
}

/// パース済み MIME タイプ
///
/// 等価性はタイプ、サブタイプ、パラメータ名の大文字小文字を区別せず、
/// パラメータ値の大文字小文字を区別する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    kind: MimeKind,
    /// 小文字のパラメータ名をキーとするパラメータ
    parameters: BTreeMap<String, String>,
}

impl MimeType {
    /// 文字列をパース
    ///
    /// パースできない場合は `None` を返す。
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let (essence, rest) = match input.split_once(';') {
            Some((essence, rest)) => (essence, Some(rest)),
            None => (input, None),
        };

        let (media_type, subtype) = essence.split_once('/')?;
        let media_type = media_type.trim();
        let subtype = subtype.trim();
        if !is_token(media_type) || !is_token(subtype) {
            return None;
        }

        let kind = match (media_type, subtype) {
            ("*", "*") => MimeKind::Any,
            ("*", _) => return None,
            (media_type, "*") => MimeKind::AnySubtype(media_type.to_ascii_lowercase()),
            (media_type, subtype) => MimeKind::Concrete {
                media_type: media_type.to_ascii_lowercase(),
                subtype: subtype.to_ascii_lowercase(),
            },
        };

        let parameters = match rest {
            Some(rest) => parse_parameters(rest)?,
            None => BTreeMap::new(),
        };

        Some(MimeType { kind, parameters })
    }

    /// 具体的な MIME タイプを作成
    pub fn concrete(media_type: &str, subtype: &str) -> Self {
        Self::from_kind(MimeKind::Concrete {
            media_type: media_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
        })
    }

    /// `*/*` を作成
    pub fn any() -> Self {
        Self::from_kind(MimeKind::Any)
    }

    /// `type/*` を作成
    pub fn any_subtype(media_type: &str) -> Self {
        Self::from_kind(MimeKind::AnySubtype(media_type.to_ascii_lowercase()))
    }

    fn from_kind(kind: MimeKind) -> Self {
        MimeType {
            kind,
            parameters: BTreeMap::new(),
        }
    }

    /// パラメータを追加
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// タイプとサブタイプの組を取得
    pub fn kind(&self) -> &MimeKind {
        &self.kind
    }

    /// タイプを取得 (`*/*` の場合は `None`)
    pub fn media_type(&self) -> Option<&str> {
        match &self.kind {
            MimeKind::Any => None,
            MimeKind::AnySubtype(media_type) | MimeKind::Concrete { media_type, .. } => {
                Some(media_type)
            }
        }
    }

    /// サブタイプを取得 (ワイルドカードの場合は `None`)
    pub fn subtype(&self) -> Option<&str> {
        match &self.kind {
            MimeKind::Concrete { subtype, .. } => Some(subtype),
            _ => None,
        }
    }

    /// ワイルドカードを含むかどうか
    pub fn is_wildcard(&self) -> bool {
        !matches!(self.kind, MimeKind::Concrete { .. })
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

    /// パラメータ数
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// パラメータを取り除く
    pub fn remove_parameter(&mut self, name: &str) -> Option<String> {
        self.parameters.remove(&name.to_ascii_lowercase())
    }
}

impl FromStr for MimeType {
    type Err = MimeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MimeType::parse(s).ok_or_else(|| MimeTypeError {
            input: s.to_string(),
        })
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (name, value) in &self.parameters {
            write!(f, "; {}=", name)?;
            if is_token(value) {
                f.write_str(value)?;
            } else {
                write_quoted(f, value)?;
            }
        }
        Ok(())
    }
}

/// `;` で区切られたパラメータをパース
fn parse_parameters(input: &str) -> Option<BTreeMap<String, String>> {
    let mut parameters = BTreeMap::new();
    for part in split_unquoted(input, ';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (name, value) = part.split_once('=')?;
        let name = name.trim();
        if !is_token(name) {
            return None;
        }
        parameters.insert(name.to_ascii_lowercase(), token_or_quoted(value.trim())?);
    }
    Some(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_concrete() {
        let mime = MimeType::parse("text/html").unwrap();
        assert_eq!(
            mime.kind(),
            &MimeKind::Concrete {
                media_type: "text".to_string(),
                subtype: "html".to_string()
            }
        );
        assert_eq!(mime.media_type(), Some("text"));
        assert_eq!(mime.subtype(), Some("html"));
        assert!(!mime.is_wildcard());
    }

    #[test]
    fn parse_wildcards() {
        assert_eq!(MimeType::parse("*/*").unwrap(), MimeType::any());
        let mime = MimeType::parse("Text/*").unwrap();
        assert_eq!(mime, MimeType::any_subtype("text"));
        assert_eq!(mime.media_type(), Some("text"));
        assert_eq!(mime.subtype(), None);
        assert!(mime.is_wildcard());
    }

    #[test]
    fn equality_is_case_insensitive_except_values() {
        assert_eq!(
            MimeType::parse("Application/JSON").unwrap(),
            MimeType::parse("application/json").unwrap()
        );
        assert_eq!(
            MimeType::parse("text/plain; CHARSET=utf-8").unwrap(),
            MimeType::parse("text/plain; charset=utf-8").unwrap()
        );
        assert_ne!(
            MimeType::parse("text/plain; charset=UTF-8").unwrap(),
            MimeType::parse("text/plain; charset=utf-8").unwrap()
        );
    }

    #[test]
    fn parse_parameters_quoted() {
        let mime = MimeType::parse(r#"multipart/form-data; boundary="a;b\"c"; x=1"#).unwrap();
        assert_eq!(mime.parameter("boundary"), Some("a;b\"c"));
        assert_eq!(mime.parameter("X"), Some("1"));
        assert_eq!(mime.parameter_count(), 2);
    }

    #[test]
    fn parse_with_spaces() {
        let mime = MimeType::parse("  text/html  ;  charset = utf-8  ").unwrap();
        assert_eq!(mime.parameter("charset"), Some("utf-8"));
    }

    #[test]
    fn parse_invalid() {
        for input in [
            "",
            "text",
            "/html",
            "text/",
            "*/html",
            "text/html/x",
            "text/plain; charset",
            "text/plain; =utf-8",
            "text/plain; charset=\"utf-8",
            "text/plain; charset=\"utf-8\"x",
            "text/plain; charset=a b",
        ] {
            assert!(MimeType::parse(input).is_none(), "{input}");
        }
    }

    #[test]
    fn from_str_names_input() {
        let error = "nope".parse::<MimeType>().unwrap_err();
        assert_eq!(error.input, "nope");
        assert_eq!(error.to_string(), "invalid mime type: \"nope\"");
    }

    #[test]
    fn display() {
        let mime = MimeType::concrete("Text", "Plain")
            .with_parameter("Charset", "utf-8")
            .with_parameter("note", "a b");
        assert_eq!(mime.to_string(), "text/plain; charset=utf-8; note=\"a b\"");
        assert_eq!(MimeType::parse(&mime.to_string()).unwrap(), mime);
        assert_eq!(MimeType::any_subtype("image").to_string(), "image/*");
    }

    #[test]
    fn remove_parameter() {
        let mut mime = MimeType::parse("text/html; q=0.5; level=1").unwrap();
        assert_eq!(mime.remove_parameter("Q").as_deref(), Some("0.5"));
        assert_eq!(mime.to_string(), "text/html; level=1");
    }
}
