//! URI テンプレート展開 (RFC 6570)
//!
//! ## 概要
//!
//! クエリパラメータ、パスセグメント、ヘッダー値に使う文字列を
//! RFC 6570 の form (`?`) と simple (`{}`) 展開で生成/パースします。
//!
//! - 値は [`UriNode`] で表し、コンテナの入れ子はエラーになる
//! - unreserved 以外の文字はパーセントエンコードする
//! - 空白は設定に応じて `%20` または `+` にする
//! - 辞書は大文字小文字を区別しないキーの昇順で出力する
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_openapi_wire::uri::{SerializerConfiguration, UriNode, UriParser, UriSerializer};
//!
//! let node = UriNode::array(["red", "green", "blue"]);
//!
//! let mut serializer = UriSerializer::new(SerializerConfiguration::FORM_UNEXPLODE);
//! assert_eq!(serializer.serialize(&node, "list").unwrap(), "list=red,green,blue");
//!
//! let mut serializer = UriSerializer::new(SerializerConfiguration::SIMPLE_EXPLODE);
//! assert_eq!(serializer.serialize(&node, "list").unwrap(), "red,green,blue");
//!
//! // パースは逆変換になる
//! let parser = UriParser::new(SerializerConfiguration::SIMPLE_EXPLODE, "red,green,blue");
//! assert_eq!(parser.parse_array("list").unwrap(), vec!["red", "green", "blue"]);
//! ```

mod parser;
mod serializer;

use core::fmt;
use std::collections::BTreeMap;

use crate::syntax;

pub use parser::{UriParseError, UriParser};
pub use serializer::{UriSerializationError, UriSerializer};

/// 展開スタイル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    /// `key=value` 形式 (クエリ、フォーム)
    Form,
    /// 値のみ (パス、ヘッダー)
    Simple,
}

/// 空白のエスケープ方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceEscape {
    /// `%20`
    Percent,
    /// `+` (application/x-www-form-urlencoded)
    Plus,
}

/// URI エンコード設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerializerConfiguration {
    /// 展開スタイル
    pub style: Style,
    /// 複数の値を `key=value` の繰り返しに展開するか
    pub explode: bool,
    /// 空白のエスケープ方法
    pub space_escape: SpaceEscape,
}

impl SerializerConfiguration {
    /// form + explode (クエリのデフォルト)
    pub const FORM_EXPLODE: Self = Self::new(Style::Form, true, SpaceEscape::Percent);
    /// form + unexplode
    pub const FORM_UNEXPLODE: Self = Self::new(Style::Form, false, SpaceEscape::Percent);
    /// simple + explode
    pub const SIMPLE_EXPLODE: Self = Self::new(Style::Simple, true, SpaceEscape::Percent);
    /// simple + unexplode (パス、ヘッダーのデフォルト)
    pub const SIMPLE_UNEXPLODE: Self = Self::new(Style::Simple, false, SpaceEscape::Percent);
    /// form + explode、空白は `+` (application/x-www-form-urlencoded)
    pub const FORM_DATA_EXPLODE: Self = Self::new(Style::Form, true, SpaceEscape::Plus);
    /// form + unexplode、空白は `+`
    pub const FORM_DATA_UNEXPLODE: Self = Self::new(Style::Form, false, SpaceEscape::Plus);

    /// 設定を作成
    pub const fn new(style: Style, explode: bool, space_escape: SpaceEscape) -> Self {
        SerializerConfiguration {
            style,
            explode,
            space_escape,
        }
    }
}

impl Default for SerializerConfiguration {
    fn default() -> Self {
        Self::FORM_EXPLODE
    }
}

/// プリミティブ値
#[derive(Debug, Clone, PartialEq)]
pub enum UriPrimitive {
    Bool(bool),
    String(String),
    Integer(i64),
    Double(f64),
}

impl UriPrimitive {
    /// プリミティブの種類
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            UriPrimitive::Bool(_) => PrimitiveKind::Bool,
            UriPrimitive::String(_) => PrimitiveKind::String,
            UriPrimitive::Integer(_) => PrimitiveKind::Integer,
            UriPrimitive::Double(_) => PrimitiveKind::Double,
        }
    }
}

impl fmt::Display for UriPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriPrimitive::Bool(v) => write!(f, "{v}"),
            UriPrimitive::String(v) => f.write_str(v),
            UriPrimitive::Integer(v) => write!(f, "{v}"),
            UriPrimitive::Double(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for UriPrimitive {
    fn from(v: bool) -> Self {
        UriPrimitive::Bool(v)
    }
}

impl From<&str> for UriPrimitive {
    fn from(v: &str) -> Self {
        UriPrimitive::String(v.to_string())
    }
}

impl From<String> for UriPrimitive {
    fn from(v: String) -> Self {
        UriPrimitive::String(v)
    }
}

impl From<i64> for UriPrimitive {
    fn from(v: i64) -> Self {
        UriPrimitive::Integer(v)
    }
}

impl From<i32> for UriPrimitive {
    fn from(v: i32) -> Self {
        UriPrimitive::Integer(v.into())
    }
}

impl From<f64> for UriPrimitive {
    fn from(v: f64) -> Self {
        UriPrimitive::Double(v)
    }
}

/// URI エンコード可能な値
///
/// 配列と辞書の要素はプリミティブでなければならない。
/// 入れ子のコンテナは表現できるがエンコード時にエラーになる。
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UriNode {
    /// 値なし (何も出力しない)
    #[default]
    Unset,
    Primitive(UriPrimitive),
    Array(Vec<UriNode>),
    Dictionary(BTreeMap<String, UriNode>),
}

impl UriNode {
    /// プリミティブ値を作成
    pub fn primitive(value: impl Into<UriPrimitive>) -> Self {
        UriNode::Primitive(value.into())
    }

    /// プリミティブの配列を作成
    pub fn array<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<UriPrimitive>,
    {
        UriNode::Array(values.into_iter().map(Self::primitive).collect())
    }

    /// プリミティブの辞書を作成
    pub fn dictionary<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<UriPrimitive>,
    {
        UriNode::Dictionary(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), Self::primitive(v)))
                .collect(),
        )
    }

    /// 値の種類
    ///
    /// `Unset` の場合は `None` を返す。
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            UriNode::Unset => None,
            UriNode::Primitive(_) => Some(NodeKind::Primitive),
            UriNode::Array(_) => Some(NodeKind::Array),
            UriNode::Dictionary(_) => Some(NodeKind::Dictionary),
        }
    }
}

/// パース時に期待する値の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Primitive,
    Array,
    Dictionary,
}

/// パース時に期待するプリミティブの種類
///
/// 配列と辞書の要素はすべて同じ種類として復元する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveKind {
    Bool,
    #[default]
    String,
    Integer,
    Double,
}

/// RFC 3986 Section 2.3 unreserved
fn is_unreserved(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'.' || c == b'_' || c == b'~'
}

/// unreserved 以外をパーセントエンコードして追記
fn percent_encode_into(out: &mut String, input: &str, space_escape: SpaceEscape) {
    syntax::percent_encode_into(out, input, |byte| match byte {
        _ if is_unreserved(byte) => Some(char::from(byte)),
        b' ' if space_escape == SpaceEscape::Plus => Some('+'),
        _ => None,
    });
}

/// パーセントデコード
///
/// `+` は `SpaceEscape::Plus` の場合のみ空白として扱う。
fn percent_decode(input: &str, space_escape: SpaceEscape) -> Result<String, UriParseError> {
    let plus_is_space = space_escape == SpaceEscape::Plus;
    let decoded = syntax::percent_decode(input, |byte| {
        Some(if plus_is_space && byte == b'+' { b' ' } else { byte })
    })
    .ok_or_else(|| UriParseError::InvalidPercentEncoding {
        input: input.to_string(),
    })?;
    String::from_utf8(decoded).map_err(|_| UriParseError::InvalidUtf8 {
        input: input.to_string(),
    })
}
