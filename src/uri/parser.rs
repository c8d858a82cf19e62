use std::collections::BTreeMap;
use std::str::FromStr;

use crate::uri::{
    NodeKind, PrimitiveKind, SerializerConfiguration, Style, UriNode, UriPrimitive, percent_decode,
};

/// URI デコードエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriParseError {
    /// 不正なパーセントエンコーディング
    #[error("invalid percent encoding: {input:?}")]
    InvalidPercentEncoding { input: String },
    /// デコード結果が UTF-8 として不正
    #[error("percent-decoded value is not valid UTF-8: {input:?}")]
    InvalidUtf8 { input: String },
    /// `=` の無い組
    #[error("missing '=' in {input:?}")]
    InvalidPair { input: String },
    /// unexplode の辞書の要素数が奇数
    #[error("odd number of dictionary components: {input:?}")]
    OddDictionaryComponents { input: String },
    /// 期待した種類の値として解釈できない
    #[error("invalid primitive value: {input:?}")]
    InvalidPrimitive { input: String },
}

/// RFC 6570 form/simple 展開のデコーダー
///
/// 区切り文字で分割してから各要素をパーセントデコードする。
/// simple スタイルの空入力は、プリミティブとしては空文字列、
/// 配列と辞書としては空のコンテナになる。
#[derive(Debug, Clone, Copy)]
pub struct UriParser<'a> {
    configuration: SerializerConfiguration,
    data: &'a str,
}

impl<'a> UriParser<'a> {
    /// デコーダーを作成
    ///
    /// form スタイルでは `data` はクエリ文字列全体 (`?` を除く) を渡す。
    pub fn new(configuration: SerializerConfiguration, data: &'a str) -> Self {
        UriParser {
            configuration,
            data,
        }
    }

    /// プリミティブ値をデコード
    ///
    /// form スタイルで `key` が無い場合は `None` を返す。
    /// simple スタイルでは入力全体が値になるため常に `Some` を返す。
    pub fn parse_primitive(&self, key: &str) -> Result<Option<String>, UriParseError> {
        match self.configuration.style {
            Style::Form => match self.find_value(key)? {
                Some(value) => self.decode(value).map(Some),
                None => Ok(None),
            },
            Style::Simple => self.decode(self.data).map(Some),
        }
    }

    /// プリミティブ値を `T` としてデコード
    ///
    /// `T::from_str` に失敗した場合は [`UriParseError::InvalidPrimitive`] を返す。
    pub fn parse_primitive_as<T: FromStr>(&self, key: &str) -> Result<Option<T>, UriParseError> {
        self.parse_primitive(key)?
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| UriParseError::InvalidPrimitive { input: value })
            })
            .transpose()
    }

    /// 配列をデコード
    ///
    /// 値が無い場合は空の配列を返す。
    pub fn parse_array(&self, key: &str) -> Result<Vec<String>, UriParseError> {
        let raw: Vec<&str> = match (self.configuration.style, self.configuration.explode) {
            (Style::Form, true) => self
                .pairs()?
                .into_iter()
                .filter_map(|(name, value)| (name == key).then_some(value))
                .collect(),
            (Style::Form, false) => match self.find_value(key)? {
                Some(value) => value.split(',').collect(),
                None => Vec::new(),
            },
            (Style::Simple, _) => self.simple_components(),
        };
        raw.into_iter().map(|value| self.decode(value)).collect()
    }

    /// 辞書をデコード
    ///
    /// 値が無い場合は空の辞書を返す。
    /// form + explode ではすべての組が辞書の要素になり、`key` は使わない。
    pub fn parse_dictionary(&self, key: &str) -> Result<BTreeMap<String, String>, UriParseError> {
        let mut result = BTreeMap::new();
        match (self.configuration.style, self.configuration.explode) {
            (Style::Form, true) => {
                for (name, value) in self.pairs()? {
                    result.insert(name, self.decode(value)?);
                }
            }
            (Style::Form, false) => {
                if let Some(value) = self.find_value(key)? {
                    self.insert_flat_pairs(&mut result, value)?;
                }
            }
            (Style::Simple, true) => {
                for component in self.simple_components() {
                    let (name, value) = split_pair(component)?;
                    result.insert(self.decode(name)?, self.decode(value)?);
                }
            }
            (Style::Simple, false) => {
                if !self.data.is_empty() {
                    self.insert_flat_pairs(&mut result, self.data)?;
                }
            }
        }
        Ok(result)
    }

    /// 指定した種類の値をデコード
    ///
    /// デコードしたプリミティブはすべて `UriPrimitive::String` になる。
    pub fn parse_node(&self, key: &str, kind: NodeKind) -> Result<UriNode, UriParseError> {
        self.parse_typed_node(key, kind, PrimitiveKind::String)
    }

    /// 指定した種類の値を、プリミティブの種類も指定してデコード
    ///
    /// simple スタイルの空入力は、文字列以外のプリミティブとしては `Unset` になる。
    pub fn parse_typed_node(
        &self,
        key: &str,
        kind: NodeKind,
        primitive: PrimitiveKind,
    ) -> Result<UriNode, UriParseError> {
        let element = |value: String| typed_primitive(primitive, value).map(UriNode::Primitive);
        Ok(match kind {
            NodeKind::Primitive => match self.parse_primitive(key)? {
                Some(value)
                    if value.is_empty()
                        && primitive != PrimitiveKind::String
                        && self.configuration.style == Style::Simple =>
                {
                    UriNode::Unset
                }
                Some(value) => element(value)?,
                None => UriNode::Unset,
            },
            NodeKind::Array => UriNode::Array(
                self.parse_array(key)?
                    .into_iter()
                    .map(element)
                    .collect::<Result<_, UriParseError>>()?,
            ),
            NodeKind::Dictionary => UriNode::Dictionary(
                self.parse_dictionary(key)?
                    .into_iter()
                    .map(|(k, v)| element(v).map(|node| (k, node)))
                    .collect::<Result<_, UriParseError>>()?,
            ),
        })
    }

    /// `&` で区切られた組。名前はデコード済み、値は未デコード
    fn pairs(&self) -> Result<Vec<(String, &'a str)>, UriParseError> {
        self.data
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = split_pair(pair)?;
                Ok((self.decode(name)?, value))
            })
            .collect()
    }

    fn find_value(&self, key: &str) -> Result<Option<&'a str>, UriParseError> {
        Ok(self
            .pairs()?
            .into_iter()
            .find_map(|(name, value)| (name == key).then_some(value)))
    }

    fn simple_components(&self) -> Vec<&'a str> {
        if self.data.is_empty() {
            Vec::new()
        } else {
            self.data.split(',').collect()
        }
    }

    /// `k1,v1,k2,v2` 形式を辞書に追加
    fn insert_flat_pairs(
        &self,
        result: &mut BTreeMap<String, String>,
        input: &str,
    ) -> Result<(), UriParseError> {
        let components: Vec<&str> = input.split(',').collect();
        if components.len() % 2 != 0 {
            return Err(UriParseError::OddDictionaryComponents {
                input: input.to_string(),
            });
        }
        for pair in components.chunks_exact(2) {
            result.insert(self.decode(pair[0])?, self.decode(pair[1])?);
        }
        Ok(())
    }

    fn decode(&self, input: &str) -> Result<String, UriParseError> {
        percent_decode(input, self.configuration.space_escape)
    }
}

fn typed_primitive(kind: PrimitiveKind, value: String) -> Result<UriPrimitive, UriParseError> {
    fn parsed<T: FromStr>(value: String) -> Result<T, UriParseError> {
        value
            .parse()
            .map_err(|_| UriParseError::InvalidPrimitive { input: value })
    }

    Ok(match kind {
        PrimitiveKind::String => UriPrimitive::String(value),
        PrimitiveKind::Bool => UriPrimitive::Bool(parsed(value)?),
        PrimitiveKind::Integer => UriPrimitive::Integer(parsed(value)?),
        PrimitiveKind::Double => UriPrimitive::Double(parsed(value)?),
    })
}

fn split_pair(input: &str) -> Result<(&str, &str), UriParseError> {
    input.split_once('=').ok_or_else(|| UriParseError::InvalidPair {
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::SerializerConfiguration as C;

    #[test]
    fn primitive_form() {
        let parser = UriParser::new(C::FORM_EXPLODE, "a=1&q=hello%20world&q=ignored");
        assert_eq!(parser.parse_primitive("q").unwrap().as_deref(), Some("hello world"));
        assert_eq!(parser.parse_primitive("missing").unwrap(), None);
    }

    #[test]
    fn primitive_simple() {
        let parser = UriParser::new(C::SIMPLE_UNEXPLODE, "a%2Cb");
        assert_eq!(parser.parse_primitive("x").unwrap().as_deref(), Some("a,b"));
        let empty = UriParser::new(C::SIMPLE_UNEXPLODE, "");
        assert_eq!(empty.parse_primitive("x").unwrap().as_deref(), Some(""));
        assert_eq!(
            empty.parse_node("x", NodeKind::Primitive).unwrap(),
            UriNode::primitive("")
        );
        assert_eq!(
            empty
                .parse_typed_node("x", NodeKind::Primitive, PrimitiveKind::Integer)
                .unwrap(),
            UriNode::Unset
        );
    }

    #[test]
    fn primitive_as() {
        let parser = UriParser::new(C::FORM_EXPLODE, "n=-42&f=true&d=0.5&s=x");
        assert_eq!(parser.parse_primitive_as::<i64>("n").unwrap(), Some(-42));
        assert_eq!(parser.parse_primitive_as::<bool>("f").unwrap(), Some(true));
        assert_eq!(parser.parse_primitive_as::<f64>("d").unwrap(), Some(0.5));
        assert_eq!(parser.parse_primitive_as::<i64>("missing").unwrap(), None);
        assert_eq!(
            parser.parse_primitive_as::<i64>("s"),
            Err(UriParseError::InvalidPrimitive {
                input: "x".to_string()
            })
        );
    }

    #[test]
    fn typed_nodes_roundtrip() {
        use crate::uri::UriSerializer;

        let configurations = [
            C::FORM_EXPLODE,
            C::FORM_UNEXPLODE,
            C::SIMPLE_EXPLODE,
            C::SIMPLE_UNEXPLODE,
            C::FORM_DATA_EXPLODE,
            C::FORM_DATA_UNEXPLODE,
        ];
        let nodes = [
            (UriNode::primitive(5i64), NodeKind::Primitive, PrimitiveKind::Integer),
            (UriNode::primitive(true), NodeKind::Primitive, PrimitiveKind::Bool),
            (UriNode::primitive(-0.125), NodeKind::Primitive, PrimitiveKind::Double),
            (UriNode::primitive(""), NodeKind::Primitive, PrimitiveKind::String),
            (UriNode::array([1i64, -2, 3]), NodeKind::Array, PrimitiveKind::Integer),
            (UriNode::array([false, true]), NodeKind::Array, PrimitiveKind::Bool),
            (
                UriNode::dictionary([("a", 1.5), ("b", 1e21)]),
                NodeKind::Dictionary,
                PrimitiveKind::Double,
            ),
        ];
        for configuration in configurations {
            let mut serializer = UriSerializer::new(configuration);
            for (node, kind, primitive) in &nodes {
                let encoded = serializer.serialize(node, "k").unwrap();
                let parser = UriParser::new(configuration, encoded);
                assert_eq!(
                    &parser.parse_typed_node("k", *kind, *primitive).unwrap(),
                    node,
                    "{configuration:?} {encoded}"
                );
            }
        }
    }

    #[test]
    fn typed_node_rejects_mismatched_primitive() {
        let parser = UriParser::new(C::SIMPLE_EXPLODE, "1,two,3");
        assert_eq!(
            parser.parse_typed_node("k", NodeKind::Array, PrimitiveKind::Integer),
            Err(UriParseError::InvalidPrimitive {
                input: "two".to_string()
            })
        );
        let parser = UriParser::new(C::FORM_EXPLODE, "f=yes");
        assert!(matches!(
            parser.parse_typed_node("f", NodeKind::Primitive, PrimitiveKind::Bool),
            Err(UriParseError::InvalidPrimitive { .. })
        ));
    }

    #[test]
    fn array_all_styles() {
        let expected = vec!["red", "green", "blue"];
        let cases = [
            (C::FORM_EXPLODE, "list=red&other=x&list=green&list=blue"),
            (C::FORM_UNEXPLODE, "list=red,green,blue"),
            (C::SIMPLE_EXPLODE, "red,green,blue"),
            (C::SIMPLE_UNEXPLODE, "red,green,blue"),
        ];
        for (configuration, input) in cases {
            let parser = UriParser::new(configuration, input);
            assert_eq!(parser.parse_array("list").unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn array_missing_is_empty() {
        assert!(UriParser::new(C::FORM_EXPLODE, "a=1").parse_array("list").unwrap().is_empty());
        assert!(UriParser::new(C::FORM_UNEXPLODE, "").parse_array("list").unwrap().is_empty());
        assert!(UriParser::new(C::SIMPLE_EXPLODE, "").parse_array("list").unwrap().is_empty());
    }

    #[test]
    fn dictionary_all_styles() {
        let expected = BTreeMap::from([
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ]);
        let cases = [
            (C::FORM_EXPLODE, "a=1&b=2"),
            (C::FORM_UNEXPLODE, "obj=a,1,b,2"),
            (C::SIMPLE_EXPLODE, "a=1,b=2"),
            (C::SIMPLE_UNEXPLODE, "a,1,b,2"),
        ];
        for (configuration, input) in cases {
            let parser = UriParser::new(configuration, input);
            assert_eq!(parser.parse_dictionary("obj").unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn plus_decoding_depends_on_configuration() {
        let input = "q=a+b";
        assert_eq!(
            UriParser::new(C::FORM_DATA_EXPLODE, input)
                .parse_primitive("q")
                .unwrap()
                .as_deref(),
            Some("a b")
        );
        assert_eq!(
            UriParser::new(C::FORM_EXPLODE, input)
                .parse_primitive("q")
                .unwrap()
                .as_deref(),
            Some("a+b")
        );
    }

    #[test]
    fn errors_name_input() {
        assert_eq!(
            UriParser::new(C::SIMPLE_UNEXPLODE, "a,1,b").parse_dictionary("x"),
            Err(UriParseError::OddDictionaryComponents {
                input: "a,1,b".to_string()
            })
        );
        assert_eq!(
            UriParser::new(C::FORM_EXPLODE, "a=1&novalue").parse_primitive("a"),
            Err(UriParseError::InvalidPair {
                input: "novalue".to_string()
            })
        );
        assert_eq!(
            UriParser::new(C::SIMPLE_EXPLODE, "a=1,b").parse_dictionary("x"),
            Err(UriParseError::InvalidPair {
                input: "b".to_string()
            })
        );
        assert!(matches!(
            UriParser::new(C::SIMPLE_EXPLODE, "%G0").parse_primitive("x"),
            Err(UriParseError::InvalidPercentEncoding { .. })
        ));
    }

    #[test]
    fn parse_node_kinds() {
        let parser = UriParser::new(C::FORM_UNEXPLODE, "k=x,y");
        assert_eq!(
            parser.parse_node("k", NodeKind::Array).unwrap(),
            UriNode::array(["x", "y"])
        );
        assert_eq!(
            parser.parse_node("k", NodeKind::Dictionary).unwrap(),
            UriNode::dictionary([("x", "y")])
        );
        assert_eq!(
            parser.parse_node("k", NodeKind::Primitive).unwrap(),
            UriNode::primitive("x,y")
        );
    }
}
