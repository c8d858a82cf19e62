use std::fmt::Write as _;

use crate::uri::{SerializerConfiguration, Style, UriNode, UriPrimitive, percent_encode_into};

/// URI エンコードエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriSerializationError {
    /// 配列または辞書の要素にコンテナがある
    #[error("nested container in {key:?} cannot be uri-encoded")]
    NestedContainer { key: String },
    /// 配列または辞書の要素が値なし
    #[error("unset element in {key:?} cannot be uri-encoded")]
    UnsetElement { key: String },
}

/// RFC 6570 form/simple 展開のエンコーダー
///
/// 内部バッファを再利用するため、1 つのインスタンスで多数の値をエンコードできる。
/// 辞書のキーの並べ替えを除き、バッファが十分に育った後は割り当てを行わない。
#[derive(Debug, Clone, Default)]
pub struct UriSerializer {
    configuration: SerializerConfiguration,
    data: String,
    /// 文字列以外のプリミティブの描画用
    scratch: String,
}

impl UriSerializer {
    /// エンコーダーを作成
    pub fn new(configuration: SerializerConfiguration) -> Self {
        UriSerializer {
            configuration,
            data: String::new(),
            scratch: String::new(),
        }
    }

    /// 設定を取得
    pub fn configuration(&self) -> SerializerConfiguration {
        self.configuration
    }

    /// 値をエンコード
    ///
    /// 返り値は次の呼び出しまで有効な内部バッファを参照する。
    /// `Unset` と空のコンテナは空文字列になる。
    pub fn serialize(&mut self, node: &UriNode, key: &str) -> Result<&str, UriSerializationError> {
        self.data.clear();
        if let Err(e) = self.serialize_node(node, key) {
            self.data.clear();
            return Err(e);
        }
        Ok(&self.data)
    }

    fn serialize_node(&mut self, node: &UriNode, key: &str) -> Result<(), UriSerializationError> {
        match node {
            UriNode::Unset => Ok(()),
            UriNode::Primitive(value) => {
                if self.configuration.style == Style::Form {
                    self.push_encoded(key);
                    self.data.push('=');
                }
                self.push_primitive(value);
                Ok(())
            }
            UriNode::Array(elements) => {
                elements
                    .iter()
                    .try_for_each(|element| primitive_element(element, key).map(drop))?;
                self.serialize_array(elements, key);
                Ok(())
            }
            UriNode::Dictionary(entries) => {
                let mut values = entries
                    .iter()
                    .map(|(k, element)| {
                        primitive_element(element, key).map(|value| (k.as_str(), value))
                    })
                    .collect::<Result<Vec<_>, UriSerializationError>>()?;
                sort_keys(&mut values);
                self.serialize_dictionary(&values, key);
                Ok(())
            }
        }
    }

    /// 要素がすべてプリミティブであることは呼び出し側で確認済み
    fn serialize_array(&mut self, elements: &[UriNode], key: &str) {
        if elements.is_empty() {
            return;
        }
        let style = self.configuration.style;
        let explode = self.configuration.explode;

        if style == Style::Form && !explode {
            self.push_encoded(key);
            self.data.push('=');
        }
        let values = elements.iter().filter_map(|element| match element {
            UriNode::Primitive(value) => Some(value),
            _ => None,
        });
        for (i, value) in values.enumerate() {
            match (style, explode) {
                (Style::Form, true) => {
                    if i > 0 {
                        self.data.push('&');
                    }
                    self.push_encoded(key);
                    self.data.push('=');
                }
                _ => {
                    if i > 0 {
                        self.data.push(',');
                    }
                }
            }
            self.push_primitive(value);
        }
    }

    fn serialize_dictionary(&mut self, entries: &[(&str, &UriPrimitive)], key: &str) {
        if entries.is_empty() {
            return;
        }
        let (pair_separator, key_value_separator) =
            match (self.configuration.style, self.configuration.explode) {
                (Style::Form, true) => ('&', '='),
                (Style::Form, false) => {
                    self.push_encoded(key);
                    self.data.push('=');
                    (',', ',')
                }
                (Style::Simple, true) => (',', '='),
                (Style::Simple, false) => (',', ','),
            };

        for (i, (k, value)) in entries.iter().enumerate() {
            if i > 0 {
                self.data.push(pair_separator);
            }
            self.push_encoded(k);
            self.data.push(key_value_separator);
            self.push_primitive(value);
        }
    }

    fn push_primitive(&mut self, value: &UriPrimitive) {
        if let UriPrimitive::String(s) = value {
            self.push_encoded(s);
            return;
        }
        self.scratch.clear();
        // String への書き込みは失敗しない
        let _ = write!(self.scratch, "{value}");
        percent_encode_into(&mut self.data, &self.scratch, self.configuration.space_escape);
    }

    fn push_encoded(&mut self, input: &str) {
        percent_encode_into(&mut self.data, input, self.configuration.space_escape);
    }
}

fn primitive_element<'a>(
    element: &'a UriNode,
    key: &str,
) -> Result<&'a UriPrimitive, UriSerializationError> {
    match element {
        UriNode::Primitive(value) => Ok(value),
        UriNode::Unset => Err(UriSerializationError::UnsetElement {
            key: key.to_string(),
        }),
        UriNode::Array(_) | UriNode::Dictionary(_) => Err(UriSerializationError::NestedContainer {
            key: key.to_string(),
        }),
    }
}

/// 大文字小文字を区別しないキーの昇順 (安定ソート)
///
/// 入力は `BTreeMap` 由来なので、大文字小文字だけが異なるキーはバイト順になる。
fn sort_keys(entries: &mut [(&str, &UriPrimitive)]) {
    entries.sort_by(|(a, _), (b, _)| {
        a.bytes()
            .map(|c| c.to_ascii_lowercase())
            .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
    });
}
