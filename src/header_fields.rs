//! ヘッダーフィールド
//!
//! multipart パートのヘッダーを名前と値の組の列として保持します。
//! 名前の比較は大文字小文字を区別しません。Content-Disposition 以外の値は解釈しません。

/// ヘッダーフィールドの列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    fields: Vec<(String, String)>,
}

impl HeaderFields {
    /// 空のヘッダーフィールドを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ヘッダーを追加 (ビルダー)
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.append(name, value);
        self
    }

    /// ヘッダーを追加
    pub fn append(&mut self, name: &str, value: &str) {
        self.fields.push((name.to_string(), value.to_string()));
    }

    /// 同名のヘッダーをすべて置き換える
    pub fn set(&mut self, name: &str, value: &str) {
        self.remove(name);
        self.append(name, value);
    }

    /// 同名のヘッダーをすべて削除
    pub fn remove(&mut self, name: &str) {
        self.fields.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// 最初に現れるヘッダー値を取得
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 同名のヘッダー値をすべて取得
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// すべてのヘッダー
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// ヘッダー数
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderFields {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        HeaderFields {
            fields: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}
