//! Accept ヘッダーと品質値 (RFC 9110 Section 12.4.2, 12.5.1)
//!
//! ## 概要
//!
//! - [`QualityValue`]: 0.000 から 1.000 の品質値を千分率の整数で保持する
//! - [`AcceptEntry`]: MIME タイプと品質値の組
//! - [`parse_accept_header`]: Accept ヘッダーを品質値の降順に並べてパースする
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_openapi_wire::accept::{accept_header_value, parse_accept_header, QualityValue};
//!
//! let entries = parse_accept_header("text/plain; q=0.8, application/json").unwrap();
//! assert_eq!(entries[0].content_type.to_string(), "application/json");
//! assert_eq!(entries[1].quality, QualityValue::parse("0.8").unwrap());
//!
//! assert_eq!(accept_header_value(&entries), "application/json, text/plain; q=0.8");
//! ```

use core::fmt;
use core::str::FromStr;

use crate::mime::MimeType;
use crate::syntax::split_unquoted;

const QUALITY_PARAMETER: &str = "q";

/// 品質値のパースエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid quality value: {input:?}")]
pub struct QualityValueError {
    /// パースできなかった入力
    pub input: String,
}

/// Accept ヘッダーのパースエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcceptError {
    /// 不正なメディアタイプ
    #[error("invalid media type in accept header: {input:?}")]
    InvalidMediaType { input: String },
    /// 不正な品質値
    #[error(transparent)]
    InvalidQuality(#[from] QualityValueError),
}

/// 品質値 (0.000 - 1.000)
///
/// 正確に比較できるよう千分率の整数で保持する。デフォルトは 1。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualityValue(u16);

impl QualityValue {
    /// 1.000
    pub const ONE: Self = QualityValue(1000);
    /// 0.000
    pub const ZERO: Self = QualityValue(0);

    /// 小数から作成
    ///
    /// # Panics
    ///
    /// `value` が 0 以上 1 以下でない場合
    pub fn new(value: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&value),
            "quality value out of range: {value}"
        );
        QualityValue((value * 1000.0).round() as u16)
    }

    /// 千分率から作成
    ///
    /// 1000 を超える場合は `None` を返す。
    pub fn from_thousandths(thousandths: u16) -> Option<Self> {
        (thousandths <= 1000).then_some(QualityValue(thousandths))
    }

    /// 品質値をパース
    ///
    /// 小数点以下 4 桁目以降は切り捨てる。
    pub fn parse(input: &str) -> Result<Self, QualityValueError> {
        let invalid = || QualityValueError {
            input: input.to_string(),
        };
        let trimmed = input.trim();
        let (integer, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        match integer {
            "1" if fraction.bytes().all(|b| b == b'0') => Ok(Self::ONE),
            "0" => {
                let value = fraction
                    .bytes()
                    .chain(std::iter::repeat(b'0'))
                    .take(3)
                    .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));
                Ok(QualityValue(value))
            }
            _ => Err(invalid()),
        }
    }

    /// 千分率の値
    pub fn thousandths(&self) -> u16 {
        self.0
    }

    /// 小数の値
    pub fn double_value(&self) -> f64 {
        f64::from(self.0) / 1000.0
    }
}

impl Default for QualityValue {
    fn default() -> Self {
        Self::ONE
    }
}

impl FromStr for QualityValue {
    type Err = QualityValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for QualityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 1000 {
            return write!(f, "1");
        }
        if self.0 == 0 {
            return write!(f, "0");
        }

        let mut frac = format!("{:03}", self.0);
        while frac.ends_with('0') {
            frac.pop();
        }
        write!(f, "0.{}", frac)
    }
}

/// Accept ヘッダーの要素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptEntry {
    /// MIME タイプ (`q` パラメータを除く)
    pub content_type: MimeType,
    /// 品質値
    pub quality: QualityValue,
}

impl AcceptEntry {
    /// 要素を作成
    pub fn new(content_type: MimeType, quality: QualityValue) -> Self {
        AcceptEntry {
            content_type,
            quality,
        }
    }

    /// 1 つの要素をパース
    pub fn parse(input: &str) -> Result<Self, AcceptError> {
        let mut content_type =
            MimeType::parse(input).ok_or_else(|| AcceptError::InvalidMediaType {
                input: input.trim().to_string(),
            })?;
        let quality = match content_type.remove_parameter(QUALITY_PARAMETER) {
            Some(q) => QualityValue::parse(&q)?,
            None => QualityValue::default(),
        };
        Ok(AcceptEntry::new(content_type, quality))
    }
}

impl fmt::Display for AcceptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content_type)?;
        if self.quality != QualityValue::ONE {
            write!(f, "; q={}", self.quality)?;
        }
        Ok(())
    }
}

/// 品質値の降順に並べ替える
///
/// 品質値が同じ要素は元の順序を保つ。
pub fn sort_by_quality(entries: &mut [AcceptEntry]) {
    entries.sort_by(|a, b| b.quality.0.cmp(&a.quality.0));
}

/// Accept ヘッダーをパース
///
/// 結果は品質値の降順に並ぶ。空のヘッダーは空の列になる。
pub fn parse_accept_header(input: &str) -> Result<Vec<AcceptEntry>, AcceptError> {
    let mut entries = split_unquoted(input, ',')
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .map(AcceptEntry::parse)
        .collect::<Result<Vec<_>, _>>()?;
    sort_by_quality(&mut entries);
    Ok(entries)
}

/// Accept ヘッダーの値を生成
pub fn accept_header_value(entries: &[AcceptEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
