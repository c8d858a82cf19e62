//! multipart パート名の検証
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_openapi_wire::ByteSequence;
//! use shiguredo_openapi_wire::multipart::MultipartPart;
//! use shiguredo_openapi_wire::multipart::validation::MultipartValidation;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let validation = MultipartValidation::new()
//!     .required_exactly_once("metadata")
//!     .zero_or_more("attachment");
//!
//! let parts = ByteSequence::from_elements(vec![
//!     MultipartPart::form_data("metadata", "{}"),
//!     MultipartPart::form_data("attachment", "a"),
//!     MultipartPart::form_data("attachment", "b"),
//! ]);
//! let validated = validation.validate(&parts);
//! assert_eq!(validated.collect(16).await.unwrap().len(), 3);
//! # });
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::stream;
use tracing::debug;

use crate::body::{BoxElementStream, ByteSequence, Length, SequenceIterator};
use crate::content_disposition::ContentDispositionError;
use crate::error::{Error, ErrorClass};
use crate::multipart::MultipartPart;

/// パート名の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Content-Disposition に name が無い
    #[error("multipart part has no name")]
    MissingPartName,
    /// Content-Disposition が不正
    #[error("invalid part content-disposition: {0}")]
    InvalidContentDisposition(ContentDispositionError),
    /// 許可された回数を超えて出現した
    #[error("too many parts named {name:?}")]
    TooManyParts { name: String },
    /// 宣言されていないパート名
    #[error("unknown part name: {name:?}")]
    UnknownPart { name: String },
    /// 必須パートが出現しなかった
    #[error("missing required parts: {names:?}")]
    MissingRequiredParts { names: Vec<String> },
}

/// パート名の出現回数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// ちょうど 1 回
    ExactlyOnce,
    /// 1 回以上
    AtLeastOnce,
    /// 0 回または 1 回
    AtMostOnce,
    /// 任意
    ZeroOrMore,
}

impl Cardinality {
    fn is_required(self) -> bool {
        matches!(self, Cardinality::ExactlyOnce | Cardinality::AtLeastOnce)
    }

    fn allows(self, count: usize) -> bool {
        match self {
            Cardinality::ExactlyOnce | Cardinality::AtMostOnce => count <= 1,
            Cardinality::AtLeastOnce | Cardinality::ZeroOrMore => true,
        }
    }
}

/// パート名の検証ルール
#[derive(Debug, Clone, Default)]
pub struct MultipartValidation {
    cardinalities: BTreeMap<String, Cardinality>,
    allows_unknown_parts: bool,
}

impl MultipartValidation {
    /// 空のルールを作成
    ///
    /// 宣言されていないパート名はデフォルトで拒否する。
    pub fn new() -> Self {
        Self::default()
    }

    /// 出現回数を宣言
    pub fn with_part(mut self, name: &str, cardinality: Cardinality) -> Self {
        self.cardinalities.insert(name.to_string(), cardinality);
        self
    }

    /// ちょうど 1 回出現するパート
    pub fn required_exactly_once(self, name: &str) -> Self {
        self.with_part(name, Cardinality::ExactlyOnce)
    }

    /// 1 回以上出現するパート
    pub fn required_at_least_once(self, name: &str) -> Self {
        self.with_part(name, Cardinality::AtLeastOnce)
    }

    /// 高々 1 回出現するパート
    pub fn at_most_once(self, name: &str) -> Self {
        self.with_part(name, Cardinality::AtMostOnce)
    }

    /// 何回でも出現してよいパート
    pub fn zero_or_more(self, name: &str) -> Self {
        self.with_part(name, Cardinality::ZeroOrMore)
    }

    /// 宣言されていないパート名を許可するか
    pub fn allow_unknown_parts(mut self, allow: bool) -> Self {
        self.allows_unknown_parts = allow;
        self
    }

    /// 検証しながらパートを返すシーケンスを作成
    ///
    /// 出現回数の超過と未知のパートはそのパートの時点で、
    /// 必須パートの欠落は終端で失敗する。
    pub fn validate(&self, parts: &ByteSequence<MultipartPart>) -> ByteSequence<MultipartPart> {
        let rules = Arc::new(self.clone());
        parts.derive(Length::Unknown, move |upstream| {
            validated_stream(Validator {
                rules: Arc::clone(&rules),
                upstream,
                seen: BTreeMap::new(),
            })
        })
    }
}

struct Validator {
    rules: Arc<MultipartValidation>,
    upstream: SequenceIterator<MultipartPart>,
    seen: BTreeMap<String, usize>,
}

impl Validator {
    async fn next_part(&mut self) -> Result<Option<MultipartPart>, Error> {
        match self.upstream.next().await? {
            Some(part) => {
                self.check(&part)?;
                Ok(Some(part))
            }
            None => {
                self.check_required()?;
                Ok(None)
            }
        }
    }

    fn check(&mut self, part: &MultipartPart) -> Result<(), ValidationError> {
        let name = part
            .content_disposition()
            .map_err(ValidationError::InvalidContentDisposition)?
            .and_then(|cd| cd.name().map(str::to_string))
            .ok_or(ValidationError::MissingPartName)?;

        let count = self.seen.entry(name.clone()).or_insert(0);
        *count += 1;

        match self.rules.cardinalities.get(&name) {
            Some(cardinality) if !cardinality.allows(*count) => {
                debug!(part = %name, count = *count, "multipart part exceeds cardinality");
                Err(ValidationError::TooManyParts { name })
            }
            None if !self.rules.allows_unknown_parts => {
                debug!(part = %name, "undocumented multipart part");
                Err(ValidationError::UnknownPart { name })
            }
            _ => Ok(()),
        }
    }

    fn check_required(&self) -> Result<(), ValidationError> {
        let names: Vec<String> = self
            .rules
            .cardinalities
            .iter()
            .filter(|(name, cardinality)| cardinality.is_required() && !self.seen.contains_key(*name))
            .map(|(name, _)| name.clone())
            .collect();
        if names.is_empty() {
            Ok(())
        } else {
            debug!(?names, "required multipart parts missing");
            Err(ValidationError::MissingRequiredParts { names })
        }
    }
}

/// 上流の契約違反エラーはそのまま返し、検証状態を保ったまま続行する
fn validated_stream(validator: Validator) -> BoxElementStream<MultipartPart> {
    Box::pin(stream::unfold(Some(validator), |validator| async move {
        let mut validator = validator?;
        match validator.next_part().await {
            Ok(Some(part)) => Some((Ok(part), Some(validator))),
            Ok(None) => None,
            Err(e) => {
                let validator = (e.class() == ErrorClass::ContractViolation).then_some(validator);
                Some((Err(e), validator))
            }
        }
    }))
}
