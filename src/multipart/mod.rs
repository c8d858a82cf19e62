//! multipart チャンク列とパート列の相互変換
//!
//! ## 概要
//!
//! 境界の解析が済んだフラットなチャンク列 ([`MultipartChunk`]) と、
//! ヘッダーと遅延評価されるボディを持つパート列 ([`MultipartPart`]) を相互に変換します。
//!
//! - [`decompose`]: チャンク列をパート列に変換する
//! - [`recompose`]: パート列をチャンク列に変換する
//! - [`validation`]: パート名の出現回数を検証する
//!
//! パートは厳密に順番に処理します。
//! パート N のボディを読み終えるまでパート N+1 を要求することはできません。
//!
//! ## 使い方
//!
//! ```rust
//! use bytes::Bytes;
//! use shiguredo_openapi_wire::{ByteSequence, HeaderFields};
//! use shiguredo_openapi_wire::multipart::{self, MultipartChunk};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let chunks = ByteSequence::from_elements(vec![
//!     MultipartChunk::HeaderFields(
//!         HeaderFields::new().header("Content-Disposition", "form-data; name=\"a\""),
//!     ),
//!     MultipartChunk::BodyChunk(Bytes::from("hello")),
//! ]);
//!
//! let parts = multipart::decompose(&chunks);
//! let mut iterator = parts.make_iterator().unwrap();
//! let part = iterator.next().await.unwrap().unwrap();
//! assert_eq!(part.name().as_deref(), Some("a"));
//! assert_eq!(part.body.collect_string(1024).await.unwrap(), "hello");
//! assert!(iterator.next().await.unwrap().is_none());
//! # });
//! ```

mod decompose;
mod recompose;
pub mod validation;

use bytes::Bytes;

use crate::body::{ByteSequence, Element};
use crate::content_disposition::{ContentDisposition, ContentDispositionError};
use crate::error::ErrorClass;
use crate::header_fields::HeaderFields;

pub use decompose::decompose;
pub use recompose::recompose;

/// multipart チャンク列のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MultipartError {
    /// ヘッダーを待っている間にボディチャンクを受信した
    #[error("received body chunk when waiting for part headers")]
    ReceivedBodyChunkWhenWaitingForHeaders,
    /// 前のパートのボディを読み終える前に次のパートを要求した
    #[error("next part requested before body of part {part} was fully read")]
    PartRequestedBeforeBodyFinished { part: usize },
    /// 現在のパートではないボディを読もうとした
    #[error("body of part {part} requested out of order")]
    BodyRequestedOutOfOrder { part: usize },
}

impl MultipartError {
    /// エラー分類を取得
    pub fn class(&self) -> ErrorClass {
        match self {
            MultipartError::ReceivedBodyChunkWhenWaitingForHeaders => ErrorClass::Protocol,
            MultipartError::PartRequestedBeforeBodyFinished { .. }
            | MultipartError::BodyRequestedOutOfOrder { .. } => ErrorClass::ContractViolation,
        }
    }
}

/// 境界解析後の multipart の単位
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartChunk {
    /// パートのヘッダー
    HeaderFields(HeaderFields),
    /// パートのボディの一部
    BodyChunk(Bytes),
}

impl Element for MultipartChunk {}

/// multipart パート
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
    /// ヘッダー
    pub header_fields: HeaderFields,
    /// ボディ
    pub body: ByteSequence<Bytes>,
}

impl Element for MultipartPart {}

impl MultipartPart {
    /// 新しいパートを作成
    pub fn new(header_fields: HeaderFields, body: impl Into<ByteSequence<Bytes>>) -> Self {
        MultipartPart {
            header_fields,
            body: body.into(),
        }
    }

    /// `form-data; name="..."` の Content-Disposition を持つパートを作成
    pub fn form_data(name: &str, body: impl Into<ByteSequence<Bytes>>) -> Self {
        let mut header_fields = HeaderFields::new();
        header_fields.set_content_disposition(&ContentDisposition::form_data(name));
        Self::new(header_fields, body)
    }

    /// Content-Disposition を取得
    pub fn content_disposition(&self) -> Result<Option<ContentDisposition>, ContentDispositionError> {
        self.header_fields.content_disposition()
    }

    /// Content-Disposition の name を取得
    ///
    /// ヘッダーが無いかパースできない場合は `None` を返す。
    pub fn name(&self) -> Option<String> {
        self.content_disposition()
            .ok()
            .flatten()
            .and_then(|cd| cd.name().map(str::to_string))
    }

    /// Content-Disposition の filename を取得
    pub fn filename(&self) -> Option<String> {
        self.content_disposition()
            .ok()
            .flatten()
            .and_then(|cd| cd.filename().map(str::to_string))
    }
}
