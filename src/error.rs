use crate::multipart::MultipartError;
use crate::multipart::validation::ValidationError;

/// 外部プロデューサーが返す任意のエラー
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// ストリームエラー
///
/// [`ByteSequence`](crate::ByteSequence) とその上に構築された multipart 変換が返すエラー。
/// ストリームの終端はエラーではなく `Ok(None)` で表す。
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// 収集上限を超過
    #[error("sequence too large: more than {limit} allowed")]
    TooLarge { limit: usize },
    /// single シーケンスで 2 つ目のイテレーターを作成しようとした
    #[error("sequence can only be iterated once")]
    AlreadyIterated,
    /// ボディが UTF-8 として不正
    #[error("body is not valid UTF-8")]
    InvalidUtf8,
    /// multipart チャンク列のエラー
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    /// multipart パート名の検証エラー
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// 外部プロデューサーのエラー
    #[error("producer error: {0}")]
    Producer(#[source] BoxError),
}

/// エラー分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 不正な入力 (形式エラー、順序エラー)
    Protocol,
    /// 呼び出し側が指定した上限の超過
    ResourceLimit,
    /// 呼び出し側のプログラミングエラー
    ContractViolation,
    /// 外部プロデューサー由来のエラー
    Producer,
}

impl Error {
    /// 外部プロデューサーのエラーを包む
    pub fn producer(error: impl Into<BoxError>) -> Self {
        Error::Producer(error.into())
    }

    /// エラー分類を取得
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::TooLarge { .. } => ErrorClass::ResourceLimit,
            Error::AlreadyIterated => ErrorClass::ContractViolation,
            Error::InvalidUtf8 | Error::Validation(_) => ErrorClass::Protocol,
            Error::Multipart(e) => e.class(),
            Error::Producer(_) => ErrorClass::Producer,
        }
    }
}
