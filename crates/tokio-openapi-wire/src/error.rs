//! tokio-openapi-wire エラー型

use std::fmt;

/// tokio-openapi-wire エラー
#[derive(Debug)]
pub enum Error {
    /// I/O エラー
    Io(std::io::Error),
    /// シーケンスのエラー
    Wire(shiguredo_openapi_wire::Error),
    /// 受信側が閉じられた
    ChannelClosed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Wire(e) => write!(f, "wire error: {}", e),
            Error::ChannelClosed => write!(f, "body channel closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Wire(e) => Some(e),
            Error::ChannelClosed => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<shiguredo_openapi_wire::Error> for Error {
    fn from(e: shiguredo_openapi_wire::Error) -> Self {
        Error::Wire(e)
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
