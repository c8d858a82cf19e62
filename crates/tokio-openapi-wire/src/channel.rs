//! 外部チャネルから供給されるボディ
//!
//! ```rust
//! use shiguredo_openapi_wire::Length;
//! use tokio_openapi_wire::body_channel;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let (sender, body) = body_channel(4, Length::Unknown);
//! tokio::spawn(async move {
//!     sender.send("hello, ").await.unwrap();
//!     sender.send("world").await.unwrap();
//! });
//! assert_eq!(body.collect_string(64).await.unwrap(), "hello, world");
//! # });
//! ```

use bytes::Bytes;
use futures_util::stream;
use shiguredo_openapi_wire::{BoxError, ByteSequence, Length};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

type Item = std::result::Result<Bytes, shiguredo_openapi_wire::Error>;

/// ボディのチャンクを送る側
///
/// ドロップするとボディが終端に達する。
#[derive(Debug)]
pub struct BodySender {
    sender: mpsc::Sender<Item>,
}

impl BodySender {
    /// チャンクを送る
    ///
    /// 受信側が空きを作るまで待つ。ボディが破棄されている場合は
    /// [`Error::ChannelClosed`] を返す。
    pub async fn send(&self, chunk: impl Into<Bytes>) -> Result<()> {
        self.sender
            .send(Ok(chunk.into()))
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    /// ボディをエラーで終える
    ///
    /// 受信側にはプロデューサーエラーとして届く。
    pub async fn abort(self, error: impl Into<BoxError>) -> Result<()> {
        self.sender
            .send(Err(shiguredo_openapi_wire::Error::producer(error)))
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    /// 受信側が閉じられたかどうか
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// チャネルで供給される `single` のボディを作成
///
/// # Panics
///
/// `capacity` が 0 の場合
pub fn body_channel(capacity: usize, length: Length) -> (BodySender, ByteSequence<Bytes>) {
    let (sender, receiver) = mpsc::channel(capacity);
    let chunks = stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|item| (item, receiver))
    });
    (
        BodySender { sender },
        ByteSequence::from_stream(chunks, length),
    )
}
