use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::StreamExt;
use futures_util::stream::Fuse;

use crate::body::producer::BoxElementStream;
use crate::error::Error;

/// [`ByteSequence`](crate::ByteSequence) のイテレーター
///
/// 終端に達した後は常に `None` を返す。
pub struct SequenceIterator<T> {
    stream: Fuse<BoxElementStream<T>>,
}

impl<T> SequenceIterator<T> {
    pub(crate) fn new(stream: BoxElementStream<T>) -> Self {
        SequenceIterator {
            stream: stream.fuse(),
        }
    }

    /// 次の要素を取り出す
    ///
    /// 終端では `Ok(None)` を返す。
    pub async fn next(&mut self) -> Result<Option<T>, Error> {
        self.stream.next().await.transpose()
    }
}

impl<T> Stream for SequenceIterator<T> {
    type Item = Result<T, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().stream.poll_next_unpin(cx)
    }
}

impl<T> std::fmt::Debug for SequenceIterator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceIterator")
            .field("terminated", &self.stream.is_done())
            .finish()
    }
}
