//! AsyncRead から読み取るボディ

use bytes::{Bytes, BytesMut};
use futures_util::stream;
use shiguredo_openapi_wire::{ByteSequence, Length};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

struct ReadLoop<R> {
    reader: R,
    chunk_size: usize,
    /// 長さが既知の場合の残りバイト数
    remaining: Option<u64>,
}

impl<R: AsyncRead + Unpin> ReadLoop<R> {
    async fn next_chunk(&mut self) -> Option<Result<Bytes, shiguredo_openapi_wire::Error>> {
        let limit = match self.remaining {
            Some(0) => return None,
            Some(remaining) => remaining.min(self.chunk_size as u64),
            None => self.chunk_size as u64,
        };

        let mut buffer = BytesMut::with_capacity(limit as usize);
        let result = (&mut self.reader).take(limit).read_buf(&mut buffer).await;
        match result {
            Ok(0) if self.remaining.is_some() => {
                debug!(remaining = ?self.remaining, "body reader ended before declared length");
                self.remaining = Some(0);
                Some(Err(shiguredo_openapi_wire::Error::producer(
                    std::io::Error::from(std::io::ErrorKind::UnexpectedEof),
                )))
            }
            Ok(0) => None,
            Ok(n) => {
                if let Some(remaining) = &mut self.remaining {
                    *remaining -= n as u64;
                }
                Some(Ok(buffer.freeze()))
            }
            Err(e) => {
                debug!(error = %e, "body read failed");
                self.remaining = Some(0);
                Some(Err(shiguredo_openapi_wire::Error::producer(e)))
            }
        }
    }
}

/// リーダーから `chunk_size` バイトずつ読み取る `single` のボディを作成
///
/// 長さが既知の場合はそのバイト数だけ読み取り、それより前に終端に達するとエラーになる。
///
/// # Panics
///
/// `chunk_size` が 0 の場合
pub fn read_body<R>(reader: R, chunk_size: usize, length: Length) -> ByteSequence<Bytes>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    assert!(chunk_size > 0, "chunk_size must be greater than zero");
    let read_loop = ReadLoop {
        reader,
        chunk_size,
        remaining: match length {
            Length::Known(n) => Some(n as u64),
            Length::Unknown => None,
        },
    };
    let chunks = stream::unfold(read_loop, |mut read_loop| async move {
        let chunk = read_loop.next_chunk().await?;
        Some((chunk, read_loop))
    });
    ByteSequence::from_stream(chunks, length)
}
