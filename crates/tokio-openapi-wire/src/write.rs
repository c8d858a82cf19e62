//! ボディを AsyncWrite に書き出す

use bytes::Bytes;
use shiguredo_openapi_wire::ByteSequence;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;

/// ボディを読み出してすべて書き込む
///
/// 書き込んだバイト数を返す。
pub async fn write_body<W>(body: &ByteSequence<Bytes>, writer: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut iterator = body.make_iterator()?;
    let mut written = 0u64;
    while let Some(chunk) = iterator.next().await? {
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;
    Ok(written)
}
