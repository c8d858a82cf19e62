use bytes::Bytes;
use futures_util::stream;

use crate::body::{BoxElementStream, ByteSequence, Length, SequenceIterator};
use crate::error::Error;
use crate::multipart::{MultipartChunk, MultipartPart};

/// パート列をチャンク列に変換する
///
/// 各パートについてヘッダーを 1 つ出力し、続けてボディのチャンクを出力する。
/// ボディを読み終えてから次のパートを上流に要求する。
pub fn recompose(parts: &ByteSequence<MultipartPart>) -> ByteSequence<MultipartChunk> {
    parts.derive(Length::Unknown, |upstream| chunk_stream(Recomposer::new(upstream)))
}

struct Recomposer {
    parts: SequenceIterator<MultipartPart>,
    body: Option<SequenceIterator<Bytes>>,
}

impl Recomposer {
    fn new(parts: SequenceIterator<MultipartPart>) -> Self {
        Recomposer { parts, body: None }
    }

    async fn next_chunk(&mut self) -> Result<Option<MultipartChunk>, Error> {
        if let Some(body) = &mut self.body {
            if let Some(chunk) = body.next().await? {
                return Ok(Some(MultipartChunk::BodyChunk(chunk)));
            }
            self.body = None;
        }

        let Some(part) = self.parts.next().await? else {
            return Ok(None);
        };
        self.body = Some(part.body.make_iterator()?);
        Ok(Some(MultipartChunk::HeaderFields(part.header_fields)))
    }
}

fn chunk_stream(recomposer: Recomposer) -> BoxElementStream<MultipartChunk> {
    Box::pin(stream::unfold(Some(recomposer), |recomposer| async move {
        let mut recomposer = recomposer?;
        match recomposer.next_chunk().await {
            Ok(Some(chunk)) => Some((Ok(chunk), Some(recomposer))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    }))
}
