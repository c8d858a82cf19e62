use std::sync::Arc;

use bytes::Bytes;
use futures_util::lock::Mutex;
use futures_util::stream;
use tracing::{debug, trace};

use crate::body::{BoxElementStream, ByteSequence, Length, SequenceIterator};
use crate::error::{Error, ErrorClass};
use crate::header_fields::HeaderFields;
use crate::multipart::{MultipartChunk, MultipartError, MultipartPart};

/// チャンク列をパート列に変換する
///
/// パート列のイテレーターを作成するたびに上流のイテレーターを 1 つ作成する。
/// 反復回数は上流を引き継ぐ。各パートのボディは `single` になる。
pub fn decompose(chunks: &ByteSequence<MultipartChunk>) -> ByteSequence<MultipartPart> {
    chunks.derive(Length::Unknown, |upstream| {
        part_stream(Arc::new(Mutex::new(Decomposer::new(upstream))))
    })
}

#[derive(Debug)]
enum State {
    Initial,
    /// ボディの終端として受信したヘッダーを保持する
    WaitingForHeaders(HeaderFields),
    StreamingBody,
    PartFinished,
    Finished,
}

/// 上流のイテレーターを所有する唯一の状態機械
///
/// パート列とボディの 2 つのビューはどちらもこの状態機械を経由して上流から読む。
struct Decomposer {
    upstream: SequenceIterator<MultipartChunk>,
    state: State,
    /// これまでに出力したパート数
    emitted: usize,
}

impl Decomposer {
    fn new(upstream: SequenceIterator<MultipartChunk>) -> Self {
        Decomposer {
            upstream,
            state: State::Initial,
            emitted: 0,
        }
    }

    fn current_part(&self) -> usize {
        self.emitted.saturating_sub(1)
    }

    async fn next_part(&mut self) -> Result<Option<(HeaderFields, usize)>, Error> {
        match std::mem::replace(&mut self.state, State::Finished) {
            State::WaitingForHeaders(header_fields) => return Ok(Some(self.emit(header_fields))),
            State::StreamingBody => {
                self.state = State::StreamingBody;
                let part = self.current_part();
                debug!(part, "next multipart part requested before body was drained");
                return Err(MultipartError::PartRequestedBeforeBodyFinished { part }.into());
            }
            State::Finished => return Ok(None),
            state @ (State::Initial | State::PartFinished) => self.state = state,
        }

        match self.upstream.next().await {
            Ok(Some(MultipartChunk::HeaderFields(header_fields))) => {
                Ok(Some(self.emit(header_fields)))
            }
            Ok(Some(MultipartChunk::BodyChunk(_))) => {
                self.state = State::Finished;
                debug!("multipart body chunk received without preceding headers");
                Err(MultipartError::ReceivedBodyChunkWhenWaitingForHeaders.into())
            }
            Ok(None) => {
                trace!(parts = self.emitted, "multipart stream finished");
                self.state = State::Finished;
                Ok(None)
            }
            Err(e) => {
                self.state = State::Finished;
                Err(e)
            }
        }
    }

    async fn next_body_chunk(&mut self, part: usize) -> Result<Option<Bytes>, Error> {
        if part + 1 != self.emitted || !matches!(self.state, State::StreamingBody) {
            debug!(part, current = self.current_part(), "multipart body read out of order");
            return Err(MultipartError::BodyRequestedOutOfOrder { part }.into());
        }

        match self.upstream.next().await {
            Ok(Some(MultipartChunk::BodyChunk(chunk))) => Ok(Some(chunk)),
            Ok(Some(MultipartChunk::HeaderFields(header_fields))) => {
                trace!(part, "multipart part body finished by next headers");
                self.state = State::WaitingForHeaders(header_fields);
                Ok(None)
            }
            Ok(None) => {
                trace!(part, "multipart part body finished by end of stream");
                self.state = State::PartFinished;
                Ok(None)
            }
            Err(e) => {
                self.state = State::Finished;
                Err(e)
            }
        }
    }

    fn emit(&mut self, header_fields: HeaderFields) -> (HeaderFields, usize) {
        let part = self.emitted;
        self.emitted += 1;
        self.state = State::StreamingBody;
        trace!(part, "multipart part headers emitted");
        (header_fields, part)
    }
}

type Shared = Arc<Mutex<Decomposer>>;

/// 呼び出し側の誤用はストリームを終了させず、再試行を許す
fn keep_after(error: &Error, shared: Shared) -> Option<Shared> {
    (error.class() == ErrorClass::ContractViolation).then_some(shared)
}

fn part_stream(shared: Shared) -> BoxElementStream<MultipartPart> {
    Box::pin(stream::unfold(Some(shared), |shared| async move {
        let shared = shared?;
        let result = {
            let mut decomposer = shared.lock().await;
            decomposer.next_part().await
        };
        match result {
            Ok(Some((header_fields, part))) => {
                let body = body_sequence(Arc::clone(&shared), part);
                Some((Ok(MultipartPart { header_fields, body }), Some(shared)))
            }
            Ok(None) => None,
            Err(e) => {
                let next = keep_after(&e, shared);
                Some((Err(e), next))
            }
        }
    }))
}

fn body_sequence(shared: Shared, part: usize) -> ByteSequence<Bytes> {
    let chunks = stream::unfold(Some(shared), move |shared| async move {
        let shared = shared?;
        let result = {
            let mut decomposer = shared.lock().await;
            decomposer.next_body_chunk(part).await
        };
        match result {
            Ok(Some(chunk)) => Some((Ok(chunk), Some(shared))),
            Ok(None) => None,
            Err(e) => {
                let next = keep_after(&e, shared);
                Some((Err(e), next))
            }
        }
    });
    ByteSequence::from_stream(chunks, Length::Unknown)
}
