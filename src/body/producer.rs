use std::pin::Pin;
use std::sync::Arc;

use futures_core::Stream;
use futures_util::{future, stream};

use crate::body::Element;
use crate::error::Error;

/// 要素を 1 つずつ返す型消去されたストリーム
pub type BoxElementStream<T> = Pin<Box<dyn Stream<Item = Result<T, Error>> + Send + 'static>>;

/// 要素の供給元
///
/// `open` を呼ぶたびに先頭から要素を返す新しいストリームを作成する。
/// 巻き戻せない供給元 (ネットワークの読み取りなど) は
/// [`ByteSequence::from_stream`](crate::ByteSequence::from_stream) を使う。
pub trait Producer<T>: Send + Sync + 'static {
    /// 先頭から要素を返すストリームを開く
    fn open(&self) -> BoxElementStream<T>;
}

impl<T, F> Producer<T> for F
where
    F: Fn() -> BoxElementStream<T> + Send + Sync + 'static,
{
    fn open(&self) -> BoxElementStream<T> {
        self()
    }
}

/// メモリ上の要素列
pub(crate) struct Buffered<T> {
    elements: Arc<[T]>,
}

impl<T> Buffered<T> {
    pub(crate) fn new(elements: Vec<T>) -> Self {
        Buffered {
            elements: elements.into(),
        }
    }
}

impl<T: Element + Clone> Producer<T> for Buffered<T> {
    fn open(&self) -> BoxElementStream<T> {
        let elements = Arc::clone(&self.elements);
        Box::pin(stream::iter(
            (0..elements.len()).map(move |i| Ok(elements[i].clone())),
        ))
    }
}

/// 空の要素列
pub(crate) struct Empty;

impl<T: Element> Producer<T> for Empty {
    fn open(&self) -> BoxElementStream<T> {
        Box::pin(stream::empty())
    }
}

/// 最初にエラーを 1 つ返して終わるストリーム
pub(crate) fn failed<T: Element>(error: Error) -> BoxElementStream<T> {
    Box::pin(stream::once(future::ready(Err(error))))
}
