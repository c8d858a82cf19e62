//! 遅延評価されるボディ
//!
//! ## 概要
//!
//! リクエスト/レスポンス/multipart パートのボディを表す [`ByteSequence`] を提供します。
//! 要素は利用者が要求したときに 1 つずつ供給元から取り出されます。
//!
//! - 反復回数: `single` は生涯で 1 つのイテレーターのみ、
//!   `multiple` はイテレーターごとに先頭から全要素を観測できる
//! - 長さ: 事前にわかっていれば `Length::Known`
//! - 収集: [`ByteSequence::collect_bytes`] は上限を超える前に失敗する
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_openapi_wire::ByteSequence;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let body = ByteSequence::from("hello");
//! let bytes = body.collect_bytes(1024).await.unwrap();
//! assert_eq!(&bytes[..], b"hello");
//!
//! // 上限を超えると失敗する
//! assert!(body.collect_bytes(3).await.is_err());
//! # });
//! ```

mod iterator;
mod producer;

use std::sync::{Arc, Mutex, PoisonError};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;
use tracing::debug;

use crate::error::Error;

pub use iterator::SequenceIterator;
pub use producer::{BoxElementStream, Producer};

pub(crate) use producer::failed;

/// シーケンスの要素
///
/// `size` は [`Length`] と収集上限の単位になる。
pub trait Element: Send + Sync + 'static {
    /// 要素の大きさ
    fn size(&self) -> usize {
        1
    }
}

impl Element for Bytes {
    fn size(&self) -> usize {
        self.len()
    }
}

/// シーケンスの長さ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Length {
    /// 不明
    #[default]
    Unknown,
    /// 既知 (要素の大きさの合計)
    Known(usize),
}

/// 反復回数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationBehavior {
    /// イテレーターは 1 つだけ作成できる
    Single,
    /// イテレーターは何度でも作成でき、それぞれが先頭から全要素を観測する
    Multiple,
}

enum Source<T> {
    Rewindable(Box<dyn Producer<T>>),
    Once(Mutex<Option<BoxElementStream<T>>>),
}

struct Shared<T> {
    source: Source<T>,
    length: Length,
    iteration_behavior: IterationBehavior,
    iterator_created: Mutex<bool>,
}

/// 遅延評価される要素列
///
/// クローンは同じ供給元を共有する。等価性は同一性で判定し、内容は比較しない。
pub struct ByteSequence<T = Bytes> {
    shared: Arc<Shared<T>>,
}

impl<T: Element> ByteSequence<T> {
    /// 空のシーケンスを作成
    pub fn empty() -> Self {
        Self::from_producer(producer::Empty, Length::Known(0), IterationBehavior::Multiple)
    }

    /// メモリ上の要素列からシーケンスを作成
    pub fn from_elements(elements: Vec<T>) -> Self
    where
        T: Clone,
    {
        let length = elements.iter().map(Element::size).sum();
        Self::from_producer(
            producer::Buffered::new(elements),
            Length::Known(length),
            IterationBehavior::Multiple,
        )
    }

    /// 巻き戻せないストリームからシーケンスを作成
    ///
    /// 反復回数は常に `single` になる。
    pub fn from_stream<S>(stream: S, length: Length) -> Self
    where
        S: Stream<Item = Result<T, Error>> + Send + 'static,
    {
        ByteSequence {
            shared: Arc::new(Shared {
                source: Source::Once(Mutex::new(Some(Box::pin(stream)))),
                length,
                iteration_behavior: IterationBehavior::Single,
                iterator_created: Mutex::new(false),
            }),
        }
    }

    /// 任意の供給元からシーケンスを作成
    ///
    /// 供給元が巻き戻せない場合は `IterationBehavior::Single` を指定すること。
    pub fn from_producer(
        producer: impl Producer<T>,
        length: Length,
        iteration_behavior: IterationBehavior,
    ) -> Self {
        ByteSequence {
            shared: Arc::new(Shared {
                source: Source::Rewindable(Box::new(producer)),
                length,
                iteration_behavior,
                iterator_created: Mutex::new(false),
            }),
        }
    }

    /// 長さを取得
    pub fn length(&self) -> Length {
        self.shared.length
    }

    /// 反復回数を取得
    pub fn iteration_behavior(&self) -> IterationBehavior {
        self.shared.iteration_behavior
    }

    /// イテレーターを作成
    ///
    /// `single` シーケンスで 2 回目以降に呼ぶと [`Error::AlreadyIterated`] を返す。
    pub fn make_iterator(&self) -> Result<SequenceIterator<T>, Error> {
        self.try_begin_iteration()?;
        let stream = match &self.shared.source {
            Source::Rewindable(producer) => producer.open(),
            Source::Once(cell) => cell
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
                .ok_or(Error::AlreadyIterated)?,
        };
        Ok(SequenceIterator::new(stream))
    }

    /// 全要素を収集
    ///
    /// 要素の大きさの合計が `limit` を超える場合は [`Error::TooLarge`] を返す。
    /// 長さが既知で `limit` を超えている場合は読み取りを行わずに失敗する。
    pub async fn collect(&self, limit: usize) -> Result<Vec<T>, Error> {
        self.check_known_length(limit)?;
        let mut iterator = self.make_iterator()?;
        let mut elements = Vec::new();
        let mut total = 0usize;
        while let Some(element) = iterator.next().await? {
            total = accumulate(total, element.size(), limit)?;
            elements.push(element);
        }
        Ok(elements)
    }

    /// 要素を変換したシーケンスを作成
    ///
    /// 変換は要素が取り出されたときに行われる。反復回数は元のシーケンスを引き継ぐ。
    pub fn map<U, F>(&self, f: F) -> ByteSequence<U>
    where
        U: Element,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.derive(Length::Unknown, move |iterator| {
            let f = Arc::clone(&f);
            Box::pin(iterator.map(move |element| element.map(|e| f(e))))
        })
    }

    /// このシーケンスを上流とするシーケンスを作成
    ///
    /// 派生シーケンスのイテレーターを作成するたびに上流のイテレーターを作成する。
    pub(crate) fn derive<U, F>(&self, length: Length, transform: F) -> ByteSequence<U>
    where
        U: Element,
        F: Fn(SequenceIterator<T>) -> BoxElementStream<U> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let producer = move || match upstream.make_iterator() {
            Ok(iterator) => transform(iterator),
            Err(e) => failed(e),
        };
        ByteSequence::from_producer(producer, length, self.iteration_behavior())
    }

    fn try_begin_iteration(&self) -> Result<(), Error> {
        let mut created = self
            .shared
            .iterator_created
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *created && self.shared.iteration_behavior == IterationBehavior::Single {
            debug!("second iterator requested on a single-iteration sequence");
            return Err(Error::AlreadyIterated);
        }
        *created = true;
        Ok(())
    }

    fn check_known_length(&self, limit: usize) -> Result<(), Error> {
        if let Length::Known(length) = self.shared.length {
            if length > limit {
                debug!(length, limit, "known length exceeds collect limit");
                return Err(Error::TooLarge { limit });
            }
        }
        Ok(())
    }
}

impl ByteSequence<Bytes> {
    /// 単一のバッファからシーケンスを作成
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let length = bytes.len();
        Self::from_producer(
            producer::Buffered::new(vec![bytes]),
            Length::Known(length),
            IterationBehavior::Multiple,
        )
    }

    /// 全バイトを 1 つのバッファに収集
    ///
    /// 合計が `limit` バイトを超える場合は [`Error::TooLarge`] を返す。
    pub async fn collect_bytes(&self, limit: usize) -> Result<Bytes, Error> {
        self.check_known_length(limit)?;
        let mut iterator = self.make_iterator()?;
        let capacity = match self.length() {
            Length::Known(length) => length,
            Length::Unknown => 0,
        };
        let mut buffer = BytesMut::with_capacity(capacity);
        while let Some(chunk) = iterator.next().await? {
            accumulate(buffer.len(), chunk.len(), limit)?;
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }

    /// 全バイトを UTF-8 文字列として収集
    pub async fn collect_string(&self, limit: usize) -> Result<String, Error> {
        let bytes = self.collect_bytes(limit).await?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidUtf8)
    }
}

fn accumulate(total: usize, size: usize, limit: usize) -> Result<usize, Error> {
    match total.checked_add(size) {
        Some(total) if total <= limit => Ok(total),
        _ => {
            debug!(limit, "collect limit exceeded while reading");
            Err(Error::TooLarge { limit })
        }
    }
}

impl<T> Clone for ByteSequence<T> {
    fn clone(&self) -> Self {
        ByteSequence {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> PartialEq for ByteSequence<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<T> Eq for ByteSequence<T> {}

impl<T> std::fmt::Debug for ByteSequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteSequence")
            .field("length", &self.shared.length)
            .field("iteration_behavior", &self.shared.iteration_behavior)
            .finish()
    }
}

impl Default for ByteSequence<Bytes> {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for ByteSequence<Bytes> {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for ByteSequence<Bytes> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&'static [u8]> for ByteSequence<Bytes> {
    fn from(bytes: &'static [u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&'static str> for ByteSequence<Bytes> {
    fn from(s: &'static str) -> Self {
        Self::from_bytes(s)
    }
}

impl From<String> for ByteSequence<Bytes> {
    fn from(s: String) -> Self {
        Self::from_bytes(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunks(parts: &[&'static str]) -> Vec<Bytes> {
        parts.iter().map(|p| Bytes::from_static(p.as_bytes())).collect()
    }

    fn single_from(parts: &[&'static str], length: Length) -> ByteSequence {
        let items: Vec<Result<Bytes, Error>> = chunks(parts).into_iter().map(Ok).collect();
        ByteSequence::from_stream(stream::iter(items), length)
    }

    #[tokio::test]
    async fn empty_sequence() {
        let body = ByteSequence::<Bytes>::empty();
        assert_eq!(body.length(), Length::Known(0));
        assert_eq!(body.iteration_behavior(), IterationBehavior::Multiple);
        assert!(body.collect_bytes(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn from_bytes_known_length() {
        let body = ByteSequence::from("hello");
        assert_eq!(body.length(), Length::Known(5));
        assert_eq!(body.iteration_behavior(), IterationBehavior::Multiple);
    }

    #[tokio::test]
    async fn from_elements_sums_length() {
        let body = ByteSequence::from_elements(chunks(&["ab", "cde", ""]));
        assert_eq!(body.length(), Length::Known(5));
        assert_eq!(&body.collect_bytes(5).await.unwrap()[..], b"abcde");
    }

    #[tokio::test]
    async fn multiple_iterators_observe_all_elements() {
        let body = ByteSequence::from_elements(chunks(&["a", "b", "c"]));
        let mut first = body.make_iterator().unwrap();
        let mut second = body.make_iterator().unwrap();

        assert_eq!(first.next().await.unwrap(), Some(Bytes::from("a")));
        assert_eq!(first.next().await.unwrap(), Some(Bytes::from("b")));

        // 2 つ目のイテレーターは先頭から観測する
        assert_eq!(second.next().await.unwrap(), Some(Bytes::from("a")));
        assert_eq!(second.next().await.unwrap(), Some(Bytes::from("b")));
        assert_eq!(second.next().await.unwrap(), Some(Bytes::from("c")));
        assert_eq!(second.next().await.unwrap(), None);

        assert_eq!(first.next().await.unwrap(), Some(Bytes::from("c")));
        assert_eq!(first.next().await.unwrap(), None);
        assert_eq!(first.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn single_rejects_second_iterator() {
        let body = single_from(&["a"], Length::Unknown);
        assert_eq!(body.iteration_behavior(), IterationBehavior::Single);

        let _first = body.make_iterator().unwrap();
        let second = body.make_iterator();
        assert!(matches!(second, Err(Error::AlreadyIterated)));

        // クローンも同じ供給元を共有する
        let clone = body.clone();
        assert!(matches!(clone.make_iterator(), Err(Error::AlreadyIterated)));
    }

    #[tokio::test]
    async fn single_producer_rejects_second_iterator() {
        let producer = || -> BoxElementStream<Bytes> {
            Box::pin(stream::iter(vec![Ok::<_, Error>(Bytes::from("x"))]))
        };
        let body = ByteSequence::from_producer(producer, Length::Unknown, IterationBehavior::Single);
        assert!(body.make_iterator().is_ok());
        assert!(matches!(body.make_iterator(), Err(Error::AlreadyIterated)));
    }

    #[tokio::test]
    async fn collect_rejects_consumed_single_sequence() {
        let body = single_from(&["abc"], Length::Unknown);
        assert_eq!(&body.collect_bytes(16).await.unwrap()[..], b"abc");
        assert!(matches!(
            body.collect_bytes(16).await,
            Err(Error::AlreadyIterated)
        ));
    }

    #[tokio::test]
    async fn collect_exact_limit() {
        let body = single_from(&["abc", "def"], Length::Unknown);
        assert_eq!(&body.collect_bytes(6).await.unwrap()[..], b"abcdef");
    }

    #[tokio::test]
    async fn collect_over_limit_while_reading() {
        let body = single_from(&["abc", "def"], Length::Unknown);
        assert!(matches!(
            body.collect_bytes(5).await,
            Err(Error::TooLarge { limit: 5 })
        ));
    }

    #[tokio::test]
    async fn collect_known_length_rejects_without_reading() {
        let body = single_from(&["abcdef"], Length::Known(6));
        assert!(matches!(
            body.collect_bytes(5).await,
            Err(Error::TooLarge { limit: 5 })
        ));
        // 読み取りを行っていないのでイテレーターはまだ作成できる
        assert!(body.make_iterator().is_ok());
    }

    #[tokio::test]
    async fn collect_elements_counts_sizes() {
        let body = ByteSequence::from_elements(chunks(&["ab", "cd"]));
        assert_eq!(body.collect(4).await.unwrap().len(), 2);
        assert!(matches!(body.collect(3).await, Err(Error::TooLarge { limit: 3 })));
    }

    #[tokio::test]
    async fn collect_string_rejects_invalid_utf8() {
        let body = ByteSequence::from(vec![0xFF, 0xFE]);
        assert!(matches!(
            body.collect_string(16).await,
            Err(Error::InvalidUtf8)
        ));
        let body = ByteSequence::from("日本語");
        assert_eq!(body.collect_string(16).await.unwrap(), "日本語");
    }

    #[tokio::test]
    async fn producer_error_is_forwarded() {
        let items: Vec<Result<Bytes, Error>> = vec![
            Ok(Bytes::from("a")),
            Err(Error::producer(std::io::Error::other("reset"))),
        ];
        let body = ByteSequence::from_stream(stream::iter(items), Length::Unknown);
        assert!(matches!(
            body.collect_bytes(16).await,
            Err(Error::Producer(_))
        ));
    }

    #[tokio::test]
    async fn map_is_lazy_and_inherits_behavior() {
        let body = ByteSequence::from_elements(chunks(&["a", "bb"]));
        let lengths = body.map(|chunk| Bytes::from(chunk.len().to_string()));
        assert_eq!(lengths.iteration_behavior(), IterationBehavior::Multiple);
        assert_eq!(&lengths.collect_bytes(8).await.unwrap()[..], b"12");
        assert_eq!(&lengths.collect_bytes(8).await.unwrap()[..], b"12");
    }

    #[test]
    fn identity_equality() {
        let a = ByteSequence::from("same");
        let b = ByteSequence::from("same");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
