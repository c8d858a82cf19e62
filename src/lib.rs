//! # shiguredo_openapi_wire
//!
//! OpenAPI クライアント/サーバーランタイム向けのワイヤーフォーマットコーデックとストリーミングエンジン
//!
//! ## 特徴
//!
//! - **フレームワーク非依存**: 特定の Web フレームワークや非同期ランタイムに依存しない
//! - **遅延ストリーミング**: ボディは要求されたときに 1 要素ずつ取り出す
//! - **上限付き収集**: メモリへの収集は呼び出し側が指定した上限を超えない
//!
//! ## 構成
//!
//! - [`body`]: 遅延評価されるバイト列/要素列 [`ByteSequence`]
//! - [`multipart`]: multipart チャンク列とパート列の相互変換
//! - [`uri`]: RFC 6570 form / simple 展開によるパラメータのシリアライズ
//! - [`mime`], [`accept`], [`negotiation`]: MIME タイプのパースとコンテントネゴシエーション
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_openapi_wire::mime::MimeType;
//! use shiguredo_openapi_wire::negotiation::best_content_type;
//! use shiguredo_openapi_wire::uri::{SerializerConfiguration, UriNode, UriSerializer};
//!
//! // クエリパラメータをシリアライズ
//! let mut serializer = UriSerializer::new(SerializerConfiguration::FORM_EXPLODE);
//! let node = UriNode::array(["red", "green", "blue"]);
//! assert_eq!(
//!     serializer.serialize(&node, "list").unwrap(),
//!     "list=red&list=green&list=blue"
//! );
//!
//! // 受信した Content-Type に最も合う宣言済みコンテントタイプを選ぶ
//! let received = MimeType::parse("application/json; charset=utf-8").unwrap();
//! let best = best_content_type(Some(&received), &["*/*", "application/json"]).unwrap();
//! assert_eq!(best, "application/json");
//! ```

pub mod accept;
pub mod body;
pub mod content_disposition;
mod error;
pub mod header_fields;
pub mod mime;
pub mod multipart;
pub mod negotiation;
mod syntax;
pub mod uri;

pub use body::{ByteSequence, Element, IterationBehavior, Length, Producer, SequenceIterator};
pub use error::{BoxError, Error, ErrorClass};
pub use header_fields::HeaderFields;
