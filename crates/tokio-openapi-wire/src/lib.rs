//! tokio_openapi_wire - Tokio integration for shiguredo_openapi_wire
//!
//! tokio の非同期 I/O と [`ByteSequence`](shiguredo_openapi_wire::ByteSequence) をつなぐライブラリ。
//!
//! ## Features
//!
//! - `channel` - 外部チャネルから供給されるボディ (デフォルト有効)
//! - `io` - `AsyncRead` / `AsyncWrite` とボディの相互変換 (デフォルト有効)
//! - `full` - すべての機能を有効化
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_openapi_wire::Length;
//! use tokio_openapi_wire::{read_body, write_body};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! // ネットワークからの読み取りを single のボディとして扱う
//! let body = read_body(&b"payload"[..], 8192, Length::Known(7));
//!
//! let mut out = Vec::new();
//! let written = write_body(&body, &mut out).await.unwrap();
//! assert_eq!(written, 7);
//! assert_eq!(out, b"payload");
//! # });
//! ```

#[cfg(feature = "channel")]
pub mod channel;
pub mod error;
#[cfg(feature = "io")]
pub mod read;
#[cfg(feature = "io")]
pub mod write;

#[cfg(feature = "channel")]
pub use channel::{BodySender, body_channel};
pub use error::{Error, Result};
#[cfg(feature = "io")]
pub use read::read_body;
#[cfg(feature = "io")]
pub use write::write_body;
