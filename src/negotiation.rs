//! コンテントネゴシエーション
//!
//! ## 概要
//!
//! 受信した MIME タイプと、オペレーションが宣言した MIME タイプの一覧を照合します。
//!
//! - [`best_content_type`]: 互換な候補のうち最も具体的なものを選ぶ
//! - [`is_matching_content_type`]: 受信した具体的な MIME タイプが 1 つのパターンに一致するか
//!
//! 具体性は `type/subtype` > `type/*` > `*/*` の順で、
//! `type/subtype` 同士では一致したパラメータの数が多いほど具体的です。
//! 同じ具体性の候補は一覧で先にあるものを選びます。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_openapi_wire::mime::MimeType;
//! use shiguredo_openapi_wire::negotiation::best_content_type;
//!
//! let received = MimeType::parse("application/json; charset=utf-8").unwrap();
//! let options = ["*/*", "application/*", "application/json"];
//! assert_eq!(best_content_type(Some(&received), &options).unwrap(), "application/json");
//!
//! // 受信していない場合は先頭の候補
//! assert_eq!(best_content_type(None, &options).unwrap(), "*/*");
//! ```

use tracing::debug;

use crate::mime::{MimeKind, MimeType};

/// ネゴシエーションエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    /// 候補が空
    #[error("no content type options")]
    NoOptions,
    /// 候補の MIME タイプが不正
    #[error("invalid content type option: {option:?}")]
    InvalidOption { option: String },
    /// 互換な候補が無い
    #[error("unexpected content type: {received:?}")]
    UnexpectedContentType { received: String },
}

/// 候補の具体性
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Specificity {
    /// `*/*`
    Wildcard,
    /// `type/*`
    SubtypeWildcard,
    /// `type/subtype`
    Concrete { matched_parameters: usize },
}

/// 候補を受信した MIME タイプと照合する
///
/// 互換でない場合は `None` を返す。
/// 候補のパラメータは、受信側が具体的な場合にすべて一致しなければならない。
pub fn evaluate(option: &MimeType, received: &MimeType) -> Option<Specificity> {
    match (option.kind(), received.kind()) {
        (MimeKind::Any, _) => Some(Specificity::Wildcard),
        (MimeKind::AnySubtype(_), MimeKind::Any) => Some(Specificity::SubtypeWildcard),
        (MimeKind::AnySubtype(option_type), _) => {
            (received.media_type() == Some(option_type.as_str()))
                .then_some(Specificity::SubtypeWildcard)
        }
        (MimeKind::Concrete { .. }, MimeKind::Any) => {
            Some(Specificity::Concrete {
                matched_parameters: 0,
            })
        }
        (MimeKind::Concrete { media_type, .. }, MimeKind::AnySubtype(received_type)) => {
            (media_type == received_type).then_some(Specificity::Concrete {
                matched_parameters: 0,
            })
        }
        (
            MimeKind::Concrete {
                media_type,
                subtype,
            },
            MimeKind::Concrete {
                media_type: received_type,
                subtype: received_subtype,
            },
        ) => {
            if media_type != received_type || subtype != received_subtype {
                return None;
            }
            let all_match = option
                .parameters()
                .all(|(name, value)| received.parameter(name) == Some(value));
            all_match.then_some(Specificity::Concrete {
                matched_parameters: option.parameter_count(),
            })
        }
    }
}

/// 最も具体的な互換候補を選ぶ
///
/// `received` が `None` の場合は `options` の先頭を返す。
/// 同じ具体性の候補は `options` で先にあるものを返す。
pub fn best_content_type<'a>(
    received: Option<&MimeType>,
    options: &[&'a str],
) -> Result<&'a str, NegotiationError> {
    let Some(first) = options.first() else {
        return Err(NegotiationError::NoOptions);
    };
    let Some(received) = received else {
        return Ok(*first);
    };

    let mut best: Option<(&'a str, Specificity)> = None;
    for &option in options {
        let parsed = MimeType::parse(option).ok_or_else(|| {
            debug!(option = %option, "invalid content type option");
            NegotiationError::InvalidOption {
                option: option.to_string(),
            }
        })?;
        let Some(specificity) = evaluate(&parsed, received) else {
            continue;
        };
        if best.is_none_or(|(_, current)| specificity > current) {
            best = Some((option, specificity));
        }
    }

    best.map(|(option, _)| option).ok_or_else(|| {
        debug!(received = %received, "no compatible content type option");
        NegotiationError::UnexpectedContentType {
            received: received.to_string(),
        }
    })
}

/// 受信した MIME タイプがパターンに一致するか
///
/// パターン側のみワイルドカードを含められる。
/// 受信していない場合や受信側がワイルドカードの場合は `false` を返す。
pub fn is_matching_content_type(
    received: Option<&MimeType>,
    expected: &str,
) -> Result<bool, NegotiationError> {
    let pattern = MimeType::parse(expected).ok_or_else(|| NegotiationError::InvalidOption {
        option: expected.to_string(),
    })?;
    let Some(MimeKind::Concrete {
        media_type,
        subtype,
    }) = received.map(MimeType::kind)
    else {
        return Ok(false);
    };

    Ok(match pattern.kind() {
        MimeKind::Any => true,
        MimeKind::AnySubtype(pattern_type) => pattern_type == media_type,
        MimeKind::Concrete {
            media_type: pattern_type,
            subtype: pattern_subtype,
        } => pattern_type == media_type && pattern_subtype == subtype,
    })
}
