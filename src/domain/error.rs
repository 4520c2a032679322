//! Error taxonomy of the bottle exchange.
//!
//! Every variant is recoverable: the caller shows a message and the
//! session carries on. Infrastructure failures are wrapped in `Store`.

use super::bottle::BottleId;
use super::quota::QuotaKind;

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// Non-VIP user reached today's ceiling for `kind`.
    #[error("daily {kind} limit of {limit} reached")]
    QuotaExceeded { kind: QuotaKind, limit: u32 },

    /// The sea holds no bottle this user may catch.
    #[error("no bottle available to catch")]
    NothingToCatch,

    /// A user tried to greet themself.
    #[error("cannot greet yourself")]
    SelfGreetRejected,

    /// Thrown bottle had no content after trimming.
    #[error("bottle content is empty")]
    EmptyContent,

    #[error("bottle not found: {0}")]
    BottleNotFound(BottleId),

    /// Every selected bottle was taken by a concurrent catch.
    #[error("catch lost the race {attempts} times in a row")]
    CatchContended { attempts: u32 },

    /// The interaction view does not permit this action.
    #[error("action `{action}` is not allowed from view `{from}`")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    /// Persistence or network failure reported by a port.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ExchangeError {
    /// Empty-sea outcomes are shown as information, not as a failure banner.
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::NothingToCatch)
    }

    /// Message shown to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::QuotaExceeded {
                kind: QuotaKind::Throw,
                ..
            } => "今天已扔满，开通VIP可无限".to_string(),
            Self::QuotaExceeded {
                kind: QuotaKind::Catch,
                ..
            } => "今天已捞满，开通VIP可无限".to_string(),
            Self::NothingToCatch => "大海空空的，没有捞到瓶子~".to_string(),
            Self::SelfGreetRejected => "不能和自己打招呼".to_string(),
            Self::EmptyContent => "写点什么再扔吧".to_string(),
            Self::BottleNotFound(_) => "瓶子已经找不到了".to_string(),
            Self::CatchContended { .. } => "瓶子被别人抢先捞走了，再试一次吧".to_string(),
            Self::InvalidTransition { .. } | Self::Store(_) => "操作失败，请稍后再试".to_string(),
        }
    }
}
