//! Daily throw/catch quotas.
//!
//! Counters are keyed by `(user_id, date)`; one row per user per
//! calendar day, created lazily on the first action of the day.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::bottle::UserId;

/// Which daily allowance an action draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaKind {
    Throw,
    Catch,
}

impl QuotaKind {
    /// Column name of this counter in the `bottle_daily_limits` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Throw => "throws",
            Self::Catch => "catches",
        }
    }
}

impl std::fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Throw => write!(f, "throw"),
            Self::Catch => write!(f, "catch"),
        }
    }
}

/// Per-user, per-day action counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounter {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub throws: u32,
    pub catches: u32,
}

impl DailyCounter {
    /// A zeroed counter, used when no row exists yet for the day.
    pub fn empty(user_id: &str, date: NaiveDate) -> Self {
        Self {
            user_id: user_id.to_string(),
            date,
            throws: 0,
            catches: 0,
        }
    }

    pub fn count(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Throw => self.throws,
            QuotaKind::Catch => self.catches,
        }
    }

    /// Bump one counter by one.
    pub fn bump(&mut self, kind: QuotaKind) {
        match kind {
            QuotaKind::Throw => self.throws += 1,
            QuotaKind::Catch => self.catches += 1,
        }
    }

    /// Take one back from a counter, stopping at zero.
    pub fn unbump(&mut self, kind: QuotaKind) {
        match kind {
            QuotaKind::Throw => self.throws = self.throws.saturating_sub(1),
            QuotaKind::Catch => self.catches = self.catches.saturating_sub(1),
        }
    }
}

/// Configured daily ceilings for non-VIP users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub daily_throw_limit: u32,
    pub daily_catch_limit: u32,
}

impl QuotaPolicy {
    pub fn limit(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Throw => self.daily_throw_limit,
            QuotaKind::Catch => self.daily_catch_limit,
        }
    }

    /// Remaining allowance, or `None` when unlimited.
    pub fn remaining(&self, counter: &DailyCounter, kind: QuotaKind, is_vip: bool) -> Option<u32> {
        if is_vip {
            None
        } else {
            Some(self.limit(kind).saturating_sub(counter.count(kind)))
        }
    }
}

/// Snapshot of today's usage as shown next to the throw/catch buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub throws: u32,
    pub catches: u32,
    /// `None` for VIPs.
    pub throws_remaining: Option<u32>,
    /// `None` for VIPs.
    pub catches_remaining: Option<u32>,
}

impl DailyUsage {
    pub fn from_counter(counter: &DailyCounter, policy: &QuotaPolicy, is_vip: bool) -> Self {
        Self {
            date: counter.date,
            throws: counter.throws,
            catches: counter.catches,
            throws_remaining: policy.remaining(counter, QuotaKind::Throw, is_vip),
            catches_remaining: policy.remaining(counter, QuotaKind::Catch, is_vip),
        }
    }
}

/// Calendar day of `instant` at the service's UTC offset.
pub fn day_key(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}
