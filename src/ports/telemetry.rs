//! Telemetry Port - Exchange Activity Counters
//!
//! Synchronous hooks the exchange calls on every outcome. The Prometheus
//! adapter implements this; tests and embedded uses take `NoopTelemetry`.

use crate::domain::quota::QuotaKind;

pub trait ExchangeTelemetry: Send + Sync + 'static {
  /// A bottle was thrown into the sea.
  fn bottle_thrown(&self);

  /// A bottle was caught; `returned` if this was its final draw.
  fn bottle_caught(&self, returned: bool);

  /// A catch found an empty sea.
  fn empty_sea(&self);

  /// An action was refused by the daily quota.
  fn quota_rejected(&self, kind: QuotaKind);

  /// A conditional pick lost to a concurrent catch.
  fn pick_conflict(&self);

  /// A reply was attached to a bottle.
  fn reply_written(&self);

  /// A catcher greeted a bottle's creator.
  fn creator_greeted(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl ExchangeTelemetry for NoopTelemetry {
  fn bottle_thrown(&self) {}
  fn bottle_caught(&self, _returned: bool) {}
  fn empty_sea(&self) {}
  fn quota_rejected(&self, _kind: QuotaKind) {}
  fn pick_conflict(&self) {}
  fn reply_written(&self) {}
  fn creator_greeted(&self) {}
}
