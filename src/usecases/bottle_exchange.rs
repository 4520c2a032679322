//! Bottle Exchange - Throw, Catch, Reply and Greet
//!
//! Orchestrates the bottle domain with the store ports:
//! - Throwing a bottle (quota-checked, VIPs exempt)
//! - Catching a uniformly random eligible bottle with an atomic pick
//! - Replying to a caught bottle, optionally greeting its creator
//! - Listing a user's recent bottles and today's usage
//!
//! The exchange holds no session state. Its only inputs besides request
//! parameters are the ports and the live settings channel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ExchangeSettings;
use crate::domain::bottle::{
  normalize_content, Bottle, BottleId, BottleReply, BottleStatus, NewBottle, NewReply,
  PickTransition, UserId,
};
use crate::domain::conversation::ConversationId;
use crate::domain::error::ExchangeError;
use crate::domain::interaction::{CatchTicket, PostCatchAction};
use crate::domain::notification::Notification;
use crate::domain::quota::{day_key, DailyCounter, DailyUsage, QuotaKind};
use crate::domain::selection::pick_uniform;
use crate::ports::{
  BottleStore, Clock, ConversationDirectory, ExchangeTelemetry, NoopTelemetry, Notifier,
  ProfileDirectory, QuotaStore, ReplyStore, SystemClock,
};

/// Every collaborator the exchange talks to.
#[derive(Clone)]
pub struct ExchangePorts {
  pub bottles: Arc<dyn BottleStore>,
  pub replies: Arc<dyn ReplyStore>,
  pub quotas: Arc<dyn QuotaStore>,
  pub profiles: Arc<dyn ProfileDirectory>,
  pub conversations: Arc<dyn ConversationDirectory>,
  pub notifier: Arc<dyn Notifier>,
  pub telemetry: Arc<dyn ExchangeTelemetry>,
  pub clock: Arc<dyn Clock>,
}

impl ExchangePorts {
  /// Wire every store and directory port to one backend.
  ///
  /// Telemetry defaults to no-op and the clock to the system clock.
  pub fn from_backend<B>(backend: Arc<B>) -> Self
  where
    B: BottleStore + ReplyStore + QuotaStore + ProfileDirectory + ConversationDirectory + Notifier,
  {
    Self {
      bottles: backend.clone(),
      replies: backend.clone(),
      quotas: backend.clone(),
      profiles: backend.clone(),
      conversations: backend.clone(),
      notifier: backend,
      telemetry: Arc::new(NoopTelemetry),
      clock: Arc::new(SystemClock),
    }
  }

  #[must_use]
  pub fn with_telemetry(mut self, telemetry: Arc<dyn ExchangeTelemetry>) -> Self {
    self.telemetry = telemetry;
    self
  }

  #[must_use]
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  #[must_use]
  pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
    self.notifier = notifier;
    self
  }
}

/// A reply with its author's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyView {
  pub reply: BottleReply,
  pub author_name: String,
}

/// A bottle with its reply thread, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BottleDetail {
  pub bottle: Bottle,
  pub creator_name: String,
  /// Oldest first.
  pub replies: Vec<ReplyView>,
}

/// Result of a successful catch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaughtBottle {
  /// The bottle as it stands after this draw.
  pub detail: BottleDetail,
  /// Draw ordinal of this catch; replies written now carry it.
  pub pick_number: u32,
}

impl CaughtBottle {
  /// The handle a session keeps while the user decides what to do.
  pub fn ticket(&self) -> CatchTicket {
    CatchTicket {
      bottle_id: self.detail.bottle.id.clone(),
      creator_id: self.detail.bottle.creator_id.clone(),
      pick_number: self.pick_number,
    }
  }
}

/// Outcome of greeting a bottle's creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
  pub reply: Option<BottleReply>,
  pub conversation_id: ConversationId,
}

/// Where a post-catch action leaves the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatchResolution {
  /// Bottle went back to the sea, with or without a reply.
  BackToSea { reply: Option<BottleReply> },
  /// Control passes to the conversation with the creator.
  Handoff {
    reply: Option<BottleReply>,
    conversation_id: ConversationId,
  },
}

/// The bottle exchange engine.
pub struct BottleExchange {
  ports: ExchangePorts,
  settings: watch::Receiver<ExchangeSettings>,
}

impl BottleExchange {
  /// Create an exchange reading live settings from `settings`.
  pub fn new(ports: ExchangePorts, settings: watch::Receiver<ExchangeSettings>) -> Self {
    Self { ports, settings }
  }

  /// Create an exchange with fixed settings.
  pub fn with_settings(ports: ExchangePorts, settings: ExchangeSettings) -> Self {
    let (_tx, rx) = watch::channel(settings);
    Self::new(ports, rx)
  }

  /// Snapshot of the current settings.
  pub fn settings(&self) -> ExchangeSettings {
    self.settings.borrow().clone()
  }

  /// Throw a new bottle into the sea.
  ///
  /// # Errors
  /// `EmptyContent` for blank text, `QuotaExceeded` when a non-VIP user
  /// already threw today's allowance, `Store` on persistence failure.
  /// A non-VIP throw claims its quota unit before the insert and hands
  /// it back if the insert fails.
  #[instrument(skip(self, content), fields(user = %user_id, vip = is_vip))]
  pub async fn throw_bottle(
    &self,
    user_id: &UserId,
    content: &str,
    is_vip: bool,
  ) -> Result<Bottle, ExchangeError> {
    let content = normalize_content(content).ok_or(ExchangeError::EmptyContent)?;
    let settings = self.settings();
    let now = self.ports.clock.now();
    let day = day_key(now, settings.utc_offset);

    if !is_vip {
      self.reserve_quota(user_id, day, QuotaKind::Throw, &settings).await?;
    }

    let inserted = self
      .ports
      .bottles
      .insert_bottle(NewBottle {
        creator_id: user_id.clone(),
        content,
        max_picks: settings.max_picks,
        created_at: now,
      })
      .await;

    let bottle = match inserted {
      Ok(bottle) => bottle,
      Err(e) => {
        if !is_vip {
          self.release_quota(user_id, day, QuotaKind::Throw).await;
        }
        return Err(store_error("insert bottle", e));
      }
    };

    if is_vip {
      self.count_vip(user_id, day, QuotaKind::Throw).await?;
    }

    self.ports.telemetry.bottle_thrown();
    info!(bottle_id = %bottle.id, max_picks = bottle.max_picks, "Bottle thrown");

    Ok(bottle)
  }

  /// Catch one random eligible bottle.
  ///
  /// A non-VIP catch claims its quota unit before drawing and hands it
  /// back when nothing was caught, so only successful catches count.
  ///
  /// # Errors
  /// `QuotaExceeded`, `NothingToCatch` for an empty sea (no counter
  /// change), `CatchContended` when every attempt lost its pick race,
  /// `Store` on persistence failure.
  #[instrument(skip(self), fields(user = %user_id, vip = is_vip))]
  pub async fn catch_bottle(
    &self,
    user_id: &UserId,
    is_vip: bool,
  ) -> Result<CaughtBottle, ExchangeError> {
    let settings = self.settings();
    let day = day_key(self.ports.clock.now(), settings.utc_offset);

    if !is_vip {
      self.reserve_quota(user_id, day, QuotaKind::Catch, &settings).await?;
    }

    let picked = match self.draw(user_id, &settings).await {
      Ok(picked) => picked,
      Err(e) => {
        if !is_vip {
          self.release_quota(user_id, day, QuotaKind::Catch).await;
        }
        return Err(e);
      }
    };

    if is_vip {
      self.count_vip(user_id, day, QuotaKind::Catch).await?;
    }

    self.ports.telemetry.bottle_caught(picked.returned);

    if picked.returned {
      info!(bottle_id = %picked.bottle.id, "Bottle reached its draw ceiling and returned");
      if settings.notify_creators {
        self.notify(&Notification::bottle_returned(&picked.bottle)).await;
      }
    }

    let pick_number = picked.bottle.pick_count;
    let detail = self.enrich(picked.bottle, &settings).await?;

    info!(
      bottle_id = %detail.bottle.id,
      pick_number,
      replies = detail.replies.len(),
      "Bottle caught"
    );

    Ok(CaughtBottle {
      detail,
      pick_number,
    })
  }

  /// Attach a reply to a bottle at draw `pick_number`.
  ///
  /// Blank content is a no-op success: catching and throwing back
  /// without replying is a normal path. Never touches the bottle's
  /// lifecycle fields.
  #[instrument(skip(self, content), fields(bottle = %bottle_id, user = %user_id))]
  pub async fn reply_to_bottle(
    &self,
    bottle_id: &BottleId,
    user_id: &UserId,
    content: &str,
    pick_number: u32,
  ) -> Result<Option<BottleReply>, ExchangeError> {
    let Some(content) = normalize_content(content) else {
      debug!("Empty reply, nothing to write");
      return Ok(None);
    };
    let settings = self.settings();

    let bottle = self
      .ports
      .bottles
      .find_bottle(bottle_id)
      .await
      .map_err(|e| store_error("find bottle", e))?
      .ok_or_else(|| ExchangeError::BottleNotFound(bottle_id.clone()))?;

    let reply = self
      .ports
      .replies
      .insert_reply(NewReply {
        bottle_id: bottle_id.clone(),
        user_id: user_id.clone(),
        content,
        pick_number,
        created_at: self.ports.clock.now(),
      })
      .await
      .map_err(|e| store_error("insert reply", e))?;

    self.ports.telemetry.reply_written();

    if settings.notify_creators && bottle.creator_id != *user_id {
      self.notify(&Notification::bottle_reply(&bottle, &reply.content)).await;
    }

    Ok(Some(reply))
  }

  /// Reply, then find or create a conversation with `target_id`.
  ///
  /// # Errors
  /// `SelfGreetRejected` before any store call when the actor targets
  /// themself.
  #[instrument(skip(self, content), fields(actor = %actor_id, target = %target_id))]
  pub async fn reply_and_greet(
    &self,
    actor_id: &UserId,
    bottle_id: &BottleId,
    target_id: &UserId,
    content: &str,
    pick_number: u32,
  ) -> Result<Greeting, ExchangeError> {
    if actor_id == target_id {
      return Err(ExchangeError::SelfGreetRejected);
    }

    let reply = self
      .reply_to_bottle(bottle_id, actor_id, content, pick_number)
      .await?;

    let conversation_id = self
      .ports
      .conversations
      .find_or_create_conversation(actor_id, target_id)
      .await
      .map_err(|e| store_error("find or create conversation", e))?;

    self.ports.telemetry.creator_greeted();
    info!(conversation_id = %conversation_id, "Handing off to conversation");

    Ok(Greeting {
      reply,
      conversation_id,
    })
  }

  /// Apply one of the three post-catch actions to a held draw.
  pub async fn resolve_catch(
    &self,
    user_id: &UserId,
    ticket: &CatchTicket,
    action: PostCatchAction,
    reply_text: &str,
  ) -> Result<CatchResolution, ExchangeError> {
    match action {
      PostCatchAction::ThrowBack => Ok(CatchResolution::BackToSea { reply: None }),
      PostCatchAction::ReplyAndThrowBack => {
        let reply = self
          .reply_to_bottle(&ticket.bottle_id, user_id, reply_text, ticket.pick_number)
          .await?;
        Ok(CatchResolution::BackToSea { reply })
      }
      PostCatchAction::ReplyAndGreet => {
        let greeting = self
          .reply_and_greet(
            user_id,
            &ticket.bottle_id,
            &ticket.creator_id,
            reply_text,
            ticket.pick_number,
          )
          .await?;
        Ok(CatchResolution::Handoff {
          reply: greeting.reply,
          conversation_id: greeting.conversation_id,
        })
      }
    }
  }

  /// The user's own bottles from the trailing beach window, newest first.
  #[instrument(skip(self), fields(user = %user_id))]
  pub async fn list_my_bottles(&self, user_id: &UserId) -> Result<Vec<Bottle>, ExchangeError> {
    let settings = self.settings();
    let since = self.ports.clock.now() - settings.beach_window;

    let mut bottles = self
      .ports
      .bottles
      .list_by_creator_since(user_id, since)
      .await
      .map_err(|e| store_error("list own bottles", e))?;

    bottles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(bottles)
  }

  /// A bottle with its enriched reply thread.
  #[instrument(skip(self), fields(bottle = %bottle_id))]
  pub async fn bottle_detail(&self, bottle_id: &BottleId) -> Result<BottleDetail, ExchangeError> {
    let settings = self.settings();
    let bottle = self
      .ports
      .bottles
      .find_bottle(bottle_id)
      .await
      .map_err(|e| store_error("find bottle", e))?
      .ok_or_else(|| ExchangeError::BottleNotFound(bottle_id.clone()))?;

    self.enrich(bottle, &settings).await
  }

  /// Today's counters and remaining allowance.
  pub async fn daily_usage(&self, user_id: &UserId, is_vip: bool) -> Result<DailyUsage, ExchangeError> {
    let settings = self.settings();
    let day = day_key(self.ports.clock.now(), settings.utc_offset);
    let counter = self.counter_for(user_id, day).await?;
    Ok(DailyUsage::from_counter(&counter, &settings.quota, is_vip))
  }

  /// Number of bottles currently floating in the sea.
  pub async fn floating_count(&self) -> Result<u64, ExchangeError> {
    self
      .ports
      .bottles
      .count_floating()
      .await
      .map_err(|e| store_error("count floating bottles", e))
  }

  /// Claim one `kind` unit for a non-VIP user, or reject at the ceiling.
  ///
  /// The check and the increment are one conditional store update.
  async fn reserve_quota(
    &self,
    user_id: &UserId,
    day: NaiveDate,
    kind: QuotaKind,
    settings: &ExchangeSettings,
  ) -> Result<(), ExchangeError> {
    let limit = settings.quota.limit(kind);
    let claimed = self
      .ports
      .quotas
      .try_consume(user_id, day, kind, limit)
      .await
      .map_err(|e| store_error("claim daily quota", e))?;

    match claimed {
      Some(counter) => {
        debug!(%kind, used = counter.count(kind), limit, "Quota unit claimed");
        Ok(())
      }
      None => {
        self.ports.telemetry.quota_rejected(kind);
        info!(%kind, limit, "Daily quota reached");
        Err(ExchangeError::QuotaExceeded { kind, limit })
      }
    }
  }

  /// Hand back a claimed unit whose action did not happen.
  async fn release_quota(&self, user_id: &UserId, day: NaiveDate, kind: QuotaKind) {
    if let Err(e) = self.ports.quotas.release(user_id, day, kind).await {
      warn!(error = %e, %kind, "Failed to release unused quota unit");
    }
  }

  /// Record a VIP action; VIPs have no ceiling but are still counted.
  async fn count_vip(&self, user_id: &UserId, day: NaiveDate, kind: QuotaKind) -> Result<(), ExchangeError> {
    self
      .ports
      .quotas
      .increment_counter(user_id, day, kind)
      .await
      .map_err(|e| store_error("increment daily counter", e))?;
    Ok(())
  }

  async fn counter_for(&self, user_id: &UserId, day: NaiveDate) -> Result<DailyCounter, ExchangeError> {
    Ok(
      self
        .ports
        .quotas
        .get_counter(user_id, day)
        .await
        .map_err(|e| store_error("read daily counter", e))?
        .unwrap_or_else(|| DailyCounter::empty(user_id, day)),
    )
  }

  /// Select uniformly among eligible bottles and apply an atomic pick.
  ///
  /// A pick that loses to a concurrent catch re-queries the sea, up to
  /// `max_catch_attempts` times.
  async fn draw(
    &self,
    user_id: &UserId,
    settings: &ExchangeSettings,
  ) -> Result<PickTransition, ExchangeError> {
    for attempt in 1..=settings.max_catch_attempts {
      let eligible: Vec<Bottle> = self
        .ports
        .bottles
        .find_eligible(user_id)
        .await
        .map_err(|e| store_error("find eligible bottles", e))?
        .into_iter()
        .filter(|b| b.is_catchable_by(user_id))
        .collect();

      let chosen = {
        let mut rng = rand::rng();
        pick_uniform(&eligible, &mut rng)
      };
      let Some(chosen) = chosen else {
        self.ports.telemetry.empty_sea();
        debug!("Sea is empty");
        return Err(ExchangeError::NothingToCatch);
      };

      let now = self.ports.clock.now();
      let updated = self
        .ports
        .bottles
        .record_pick(&chosen.id, chosen.pick_count, now)
        .await
        .map_err(|e| store_error("record pick", e))?;

      match updated {
        Some(bottle) => {
          let returned = bottle.status == BottleStatus::Returned;
          return Ok(PickTransition { bottle, returned });
        }
        None => {
          self.ports.telemetry.pick_conflict();
          debug!(
            attempt,
            bottle_id = %chosen.id,
            pool = eligible.len(),
            "Pick lost a race, reselecting"
          );
        }
      }
    }

    warn!(
      attempts = settings.max_catch_attempts,
      "Every catch attempt lost its pick race"
    );
    Err(ExchangeError::CatchContended {
      attempts: settings.max_catch_attempts,
    })
  }

  /// Attach the reply thread and display names.
  ///
  /// Names come from one batch lookup; a failed lookup or a missing
  /// nickname falls back to the anonymous placeholder.
  async fn enrich(
    &self,
    bottle: Bottle,
    settings: &ExchangeSettings,
  ) -> Result<BottleDetail, ExchangeError> {
    let replies = self
      .ports
      .replies
      .replies_for(&bottle.id)
      .await
      .map_err(|e| store_error("load replies", e))?;

    let mut user_ids: Vec<UserId> = vec![bottle.creator_id.clone()];
    for reply in &replies {
      if !user_ids.contains(&reply.user_id) {
        user_ids.push(reply.user_id.clone());
      }
    }

    let names = match self.ports.profiles.display_names(&user_ids).await {
      Ok(names) => names,
      Err(e) => {
        warn!(error = %e, "Profile lookup failed, using placeholder names");
        HashMap::new()
      }
    };
    let name_of = |user_id: &str| {
      names
        .get(user_id)
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map_or_else(|| settings.anonymous_name.clone(), str::to_string)
    };

    let mut replies: Vec<ReplyView> = replies
      .into_iter()
      .map(|reply| ReplyView {
        author_name: name_of(&reply.user_id),
        reply,
      })
      .collect();
    replies.sort_by_key(|r| r.reply.created_at);

    Ok(BottleDetail {
      creator_name: name_of(&bottle.creator_id),
      bottle,
      replies,
    })
  }

  /// Record a notification; failures are logged, never surfaced.
  async fn notify(&self, notification: &Notification) {
    if let Err(e) = self.ports.notifier.notify(notification).await {
      warn!(
        error = %e,
        recipient = %notification.user_id,
        kind = ?notification.kind,
        "Failed to record notification"
      );
    }
  }
}

/// Log a port failure and wrap it for the caller.
fn store_error(op: &'static str, err: anyhow::Error) -> ExchangeError {
  error!(op, error = %format!("{err:#}"), "Store operation failed");
  ExchangeError::Store(err.context(op))
}
