//! Bottle Session - Per-user Cache and Interaction State
//!
//! One session per signed-in user. Holds the cached beach (own recent
//! bottles), today's usage and the interaction view, and routes every
//! action through the shared `BottleExchange`. Nothing here is global;
//! dropping the session drops its state.

use std::sync::Arc;

use futures_util::future::try_join;
use tracing::{debug, instrument, warn};

use crate::domain::bottle::{Bottle, UserId};
use crate::domain::error::ExchangeError;
use crate::domain::interaction::{Interaction, PostCatchAction, View};
use crate::domain::quota::DailyUsage;

use super::bottle_exchange::{BottleExchange, CatchResolution, CaughtBottle};

pub struct BottleSession {
  exchange: Arc<BottleExchange>,
  user_id: UserId,
  is_vip: bool,
  /// Own bottles from the beach window, newest first.
  my_bottles: Vec<Bottle>,
  /// Today's counters, refreshed after every throw and catch.
  usage: Option<DailyUsage>,
  loaded: bool,
  interaction: Interaction,
  /// The last bottle caught, kept while the catch-result view is open.
  current_catch: Option<CaughtBottle>,
}

impl BottleSession {
  pub fn new(exchange: Arc<BottleExchange>, user_id: impl Into<UserId>, is_vip: bool) -> Self {
    Self {
      exchange,
      user_id: user_id.into(),
      is_vip,
      my_bottles: Vec::new(),
      usage: None,
      loaded: false,
      interaction: Interaction::new(),
      current_catch: None,
    }
  }

  pub fn user_id(&self) -> &UserId {
    &self.user_id
  }

  pub fn is_vip(&self) -> bool {
    self.is_vip
  }

  pub fn is_loaded(&self) -> bool {
    self.loaded
  }

  pub fn my_bottles(&self) -> &[Bottle] {
    &self.my_bottles
  }

  pub fn usage(&self) -> Option<&DailyUsage> {
    self.usage.as_ref()
  }

  pub fn view(&self) -> &View {
    self.interaction.view()
  }

  pub fn current_catch(&self) -> Option<&CaughtBottle> {
    self.current_catch.as_ref()
  }

  /// Fetch own bottles and today's usage concurrently.
  #[instrument(skip(self), fields(user = %self.user_id))]
  pub async fn load(&mut self) -> Result<(), ExchangeError> {
    let (bottles, usage) = try_join(
      self.exchange.list_my_bottles(&self.user_id),
      self.exchange.daily_usage(&self.user_id, self.is_vip),
    )
    .await?;

    debug!(bottles = bottles.len(), throws = usage.throws, catches = usage.catches, "Session loaded");
    self.my_bottles = bottles;
    self.usage = Some(usage);
    self.loaded = true;
    Ok(())
  }

  pub fn begin_throw(&mut self) -> Result<(), ExchangeError> {
    self.interaction.begin_throw()
  }

  /// Leave the throw composer without throwing.
  pub fn cancel(&mut self) -> Result<(), ExchangeError> {
    self.interaction.cancel_throw()
  }

  /// Throw from the composer, then refresh the cached beach and usage.
  ///
  /// The composer stays open when the throw fails so the text can be
  /// retried.
  pub async fn throw(&mut self, content: &str) -> Result<Bottle, ExchangeError> {
    self.interaction.ensure_can_throw()?;
    let bottle = self
      .exchange
      .throw_bottle(&self.user_id, content, self.is_vip)
      .await?;
    self.interaction.thrown()?;

    if let Err(e) = self.load().await {
      warn!(error = %e, "Failed to refresh session after throw");
    }
    Ok(bottle)
  }

  /// Catch a bottle and open the catch-result view.
  pub async fn catch(&mut self) -> Result<CaughtBottle, ExchangeError> {
    self.interaction.ensure_can_catch()?;
    let caught = self.exchange.catch_bottle(&self.user_id, self.is_vip).await?;
    self.interaction.caught(caught.ticket())?;
    self.current_catch = Some(caught.clone());

    match self.exchange.daily_usage(&self.user_id, self.is_vip).await {
      Ok(usage) => self.usage = Some(usage),
      Err(e) => warn!(error = %e, "Failed to refresh usage after catch"),
    }
    Ok(caught)
  }

  /// Apply a post-catch action to the held bottle.
  pub async fn resolve(
    &mut self,
    action: PostCatchAction,
    reply_text: &str,
  ) -> Result<CatchResolution, ExchangeError> {
    let ticket = self
      .interaction
      .ticket()
      .cloned()
      .ok_or(ExchangeError::InvalidTransition {
        from: self.interaction.view().name(),
        action: action.name(),
      })?;

    let resolution = self
      .exchange
      .resolve_catch(&self.user_id, &ticket, action, reply_text)
      .await?;

    let conversation_id = match &resolution {
      CatchResolution::Handoff {
        conversation_id, ..
      } => Some(conversation_id.clone()),
      CatchResolution::BackToSea { .. } => None,
    };
    self.interaction.resolved(action, conversation_id)?;
    self.current_catch = None;
    Ok(resolution)
  }

  pub fn return_to_main(&mut self) {
    self.interaction.return_to_main();
    self.current_catch = None;
  }

  /// Drop every cached value, e.g. on sign-out.
  pub fn reset(&mut self) {
    self.my_bottles.clear();
    self.usage = None;
    self.loaded = false;
    self.interaction = Interaction::new();
    self.current_catch = None;
  }
}
