//! Client-side interaction state machine.
//!
//! Governs which bottle actions a session may take next. Not persisted;
//! one `Interaction` lives inside each session.
//!
//! ```text
//! main --begin throw--> throw-compose --thrown / cancel--> main
//! main --caught--> catch-result
//! catch-result --throw back / reply and throw back--> main
//! catch-result --reply and greet--> handoff
//! any --return to main--> main
//! ```

use serde::{Deserialize, Serialize};

use super::bottle::{BottleId, UserId};
use super::conversation::ConversationId;
use super::error::ExchangeError;

/// The draw a session is currently holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchTicket {
    pub bottle_id: BottleId,
    pub creator_id: UserId,
    pub pick_number: u32,
}

/// What the user chooses after catching a bottle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostCatchAction {
    /// Put the bottle back without writing anything.
    ThrowBack,
    /// Attach a reply, then put the bottle back.
    ReplyAndThrowBack,
    /// Attach a reply and open a conversation with the creator.
    ReplyAndGreet,
}

impl PostCatchAction {
    pub fn name(self) -> &'static str {
        match self {
            Self::ThrowBack => "throw_back",
            Self::ReplyAndThrowBack => "reply_and_throw_back",
            Self::ReplyAndGreet => "reply_and_greet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Main,
    ThrowCompose,
    CatchResult(CatchTicket),
    Handoff { conversation_id: ConversationId },
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::ThrowCompose => "throw_compose",
            Self::CatchResult(_) => "catch_result",
            Self::Handoff { .. } => "handoff",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    view: View,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self { view: View::Main }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// The held draw, if the session is looking at a caught bottle.
    pub fn ticket(&self) -> Option<&CatchTicket> {
        match &self.view {
            View::CatchResult(ticket) => Some(ticket),
            _ => None,
        }
    }

    pub fn begin_throw(&mut self) -> Result<(), ExchangeError> {
        self.require(matches!(self.view, View::Main), "begin_throw")?;
        self.view = View::ThrowCompose;
        Ok(())
    }

    pub fn cancel_throw(&mut self) -> Result<(), ExchangeError> {
        self.require(matches!(self.view, View::ThrowCompose), "cancel_throw")?;
        self.view = View::Main;
        Ok(())
    }

    /// Check that a throw may be submitted from the current view.
    pub fn ensure_can_throw(&self) -> Result<(), ExchangeError> {
        self.require(matches!(self.view, View::ThrowCompose), "throw")
    }

    pub fn thrown(&mut self) -> Result<(), ExchangeError> {
        self.ensure_can_throw()?;
        self.view = View::Main;
        Ok(())
    }

    pub fn ensure_can_catch(&self) -> Result<(), ExchangeError> {
        self.require(matches!(self.view, View::Main), "catch")
    }

    pub fn caught(&mut self, ticket: CatchTicket) -> Result<(), ExchangeError> {
        self.ensure_can_catch()?;
        self.view = View::CatchResult(ticket);
        Ok(())
    }

    /// Leave the catch-result view after `action` completed.
    ///
    /// `conversation_id` must be present exactly for `ReplyAndGreet`.
    pub fn resolved(
        &mut self,
        action: PostCatchAction,
        conversation_id: Option<ConversationId>,
    ) -> Result<(), ExchangeError> {
        self.require(self.ticket().is_some(), action.name())?;
        self.view = match (action, conversation_id) {
            (PostCatchAction::ReplyAndGreet, Some(conversation_id)) => {
                View::Handoff { conversation_id }
            }
            (PostCatchAction::ReplyAndGreet, None) => {
                return Err(ExchangeError::InvalidTransition {
                    from: self.view.name(),
                    action: action.name(),
                });
            }
            _ => View::Main,
        };
        Ok(())
    }

    pub fn return_to_main(&mut self) {
        self.view = View::Main;
    }

    fn require(&self, allowed: bool, action: &'static str) -> Result<(), ExchangeError> {
        if allowed {
            Ok(())
        } else {
            Err(ExchangeError::InvalidTransition {
                from: self.view.name(),
                action,
            })
        }
    }
}
