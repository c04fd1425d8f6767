//! Open/closed tracking and admission policy.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parley_core::Direction;

use crate::config::EngineSettings;

/// Static admission flags, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    pub process_bot_events: bool,
    pub process_user_events: bool,
    pub process_when_closed: bool,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self::from(&EngineSettings::default())
    }
}

impl From<&EngineSettings> for GatePolicy {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            process_bot_events: settings.process_bot_events,
            process_user_events: settings.process_user_events,
            process_when_closed: settings.process_when_closed,
        }
    }
}

/// Why an event was not dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The widget is closed and closed-state processing is off.
    Closed,
    /// User-authored events are switched off.
    UserEventsDisabled,
    /// Bot-authored events are switched off.
    BotEventsDisabled,
}

impl DropReason {
    /// The debug message logged when an event is dropped.
    pub fn message(self) -> &'static str {
        match self {
            Self::Closed => "Ignoring event, embed closed",
            Self::UserEventsDisabled => "Ignoring outgoing user message event",
            Self::BotEventsDisabled => "Ignoring incoming bot message event",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Tracks whether the widget is open and decides which events are admitted.
///
/// The open flag is per instance and starts closed.
#[derive(Debug, Default)]
pub struct LifecycleGate {
    policy: GatePolicy,
    embed_open: AtomicBool,
}

impl LifecycleGate {
    pub fn new(policy: GatePolicy) -> Self {
        Self {
            policy,
            embed_open: AtomicBool::new(false),
        }
    }

    pub fn policy(&self) -> GatePolicy {
        self.policy
    }

    /// Marks the widget open.
    pub fn open(&self) {
        self.embed_open.store(true, Ordering::SeqCst);
    }

    /// Marks the widget closed.
    pub fn close(&self) {
        self.embed_open.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.embed_open.load(Ordering::SeqCst)
    }

    /// Decides whether an event in `direction` may be dispatched.
    ///
    /// Checks run in order: closed state, then user events, then bot events.
    pub fn admit(&self, direction: &Direction) -> Result<(), DropReason> {
        if !self.is_open() && !self.policy.process_when_closed {
            return Err(DropReason::Closed);
        }
        if direction.is_user() && !self.policy.process_user_events {
            return Err(DropReason::UserEventsDisabled);
        }
        if direction.is_bot() && !self.policy.process_bot_events {
            return Err(DropReason::BotEventsDisabled);
        }
        Ok(())
    }
}
