//! Unsaved-changes confirmation.
//!
//! Replacing or closing a modified document goes through here. The guard remembers what the
//! user was trying to do while they answer the prompt and while a requested save runs.

use std::path::PathBuf;

/// The user's answer to "save changes?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardChoice {
    Save,
    Discard,
    Cancel,
}

/// The operation waiting on the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    New,
    Open { path: PathBuf, recent: bool },
    Quit,
}

/// What the caller should do after [`CloseGuard::choose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Proceed(PendingAction),
    /// Start a save; report its end with [`CloseGuard::save_finished`].
    Save,
    Cancelled,
    /// No prompt was showing.
    Ignored,
}

#[derive(Debug, Default)]
enum GuardState {
    #[default]
    Idle,
    Prompting(PendingAction),
    Saving(PendingAction),
}

#[derive(Debug, Default)]
pub struct CloseGuard {
    state: GuardState,
}

impl CloseGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate `action`. Unmodified documents proceed at once (`Some`); otherwise the guard
    /// starts prompting and returns `None`.
    pub fn request(&mut self, action: PendingAction, modified: bool) -> Option<PendingAction> {
        if !modified {
            self.state = GuardState::Idle;
            return Some(action);
        }
        self.state = GuardState::Prompting(action);
        None
    }

    pub fn choose(&mut self, choice: GuardChoice) -> GuardOutcome {
        if !self.is_prompting() {
            return GuardOutcome::Ignored;
        }
        let GuardState::Prompting(action) = std::mem::take(&mut self.state) else {
            return GuardOutcome::Ignored;
        };
        match choice {
            GuardChoice::Save => {
                self.state = GuardState::Saving(action);
                GuardOutcome::Save
            }
            GuardChoice::Discard => GuardOutcome::Proceed(action),
            GuardChoice::Cancel => GuardOutcome::Cancelled,
        }
    }

    /// A save finished (or was abandoned). Returns the pending action only if the guard was
    /// waiting on this save and it succeeded.
    pub fn save_finished(&mut self, success: bool) -> Option<PendingAction> {
        match std::mem::take(&mut self.state) {
            GuardState::Saving(action) if success => Some(action),
            GuardState::Saving(_) => None,
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn is_prompting(&self) -> bool {
        matches!(self.state, GuardState::Prompting(_))
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        match &self.state {
            GuardState::Idle => None,
            GuardState::Prompting(a) | GuardState::Saving(a) => Some(a),
        }
    }
}
