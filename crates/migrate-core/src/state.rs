//! Wizard step state.
//!
//! An explicit record of which pipeline stages have completed, with pure
//! transition functions. Persistence is the caller's concern; the core
//! never reads this back to gate an operation, it re-derives reality from
//! the collaborators on every call.

use serde::{Deserialize, Serialize};

/// Completion flags for the four manual wizard steps.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WizardState {
    pub fetched: bool,
    pub downloaded: bool,
    pub uploaded: bool,
    pub migrated: bool,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh fetch invalidates everything derived from the old list.
    pub fn with_fetched(self) -> Self {
        Self {
            fetched: true,
            downloaded: false,
            uploaded: false,
            migrated: false,
        }
    }

    pub fn with_downloaded(self) -> Self {
        Self {
            downloaded: true,
            ..self
        }
    }

    pub fn with_uploaded(self) -> Self {
        Self {
            uploaded: true,
            ..self
        }
    }

    pub fn with_migrated(self) -> Self {
        Self {
            migrated: true,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all_false() {
        let state = WizardState::new();
        assert!(!state.fetched && !state.downloaded && !state.uploaded && !state.migrated);
    }

    #[test]
    fn test_transitions_accumulate() {
        let state = WizardState::new()
            .with_fetched()
            .with_downloaded()
            .with_uploaded()
            .with_migrated();
        assert!(state.fetched && state.downloaded && state.uploaded && state.migrated);
    }

    #[test]
    fn test_refetch_resets_downstream_steps() {
        let state = WizardState::new()
            .with_fetched()
            .with_downloaded()
            .with_uploaded()
            .with_fetched();
        assert!(state.fetched);
        assert!(!state.downloaded && !state.uploaded && !state.migrated);
    }

    #[test]
    fn test_serde_round_trip() {
        let state = WizardState::new().with_fetched().with_downloaded();
        let text = serde_json::to_string(&state).unwrap();
        let back: WizardState = serde_json::from_str(&text).unwrap();
        assert_eq!(state, back);
    }
}
