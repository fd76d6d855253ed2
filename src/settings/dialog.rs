//! Settings dialog state machine.
//!
//! The dialog edits the daily target as free text. Every transition is a
//! pure function of the previous state and an action, so front ends only
//! render [`DialogState`] and feed it [`DialogAction`]s.

use crate::types::{DailyTarget, ValidationError};

/// User-visible state of the settings dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogState {
    /// Text currently in the target field
    pub draft: String,
    /// Whether the dialog is shown
    pub open: bool,
    /// Validation result of `draft`; `None` when valid
    pub error: Option<ValidationError>,
}

/// Inputs the dialog reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogAction {
    /// Show the dialog, seeding the field with the saved target
    Open(DailyTarget),
    /// Replace the field text
    Edit(String),
    /// Re-check the field text
    Validate,
    /// Hide the dialog, keeping the draft
    Close,
    /// The store accepted the draft
    SaveSucceeded,
}

impl DialogState {
    /// A closed dialog showing `current`.
    pub fn new(current: DailyTarget) -> Self {
        Self {
            draft: current.to_string(),
            open: false,
            error: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Message to show under the field, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Applies `action` and returns the next state.
    #[must_use]
    pub fn apply(self, action: DialogAction) -> Self {
        transition(self, action)
    }

    /// The target to save, or why the draft cannot be saved.
    pub fn save_request(&self) -> Result<DailyTarget, ValidationError> {
        DailyTarget::parse(&self.draft)
    }
}

/// Pure transition function of the dialog.
#[must_use]
pub fn transition(state: DialogState, action: DialogAction) -> DialogState {
    match action {
        DialogAction::Open(current) => DialogState {
            draft: current.to_string(),
            open: true,
            error: None,
        },
        DialogAction::Edit(text) => {
            let error = DailyTarget::parse(&text).err();
            DialogState {
                draft: text,
                error,
                ..state
            }
        }
        DialogAction::Validate => DialogState {
            error: DailyTarget::parse(&state.draft).err(),
            ..state
        },
        DialogAction::Close | DialogAction::SaveSucceeded => DialogState {
            open: false,
            ..state
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(n: u8) -> DailyTarget {
        DailyTarget::new(n).unwrap()
    }

    fn opened(n: u8) -> DialogState {
        DialogState::new(target(n)).apply(DialogAction::Open(target(n)))
    }

    #[test]
    fn test_open_seeds_draft_and_clears_error() {
        let state = DialogState {
            draft: "abc".to_string(),
            open: false,
            error: Some(ValidationError::DailyTargetOutOfRange("abc".to_string())),
        };

        let state = state.apply(DialogAction::Open(target(8)));

        assert!(state.open);
        assert_eq!(state.draft, "8");
        assert!(state.is_valid());
    }

    #[test]
    fn test_edit_validates_immediately() {
        let state = opened(8).apply(DialogAction::Edit("21".to_string()));
        assert!(!state.is_valid());
        assert_eq!(
            state.error_message().as_deref(),
            Some("目標は1〜20の範囲で設定してください")
        );

        let state = state.apply(DialogAction::Edit("12".to_string()));
        assert!(state.is_valid());
        assert_eq!(state.save_request(), Ok(target(12)));
    }

    #[test]
    fn test_rejected_inputs() {
        for input in ["0", "21", "abc", "", "-3", "8.5"] {
            let state = opened(8).apply(DialogAction::Edit(input.to_string()));
            assert!(!state.is_valid(), "{input:?} should be rejected");
            assert!(state.save_request().is_err());
        }
    }

    #[test]
    fn test_accepted_bounds() {
        for (input, expected) in [("1", 1), ("20", 20), (" 5 ", 5)] {
            let state = opened(8).apply(DialogAction::Edit(input.to_string()));
            assert!(state.is_valid());
            assert_eq!(state.save_request(), Ok(target(expected)));
        }
    }

    #[test]
    fn test_validate_rechecks_draft() {
        let state = DialogState {
            draft: "30".to_string(),
            open: true,
            error: None,
        };

        let state = transition(state, DialogAction::Validate);

        assert!(!state.is_valid());
        assert!(state.open);
    }

    #[test]
    fn test_close_and_save_keep_draft() {
        let state = opened(8).apply(DialogAction::Edit("10".to_string()));

        let closed = state.clone().apply(DialogAction::Close);
        assert!(!closed.open);
        assert_eq!(closed.draft, "10");

        let saved = state.apply(DialogAction::SaveSucceeded);
        assert!(!saved.open);
    }

    #[test]
    fn test_reopen_discards_unsaved_draft() {
        let state = opened(8)
            .apply(DialogAction::Edit("abc".to_string()))
            .apply(DialogAction::Close)
            .apply(DialogAction::Open(target(8)));

        assert_eq!(state.draft, "8");
        assert!(state.is_valid());
    }
}
