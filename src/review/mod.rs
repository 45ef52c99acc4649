//! Extraction review session — types and state transitions.
//!
//! Models the reconciliation flow between what the model extracted and what
//! the reviewer confirms: a read-only preview of extracted values, inline
//! edits against a pristine snapshot, a confirmation step that enumerates
//! every change, and a final submit. The session is a pure state machine;
//! persistence happens in the API layer after `Submitted`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ExtractedDetails, FieldValue};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Operation not allowed in state {state}: {operation}")]
    InvalidTransition {
        state: &'static str,
        operation: &'static str,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),
}

/// Where the session currently is in the review flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// Extraction still running; no values to show yet.
    Loading,
    /// Read-only display of the extracted values.
    Preview,
    /// Inline editing enabled.
    Editing,
    /// A save was requested with pending changes; awaiting confirmation.
    Confirming,
    /// Values accepted, ready for persistence.
    Submitted,
}

impl ReviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewState::Loading => "loading",
            ReviewState::Preview => "preview",
            ReviewState::Editing => "editing",
            ReviewState::Confirming => "confirming",
            ReviewState::Submitted => "submitted",
        }
    }
}

/// One field-level difference between the snapshot and the working values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub original: FieldValue,
    pub new: FieldValue,
}

/// A review session over one upload's extracted details.
///
/// `snapshot` is the extraction result as it arrived and never changes;
/// `working` carries the reviewer's edits. `reset` restores `working` to the
/// snapshot exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSession {
    pub upload_id: Uuid,
    pub state: ReviewState,
    snapshot: ExtractedDetails,
    working: ExtractedDetails,
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

impl ReviewSession {
    /// Start a session for an upload whose extraction is still in flight.
    pub fn loading(upload_id: Uuid) -> Self {
        Self {
            upload_id,
            state: ReviewState::Loading,
            snapshot: ExtractedDetails::new(),
            working: ExtractedDetails::new(),
        }
    }

    /// Start a session directly in preview from a finished extraction.
    pub fn preview(upload_id: Uuid, details: ExtractedDetails) -> Self {
        Self {
            upload_id,
            state: ReviewState::Preview,
            snapshot: details.clone(),
            working: details,
        }
    }

    /// Extraction finished: move from `Loading` into `Preview`.
    pub fn extraction_ready(&mut self, details: ExtractedDetails) -> Result<(), ReviewError> {
        if self.state != ReviewState::Loading {
            return Err(self.bad_transition("extraction_ready"));
        }
        self.snapshot = details.clone();
        self.working = details;
        self.state = ReviewState::Preview;
        Ok(())
    }

    /// Enter edit mode from the preview.
    pub fn begin_editing(&mut self) -> Result<(), ReviewError> {
        match self.state {
            ReviewState::Preview => {
                self.state = ReviewState::Editing;
                Ok(())
            }
            ReviewState::Editing => Ok(()),
            _ => Err(self.bad_transition("begin_editing")),
        }
    }

    /// Overwrite one field's working value. The field must exist in the
    /// extraction snapshot; review never introduces new fields.
    pub fn edit_field(&mut self, field: &str, value: FieldValue) -> Result<(), ReviewError> {
        if self.state != ReviewState::Editing {
            return Err(self.bad_transition("edit_field"));
        }
        if !self.snapshot.contains_key(field) {
            return Err(ReviewError::UnknownField(field.to_string()));
        }
        self.working.insert(field.to_string(), value);
        Ok(())
    }

    /// Discard all edits, restoring the snapshot exactly, and return to
    /// preview.
    pub fn reset(&mut self) -> Result<(), ReviewError> {
        match self.state {
            ReviewState::Editing | ReviewState::Confirming => {
                self.working = self.snapshot.clone();
                self.state = ReviewState::Preview;
                Ok(())
            }
            _ => Err(self.bad_transition("reset")),
        }
    }

    /// Request a save. With pending changes this moves to `Confirming` and
    /// returns the change list for display; with none it submits directly
    /// and returns an empty list.
    pub fn begin_save(&mut self) -> Result<Vec<FieldChange>, ReviewError> {
        if self.state != ReviewState::Editing && self.state != ReviewState::Preview {
            return Err(self.bad_transition("begin_save"));
        }
        let changes = self.changed_fields();
        self.state = if changes.is_empty() {
            ReviewState::Submitted
        } else {
            ReviewState::Confirming
        };
        Ok(changes)
    }

    /// Accept the pending changes.
    pub fn confirm(&mut self) -> Result<(), ReviewError> {
        if self.state != ReviewState::Confirming {
            return Err(self.bad_transition("confirm"));
        }
        self.state = ReviewState::Submitted;
        Ok(())
    }

    /// Back out of the confirmation, keeping the edits in place.
    pub fn cancel(&mut self) -> Result<(), ReviewError> {
        if self.state != ReviewState::Confirming {
            return Err(self.bad_transition("cancel"));
        }
        self.state = ReviewState::Editing;
        Ok(())
    }

    /// Every field whose working value differs from the snapshot.
    pub fn changed_fields(&self) -> Vec<FieldChange> {
        self.snapshot
            .iter()
            .filter_map(|(field, original)| {
                let current = self.working.get(field)?;
                if current == original {
                    return None;
                }
                Some(FieldChange {
                    field: field.clone(),
                    original: original.clone(),
                    new: current.clone(),
                })
            })
            .collect()
    }

    /// Whether a field currently differs from its snapshot value.
    pub fn is_modified(&self, field: &str) -> bool {
        match (self.snapshot.get(field), self.working.get(field)) {
            (Some(original), Some(current)) => original != current,
            _ => false,
        }
    }

    /// The original extracted value for a field, shown as a hint next to a
    /// modified input.
    pub fn original_value(&self, field: &str) -> Option<&FieldValue> {
        self.snapshot.get(field)
    }

    pub fn working_values(&self) -> &ExtractedDetails {
        &self.working
    }

    /// The accepted values, available only once the session is submitted.
    pub fn submitted_values(&self) -> Option<&ExtractedDetails> {
        (self.state == ReviewState::Submitted).then_some(&self.working)
    }

    fn bad_transition(&self, operation: &'static str) -> ReviewError {
        ReviewError::InvalidTransition {
            state: self.state.as_str(),
            operation,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn details(entries: &[(&str, FieldValue)]) -> ExtractedDetails {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn session() -> ReviewSession {
        ReviewSession::preview(
            Uuid::new_v4(),
            details(&[
                ("amount", FieldValue::Number(100.0)),
                ("company_name", FieldValue::Text("Acme Ltd".into())),
                ("notes", FieldValue::Null),
            ]),
        )
    }

    #[test]
    fn loading_flows_into_preview() {
        let mut s = ReviewSession::loading(Uuid::new_v4());
        assert_eq!(s.state, ReviewState::Loading);
        assert!(s.begin_editing().is_err());

        s.extraction_ready(details(&[("amount", FieldValue::Number(1.0))]))
            .unwrap();
        assert_eq!(s.state, ReviewState::Preview);
        assert_eq!(
            s.working_values().get("amount"),
            Some(&FieldValue::Number(1.0))
        );
    }

    #[test]
    fn single_edit_confirms_exactly_one_change() {
        let mut s = session();
        s.begin_editing().unwrap();
        s.edit_field("amount", FieldValue::Number(150.0)).unwrap();

        let changes = s.begin_save().unwrap();
        assert_eq!(s.state, ReviewState::Confirming);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "amount");
        assert_eq!(changes[0].original, FieldValue::Number(100.0));
        assert_eq!(changes[0].new, FieldValue::Number(150.0));

        s.confirm().unwrap();
        assert_eq!(s.state, ReviewState::Submitted);
        assert_eq!(
            s.submitted_values().unwrap().get("amount"),
            Some(&FieldValue::Number(150.0))
        );
    }

    #[test]
    fn save_without_changes_skips_confirmation() {
        let mut s = session();
        s.begin_editing().unwrap();
        // Write back the same value; not a change
        s.edit_field("amount", FieldValue::Number(100.0)).unwrap();

        let changes = s.begin_save().unwrap();
        assert!(changes.is_empty());
        assert_eq!(s.state, ReviewState::Submitted);
    }

    #[test]
    fn reset_restores_the_snapshot_exactly() {
        let mut s = session();
        let before = s.working_values().clone();

        s.begin_editing().unwrap();
        s.edit_field("amount", FieldValue::Number(999.0)).unwrap();
        s.edit_field("company_name", FieldValue::Text("Evil Corp".into()))
            .unwrap();
        s.edit_field("notes", FieldValue::Text("hm".into())).unwrap();
        assert_eq!(s.changed_fields().len(), 3);

        s.reset().unwrap();
        assert_eq!(s.state, ReviewState::Preview);
        assert_eq!(*s.working_values(), before);
        assert!(s.changed_fields().is_empty());
    }

    #[test]
    fn cancel_keeps_edits_and_returns_to_editing() {
        let mut s = session();
        s.begin_editing().unwrap();
        s.edit_field("amount", FieldValue::Number(150.0)).unwrap();
        s.begin_save().unwrap();

        s.cancel().unwrap();
        assert_eq!(s.state, ReviewState::Editing);
        assert_eq!(
            s.working_values().get("amount"),
            Some(&FieldValue::Number(150.0))
        );
        assert!(s.is_modified("amount"));
    }

    #[test]
    fn modified_flag_and_original_hint() {
        let mut s = session();
        s.begin_editing().unwrap();
        assert!(!s.is_modified("amount"));

        s.edit_field("amount", FieldValue::Number(150.0)).unwrap();
        assert!(s.is_modified("amount"));
        assert!(!s.is_modified("company_name"));
        assert_eq!(s.original_value("amount"), Some(&FieldValue::Number(100.0)));
    }

    #[test]
    fn null_to_value_counts_as_a_change() {
        let mut s = session();
        s.begin_editing().unwrap();
        s.edit_field("notes", FieldValue::Text("reviewed".into()))
            .unwrap();

        let changes = s.begin_save().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].original, FieldValue::Null);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut s = session();
        s.begin_editing().unwrap();
        let err = s
            .edit_field("not_a_field", FieldValue::Text("x".into()))
            .unwrap_err();
        assert!(matches!(err, ReviewError::UnknownField(_)));
    }

    #[test]
    fn editing_after_submit_is_rejected() {
        let mut s = session();
        s.begin_save().unwrap(); // no changes → Submitted
        assert_eq!(s.state, ReviewState::Submitted);

        let err = s.begin_editing().unwrap_err();
        assert!(matches!(err, ReviewError::InvalidTransition { .. }));
        assert!(s.edit_field("amount", FieldValue::Null).is_err());
    }

    #[test]
    fn preview_save_submits_directly() {
        let mut s = session();
        let changes = s.begin_save().unwrap();
        assert!(changes.is_empty());
        assert_eq!(s.state, ReviewState::Submitted);
    }
}
