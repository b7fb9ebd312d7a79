//! Reminder list kept in session state
//!
//! Reminders are an ordered list of strings stored under the reserved
//! [`REMINDERS_KEY`] of a session's state mapping. Callers address entries
//! with 1-based positions; an out-of-range position is reported in the
//! response and never touches the list.
//!
//! The state is borrowed mutably for the duration of a call. Serializing
//! calls against the same session is the caller's job.

use crate::context::SessionState;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// State key holding the reminder list
pub const REMINDERS_KEY: &str = "reminders";

const STATUS_ERROR: &str = "error";

/// Response of `add`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddResponse {
    /// Always `add_reminder`
    pub action: String,
    /// The reminder as stored
    pub reminder: String,
    /// Confirmation message
    pub message: String,
    /// `error` when the state could not be read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Response of `view`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewResponse {
    /// Always `view_reminders`
    pub action: String,
    /// Current reminders in order
    pub reminders: Vec<String>,
    /// Number of reminders
    pub count: usize,
    /// Why the list could not be read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// `error` when the state could not be read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Response of `update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse {
    /// Always `update_reminder`
    pub action: String,
    /// Requested 1-based position
    pub index: i64,
    /// Text that was replaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_text: Option<String>,
    /// Text now stored at `index`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_text: Option<String>,
    /// Human-readable message
    pub message: String,
    /// `error` when the update was refused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Response of `delete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Always `delete_reminder`
    pub action: String,
    /// Requested 1-based position
    pub index: i64,
    /// Text that was removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_reminder: Option<String>,
    /// Human-readable message
    pub message: String,
    /// `error` when the delete was refused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl AddResponse {
    /// Whether the reminder was stored
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.is_none()
    }
}

impl ViewResponse {
    /// Whether the list could be read
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.is_none()
    }
}

impl UpdateResponse {
    /// Whether the reminder was replaced
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.is_none()
    }
}

impl DeleteResponse {
    /// Whether the reminder was removed
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.is_none()
    }
}

/// Read the list; a missing key is an empty list
///
/// Fails when the key holds something other than a list of strings, so a
/// corrupt entry is reported instead of silently overwritten.
pub fn load(state: &SessionState) -> Result<Vec<String>, String> {
    match state.get(REMINDERS_KEY) {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            format!(
                "State key '{}' does not hold a list of reminders: {}",
                REMINDERS_KEY, e
            )
        }),
    }
}

fn store(state: &mut SessionState, reminders: Vec<String>) {
    state.insert(REMINDERS_KEY.to_string(), serde_json::json!(reminders));
}

/// Map a 1-based position onto the list, if it is in range
fn position(index: i64, len: usize) -> Option<usize> {
    usize::try_from(index)
        .ok()
        .filter(|i| (1..=len).contains(i))
        .map(|i| i - 1)
}

fn out_of_range(index: i64, len: usize) -> String {
    format!(
        "Could not find reminder at position {}. Currently there are {} reminders.",
        index, len
    )
}

/// Append a reminder
pub fn add(reminder: &str, state: &mut SessionState) -> AddResponse {
    debug!(reminder = %reminder, "add_reminder called");

    let mut reminders = match load(state) {
        Ok(reminders) => reminders,
        Err(message) => {
            warn!(error = %message, "Reminder list unreadable");
            return AddResponse {
                action: "add_reminder".to_string(),
                reminder: reminder.to_string(),
                message,
                status: Some(STATUS_ERROR.to_string()),
            };
        }
    };

    reminders.push(reminder.to_string());
    store(state, reminders);

    AddResponse {
        action: "add_reminder".to_string(),
        reminder: reminder.to_string(),
        message: format!("Added reminder: {}", reminder),
        status: None,
    }
}

/// Current reminders and their count
pub fn view(state: &SessionState) -> ViewResponse {
    debug!("view_reminders called");

    match load(state) {
        Ok(reminders) => ViewResponse {
            action: "view_reminders".to_string(),
            count: reminders.len(),
            reminders,
            message: None,
            status: None,
        },
        Err(message) => {
            warn!(error = %message, "Reminder list unreadable");
            ViewResponse {
                action: "view_reminders".to_string(),
                reminders: Vec::new(),
                count: 0,
                message: Some(message),
                status: Some(STATUS_ERROR.to_string()),
            }
        }
    }
}

/// Replace the reminder at a 1-based position
pub fn update(index: i64, updated_text: &str, state: &mut SessionState) -> UpdateResponse {
    debug!(index, updated_text = %updated_text, "update_reminder called");

    let refused = |message: String| UpdateResponse {
        action: "update_reminder".to_string(),
        index,
        old_text: None,
        updated_text: None,
        message,
        status: Some(STATUS_ERROR.to_string()),
    };

    let mut reminders = match load(state) {
        Ok(reminders) => reminders,
        Err(message) => return refused(message),
    };

    let Some(pos) = position(index, reminders.len()) else {
        warn!(index, count = reminders.len(), "Reminder position out of range");
        return refused(out_of_range(index, reminders.len()));
    };

    let old_text = std::mem::replace(&mut reminders[pos], updated_text.to_string());
    store(state, reminders);

    UpdateResponse {
        action: "update_reminder".to_string(),
        index,
        message: format!(
            "Updated reminder {} from '{}' to '{}'",
            index, old_text, updated_text
        ),
        old_text: Some(old_text),
        updated_text: Some(updated_text.to_string()),
        status: None,
    }
}

/// Remove the reminder at a 1-based position; later entries shift down
pub fn delete(index: i64, state: &mut SessionState) -> DeleteResponse {
    debug!(index, "delete_reminder called");

    let refused = |message: String| DeleteResponse {
        action: "delete_reminder".to_string(),
        index,
        deleted_reminder: None,
        message,
        status: Some(STATUS_ERROR.to_string()),
    };

    let mut reminders = match load(state) {
        Ok(reminders) => reminders,
        Err(message) => return refused(message),
    };

    let Some(pos) = position(index, reminders.len()) else {
        warn!(index, count = reminders.len(), "Reminder position out of range");
        return refused(out_of_range(index, reminders.len()));
    };

    let deleted = reminders.remove(pos);
    store(state, reminders);

    DeleteResponse {
        action: "delete_reminder".to_string(),
        index,
        message: format!("Deleted reminder {}: '{}'", index, deleted),
        deleted_reminder: Some(deleted),
        status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_with(reminders: &[&str]) -> SessionState {
        let mut state = SessionState::new();
        state.insert(REMINDERS_KEY.to_string(), json!(reminders));
        state
    }

    #[test]
    fn test_add_to_empty_then_view() {
        let mut state = SessionState::new();

        let added = add("buy milk", &mut state);
        assert!(added.is_ok());
        assert_eq!(added.action, "add_reminder");
        assert_eq!(added.message, "Added reminder: buy milk");

        let viewed = view(&state);
        assert_eq!(viewed.reminders, vec!["buy milk".to_string()]);
        assert_eq!(viewed.count, 1);
    }

    #[test]
    fn test_add_allows_duplicates_and_keeps_order() {
        let mut state = SessionState::new();
        add("a", &mut state);
        add("b", &mut state);
        add("a", &mut state);

        assert_eq!(view(&state).reminders, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_view_missing_key_is_empty_and_pure() {
        let state = SessionState::new();
        let viewed = view(&state);
        assert!(viewed.is_ok());
        assert!(viewed.reminders.is_empty());
        assert_eq!(viewed.count, 0);
        assert!(state.is_empty());
    }

    #[test]
    fn test_update_replaces_only_target() {
        let mut state = state_with(&["a", "b", "c"]);

        let updated = update(2, "B", &mut state);
        assert!(updated.is_ok());
        assert_eq!(updated.old_text.as_deref(), Some("b"));
        assert_eq!(updated.updated_text.as_deref(), Some("B"));
        assert_eq!(updated.message, "Updated reminder 2 from 'b' to 'B'");

        assert_eq!(view(&state).reminders, vec!["a", "B", "c"]);
    }

    #[test]
    fn test_update_every_valid_position() {
        for index in 1..=3_i64 {
            let mut state = state_with(&["a", "b", "c"]);
            update(index, "x", &mut state);
            let reminders = view(&state).reminders;
            for (i, text) in reminders.iter().enumerate() {
                let expected = if i as i64 == index - 1 {
                    "x"
                } else {
                    ["a", "b", "c"][i]
                };
                assert_eq!(text, expected);
            }
        }
    }

    #[test]
    fn test_out_of_range_positions_leave_list_unchanged() {
        for index in [0, -1, 4, i64::MAX] {
            let mut state = state_with(&["a", "b", "c"]);
            let before = state.clone();

            let updated = update(index, "x", &mut state);
            assert_eq!(updated.status.as_deref(), Some("error"));
            assert!(updated.old_text.is_none());
            assert_eq!(
                updated.message,
                format!(
                    "Could not find reminder at position {}. Currently there are 3 reminders.",
                    index
                )
            );

            let deleted = delete(index, &mut state);
            assert_eq!(deleted.status.as_deref(), Some("error"));
            assert!(deleted.deleted_reminder.is_none());

            assert_eq!(state, before);
        }
    }

    #[test]
    fn test_update_on_empty_list_is_refused() {
        let mut state = SessionState::new();
        let updated = update(1, "x", &mut state);
        assert!(!updated.is_ok());
        assert!(updated.message.ends_with("Currently there are 0 reminders."));
        assert!(!state.contains_key(REMINDERS_KEY));
    }

    #[test]
    fn test_delete_shifts_later_entries() {
        let mut state = state_with(&["a", "b", "c"]);

        let deleted = delete(1, &mut state);
        assert!(deleted.is_ok());
        assert_eq!(deleted.deleted_reminder.as_deref(), Some("a"));
        assert_eq!(deleted.message, "Deleted reminder 1: 'a'");

        assert_eq!(view(&state).reminders, vec!["b", "c"]);
    }

    #[test]
    fn test_corrupt_state_is_reported_not_overwritten() {
        let mut state = SessionState::new();
        state.insert(REMINDERS_KEY.to_string(), json!("not a list"));

        let added = add("x", &mut state);
        assert!(!added.is_ok());
        assert_eq!(state.get(REMINDERS_KEY), Some(&json!("not a list")));

        let viewed = view(&state);
        assert_eq!(viewed.status.as_deref(), Some("error"));
        assert!(viewed
            .message
            .as_deref()
            .unwrap()
            .starts_with("State key 'reminders' does not hold a list of reminders"));

        let fine = serde_json::to_value(view(&SessionState::new())).unwrap();
        assert!(fine.get("message").is_none());
    }

    #[test]
    fn test_response_shape() {
        let mut state = SessionState::new();
        let encoded = serde_json::to_value(add("call mom", &mut state)).unwrap();
        assert_eq!(
            encoded,
            json!({
                "action": "add_reminder",
                "reminder": "call mom",
                "message": "Added reminder: call mom"
            })
        );

        let refused = serde_json::to_value(delete(9, &mut state)).unwrap();
        assert_eq!(refused["status"], "error");
        assert!(refused.get("deleted_reminder").is_none());
    }
}
