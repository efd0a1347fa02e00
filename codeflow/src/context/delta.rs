//! Field-wise differences between two states.
//!
//! Truncation here only affects what is logged, never the state itself.

use super::{PipelineState, StateField};
use serde::Serialize;
use std::fmt;

/// A field that appeared or changed between two states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    /// The field.
    pub field: StateField,
    /// The new value, quoted and truncated for display.
    pub value: String,
}

/// The set of fields that differ between an input and an output state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateDelta {
    changes: Vec<FieldChange>,
}

impl StateDelta {
    /// Computes the delta from `old` to `new`.
    ///
    /// A field is reported when it is set in `new` and either unset in `old`
    /// or holds a different value. Rendered values longer than `max_len`
    /// characters are cut with [`truncate_display`].
    #[must_use]
    pub fn between(old: &PipelineState, new: &PipelineState, max_len: usize) -> Self {
        let changes = StateField::ALL
            .into_iter()
            .filter_map(|field| {
                let next = new.value_of(field)?;
                if old.value_of(field).as_ref() == Some(&next) {
                    return None;
                }
                Some(FieldChange {
                    field,
                    value: truncate_display(&format!("{next:?}"), max_len),
                })
            })
            .collect();

        Self { changes }
    }

    /// Returns the changed fields.
    #[must_use]
    pub fn fields(&self) -> Vec<StateField> {
        self.changes.iter().map(|change| change.field).collect()
    }

    /// Returns the individual changes.
    #[must_use]
    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl fmt::Display for StateDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.changes.is_empty() {
            return f.write_str("no updates");
        }
        for (i, change) in self.changes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", change.field, change.value)?;
        }
        Ok(())
    }
}

/// Cuts `value` to at most `max_len` characters, ending in `...` when cut.
#[must_use]
pub fn truncate_display(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        return value.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = value.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Keeps the first `max_len` characters of `value` and appends `...` when cut.
#[must_use]
pub fn truncate_preview(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_len).collect();
    out.push_str("...");
    out
}
