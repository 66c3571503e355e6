//! Label resolution from the two mutually exclusive input sources.

use crate::store::BoxStore;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LabelError {
    #[error("enter or select a label first")]
    NoLabelProvided,
}

/// Resolves a label for a box from either a picked known class or typed
/// free text. Setting one source clears the other, and both are cleared
/// after a successful apply: each box needs its own explicit label action.
#[derive(Default, Debug)]
pub struct LabelAssigner {
    selected: Option<String>,
    free_text: String,
}

impl LabelAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks one of the externally supplied known class names.
    pub fn select_class(&mut self, name: &str) {
        self.selected = Some(name.to_string());
        self.free_text.clear();
    }

    /// Updates the typed label. Non-empty text overrides a prior selection.
    pub fn set_free_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.selected = None;
        }
        self.free_text = text.to_string();
    }

    pub fn selected_class(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn free_text(&self) -> &str {
        &self.free_text
    }

    /// The label that would be applied right now: the selection if set,
    /// else the trimmed free text, else nothing.
    pub fn resolve(&self) -> Option<String> {
        if let Some(sel) = &self.selected {
            return Some(sel.clone());
        }
        let trimmed = self.free_text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Applies the resolved label to the given box and clears both sources.
    /// Returns the applied label for status reporting.
    pub fn apply(&mut self, store: &mut BoxStore, box_id: u64) -> Result<String, LabelError> {
        let label = self.resolve().ok_or(LabelError::NoLabelProvided)?;
        store.set_label(box_id, &label);
        self.selected = None;
        self.free_text.clear();
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::BoundingBox;

    fn store_with_box(id: u64) -> BoxStore {
        let mut store = BoxStore::new();
        store.add(BoundingBox {
            id,
            x1: 0.0,
            y1: 0.0,
            x2: 40.0,
            y2: 40.0,
            label: String::new(),
            color: "#45B7D1".to_string(),
        });
        store
    }

    #[test]
    fn selection_wins_over_stale_text() {
        let mut a = LabelAssigner::new();
        a.set_free_text("dog");
        a.select_class("cat");
        assert_eq!(a.resolve().as_deref(), Some("cat"));
        assert_eq!(a.free_text(), "");
    }

    #[test]
    fn typing_clears_the_selection() {
        let mut a = LabelAssigner::new();
        a.select_class("cat");
        a.set_free_text("d");
        assert_eq!(a.selected_class(), None);
        assert_eq!(a.resolve().as_deref(), Some("d"));
    }

    #[test]
    fn free_text_is_trimmed() {
        let mut a = LabelAssigner::new();
        a.set_free_text("  bird  ");
        assert_eq!(a.resolve().as_deref(), Some("bird"));
        a.set_free_text("   ");
        assert_eq!(a.resolve(), None);
    }

    #[test]
    fn apply_without_a_label_fails_and_changes_nothing() {
        let mut a = LabelAssigner::new();
        let mut store = store_with_box(1);
        assert_eq!(
            a.apply(&mut store, 1).unwrap_err(),
            LabelError::NoLabelProvided
        );
        assert_eq!(store.get(1).unwrap().label, "");
    }

    #[test]
    fn apply_sets_label_and_clears_both_sources() {
        let mut a = LabelAssigner::new();
        let mut store = store_with_box(1);
        a.select_class("apple");
        assert_eq!(a.apply(&mut store, 1).unwrap(), "apple");
        assert_eq!(store.get(1).unwrap().label, "apple");
        // The next box needs its own label action.
        assert_eq!(a.resolve(), None);
        assert_eq!(a.apply(&mut store, 1).unwrap_err(), LabelError::NoLabelProvided);
    }
}
