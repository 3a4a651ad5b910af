//! Todo Models
//!
//! Data structures for the todo collection.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// A single todo entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Unique identifier, assigned at creation and stable for the item's lifetime
    pub id: String,
    /// Item text content
    pub text: String,
    /// Completion status
    pub completed: bool,
}

impl TodoItem {
    /// Create a new incomplete item with a fresh identifier
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            text: text.into(),
            completed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_creation() {
        let item = TodoItem::new("Test item");
        assert_eq!(item.text, "Test item");
        assert!(!item.completed);
        assert!(!item.id.is_empty());
    }

    #[test]
    fn test_items_get_distinct_ids() {
        let a = TodoItem::new("same text");
        let b = TodoItem::new("same text");
        assert_ne!(a.id, b.id);
    }
}
