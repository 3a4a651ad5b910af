//! Todo Collection Transitions
//!
//! Pure functions from the current collection to the next one. The app root
//! replaces its collection wholesale with the result instead of mutating in
//! place, so every render sees a consistent value.

use crate::models::TodoItem;

/// Append a new incomplete item to the end of the collection
pub fn push_todo(todos: &[TodoItem], text: String) -> Vec<TodoItem> {
    let mut next = todos.to_vec();
    next.push(TodoItem::new(text));
    next
}

/// Invert the completion state of the matching item
///
/// An unknown id leaves the collection unchanged.
pub fn toggle_todo(todos: &[TodoItem], id: &str) -> Vec<TodoItem> {
    todos
        .iter()
        .map(|todo| {
            if todo.id == id {
                TodoItem {
                    completed: !todo.completed,
                    ..todo.clone()
                }
            } else {
                todo.clone()
            }
        })
        .collect()
}

/// Drop the matching item, preserving the order of the rest
pub fn remove_todo(todos: &[TodoItem], id: &str) -> Vec<TodoItem> {
    todos.iter().filter(|todo| todo.id != id).cloned().collect()
}
