//! Todo List Component
//!
//! Ordered projection of the todo collection into rows.

use leptos::prelude::*;

use crate::components::TodoRow;
use crate::models::TodoItem;

/// Renders the collection in insertion order, forwarding intents to each row
#[component]
pub fn TodoList(
    todos: ReadSignal<Vec<TodoItem>>,
    #[prop(into)] on_toggle: Callback<String>,
    #[prop(into)] on_remove: Callback<String>,
) -> impl IntoView {
    view! {
        <ul class="todo-list">
            <For
                each=move || todos.get()
                key=|item| {
                    // Id anchors row identity; completed is part of the key
                    // because a row only re-renders when its key changes
                    (item.id.clone(), item.completed)
                }
                children=move |item| {
                    view! {
                        <TodoRow
                            item=item
                            on_toggle=on_toggle
                            on_remove=on_remove
                        />
                    }
                }
            />
        </ul>
    }
}
