//! Todo Row Component
//!
//! A single todo entry with its toggle and delete affordances.

use leptos::prelude::*;

use crate::components::DeleteConfirmButton;
use crate::models::TodoItem;

/// One item row; fully controlled by the parent
#[component]
pub fn TodoRow(
    item: TodoItem,
    #[prop(into)] on_toggle: Callback<String>,
    #[prop(into)] on_remove: Callback<String>,
) -> impl IntoView {
    let completed = item.completed;
    let text = item.text.clone();
    let toggle_id = item.id.clone();
    let remove_id = item.id.clone();

    view! {
        <li class=move || if completed { "item-row completed" } else { "item-row" }>
            // Checkbox: a click always fires the intent, the parent inverts the state
            <input
                type="checkbox"
                checked=completed
                on:click=move |_| on_toggle.run(toggle_id.clone())
            />

            // Text
            <span class="item-text">{text}</span>

            // Delete
            <DeleteConfirmButton
                button_class="delete-btn"
                on_confirm=Callback::new(move |_| on_remove.run(remove_id.clone()))
            />
        </li>
    }
}
