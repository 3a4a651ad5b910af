//! Todo Form Component
//!
//! Form for creating new todo items.

use leptos::prelude::*;
use wasm_bindgen::JsCast;

/// Form for creating new items; clears itself after a submission
#[component]
pub fn TodoForm(#[prop(into)] on_submit: Callback<String>) -> impl IntoView {
    let (new_text, set_new_text) = signal(String::new());

    let create_todo = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let text = new_text.get();
        if text.is_empty() { return; }
        on_submit.run(text);
        set_new_text.set(String::new());
    };

    view! {
        <form class="new-todo-form" on:submit=create_todo>
            <input
                type="text"
                placeholder="Add a new todo"
                required=true
                prop:value=move || new_text.get()
                on:input=move |ev| {
                    let target = ev.target().unwrap();
                    let input = target.dyn_ref::<web_sys::HtmlInputElement>().unwrap();
                    set_new_text.set(input.value());
                }
            />
            <button type="submit">"Add"</button>
        </form>
    }
}
