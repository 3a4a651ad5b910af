//! Todo Frontend App
//!
//! Root component: owns the canonical todo collection and wires form and row
//! intents into collection transitions.

use leptos::prelude::*;

use crate::components::{TodoForm, TodoList};
use crate::models::TodoItem;
use crate::state::{push_todo, remove_todo, toggle_todo};

#[component]
pub fn App() -> impl IntoView {
    // State: the collection is replaced wholesale on every transition
    let (todos, set_todos) = signal(Vec::<TodoItem>::new());

    let on_submit = Callback::new(move |text: String| {
        set_todos.update(|todos| *todos = push_todo(todos, text));
    });

    let on_toggle = Callback::new(move |id: String| {
        set_todos.update(|todos| *todos = toggle_todo(todos, &id));
    });

    let on_remove = Callback::new(move |id: String| {
        set_todos.update(|todos| *todos = remove_todo(todos, &id));
    });

    view! {
        <main class="main-content">
            <h1>"Todos"</h1>

            <TodoForm on_submit=on_submit />

            <TodoList todos=todos on_toggle=on_toggle on_remove=on_remove />

            <p class="item-count">
                {move || {
                    let todos = todos.get();
                    let done = todos.iter().filter(|todo| todo.completed).count();
                    format!("{} items, {} done", todos.len(), done)
                }}
            </p>
        </main>
    }
}
