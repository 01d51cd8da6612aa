//! Transient message banner.
//!
//! Renders whatever [`SignalNotifier`](crate::services::SignalNotifier)
//! pushes; entries remove themselves after their display time.

use leptos::*;

use crate::types::Notification;

#[component]
pub fn MessageBanner(
    /// Messages currently on screen
    messages: ReadSignal<Vec<Notification>>,
    /// Write side, for dismissing by hand
    set_messages: WriteSignal<Vec<Notification>>,
) -> impl IntoView {
    view! {
        <div id="message" class="messages" class:hidden=move || messages.get().is_empty()>
            <For
                each=move || messages.get()
                key=|entry| entry.id
                children=move |entry| {
                    let id = entry.id;
                    view! {
                        <div class=format!("message {}", entry.kind.css_class())>
                            <span class="message-time">"[" {entry.timestamp.clone()} "] "</span>
                            <p>{entry.message.clone()}</p>
                            <button
                                class="message-close"
                                on:click=move |_| set_messages.update(|m| m.retain(|e| e.id != id))
                            >
                                "×"
                            </button>
                        </div>
                    }
                }
            />
        </div>
    }
}
