use leptos::ev;
use leptos::html::Div;
use leptos::prelude::*;
use web_sys::{ScrollBehavior, ScrollIntoViewOptions};

use webhook_chat::models::{DisplayedMessage, MessageKind, MessageRole};
use webhook_chat::thread::is_near_bottom;

use crate::components::attachments::{AudioRecorder, ImageUploader};
use crate::state::AppState;

/// Main chat area: the polled thread plus the input row.
///
/// History polling runs for as long as this component is mounted.
#[component]
pub fn ChatArea() -> impl IntoView {
    let state = expect_context::<AppState>();

    let poller = StoredValue::new_local(state.start_polling());
    on_cleanup(move || poller.dispose());

    let container = NodeRef::<Div>::new();
    let bottom = NodeRef::<Div>::new();

    // Follow new messages if the reader is already near the bottom or just sent one.
    Effect::new(move |_| {
        state.thread.track();
        let near_bottom = container
            .get_untracked()
            .map(|el| {
                is_near_bottom(
                    el.scroll_height() as f64,
                    el.scroll_top() as f64,
                    el.client_height() as f64,
                )
            })
            .unwrap_or(true);
        let scroll = state
            .set_thread
            .try_maybe_update(|thread| (false, thread.take_scroll_request(near_bottom)))
            .unwrap_or(false);
        if scroll {
            if let Some(el) = bottom.get_untracked() {
                let options = ScrollIntoViewOptions::new();
                options.set_behavior(ScrollBehavior::Smooth);
                el.scroll_into_view_with_scroll_into_view_options(&options);
            }
        }
    });

    let is_empty = move || state.thread.with(|t| t.messages().is_empty());
    let is_thinking = move || state.thread.with(|t| t.is_agent_thinking());

    view! {
        <main class="chat-area">
            <div class="chat-header">"Webhook Chat"</div>

            // Messages
            <div class="messages-container" node_ref=container>
                <Show when=is_empty>
                    <div class="empty-state">
                        <p>"Start a conversation with the AI"</p>
                        <p class="hint">"Send a message, upload an image, or record audio"</p>
                    </div>
                </Show>
                <For
                    each=move || state.thread.with(|t| t.messages().to_vec())
                    key=|m| (m.id.clone(), m.content.clone(), m.kind)
                    let:msg
                >
                    <MessageBubble message=msg />
                </For>
                <Show when=is_thinking>
                    <div class="message assistant thinking">
                        <span class="dots">"● ● ●"</span>
                        " Thinking..."
                    </div>
                </Show>
                <div node_ref=bottom></div>
            </div>

            // Input area
            <ChatInput />
        </main>
    }
}

/// A single chat message bubble.
#[component]
fn MessageBubble(message: DisplayedMessage) -> impl IntoView {
    let css_class = match message.role {
        MessageRole::User => "message user",
        MessageRole::Assistant => "message assistant",
    };
    let time = message
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S")
        .to_string();
    let alt = if message.content.is_empty() {
        "Uploaded image".to_string()
    } else {
        message.content.clone()
    };

    let body = (!message.content.is_empty())
        .then(|| view! { <div class="message-text">{message.content.clone()}</div> });
    let image = message
        .image_data_url
        .clone()
        .map(|src| view! { <img class="message-image" src=src alt=alt /> });
    let tag = match (message.kind, message.image_data_url.is_some()) {
        (MessageKind::Audio, _) => Some("(Audio)"),
        (MessageKind::Image, false) => Some("(Image)"),
        _ => None,
    }
    .map(|label| view! { <span class="kind-tag">{label}</span> });

    view! {
        <div class=css_class>
            {body}
            {image}
            {tag}
            <span class="timestamp">{time}</span>
        </div>
    }
}

/// Input row: attachment chip, uploaders, text box and send button.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();

    let is_sending = move || state.is_sending.get();
    let has_attachment = move || state.attachment.with(Option::is_some);
    let pickers_disabled = Signal::derive(move || is_sending() || has_attachment());

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            state.send_message();
        }
    };

    view! {
        <div class="input-area">
            {move || {
                state.attachment.with(|a| a.as_ref().map(|a| a.kind)).map(|kind| {
                    view! {
                        <div class="attachment-chip">
                            <span>{format!("{kind} attached")}</span>
                            <button
                                class="chip-remove"
                                title="Remove attachment"
                                on:click=move |_| state.set_attachment.set(None)
                            >
                                "×"
                            </button>
                        </div>
                    }
                })
            }}
            <div class="input-row">
                <ImageUploader disabled=pickers_disabled />
                <AudioRecorder disabled=pickers_disabled />
                <textarea
                    rows="1"
                    placeholder="Type your message..."
                    prop:value=state.input
                    on:input=move |ev| {
                        state.set_input.set(event_target_value(&ev));
                    }
                    on:keydown=on_keydown
                />
                <button
                    class="send-btn"
                    on:click=move |_| state.send_message()
                    disabled=move || state.input.with(|t| t.is_empty()) && !has_attachment()
                >
                    "Send"
                </button>
            </div>
        </div>
    }
}
