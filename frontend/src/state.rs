use chrono::Utc;
use gloo_timers::callback::{Interval, Timeout};
use leptos::prelude::*;
use leptos::task::spawn_local;

use webhook_chat::envelope::Draft;
use webhook_chat::models::Attachment;
use webhook_chat::session::{FIXED_SESSION_ID, establish_session};
use webhook_chat::thread::ThreadState;

use crate::api;
use crate::storage::LocalSessionStorage;

/// History poll period.
const POLL_INTERVAL_MS: u32 = 2_000;
/// Delay between a completed send and the extra history fetch.
const SEND_REFRESH_DELAY_MS: u32 = 500;

/// Shared application state, provided via Leptos context.
#[derive(Clone, Copy)]
pub struct AppState {
    pub session_id: &'static str,

    // --- Read signals (for components to subscribe to) ---
    pub thread: ReadSignal<ThreadState>,
    pub input: ReadSignal<String>,
    pub attachment: ReadSignal<Option<Attachment>>,
    pub is_sending: ReadSignal<bool>,

    // --- Write signals (for mutating state) ---
    pub set_thread: WriteSignal<ThreadState>,
    pub set_input: WriteSignal<String>,
    pub set_attachment: WriteSignal<Option<Attachment>>,
    pub set_is_sending: WriteSignal<bool>,
}

impl AppState {
    /// Establish the session, create the signals and provide them in the
    /// current Leptos context.
    pub fn provide() -> Self {
        let session_id = match LocalSessionStorage::open() {
            Some(mut storage) => establish_session(&mut storage).unwrap_or_else(|e| {
                log::warn!("Could not persist session id: {e}");
                FIXED_SESSION_ID
            }),
            None => FIXED_SESSION_ID,
        };

        let (thread, set_thread) = signal(ThreadState::new());
        let (input, set_input) = signal(String::new());
        let (attachment, set_attachment) = signal(None::<Attachment>);
        let (is_sending, set_is_sending) = signal(false);

        let state = Self {
            session_id,
            thread,
            input,
            attachment,
            is_sending,
            set_thread,
            set_input,
            set_attachment,
            set_is_sending,
        };

        provide_context(state);
        state
    }

    /// Fetch the history once and replace the thread with the result.
    ///
    /// Failures are logged and leave the thread as it is; a completion that
    /// arrives after a newer one has been applied is dropped.
    pub fn refresh(&self) {
        let state = *self;
        let Some(ticket) = self
            .set_thread
            .try_maybe_update(|thread| (false, thread.begin_fetch()))
        else {
            return;
        };

        spawn_local(async move {
            match api::fetch_history(state.session_id).await {
                Ok(rows) => {
                    let fetched_at = Utc::now();
                    state
                        .set_thread
                        .maybe_update(|thread| thread.apply(ticket, &rows, fetched_at));
                }
                Err(e) => log::error!("Polling error: {e}"),
            }
        });
    }

    /// Fetch now and then every [`POLL_INTERVAL_MS`]. Polling lasts as long
    /// as the returned interval is alive.
    pub fn start_polling(&self) -> Interval {
        self.refresh();
        let state = *self;
        Interval::new(POLL_INTERVAL_MS, move || state.refresh())
    }

    /// Post the current input and attachment.
    ///
    /// The input box and attachment are cleared before the request goes out,
    /// whatever its outcome.
    pub fn send_message(&self) {
        let mut draft = Draft {
            text: self.input.get_untracked(),
            attachment: self.attachment.get_untracked(),
        };
        let Some(envelope) = draft.take_envelope(self.session_id) else {
            return;
        };

        self.set_input.set(draft.text);
        self.set_attachment.set(draft.attachment);
        self.set_is_sending.set(true);
        self.set_thread.maybe_update(|thread| {
            thread.mark_sent();
            false
        });

        let state = *self;
        spawn_local(async move {
            match api::send_message(&envelope).await {
                Ok(()) => {
                    Timeout::new(SEND_REFRESH_DELAY_MS, move || state.refresh()).forget();
                }
                Err(e) => log::error!("Failed to send: {e}"),
            }
            state.set_is_sending.set(false);
        });
    }
}
