//! The reconciliation loop: poll the history webhook, replace the thread.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::api::WebhookClient;
use crate::config::SEND_REFRESH_DELAY;
use crate::envelope::Draft;
use crate::models::DisplayedMessage;
use crate::thread::ThreadState;

/// One chat session: the webhook client, the session id and the displayed
/// thread shared with every view.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<Inner>,
}

struct Inner {
    client: WebhookClient,
    session_id: String,
    thread: watch::Sender<ThreadState>,
}

impl ChatSession {
    pub fn new(client: WebhookClient, session_id: impl Into<String>) -> Self {
        let (thread, _) = watch::channel(ThreadState::new());
        Self {
            inner: Arc::new(Inner {
                client,
                session_id: session_id.into(),
                thread,
            }),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// A receiver that wakes whenever the displayed thread is replaced.
    pub fn subscribe(&self) -> watch::Receiver<ThreadState> {
        self.inner.thread.subscribe()
    }

    pub fn messages(&self) -> Vec<DisplayedMessage> {
        self.inner.thread.borrow().messages().to_vec()
    }

    /// Fetches the history once and replaces the thread with it.
    ///
    /// Returns `true` if the thread was replaced. A failed fetch leaves the
    /// current thread untouched; a completion that lost the race against a
    /// newer fetch is discarded.
    pub async fn refresh(&self) -> bool {
        let mut ticket = None;
        self.inner.thread.send_if_modified(|thread| {
            ticket = Some(thread.begin_fetch());
            false
        });
        let Some(ticket) = ticket else {
            return false;
        };

        match self.inner.client.try_fetch_history(&self.inner.session_id).await {
            Ok(rows) => {
                let fetched_at = Utc::now();
                self.inner
                    .thread
                    .send_if_modified(|thread| thread.apply(ticket, &rows, fetched_at))
            }
            Err(e) => {
                warn!("Polling error (fetch #{}): {e}", ticket.seq());
                false
            }
        }
    }

    /// Starts polling: one fetch right away, then one every `period`.
    ///
    /// Each tick's fetch runs on its own task, so a request that hangs never
    /// holds back the next tick. Polling stops, and in-flight fetches are
    /// cancelled, when the returned handle is dropped.
    pub fn start_polling(&self, period: Duration) -> PollerHandle {
        let session = self.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut in_flight = JoinSet::new();
            loop {
                interval.tick().await;
                while in_flight.try_join_next().is_some() {}
                let session = session.clone();
                in_flight.spawn(async move {
                    session.refresh().await;
                });
            }
        });
        info!("History polling started every {}ms", period.as_millis());
        PollerHandle { task }
    }

    /// Sends the draft without waiting for the webhook.
    ///
    /// The draft is emptied before anything goes over the network, whatever
    /// the outcome. Once the post completes, whatever the status it was
    /// answered with, one extra fetch runs after a short delay so the reply
    /// shows up before the next poll tick. Returns `None` if the draft had
    /// nothing to send.
    pub fn send(&self, draft: &mut Draft) -> Option<JoinHandle<()>> {
        let envelope = draft.take_envelope(&self.inner.session_id)?;
        self.inner.thread.send_if_modified(|thread| {
            thread.mark_sent();
            false
        });

        let session = self.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = session.inner.client.submit(&envelope).await {
                error!("Failed to send: {e}");
                return;
            }
            debug!("Message posted, refreshing in {}ms", SEND_REFRESH_DELAY.as_millis());
            tokio::time::sleep(SEND_REFRESH_DELAY).await;
            session.refresh().await;
        }))
    }
}

/// Owns the polling task; dropping it stops the loop.
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!("History polling stopped");
    }
}
