//! Displayed thread state and the rules for replacing it.
//!
//! Each completed history fetch overwrites the whole list. There is no merge:
//! the webhook's store is the only source of truth and a thread is small.

use chrono::{DateTime, Utc};

use crate::history::to_displayed;
use crate::models::{DisplayedMessage, MessageRole, StoredMessage};

/// Distance from the bottom of the scroll area, in pixels, within which new
/// messages keep the view pinned to the newest one.
pub const AUTO_SCROLL_THRESHOLD_PX: f64 = 150.0;

/// Handed out when a fetch is issued and presented back when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ThreadState {
    messages: Vec<DisplayedMessage>,
    issued: u64,
    applied: u64,
    force_scroll: bool,
}

impl ThreadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[DisplayedMessage] {
        &self.messages
    }

    /// Reserves the next sequence number for a fetch about to be sent.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// Replaces the thread with a completed fetch.
    ///
    /// A completion older than one already applied is dropped, so a slow
    /// request can never overwrite a newer result. Returns whether the thread
    /// was replaced.
    pub fn apply(
        &mut self,
        ticket: FetchTicket,
        rows: &[StoredMessage],
        fetched_at: DateTime<Utc>,
    ) -> bool {
        if ticket.0 <= self.applied {
            log::debug!(
                "Ignoring stale history fetch #{} (already applied #{})",
                ticket.0,
                self.applied
            );
            return false;
        }
        self.applied = ticket.0;
        self.messages = to_displayed(rows, fetched_at);
        true
    }

    /// Asks the next scroll check to jump to the bottom unconditionally.
    pub fn mark_sent(&mut self) {
        self.force_scroll = true;
    }

    /// Decides whether to scroll to the newest message after a change, and
    /// consumes the forced-scroll flag if it did.
    pub fn take_scroll_request(&mut self, near_bottom: bool) -> bool {
        if self.force_scroll || near_bottom {
            self.force_scroll = false;
            true
        } else {
            false
        }
    }

    /// The assistant has not yet answered the newest message.
    pub fn is_agent_thinking(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.role == MessageRole::User)
    }
}

pub fn is_near_bottom(scroll_height: f64, scroll_top: f64, client_height: f64) -> bool {
    scroll_height - scroll_top - client_height < AUTO_SCROLL_THRESHOLD_PX
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<StoredMessage> {
        (0..n)
            .map(|i| StoredMessage {
                id: Some(format!("m{i}")),
                role: if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant },
                content: format!("message {i}"),
                created_at: None,
            })
            .collect()
    }

    #[test]
    fn every_poll_overwrites_the_list() {
        let mut thread = ThreadState::new();
        for n in [3, 5, 2, 0, 4] {
            let ticket = thread.begin_fetch();
            assert!(thread.apply(ticket, &rows(n), Utc::now()));
            assert_eq!(thread.messages().len(), n);
        }
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut thread = ThreadState::new();
        let slow = thread.begin_fetch();
        let fast = thread.begin_fetch();

        assert!(thread.apply(fast, &rows(4), Utc::now()));
        assert!(!thread.apply(slow, &rows(1), Utc::now()));
        assert_eq!(thread.messages().len(), 4);
    }

    #[test]
    fn forced_scroll_is_consumed_once() {
        let mut thread = ThreadState::new();
        assert!(!thread.take_scroll_request(false));
        thread.mark_sent();
        assert!(thread.take_scroll_request(false));
        assert!(!thread.take_scroll_request(false));
        assert!(thread.take_scroll_request(true));
    }

    #[test]
    fn thinking_while_last_message_is_from_user() {
        let mut thread = ThreadState::new();
        assert!(!thread.is_agent_thinking());
        let t = thread.begin_fetch();
        thread.apply(t, &rows(3), Utc::now());
        assert!(thread.is_agent_thinking());
        let t = thread.begin_fetch();
        thread.apply(t, &rows(2), Utc::now());
        assert!(!thread.is_agent_thinking());
    }

    #[test]
    fn near_bottom_threshold() {
        assert!(is_near_bottom(1000.0, 500.0, 400.0));
        assert!(!is_near_bottom(1000.0, 400.0, 400.0));
        assert!(!is_near_bottom(2000.0, 0.0, 400.0));
    }
}
