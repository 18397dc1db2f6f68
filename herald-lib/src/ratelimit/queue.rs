//! First-in, first-out admission for the requests of one route.
//!
//! Every request takes a numbered ticket when it is admitted. The queue
//! publishes the ticket currently being served through a
//! [`tokio::sync::watch`] channel and each waiter re-checks that value
//! whenever it changes, so a waiter never depends on a single notification
//! reaching it and never spins.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Per-route FIFO queue handing out [`AdmissionToken`]s.
#[derive(Debug, Clone)]
pub struct SequencedQueue {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    /// Bookkeeping; `serving` is only ever changed while this lock is held
    tickets: Mutex<Tickets>,
    /// Ticket currently at the head of the queue
    serving: watch::Sender<u64>,
}

#[derive(Debug, Default)]
struct Tickets {
    /// Ticket handed to the next admitted request
    next: u64,
    /// Tickets whose owners went away before reaching the head
    abandoned: BTreeSet<u64>,
}

impl Default for SequencedQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencedQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        let (serving, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                tickets: Mutex::new(Tickets::default()),
                serving,
            }),
        }
    }

    /// Append a request to the tail of the queue.
    ///
    /// Returns immediately; the position is fixed at this point.
    #[must_use = "dropping the token gives up the queue position"]
    pub fn admit(&self) -> AdmissionToken {
        let mut tickets = self.shared.lock();
        let ticket = tickets.next;
        tickets.next += 1;

        AdmissionToken {
            ticket,
            shared: Some(Arc::clone(&self.shared)),
        }
    }

    /// Wait until `token` is at the head of the queue, i.e. every request
    /// admitted before it has been released.
    pub async fn await_turn(&self, token: &AdmissionToken) {
        debug_assert!(token.belongs_to(self), "token was admitted by another queue");

        let mut serving = self.shared.serving.subscribe();
        // The sender lives as long as `self`, so this only returns once the
        // condition holds.
        let _ = serving.wait_for(|&head| head == token.ticket).await;
    }

    /// Remove the head of the queue and let the next request through.
    ///
    /// Consumes the token, so a request can release at most once. Dropping
    /// an unreleased token releases it as well.
    pub fn release(&self, token: AdmissionToken) {
        debug_assert!(token.belongs_to(self), "token was admitted by another queue");
        token.release();
    }

    /// Number of admitted requests that have not been released yet
    #[must_use]
    pub fn len(&self) -> usize {
        let tickets = self.shared.lock();
        let serving = *self.shared.serving.borrow();
        let pending = tickets.next.saturating_sub(serving);
        usize::try_from(pending)
            .unwrap_or(usize::MAX)
            .saturating_sub(tickets.abandoned.len())
    }

    /// Whether no request is waiting or being served
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the route has nothing queued, so a new request is sent right away
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.is_empty()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Tickets> {
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Give up `ticket`: advance the head if it is being served, otherwise
    /// remember it so that the head skips over it later.
    fn leave(&self, ticket: u64) {
        let mut tickets = self.lock();
        let head = *self.serving.borrow();

        if ticket != head {
            tickets.abandoned.insert(ticket);
            return;
        }

        let mut next = head + 1;
        while tickets.abandoned.remove(&next) {
            next += 1;
        }
        self.serving.send_replace(next);
    }
}

/// A request's position in a [`SequencedQueue`].
///
/// Released exactly once: explicitly through [`SequencedQueue::release`] or
/// implicitly on drop, whichever comes first.
#[derive(Debug)]
pub struct AdmissionToken {
    ticket: u64,
    shared: Option<Arc<Shared>>,
}

impl AdmissionToken {
    /// Position of this token in its queue, starting at zero
    #[must_use]
    pub const fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Whether this token is currently at the head of its queue
    #[must_use]
    pub fn is_at_head(&self) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|shared| *shared.serving.borrow() == self.ticket)
    }

    fn belongs_to(&self, queue: &SequencedQueue) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|shared| Arc::ptr_eq(shared, &queue.shared))
    }

    fn release(mut self) {
        if let Some(shared) = self.shared.take() {
            shared.leave(self.ticket);
        }
    }
}

impl Drop for AdmissionToken {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.leave(self.ticket);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_first_token_is_at_head() {
        let queue = SequencedQueue::new();
        let first = queue.admit();
        let second = queue.admit();

        assert!(first.is_at_head());
        assert!(!second.is_at_head());
        assert_eq!(queue.len(), 2);

        queue.await_turn(&first).await;
        queue.release(first);

        assert!(second.is_at_head());
        assert_eq!(queue.len(), 1);
        queue.release(second);
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn test_waiter_blocks_until_release() {
        let queue = SequencedQueue::new();
        let first = queue.admit();
        let second = queue.admit();

        let blocked = timeout(Duration::from_millis(50), queue.await_turn(&second)).await;
        assert!(blocked.is_err(), "second token must wait for the first");

        queue.release(first);
        timeout(Duration::from_millis(50), queue.await_turn(&second))
            .await
            .expect("second token should be at the head now");
    }

    #[tokio::test]
    async fn test_turns_follow_admission_order() {
        let queue = SequencedQueue::new();
        let order = Arc::new(StdMutex::new(Vec::new()));

        let tokens: Vec<_> = (0..20).map(|_| queue.admit()).collect();
        let mut handles = Vec::new();
        // Spawn in reverse so that scheduling order differs from admission order
        for (i, token) in tokens.into_iter().enumerate().rev() {
            let queue = queue.clone();
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                queue.await_turn(&token).await;
                order.lock().unwrap().push(i);
                tokio::task::yield_now().await;
                queue.release(token);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), (0..20).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_drop_releases_head() {
        let queue = SequencedQueue::new();
        let first = queue.admit();
        let second = queue.admit();

        drop(first);
        assert!(second.is_at_head());
    }

    #[tokio::test]
    async fn test_abandoned_tokens_are_skipped() {
        let queue = SequencedQueue::new();
        let first = queue.admit();
        let second = queue.admit();
        let third = queue.admit();
        let fourth = queue.admit();

        // Give up places before reaching the head
        drop(second);
        drop(third);
        assert_eq!(queue.len(), 2);

        queue.release(first);
        assert!(fourth.is_at_head());
        timeout(Duration::from_millis(50), queue.await_turn(&fourth))
            .await
            .expect("abandoned tokens must not block the queue");
        queue.release(fourth);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_queues_are_independent() {
        let a = SequencedQueue::new();
        let b = SequencedQueue::new();

        let _held = a.admit();
        let other = b.admit();
        timeout(Duration::from_millis(50), b.await_turn(&other))
            .await
            .expect("a busy queue must not block another queue");
    }

    #[tokio::test]
    async fn test_tickets_are_sequential() {
        let queue = SequencedQueue::new();
        let tickets: Vec<_> = (0..3).map(|_| queue.admit()).collect();
        assert_eq!(
            tickets.iter().map(AdmissionToken::ticket).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }
}
