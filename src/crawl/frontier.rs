// src/crawl/frontier.rs
// =============================================================================
// The crawl frontier: a FIFO work queue of (url, depth) items shared by all
// workers of one run.
//
// Besides the queue itself the frontier counts "unfinished" items: every push
// adds one, every task_done() removes one. An item stays unfinished from the
// moment it is pushed until the worker that popped it has finished with it,
// including pushing any links it found. The frontier is DRAINED when that
// count reaches zero: the queue is empty and no worker can add more work.
//
// Waiting:
// - pop() sleeps until an item shows up, the frontier drains, or the run's
//   stop token is cancelled
// - drained() sleeps until the frontier drains
//
// Rust concepts:
// - tokio::sync::Notify: wakes sleeping tasks without holding a lock
// - CancellationToken: a cloneable "stop now" flag tasks can await
// =============================================================================

use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// One unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierItem {
    pub url: String,
    /// Link hops from the seed this URL was reached from
    pub depth: usize,
}

impl FrontierItem {
    pub fn new(url: impl Into<String>, depth: usize) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<FrontierItem>,
    unfinished: usize,
}

#[derive(Debug)]
pub struct Frontier {
    state: Mutex<QueueState>,
    // Pushes wake one popper; draining wakes everyone
    item_ready: Notify,
    drain_signal: Notify,
    stop: CancellationToken,
}

impl Frontier {
    /// Creates an empty frontier whose waits end when `stop` is cancelled
    pub fn new(stop: CancellationToken) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            item_ready: Notify::new(),
            drain_signal: Notify::new(),
            stop,
        }
    }

    /// Enqueues an item. Never blocks.
    pub fn push(&self, item: FrontierItem) {
        {
            let mut state = self.state.lock();
            state.items.push_back(item);
            state.unfinished += 1;
        }
        self.item_ready.notify_one();
    }

    /// Waits for the next item.
    ///
    /// Returns None once the frontier is drained or the stop token fires.
    pub async fn pop(&self) -> Option<FrontierItem> {
        loop {
            // Register interest before looking at the queue so a push that
            // lands in between still wakes us
            let notified = self.item_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.stop.is_cancelled() {
                return None;
            }

            {
                let mut state = self.state.lock();
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.unfinished == 0 {
                    return None;
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = self.stop.cancelled() => return None,
            }
        }
    }

    /// Marks one popped item as fully processed
    pub fn task_done(&self) {
        let drained = {
            let mut state = self.state.lock();
            if state.unfinished == 0 {
                warn!("task_done called more times than items were pushed");
                return;
            }
            state.unfinished -= 1;
            state.unfinished == 0
        };

        if drained {
            // Idle poppers must see the drain too, not just drained() waiters
            self.item_ready.notify_waiters();
            self.drain_signal.notify_waiters();
        }
    }

    /// Resolves once the queue is empty and every popped item is done
    pub async fn drained(&self) {
        loop {
            let notified = self.drain_signal.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_drained() {
                return;
            }

            notified.await;
        }
    }

    pub fn is_drained(&self) -> bool {
        self.state.lock().unfinished == 0
    }

    /// Items waiting in the queue (not counting ones being processed)
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items pushed but not yet marked done
    #[cfg(test)]
    pub fn unfinished(&self) -> usize {
        self.state.lock().unfinished
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why count unfinished items instead of just checking is_empty()?
//    - A worker that just popped the last item leaves the queue empty
//    - That worker may still push the links it finds on the page
//    - Only when it calls task_done() is the run really out of work
//
// 2. Why two Notify values?
//    - notify_one() hands its wakeup to a single waiter
//    - If drained() waiters shared it with poppers, a push could wake the
//      drained() waiter and leave a popper asleep next to a full queue
//
// 3. What does enable() do?
//    - A Notified future normally starts listening on its first poll
//    - enable() starts listening right away, before we inspect the queue
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let frontier = Frontier::new(CancellationToken::new());
        frontier.push(FrontierItem::new("http://a.onion/", 0));
        frontier.push(FrontierItem::new("http://b.onion/", 1));

        assert_eq!(frontier.pop().await.unwrap().url, "http://a.onion/");
        assert_eq!(frontier.pop().await.unwrap().url, "http://b.onion/");
        assert_eq!(frontier.unfinished(), 2);
    }

    #[tokio::test]
    async fn test_pop_on_fresh_frontier_is_drained() {
        let frontier = Frontier::new(CancellationToken::new());
        assert!(frontier.is_drained());
        assert_eq!(frontier.pop().await, None);
    }

    #[tokio::test]
    async fn test_not_drained_while_item_in_flight() {
        let frontier = Frontier::new(CancellationToken::new());
        frontier.push(FrontierItem::new("http://a.onion/", 0));

        let item = frontier.pop().await.unwrap();
        assert!(frontier.is_empty());
        assert!(!frontier.is_drained());

        // The in-flight item produces a child before it is done
        frontier.push(FrontierItem::new("http://b.onion/", item.depth + 1));
        frontier.task_done();
        assert!(!frontier.is_drained());

        assert_eq!(frontier.pop().await.unwrap().depth, 1);
        frontier.task_done();
        assert!(frontier.is_drained());
    }

    #[tokio::test]
    async fn test_blocked_pop_wakes_on_push() {
        let frontier = Arc::new(Frontier::new(CancellationToken::new()));
        frontier.push(FrontierItem::new("http://seed.onion/", 0));
        let seed = frontier.pop().await.unwrap();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.pop().await })
        };
        tokio::task::yield_now().await;

        frontier.push(FrontierItem::new("http://child.onion/", seed.depth + 1));
        let popped = waiter.await.unwrap();
        assert_eq!(popped.unwrap().url, "http://child.onion/");
    }

    #[tokio::test]
    async fn test_blocked_pop_wakes_on_drain() {
        let frontier = Arc::new(Frontier::new(CancellationToken::new()));
        frontier.push(FrontierItem::new("http://seed.onion/", 0));
        frontier.pop().await.unwrap();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.pop().await })
        };
        tokio::task::yield_now().await;

        frontier.task_done();
        assert_eq!(waiter.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blocked_pop_wakes_on_stop() {
        let stop = CancellationToken::new();
        let frontier = Arc::new(Frontier::new(stop.clone()));
        frontier.push(FrontierItem::new("http://seed.onion/", 0));
        frontier.pop().await.unwrap();

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.pop().await })
        };
        tokio::task::yield_now().await;

        stop.cancel();
        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("pop returned after stop");
        assert_eq!(result.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pop_after_stop_ignores_queued_items() {
        let stop = CancellationToken::new();
        let frontier = Frontier::new(stop.clone());
        frontier.push(FrontierItem::new("http://a.onion/", 0));
        stop.cancel();
        assert_eq!(frontier.pop().await, None);
    }

    #[tokio::test]
    async fn test_drained_resolves_after_last_task_done() {
        let frontier = Arc::new(Frontier::new(CancellationToken::new()));
        frontier.push(FrontierItem::new("http://a.onion/", 0));
        frontier.pop().await.unwrap();

        let watcher = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.drained().await })
        };
        tokio::task::yield_now().await;
        assert!(!watcher.is_finished());

        frontier.task_done();
        tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .expect("drained() resolved")
            .unwrap();
    }

    #[test]
    fn test_extra_task_done_is_ignored() {
        let frontier = Frontier::new(CancellationToken::new());
        frontier.task_done();
        assert_eq!(frontier.unfinished(), 0);
    }
}
