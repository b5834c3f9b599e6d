//! Single-flight access token renewal
//!
//! At most one refresh call is in flight per coordinator. Requests that
//! hit a 401 while a refresh is running park on a oneshot channel and are
//! woken with the token that refresh produced.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<String>>,
}

/// Coordinates refresh calls between concurrent requests
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<State>,
}

/// Outcome of [`RefreshCoordinator::acquire_or_wait`]
#[derive(Debug)]
pub enum RefreshTicket<'a> {
    /// The caller must perform the refresh and settle the lease
    Leader(RefreshLease<'a>),
    /// A refresh is running; await the token it produces
    Waiter(RefreshWaiter),
}

/// Right to perform the one in-flight refresh.
///
/// Dropping the lease without calling [`RefreshLease::complete`] counts as
/// a failed refresh.
#[derive(Debug)]
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

/// Handle for a request parked behind a running refresh
#[derive(Debug)]
pub struct RefreshWaiter {
    receiver: oneshot::Receiver<String>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Become the refresh leader, or queue behind the running refresh
    pub fn acquire_or_wait(&self) -> RefreshTicket<'_> {
        let mut state = self.state();
        if state.refreshing {
            let (sender, receiver) = oneshot::channel();
            state.waiters.push(sender);
            debug!("Refresh in flight, {} request(s) waiting", state.waiters.len());
            RefreshTicket::Waiter(RefreshWaiter { receiver })
        } else {
            state.refreshing = true;
            RefreshTicket::Leader(RefreshLease {
                coordinator: self,
                settled: false,
            })
        }
    }

    /// Whether a refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.state().refreshing
    }

    /// Number of requests parked behind the running refresh
    pub fn waiting(&self) -> usize {
        self.state().waiters.len()
    }

    fn release(&self, token: Option<&str>) {
        let waiters = {
            let mut state = self.state();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        match token {
            Some(token) => {
                debug!("Refresh succeeded, waking {} waiter(s)", waiters.len());
                for waiter in waiters {
                    // A waiter whose request future was dropped is not an error
                    let _ = waiter.send(token.to_string());
                }
            }
            // Dropping the senders fails every waiter
            None => debug!("Refresh failed, failing {} waiter(s)", waiters.len()),
        }
    }
}

impl RefreshLease<'_> {
    /// Publish the new access token and return to idle
    pub fn complete(mut self, token: &str) {
        self.settled = true;
        self.coordinator.release(Some(token));
    }

    /// Fail all waiters and return to idle
    pub fn fail(mut self) {
        self.settled = true;
        self.coordinator.release(None);
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.release(None);
        }
    }
}

impl RefreshWaiter {
    /// Wait for the running refresh. `None` means it failed.
    pub async fn wait(self) -> Option<String> {
        self.receiver.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(coordinator: &RefreshCoordinator) -> RefreshLease<'_> {
        match coordinator.acquire_or_wait() {
            RefreshTicket::Leader(lease) => lease,
            RefreshTicket::Waiter(_) => panic!("expected to lead the refresh"),
        }
    }

    fn waiter(coordinator: &RefreshCoordinator) -> RefreshWaiter {
        match coordinator.acquire_or_wait() {
            RefreshTicket::Waiter(waiter) => waiter,
            RefreshTicket::Leader(_) => panic!("expected to wait for the refresh"),
        }
    }

    #[tokio::test]
    async fn test_single_leader_and_waiters_get_token() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(&coordinator);
        assert!(coordinator.is_refreshing());

        let first = waiter(&coordinator);
        let second = waiter(&coordinator);
        assert_eq!(coordinator.waiting(), 2);

        lease.complete("new-token");

        assert!(!coordinator.is_refreshing());
        assert_eq!(coordinator.waiting(), 0);
        assert_eq!(first.wait().await.as_deref(), Some("new-token"));
        assert_eq!(second.wait().await.as_deref(), Some("new-token"));
    }

    #[tokio::test]
    async fn test_failure_fails_waiters() {
        let coordinator = RefreshCoordinator::new();
        let lease = leader(&coordinator);
        let parked = waiter(&coordinator);

        lease.fail();

        assert!(!coordinator.is_refreshing());
        assert_eq!(parked.wait().await, None);
    }

    #[tokio::test]
    async fn test_dropped_lease_counts_as_failure() {
        let coordinator = RefreshCoordinator::new();
        let parked = {
            let _lease = leader(&coordinator);
            waiter(&coordinator)
        };

        assert!(!coordinator.is_refreshing());
        assert_eq!(parked.wait().await, None);
    }

    #[tokio::test]
    async fn test_waiters_only_see_their_own_refresh() {
        let coordinator = RefreshCoordinator::new();

        let lease = leader(&coordinator);
        let early = waiter(&coordinator);
        lease.complete("first");

        let lease = leader(&coordinator);
        let late = waiter(&coordinator);
        lease.complete("second");

        assert_eq!(early.wait().await.as_deref(), Some("first"));
        assert_eq!(late.wait().await.as_deref(), Some("second"));
    }
}
