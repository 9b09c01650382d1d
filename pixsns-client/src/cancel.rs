use std::{collections::HashMap, future::Future, sync::Arc};

use futures::future::{AbortHandle, Abortable};
use parking_lot::Mutex;

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("cancelled")]
pub struct Cancelled;

/// Identifies one fetch, so that only the latest one gets applied
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Ticket(pub(crate) u64);

#[derive(Default)]
struct State {
    cancelled: bool,
    next_id: u64,
    in_flight: HashMap<u64, AbortHandle>,
}

/// Ties requests to the lifetime of whoever issued them.
///
/// Once `cancel` is called every request running under this token is aborted
/// and new ones fail immediately.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<Mutex<State>>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        let mut s = self.0.lock();
        s.cancelled = true;
        for (_, h) in s.in_flight.drain() {
            h.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.lock().cancelled
    }

    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        let (handle, registration) = AbortHandle::new_pair();
        let id = {
            let mut s = self.0.lock();
            if s.cancelled {
                return Err(Cancelled);
            }
            let id = s.next_id;
            s.next_id += 1;
            s.in_flight.insert(id, handle);
            id
        };
        let res = Abortable::new(fut, registration).await;
        self.0.lock().in_flight.remove(&id);
        res.map_err(|_| Cancelled)
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.0.lock();
        f.debug_struct("CancelToken")
            .field("cancelled", &s.cancelled)
            .field("in_flight", &s.in_flight.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_until_cancelled() {
        let tok = CancelToken::new();
        assert_eq!(tok.run(async { 42 }).await, Ok(42));

        let (tx, rx) = futures::channel::oneshot::channel::<()>();
        let canceller = tok.clone();
        let waiting = tok.run(async move { rx.await.is_ok() });
        let cancelling = async move {
            tokio::task::yield_now().await;
            canceller.cancel();
            drop(tx);
        };
        let (res, ()) = futures::join!(waiting, cancelling);
        assert_eq!(res, Err(Cancelled));
        assert!(tok.is_cancelled());
        assert_eq!(tok.run(async { 1 }).await, Err(Cancelled));
    }
}
