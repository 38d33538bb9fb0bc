//! Pending asynchronous results
//!
//! A [`Pending`] is a shareable, settle-once result cell. The producing side
//! holds the matching [`Resolver`]; consumers can block on it
//! ([`Pending::wait`]), register a continuation ([`Pending::on_settle`],
//! [`Pending::map`]) or `.await` it.
//!
//! ## State machine
//!
//! ```text
//! Waiting ──resolve──▶ Settled(Ok(value))
//!    └─────reject───▶ Settled(Err(error))
//! ```
//!
//! There is no cancellation. Dropping the `Resolver` without settling leaves
//! the result waiting forever.
//!
//! Continuations run on the thread that settles the result, after the
//! internal lock is released, or immediately on the registering thread when
//! the result is already settled.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::{FacadeError, FacadeResult};
use crate::value::Value;

/// Final result of a pending value
pub type Outcome = FacadeResult<Value>;

type Continuation = Box<dyn FnOnce(&Outcome) + Send>;

/// Unique identifier for a pending result
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PendingId(u64);

static NEXT_PENDING_ID: AtomicU64 = AtomicU64::new(1);

impl PendingId {
    fn next() -> Self {
        PendingId(NEXT_PENDING_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

enum PendingState {
    Waiting {
        continuations: Vec<Continuation>,
        wakers: Vec<Waker>,
    },
    Settled(Outcome),
}

struct PendingInner {
    id: PendingId,
    state: Mutex<PendingState>,
    settled: Condvar,
}

/// Shared handle to a pending result; equality is identity
#[derive(Clone)]
pub struct Pending(Arc<PendingInner>);

/// Settling side of a [`Pending`]
pub struct Resolver {
    pending: Pending,
}

impl Pending {
    /// Create a waiting result and its resolver
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Pending, Resolver) {
        let pending = Pending(Arc::new(PendingInner {
            id: PendingId::next(),
            state: Mutex::new(PendingState::Waiting {
                continuations: Vec::new(),
                wakers: Vec::new(),
            }),
            settled: Condvar::new(),
        }));
        let resolver = Resolver {
            pending: pending.clone(),
        };
        (pending, resolver)
    }

    /// Create an already fulfilled result
    pub fn fulfilled(value: impl Into<Value>) -> Pending {
        let (pending, resolver) = Pending::new();
        resolver.resolve(value);
        pending
    }

    /// Create an already rejected result
    pub fn rejected(error: FacadeError) -> Pending {
        let (pending, resolver) = Pending::new();
        resolver.reject(error);
        pending
    }

    /// Pending ID
    pub fn id(&self) -> PendingId {
        self.0.id
    }

    /// Check two handles refer to the same result
    pub fn ptr_eq(&self, other: &Pending) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Check if the result has settled
    pub fn is_settled(&self) -> bool {
        matches!(*self.0.state.lock(), PendingState::Settled(_))
    }

    /// Peek at the outcome without blocking
    pub fn outcome(&self) -> Option<Outcome> {
        match &*self.0.state.lock() {
            PendingState::Settled(outcome) => Some(outcome.clone()),
            PendingState::Waiting { .. } => None,
        }
    }

    /// Run `f` once the result settles
    pub fn on_settle<F>(&self, f: F)
    where
        F: FnOnce(&Outcome) + Send + 'static,
    {
        let outcome = {
            let mut state = self.0.state.lock();
            match &mut *state {
                PendingState::Waiting { continuations, .. } => {
                    continuations.push(Box::new(f));
                    return;
                }
                PendingState::Settled(outcome) => outcome.clone(),
            }
        };
        f(&outcome);
    }

    /// Derive a new result that applies `f` to a successful value.
    ///
    /// Failures are propagated unchanged.
    pub fn map<F>(&self, f: F) -> Pending
    where
        F: FnOnce(Value) -> Value + Send + 'static,
    {
        let (mapped, resolver) = Pending::new();
        self.on_settle(move |outcome| match outcome {
            Ok(value) => resolver.resolve(f(value.clone())),
            Err(error) => resolver.reject(error.clone()),
        });
        mapped
    }

    /// Block until the result settles
    pub fn wait(&self) -> Outcome {
        let mut state = self.0.state.lock();
        loop {
            if let PendingState::Settled(outcome) = &*state {
                return outcome.clone();
            }
            self.0.settled.wait(&mut state);
        }
    }

    /// Block until the result settles or `timeout` elapses
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome> {
        let mut state = self.0.state.lock();
        if let PendingState::Waiting { .. } = &*state {
            self.0.settled.wait_for(&mut state, timeout);
        }
        match &*state {
            PendingState::Settled(outcome) => Some(outcome.clone()),
            PendingState::Waiting { .. } => None,
        }
    }

    fn settle(&self, outcome: Outcome) {
        let mut state = self.0.state.lock();
        let previous = std::mem::replace(&mut *state, PendingState::Settled(outcome.clone()));
        self.0.settled.notify_all();
        drop(state);

        if let PendingState::Waiting {
            continuations,
            wakers,
        } = previous
        {
            for continuation in continuations {
                continuation(&outcome);
            }
            for waker in wakers {
                waker.wake();
            }
        }
    }
}

impl Future for Pending {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        let mut state = self.0.state.lock();
        match &mut *state {
            PendingState::Settled(outcome) => Poll::Ready(outcome.clone()),
            PendingState::Waiting { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0.state.lock() {
            PendingState::Waiting { continuations, .. } => write!(
                f,
                "Pending(#{}, waiting, {} continuations)",
                self.0.id.0,
                continuations.len()
            ),
            PendingState::Settled(Ok(value)) => {
                write!(f, "Pending(#{}, fulfilled: {:?})", self.0.id.0, value)
            }
            PendingState::Settled(Err(error)) => {
                write!(f, "Pending(#{}, rejected: {})", self.0.id.0, error)
            }
        }
    }
}

impl Resolver {
    /// The result this resolver settles
    pub fn pending(&self) -> &Pending {
        &self.pending
    }

    /// Fulfill with a value
    pub fn resolve(self, value: impl Into<Value>) {
        self.pending.settle(Ok(value.into()));
    }

    /// Reject with an error
    pub fn reject(self, error: FacadeError) {
        self.pending.settle(Err(error));
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resolver({:?})", self.pending)
    }
}
