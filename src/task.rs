//! Lazily-started single-result asynchronous value.
//!
//! A [`Task`] wraps a not-yet-started body: construction runs none of its
//! side effects, and the first consumption (awaiting the task, a reference to
//! it, or its [`when_ready`][Task::when_ready] future) starts it. Once the
//! body first suspends, completion is brokered by a three-state atom so that
//! exactly one party resumes the consumer:
//!
//!   - if the consumer registers its waker before the body completes, the
//!     body's completing poll wakes it exactly once;
//!   - if the body completes first, the consumer's poll observes completion
//!     and returns ready without suspending.
//!
//! The body itself is re-polled synchronously on whichever thread wakes it,
//! via a self-resuming waker handle.

use_prelude!();

use ::core::{
    ops::Not,
    sync::atomic::{AtomicBool, AtomicU8, Ordering},
    task::Waker,
};
use ::std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, PoisonError},
};

use ::futures::task::ArcWake;

use crate::utils::result_cell::ResultCell;

/// No consumer registered, body not complete.
const INITIAL: u8 = 0;
/// A consumer waker is registered and must be woken on completion.
const ATTACHED: u8 = 1;
/// The body has completed (normally or abnormally).
const COMPLETED: u8 = 2;

/// A lazily-started asynchronous computation producing a single result.
///
/// Constructed cold with [`Task::new`]; started by its first consumption.
/// Awaiting `&task` yields `&T` and leaves the result stored (so a task may
/// be awaited any number of times by reference); awaiting the task by value
/// moves the result out.
///
/// [`Task::default`] is the *empty* task, holding no computation; consuming
/// one raises [`BrokenPromise`][crate::BrokenPromise] (or terminates the
/// process for [`NoFail`] tasks). `::core::mem::take` thus expresses
/// moving a task out of a slot, leaving an empty one behind.
#[must_use = "a task is lazy: it does nothing until awaited"]
pub
struct Task<T, M : FailureMode = Fallible> {
    raw: Option<Arc<RawTask<T, M>>>,
}

/// A [`Task`] whose body promises not to panic.
pub
type NoFailTask<T> = Task<T, NoFail>;

impl<T : Send + 'static> Task<T> {
    /// Wraps `body` into a cold task. None of `body`'s side effects run
    /// until the task is first consumed.
    pub
    fn new (body: impl Future<Output = T> + Send + 'static)
      -> Self
    {
        Self::with_failure_mode(body)
    }
}

impl<T : Send + 'static, M : FailureMode> Task<T, M> {
    /// Wraps `body` into a cold task with an explicit [`FailureMode`].
    pub
    fn with_failure_mode (body: impl Future<Output = T> + Send + 'static)
      -> Self
    {
        Self {
            raw: Some(Arc::new(RawTask {
                body: Mutex::new(Some(Box::pin(body))),
                notified: AtomicBool::new(false),
                started: AtomicBool::new(false),
                state: AtomicU8::new(INITIAL),
                continuation: Mutex::new(None),
                result: ResultCell::empty(),
                panic: PanicSlot::new(),
                _mode: PhantomData,
            })),
        }
    }

    /// Whether consuming the task would complete without suspending.
    ///
    /// `true` for an empty task and for a completed one. Never starts the
    /// body.
    pub
    fn is_ready (self: &'_ Self)
      -> bool
    {
        match &self.raw {
            | None => true,
            | Some(raw) => raw.is_complete(),
        }
    }

    /// A reference to the completed result.
    ///
    /// # Panics
    ///
    /// Raises [`BrokenPromise`][crate::BrokenPromise] on an empty task,
    /// re-raises the body's panic if it completed abnormally, and panics if
    /// the body has not completed yet.
    pub
    fn result (self: &'_ Self)
      -> &'_ T
    {
        let raw = match &self.raw {
            | Some(it) => it,
            | None => M::broken_promise(),
        };
        assert!(raw.is_complete(), "`result()` called before completion");
        raw.panic.rethrow_if_panicked();
        // SAFETY: completion observed with `Acquire` just above; by-ref
        // consumption never `take`s.
        unsafe { raw.result.get() }
            .expect("task result already moved out")
    }

    /// A future that completes when the task does, without touching the
    /// result. Starts the body. Completes immediately on an empty task.
    pub
    fn when_ready (self: &'_ Self)
      -> WhenReady<'_, T, M>
    {
        WhenReady { raw: self.raw.as_ref() }
    }
}

impl<T, M : FailureMode> Default for Task<T, M> {
    /// The empty task: ready, but consuming it raises
    /// [`BrokenPromise`][crate::BrokenPromise].
    fn default ()
      -> Self
    {
        Self { raw: None }
    }
}

impl<T, M : FailureMode> Drop for Task<T, M> {
    fn drop (self: &'_ mut Self)
    {
        if let Some(raw) = &self.raw {
            raw.abandon();
        }
    }
}

/// Future returned by [`Task::when_ready`].
#[must_use = "futures do nothing unless polled"]
pub
struct WhenReady<'task, T, M : FailureMode> {
    raw: Option<&'task Arc<RawTask<T, M>>>,
}

impl<'task, T : Send + 'static, M : FailureMode>
    Future
for
    WhenReady<'task, T, M>
{
    type Output = ();

    fn poll (self: Pin<&'_ mut Self>, cx: &'_ mut Context<'_>)
      -> Poll<()>
    {
        match self.get_mut().raw {
            | None => Poll::Ready(()),
            | Some(raw) => raw.poll_complete(cx),
        }
    }
}

impl<'task, T : Send + 'static, M : FailureMode>
    Future
for
    &'task Task<T, M>
{
    type Output = &'task T;

    fn poll (self: Pin<&'_ mut Self>, cx: &'_ mut Context<'_>)
      -> Poll<&'task T>
    {
        let this: &'task Task<T, M> = *self.get_mut();
        let raw = match &this.raw {
            | Some(it) => it,
            | None => M::broken_promise(),
        };
        ::futures::ready!(raw.poll_complete(cx));
        raw.panic.rethrow_if_panicked();
        // SAFETY: `poll_complete` returned `Ready`, which observed the
        // completed state with `Acquire`; by-ref consumption never `take`s.
        let result =
            unsafe { raw.result.get() }
                .expect("task result already moved out")
        ;
        Poll::Ready(result)
    }
}

impl<T : Send + 'static, M : FailureMode>
    Future
for
    Task<T, M>
{
    type Output = T;

    fn poll (self: Pin<&'_ mut Self>, cx: &'_ mut Context<'_>)
      -> Poll<T>
    {
        let this = self.get_mut();
        let raw = match &this.raw {
            | Some(it) => it,
            | None => M::broken_promise(),
        };
        ::futures::ready!(raw.poll_complete(cx));
        raw.panic.rethrow_if_panicked();
        // SAFETY: completion observed with `Acquire`; the by-value flavor is
        // the sole consumer from this point on (`Task` is not `Clone`).
        let result =
            unsafe { raw.result.take() }
                .expect("task result already moved out")
        ;
        Poll::Ready(result)
    }
}

struct RawTask<T, M : FailureMode> {
    /// The body, present until it completes or the task is abandoned.
    /// Locked by whichever thread is currently running it.
    body: Mutex<Option<Pin<Box<dyn Future<Output = T> + Send>>>>,

    /// Set before attempting to run, cleared by the runner before each poll,
    /// so a wake arriving while another thread holds `body` is replayed by
    /// that thread instead of being lost.
    notified: AtomicBool,

    started: AtomicBool,

    /// One of `INITIAL` / `ATTACHED` / `COMPLETED`.
    state: AtomicU8,

    continuation: Mutex<Option<Waker>>,

    result: ResultCell<T>,

    panic: PanicSlot,

    _mode: PhantomData<M>,
}

impl<T, M : FailureMode> RawTask<T, M> {
    fn is_complete (self: &'_ Self)
      -> bool
    {
        self.state.load(Ordering::Acquire) == COMPLETED
    }

    fn abandon (self: &'_ Self)
    {
        let body =
            self.body
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
        ;
        drop(body);
    }
}

impl<T : Send + 'static, M : FailureMode> RawTask<T, M> {
    fn start (self: &'_ Arc<Self>)
    {
        if self.started.swap(true, Ordering::AcqRel).not() {
            self.notify();
        }
    }

    fn notify (self: &'_ Arc<Self>)
    {
        self.notified.store(true, Ordering::Release);
        self.try_run();
    }

    /// Runs the body for as long as notifications keep arriving, on the
    /// current thread. If another thread holds the body, the `notified` flag
    /// makes that thread loop and pick the wake up.
    fn try_run (self: &'_ Arc<Self>)
    {
        loop {
            let mut slot = match self.body.try_lock() {
                | Ok(it) => it,
                | Err(_) => return,
            };
            if self.notified.swap(false, Ordering::AcqRel).not() {
                return;
            }
            let mut body = match slot.take() {
                | Some(it) => it,
                | None => return,
            };
            let waker = ::futures::task::waker(Arc::clone(self));
            let mut cx = Context::from_waker(&waker);
            match catch_unwind(AssertUnwindSafe(|| body.as_mut().poll(&mut cx))) {
                | Ok(Poll::Pending) => {
                    *slot = Some(body);
                    drop(slot);
                    // a wake may have landed during the poll
                },
                | Ok(Poll::Ready(value)) => {
                    // SAFETY: sole writer; completion not yet published.
                    unsafe {
                        self.result.put(value);
                    }
                    drop(slot);
                    self.complete();
                    return;
                },
                | Err(payload) => {
                    self.panic.store(M::capture(payload));
                    drop(slot);
                    self.complete();
                    return;
                },
            }
        }
    }

    /// Publishes completion; wakes the registered consumer iff registration
    /// won the race.
    fn complete (self: &'_ Self)
    {
        if self.state.swap(COMPLETED, Ordering::AcqRel) == ATTACHED {
            let continuation =
                self.continuation
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take()
            ;
            if let Some(waker) = continuation {
                waker.wake();
            }
        }
    }

    fn poll_complete (self: &'_ Arc<Self>, cx: &'_ mut Context<'_>)
      -> Poll<()>
    {
        self.start();
        if self.is_complete() {
            return Poll::Ready(());
        }
        // Register the waker first, then race for attachment; if completion
        // wins the race it either sees no attachment (we return ready) or
        // takes the waker we just stored (it wakes us).
        *self.continuation.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(cx.waker().clone())
        ;
        match self.state.compare_exchange(
            INITIAL,
            ATTACHED,
            Ordering::AcqRel,
            Ordering::Acquire,
        )
        {
            | Ok(_) => Poll::Pending,
            | Err(COMPLETED) => Poll::Ready(()),
            // Already attached: a previous poll of this consumer registered;
            // the waker was refreshed above, so re-check completion in case
            // it raced with the refresh.
            | Err(_attached) => if self.is_complete() {
                Poll::Ready(())
            } else {
                Poll::Pending
            },
        }
    }
}

impl<T : Send + 'static, M : FailureMode> ArcWake for RawTask<T, M> {
    fn wake_by_ref (this: &'_ Arc<Self>)
    {
        this.notify();
    }
}
