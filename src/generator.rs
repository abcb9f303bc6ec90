//! Lazily-pulled synchronous sequence.
//!
//! A [`Generator`] owns a pinned body future and an `Rc`-shared slot for the
//! current element. Resuming polls the body with a no-op waker: the only
//! legal suspension point is the yield future handed out by the [`Yielder`],
//! which fills the slot and then stays pending until the wrapper has taken
//! the element. A body awaiting anything else is a defect, reported by a
//! panic at the offending resume.
//!
//! Nothing is ever buffered beyond the current element, so infinite
//! sequences are supported.

use_prelude!();

use ::std::{
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
};

/// Outcome of [`Generator::resume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub
enum GeneratorState<T> {
    /// The body suspended at a yield point; here is the yielded element.
    Yielded(T),

    /// The body has returned. Further resumes keep answering `Complete`.
    Complete,
}

struct ItemSlot<T> {
    value: RefCell<Option<T>>,
}

/// Handle through which a generator body emits its elements.
pub
struct Yielder<T> {
    item_slot: Rc<ItemSlot<T>>,
}

impl<T> Yielder<T> {
    /// Emits `value` and suspends the body until the consumer has taken it.
    ///
    /// Must be `.await`ed; it is the only future a generator body may
    /// suspend on.
    pub
    fn yield_ (self: &'_ Self, value: T)
      -> impl Future<Output = ()> + '_
    {
        let prev = self.item_slot.value.borrow_mut().replace(value);
        debug_assert!(prev.is_none(), "yielded over an untaken element");

        /// Pending while the slot still holds the element, ready once the
        /// wrapper has taken it.
        struct WaitForClear<'yielder, T> {
            item_slot: &'yielder ItemSlot<T>,
        }

        impl<T> Future for WaitForClear<'_, T> {
            type Output = ();

            fn poll (self: Pin<&'_ mut Self>, _: &'_ mut Context<'_>)
              -> Poll<()>
            {
                if self.item_slot.value.borrow().is_some() {
                    Poll::Pending
                } else {
                    Poll::Ready(())
                }
            }
        }

        WaitForClear { item_slot: &self.item_slot }
    }
}

/// A lazily-pulled sequence of `T`s produced by the body future `F`.
///
/// Constructed cold with [`Generator::new`]; the body only ever runs inside
/// [`resume`][Generator::resume] (or the [`Iterator`] impl built on it).
/// Single-threaded by construction (`!Send`).
pub
struct Generator<T, F : Future<Output = ()>, M : FailureMode = Fallible> {
    item_slot: Rc<ItemSlot<T>>,

    /// `None` once the body has completed (or completed abnormally).
    body: Option<Pin<Box<F>>>,

    _mode: PhantomData<M>,
}

/// A [`Generator`] whose body promises not to panic.
pub
type NoFailGenerator<T, F> = Generator<T, F, NoFail>;

impl<T, F : Future<Output = ()>> Generator<T, F, Fallible> {
    /// Wraps the body produced by `producer` into a cold generator.
    pub
    fn new (producer: impl FnOnce(Yielder<T>) -> F)
      -> Self
    {
        Self::with_failure_mode(producer)
    }
}

impl<T, F : Future<Output = ()>, M : FailureMode> Generator<T, F, M> {
    /// Wraps the body produced by `producer` into a cold generator with an
    /// explicit [`FailureMode`].
    pub
    fn with_failure_mode (producer: impl FnOnce(Yielder<T>) -> F)
      -> Self
    {
        let item_slot = Rc::new(ItemSlot {
            value: RefCell::new(None),
        });
        let yielder = Yielder {
            item_slot: Rc::clone(&item_slot),
        };
        Self {
            item_slot,
            body: Some(Box::pin(producer(yielder))),
            _mode: PhantomData,
        }
    }

    /// Runs the body up to its next yield point or to completion.
    ///
    /// # Panics
    ///
    /// Re-raises the body's panic if this resume observes abnormal
    /// completion (terminates the process for no-fail generators), and
    /// panics if the body suspends on anything other than a yield.
    pub
    fn resume (self: &'_ mut Self)
      -> GeneratorState<T>
    {
        let body = match &mut self.body {
            | Some(it) => it,
            | None => return GeneratorState::Complete,
        };
        create_context!(cx);
        match catch_unwind(AssertUnwindSafe(|| body.as_mut().poll(&mut cx))) {
            | Ok(Poll::Pending) => {
                match self.item_slot.value.borrow_mut().take() {
                    | Some(value) => GeneratorState::Yielded(value),
                    | None => {
                        self.body = None;
                        panic!("generator bodies may only suspend by yielding");
                    },
                }
            },
            | Ok(Poll::Ready(())) => {
                self.body = None;
                GeneratorState::Complete
            },
            | Err(payload) => {
                self.body = None;
                M::capture(payload).resume();
            },
        }
    }

    /// Whether the body has run to completion.
    pub
    fn is_complete (self: &'_ Self)
      -> bool
    {
        self.body.is_none()
    }
}

impl<T, F : Future<Output = ()>, M : FailureMode>
    Iterator
for
    Generator<T, F, M>
{
    type Item = T;

    fn next (self: &'_ mut Self)
      -> Option<T>
    {
        match self.resume() {
            | GeneratorState::Yielded(value) => Some(value),
            | GeneratorState::Complete => None,
        }
    }
}
