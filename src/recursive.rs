//! Flattening recursive sequence.
//!
//! A [`RecursiveGenerator`] body may yield single elements *or* whole nested
//! recursive generators; consumers observe the flattened sequence. The
//! nesting is held as an explicit vector of suspended bodies owned by the
//! pull driver (root first, current leaf last), so each pull runs a bounded
//! amount of native stack regardless of nesting depth:
//!
//!   - resuming always targets the leaf;
//!   - a yielded nested generator is *pushed* (descent), including the
//!     remaining chain of a partially-consumed one;
//!   - a completing body is *popped* and its parent resumed (ascent),
//!     possibly several levels within one pull when nested sequences finish
//!     back-to-back.
//!
//! A panic escaping a nested body is re-raised *inside* its parent, at the
//! suspended yield point, and cascades upward; the consumer observes it at
//! the pull that detects root completion, after every element that preceded
//! it.

use_prelude!();

use ::core::mem;
use ::std::{
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
};

use crate::generator::GeneratorState;

enum Step<T> {
    Value(T),
    Recurse(Chain<T>),
}

struct StepSlot<T> {
    step: RefCell<Option<Step<T>>>,

    /// A failure captured out of a nested body, to be re-raised inside this
    /// body when its suspended `yield_from` await is next polled.
    child_failure: Cell<Option<CapturedPanic>>,
}

impl<T> StepSlot<T> {
    fn new ()
      -> Rc<Self>
    {
        Rc::new(Self {
            step: RefCell::new(None),
            child_failure: Cell::new(None),
        })
    }
}

/// Handle through which a recursive generator body emits elements and nested
/// sequences.
pub
struct RecursiveYielder<T, M : FailureMode = Fallible> {
    step_slot: Rc<StepSlot<T>>,

    _mode: PhantomData<M>,
}

impl<T, M : FailureMode> RecursiveYielder<T, M> {
    /// Emits a single element and suspends until the consumer has taken it.
    pub
    fn yield_ (self: &'_ Self, value: T)
      -> impl Future<Output = ()> + '_
    {
        self.suspend_with(Step::Value(value))
    }

    /// Splices a whole nested sequence into the output, suspending this body
    /// until the nested one has been consumed to completion.
    ///
    /// A partially-consumed `nested` contributes only its remaining
    /// elements. If `nested`'s body (or any body nested below it) panics,
    /// the panic is re-raised here, at this await.
    pub
    fn yield_from (self: &'_ Self, nested: RecursiveGenerator<T, M>)
      -> impl Future<Output = ()> + '_
    {
        let mut nested = nested;
        let chain = mem::replace(&mut nested.chain, Chain::Done);
        self.suspend_with(Step::Recurse(chain))
    }

    fn suspend_with (self: &'_ Self, step: Step<T>)
      -> impl Future<Output = ()> + '_
    {
        let prev = self.step_slot.step.borrow_mut().replace(step);
        debug_assert!(prev.is_none(), "yielded over an untaken step");

        struct WaitForStepTaken<'yielder, T> {
            step_slot: &'yielder StepSlot<T>,
        }

        impl<T> Future for WaitForStepTaken<'_, T> {
            type Output = ();

            fn poll (self: Pin<&'_ mut Self>, _: &'_ mut Context<'_>)
              -> Poll<()>
            {
                // A nested sequence this body descended into may have failed;
                // its captured panic resumes here, inside this body.
                if let Some(failure) = self.step_slot.child_failure.take() {
                    failure.resume();
                }
                if self.step_slot.step.borrow().is_some() {
                    Poll::Pending
                } else {
                    Poll::Ready(())
                }
            }
        }

        WaitForStepTaken { step_slot: &self.step_slot }
    }
}

/// One suspended body in the recursion chain.
struct Node<T> {
    body: Pin<Box<dyn Future<Output = ()>>>,
    step_slot: Rc<StepSlot<T>>,
}

enum Resumed<T> {
    Yielded(T),
    Descended(Chain<T>),
    Completed(Option<CapturedPanic>),
}

impl<T> Node<T> {
    fn resume<M : FailureMode> (self: &'_ mut Self)
      -> Resumed<T>
    {
        create_context!(cx);
        let poll = catch_unwind(AssertUnwindSafe(|| {
            self.body.as_mut().poll(&mut cx)
        }));
        match poll {
            | Ok(Poll::Pending) => {
                match self.step_slot.step.borrow_mut().take() {
                    | Some(Step::Value(value)) => Resumed::Yielded(value),
                    | Some(Step::Recurse(chain)) => Resumed::Descended(chain),
                    | None => panic!(
                        "recursive generator bodies may only suspend by yielding",
                    ),
                }
            },
            | Ok(Poll::Ready(())) => Resumed::Completed(None),
            | Err(payload) => Resumed::Completed(Some(M::capture(payload))),
        }
    }
}

enum Chain<T> {
    /// Not yet consumed; the root body alone.
    Cold(Node<T>),

    /// Suspended mid-iteration: root first, current leaf last.
    Running(Vec<Node<T>>),

    Done,
}

/// A lazily-pulled sequence whose body can splice nested sequences of the
/// same type into its output.
///
/// Consumed through [`Iterator`]; elements come out flattened, in order.
/// Single-threaded by construction (`!Send`).
pub
struct RecursiveGenerator<T, M : FailureMode = Fallible> {
    chain: Chain<T>,

    _mode: PhantomData<M>,
}

/// A [`RecursiveGenerator`] whose bodies promise not to panic.
pub
type NoFailRecursiveGenerator<T> = RecursiveGenerator<T, NoFail>;

impl<T : 'static> RecursiveGenerator<T, Fallible> {
    /// Wraps the body produced by `producer` into a cold recursive
    /// generator.
    pub
    fn new<F : Future<Output = ()> + 'static> (
        producer: impl FnOnce(RecursiveYielder<T>) -> F,
    ) -> Self
    {
        Self::with_failure_mode(producer)
    }
}

impl<T : 'static, M : FailureMode> RecursiveGenerator<T, M> {
    /// Wraps the body produced by `producer` into a cold recursive generator
    /// with an explicit [`FailureMode`].
    pub
    fn with_failure_mode<F : Future<Output = ()> + 'static> (
        producer: impl FnOnce(RecursiveYielder<T, M>) -> F,
    ) -> Self
    {
        let step_slot = StepSlot::new();
        let yielder = RecursiveYielder {
            step_slot: Rc::clone(&step_slot),
            _mode: PhantomData,
        };
        Self {
            chain: Chain::Cold(Node {
                body: Box::pin(producer(yielder)),
                step_slot,
            }),
            _mode: PhantomData,
        }
    }

    /// Runs the chain up to its next element or to completion of the root.
    pub
    fn resume (self: &'_ mut Self)
      -> GeneratorState<T>
    {
        match self.next() {
            | Some(value) => GeneratorState::Yielded(value),
            | None => GeneratorState::Complete,
        }
    }

    /// Whether the root body has run to completion.
    pub
    fn is_complete (self: &'_ Self)
      -> bool
    {
        matches!(self.chain, Chain::Done)
    }
}

impl<T : 'static, M : FailureMode> Iterator for RecursiveGenerator<T, M> {
    type Item = T;

    fn next (self: &'_ mut Self)
      -> Option<T>
    {
        // Park `Done` while pulling: if the pull raises, the sequence is
        // left finished.
        let mut chain = match mem::replace(&mut self.chain, Chain::Done) {
            | Chain::Cold(root) => vec![root],
            | Chain::Running(chain) => chain,
            | Chain::Done => return None,
        };
        match pull::<T, M>(&mut chain) {
            | Pulled::Value(value) => {
                self.chain = Chain::Running(chain);
                Some(value)
            },
            | Pulled::Finished(None) => None,
            | Pulled::Finished(Some(failure)) => failure.resume(),
        }
    }
}

enum Pulled<T> {
    Value(T),
    Finished(Option<CapturedPanic>),
}

/// Drives the leaf until an element surfaces or the root completes.
fn pull<T, M : FailureMode> (chain: &'_ mut Vec<Node<T>>)
  -> Pulled<T>
{
    loop {
        let leaf = chain.last_mut()
            .expect("the chain always holds the root while pulling");
        match leaf.resume::<M>() {
            | Resumed::Yielded(value) => {
                return Pulled::Value(value);
            },
            | Resumed::Descended(nested) => match nested {
                | Chain::Cold(node) => chain.push(node),
                | Chain::Running(nodes) => chain.extend(nodes),
                // An exhausted nested sequence contributes nothing; the
                // next turn of the loop resumes the same body past its
                // await.
                | Chain::Done => {},
            },
            | Resumed::Completed(failure) => {
                let completed = chain.pop()
                    .expect("the chain always holds the root while pulling");
                drop(completed);
                match chain.last_mut() {
                    | None => return Pulled::Finished(failure),
                    | Some(parent) => {
                        if let Some(failure) = failure {
                            parent.step_slot.child_failure.set(Some(failure));
                        }
                    },
                }
            },
        }
    }
}
