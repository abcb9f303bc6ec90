//! Failure capture and propagation shared by every primitive of the crate.
//!
//! A panic escaping a computation body is caught at the poll site, stored as
//! a [`CapturedPanic`], and re-raised at whichever consuming operation the
//! primitive's contract designates. The [`FailureMode`] marker selects, at
//! the type level, between that capture behavior ([`Fallible`]) and treating
//! any escaping panic as an unrecoverable defect ([`NoFail`]).

use ::std::{
    any::Any,
    panic::{panic_any, resume_unwind},
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

/// The payload of a panic in flight, as produced by
/// [`::std::panic::catch_unwind`].
pub
type PanicPayload = Box<dyn Any + Send + 'static>;

const ALREADY_RERAISED: &str =
    "coroutine panic payload was already re-raised"
;

/// A panic payload captured out of a computation body, ready to be re-raised
/// at a consuming operation.
#[doc(hidden)] /** Not part of the public API. */
pub
struct CapturedPanic {
    repr: Repr,
}

enum Repr {
    /// `panic!` message payloads are stored sharably so that re-raising is
    /// repeatable with identical content.
    Message(Arc<str>),

    /// Arbitrary `panic_any` payloads are affine: the exact original value
    /// can be re-raised only once.
    Opaque(Mutex<Option<PanicPayload>>),
}

impl CapturedPanic {
    pub(crate)
    fn new (payload: PanicPayload)
      -> Self
    {
        let repr = match payload.downcast::<&'static str>() {
            | Ok(message) => Repr::Message(Arc::from(*message)),
            | Err(payload) => match payload.downcast::<String>() {
                | Ok(message) => Repr::Message(Arc::from(&**message)),
                | Err(payload) => Repr::Opaque(Mutex::new(Some(payload))),
            },
        };
        Self { repr }
    }

    pub(crate)
    fn resume (self: Self)
      -> !
    {
        match self.repr {
            | Repr::Message(message) => panic_any(String::from(&*message)),
            | Repr::Opaque(slot) => {
                let payload =
                    slot.into_inner()
                        .unwrap_or_else(PoisonError::into_inner)
                ;
                match payload {
                    | Some(payload) => resume_unwind(payload),
                    | None => panic_any(ALREADY_RERAISED),
                }
            },
        }
    }

    pub(crate)
    fn resume_by_ref (self: &'_ Self)
      -> !
    {
        match &self.repr {
            | Repr::Message(message) => panic_any(String::from(&**message)),
            | Repr::Opaque(slot) => {
                let payload =
                    slot.lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .take()
                ;
                match payload {
                    | Some(payload) => resume_unwind(payload),
                    | None => panic_any(ALREADY_RERAISED),
                }
            },
        }
    }
}

/// Write-once slot recording whether a computation completed abnormally.
///
/// Re-raising does not clear the slot: every subsequent consumption observes
/// the failure again.
pub(crate)
struct PanicSlot {
    captured: OnceLock<CapturedPanic>,
}

impl PanicSlot {
    pub(crate)
    const
    fn new ()
      -> Self
    {
        Self { captured: OnceLock::new() }
    }

    pub(crate)
    fn store (self: &'_ Self, captured: CapturedPanic)
    {
        if self.captured.set(captured).is_err() {
            abort_with_msg("a computation body completed abnormally twice");
        }
    }

    pub(crate)
    fn rethrow_if_panicked (self: &'_ Self)
    {
        if let Some(captured) = self.captured.get() {
            captured.resume_by_ref();
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Fallible {}
    impl Sealed for super::NoFail {}
}

/// Type-level selection of how a primitive reacts to a panic escaping its
/// body.
///
/// Implemented by exactly two uninhabited marker types: [`Fallible`] (capture
/// and re-raise at the consuming operation) and [`NoFail`] (terminate the
/// process).
pub
trait FailureMode : sealed::Sealed + Send + Sync + 'static {
    #[doc(hidden)] /** Not part of the public API. */
    fn capture (payload: PanicPayload)
      -> CapturedPanic
    ;

    #[doc(hidden)] /** Not part of the public API. */
    fn broken_promise ()
      -> !
    ;
}

/// Default [`FailureMode`]: a panic escaping the body is captured and
/// re-raised at the consuming operation.
pub
enum Fallible {}

impl FailureMode for Fallible {
    fn capture (payload: PanicPayload)
      -> CapturedPanic
    {
        CapturedPanic::new(payload)
    }

    fn broken_promise ()
      -> !
    {
        panic_any(BrokenPromise)
    }
}

/// [`FailureMode`] for bodies that promise not to panic: an escaping panic
/// is an unrecoverable defect and terminates the process.
pub
enum NoFail {}

impl FailureMode for NoFail {
    fn capture (_: PanicPayload)
      -> CapturedPanic
    {
        abort_with_msg("a no-fail computation body panicked");
    }

    fn broken_promise ()
      -> !
    {
        abort_with_msg("consumed a no-fail task holding no computation");
    }
}

/// Payload raised when consuming a [`Task`][crate::Task] that holds no
/// computation (a defaulted or moved-from task).
#[derive(Debug)]
pub
struct BrokenPromise;

impl ::core::fmt::Display for BrokenPromise {
    fn fmt (self: &'_ Self, f: &'_ mut ::core::fmt::Formatter<'_>)
      -> ::core::fmt::Result
    {
        f.write_str("broken promise: task holds no computation")
    }
}

impl ::std::error::Error for BrokenPromise {}

pub(crate)
fn abort_with_msg (msg: &'_ str)
  -> !
{
    eprintln!("`recoro` fatal runtime error: {msg}");
    ::std::process::abort();
}
