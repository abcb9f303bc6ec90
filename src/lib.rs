//! Coroutine primitives on stable Rust: a lazily-started single-result
//! asynchronous value ([`Task`]), a lazily-pulled synchronous sequence
//! ([`Generator`]), and a flattening recursive sequence
//! ([`RecursiveGenerator`]) that splices arbitrarily nested sub-sequences
//! into its output without growing the native call stack per nesting level.
//!
//! All three are built on the same notion of a _suspendable computation_: a
//! pinned `async` body polled manually, which communicates with its wrapper
//! only through a yielder handle (yield a value / yield a nested sequence)
//! and through normal return or panic.
//!
//! Construction is always "cold": none of a body's side effects run until the
//! first consumption (await / iterate).
//!
//! # Example
//!
//! ```rust
//! use ::recoro::prelude::*;
//!
//! let mut generator: Generator<u32, _> = Generator::new(|co| async move {
//!     make_yield!(co);
//!     yield_!(1);
//!     yield_!(2);
//!     yield_!(3);
//! });
//!
//! assert_eq!(generator.by_ref().collect::<Vec<_>>(), [1, 2, 3]);
//! assert!(generator.is_complete());
//! ```
//!
//! # Failure modes
//!
//! Every primitive carries a type-level [`FailureMode`]: [`Fallible`] (the
//! default) captures a panic escaping the body and re-raises it at the exact
//! consuming operation, whereas [`NoFail`] treats an escaping panic as an
//! unrecoverable defect and terminates the process.

#![warn(
    future_incompatible,
    rust_2018_idioms,
    missing_docs,
    clippy::cargo,
    clippy::pedantic,
)]
#![deny(
    unused_must_use,
)]
#![doc(test(attr(deny(warnings))))]

#[path = "public_prelude.rs"]
pub
mod prelude;

mod public_macros;

#[macro_use]
mod utils;

pub use self::failure::*;
mod failure;

pub use self::task::*;
mod task;

pub use self::generator::*;
mod generator;

pub use self::recursive::*;
mod recursive;

pub use self::fmap::*;
mod fmap;

#[cfg(test)]
mod tests;
