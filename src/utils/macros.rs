macro_rules! use_prelude {() => (
    #[allow(unused_imports)]
    use crate::utils::prelude::*;
)}

/// A `Context` backed by a no-op waker, for polling computations whose only
/// legal suspension points are their own yields.
macro_rules! create_context {( $cx:ident ) => (
    let waker: ::core::task::Waker = ::futures::task::noop_waker();
    let mut $cx = ::core::task::Context::from_waker(&waker);
)}
