pub(crate) use ::core::{
    cell::{Cell, RefCell},
    future::Future,
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
};

pub(crate) use crate::failure::{
    abort_with_msg,
    CapturedPanic,
    Fallible,
    FailureMode,
    NoFail,
    PanicPayload,
    PanicSlot,
};
