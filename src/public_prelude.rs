//! The crate prelude: `use ::recoro::prelude::*;`

#[doc(no_inline)]
pub use crate::{
    fmap::fmap,
    failure::{BrokenPromise, Fallible, FailureMode, NoFail},
    generator::{Generator, GeneratorState, NoFailGenerator, Yielder},
    recursive::{NoFailRecursiveGenerator, RecursiveGenerator, RecursiveYielder},
    task::{NoFailTask, Task},
    make_yield,
};
