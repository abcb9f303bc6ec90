#[macro_use]
pub(crate) mod macros;

pub(crate) mod prelude;

pub(crate) mod result_cell;
