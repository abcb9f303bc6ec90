/// Binds a local `yield_!` macro to the given yielder handle, so that a body
/// may write `yield_!(value)` instead of `co.yield_(value).await`.
///
/// ```rust
/// use ::recoro::prelude::*;
///
/// let generator: Generator<u32, _> = Generator::new(|co| async move {
///     make_yield!(co);
///     yield_!(27);
///     yield_!(42);
/// });
/// assert_eq!(generator.collect::<Vec<_>>(), [27, 42]);
/// ```
#[macro_export]
macro_rules! make_yield {
    (
        @with_dollar![$dol:tt]
        $co:expr
    ) => (
        macro_rules! yield_ {(
            $dol value:expr $dol(,)?
        ) => (
            $co.yield_($dol value).await
        )}
    );

    (
        $co:expr $(,)?
    ) => (
        $crate::make_yield! {
            @with_dollar![$]
            $co
        }
    );
}
