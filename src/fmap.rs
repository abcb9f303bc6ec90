//! Functor-map adapter over any lazily-pulled sequence.

use_prelude!();

use crate::generator::{Generator, Yielder};

/// A generator yielding `transform` applied to each element of `source`.
///
/// `source` may be any [`IntoIterator`], which covers
/// [`Generator`]s, [`RecursiveGenerator`][crate::RecursiveGenerator]s, and
/// plain collections alike; the adapted sequence is always a plain (flat)
/// generator. Laziness is preserved: `source` is not touched until the
/// adapted generator is.
///
/// ```rust
/// use ::recoro::prelude::*;
///
/// let doubled = fmap(|x: u32| x * 2, 1 ..= 3);
/// assert_eq!(doubled.collect::<Vec<_>>(), [2, 4, 6]);
/// ```
pub
fn fmap<Source, Transform, Output> (
    transform: Transform,
    source: Source,
) -> Generator<Output, impl Future<Output = ()>, Fallible>
where
    Source : IntoIterator,
    Transform : FnMut(Source::Item) -> Output,
{
    Generator::new(move |co: Yielder<Output>| async move {
        let mut transform = transform;
        for element in source {
            co.yield_(transform(element)).await;
        }
    })
}
