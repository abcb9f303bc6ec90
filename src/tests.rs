use {
    ::core::{
        cell::Cell,
        mem,
        sync::atomic::{AtomicBool, Ordering},
    },
    ::std::{
        panic::{catch_unwind, AssertUnwindSafe},
        rc::Rc,
        sync::Arc,
    },
    ::futures::executor::block_on,
    super::*,
};

#[test]
fn generator_basic ()
{
    let mut generator: Generator<u8, _> = Generator::new(|co| async move {
        make_yield!(co);
        yield_!(1);
        yield_!(2);
        yield_!(3);
    });
    assert_it_eq!(
        generator.by_ref(),
        [1, 2, 3],
    );
    assert!(generator.is_complete());
}

#[test]
fn generator_is_reproducible_from_a_fresh_instance ()
{
    fn evens_below (limit: u8)
      -> impl Iterator<Item = u8>
    {
        Generator::new(move |co| async move {
            make_yield!(co);
            let mut current = 0;
            while current < limit {
                yield_!(current);
                current += 2;
            }
        })
    }

    assert_it_eq!(evens_below(7), [0, 2, 4, 6]);
    assert_it_eq!(evens_below(7), [0, 2, 4, 6]);
}

#[test]
fn generator_resume_protocol ()
{
    let mut generator: Generator<u8, _> = Generator::new(|co| async move {
        co.yield_(42).await;
    });
    assert_eq!(generator.resume(), GeneratorState::Yielded(42));
    assert_eq!(generator.resume(), GeneratorState::Complete);
    // resuming past completion stays complete
    assert_eq!(generator.resume(), GeneratorState::Complete);
}

#[test]
fn generator_is_lazy ()
{
    let ran = Rc::new(Cell::new(false));
    let mut generator: Generator<u8, _> = Generator::new(|co| {
        let ran = Rc::clone(&ran);
        async move {
            ran.set(true);
            co.yield_(0).await;
        }
    });
    assert!(ran.get().not());
    let _ = generator.next();
    assert!(ran.get());
}

#[test]
fn infinite_generator ()
{
    let naturals: Generator<u32, _> = Generator::new(|co| async move {
        make_yield!(co);
        let mut current = 0;
        loop {
            yield_!(current);
            current += 1;
        }
    });
    assert_it_eq!(
        naturals.take(5),
        [0, 1, 2, 3, 4],
    );
}

#[test]
fn generator_panic_is_raised_at_the_observing_resume ()
{
    let mut generator: Generator<u8, _> = Generator::new(|co| async move {
        co.yield_(1).await;
        panic!("boom");
    });
    assert_eq!(generator.next(), Some(1));
    let err =
        catch_unwind(AssertUnwindSafe(|| generator.next()))
            .unwrap_err()
    ;
    assert_eq!(err.downcast_ref::<String>().map(|s| &**s), Some("boom"));
    // the sequence is finished afterwards
    assert!(generator.is_complete());
    assert_eq!(generator.next(), None);
}

#[test]
fn foreign_await_in_a_generator_body_is_a_defect ()
{
    let mut generator: Generator<u8, _> = Generator::new(|_co| async move {
        ::std::future::pending::<()>().await;
    });
    let err =
        catch_unwind(AssertUnwindSafe(|| generator.next()))
            .unwrap_err()
    ;
    let msg = err.downcast_ref::<&'static str>().copied().unwrap();
    assert!(msg.contains("only suspend by yielding"));
    assert!(generator.is_complete());
}

#[test]
fn no_fail_generator ()
{
    let generator: NoFailGenerator<u8, _> =
        Generator::with_failure_mode(|co| async move {
            make_yield!(co);
            yield_!(27);
            yield_!(42);
        })
    ;
    assert_it_eq!(generator, [27, 42]);
}

#[test]
fn task_is_lazy ()
{
    let ran = Arc::new(AtomicBool::new(false));
    let task = Task::new({
        let ran = Arc::clone(&ran);
        async move {
            ran.store(true, Ordering::Release);
            42_u8
        }
    });
    assert!(ran.load(Ordering::Acquire).not());
    assert!(task.is_ready().not());
    assert_eq!(block_on(task), 42);
    assert!(ran.load(Ordering::Acquire));
}

#[test]
fn dropping_a_task_never_runs_its_body ()
{
    let ran = Arc::new(AtomicBool::new(false));
    let task = Task::new({
        let ran = Arc::clone(&ran);
        async move {
            ran.store(true, Ordering::Release);
        }
    });
    drop(task);
    assert!(ran.load(Ordering::Acquire).not());
}

#[test]
fn task_result_is_idempotent ()
{
    let task = Task::new(async { 42_u8 });
    block_on(task.when_ready());
    assert!(task.is_ready());
    assert_eq!(*task.result(), 42);
    assert_eq!(*task.result(), 42);
    // by-ref awaits do not move the result out either
    assert_eq!(*block_on(&task), 42);
    assert_eq!(block_on(task), 42);
}

#[test]
fn task_failure_is_re_raised_on_every_consumption ()
{
    let task = Task::<u8>::new(async { panic!("boom") });
    block_on(task.when_ready());
    assert!(task.is_ready());
    for _ in 0 .. 2 {
        let err =
            catch_unwind(AssertUnwindSafe(|| task.result()))
                .unwrap_err()
        ;
        assert_eq!(
            err.downcast_ref::<String>().map(|s| &**s),
            Some("boom"),
        );
    }
}

#[test]
fn broken_promise_on_a_default_task ()
{
    let task = Task::<u8>::default();
    assert!(task.is_ready());
    let err =
        catch_unwind(AssertUnwindSafe(|| block_on(task)))
            .unwrap_err()
    ;
    assert!(err.downcast::<BrokenPromise>().is_ok());
}

#[test]
fn broken_promise_on_a_moved_from_task ()
{
    let mut slot = Task::new(async { 42_u8 });
    let task = mem::take(&mut slot);
    assert_eq!(block_on(task), 42);
    let err =
        catch_unwind(AssertUnwindSafe(|| block_on(slot)))
            .unwrap_err()
    ;
    assert!(err.downcast::<BrokenPromise>().is_ok());
}

#[test]
fn when_ready_completes_immediately_on_an_empty_task ()
{
    let task = Task::<u8>::default();
    block_on(task.when_ready());
}

#[test]
fn no_fail_task ()
{
    let task: NoFailTask<u8> = Task::with_failure_mode(async { 42 });
    assert_eq!(block_on(task), 42);
}

#[test]
fn recursive_generator_resume_protocol ()
{
    let mut generator: RecursiveGenerator<u8> =
        RecursiveGenerator::new(|co| async move {
            co.yield_(42).await;
        })
    ;
    assert!(generator.is_complete().not());
    assert_eq!(generator.resume(), GeneratorState::Yielded(42));
    assert_eq!(generator.resume(), GeneratorState::Complete);
    assert!(generator.is_complete());
}

#[test]
fn recursive_generator_is_lazy ()
{
    let ran = Rc::new(Cell::new(false));
    let mut generator: RecursiveGenerator<u8> = RecursiveGenerator::new(|co| {
        let ran = Rc::clone(&ran);
        async move {
            ran.set(true);
            co.yield_(0).await;
        }
    });
    assert!(ran.get().not());
    let _ = generator.next();
    assert!(ran.get());
}

#[test]
fn fmap_over_a_plain_generator ()
{
    let source: Generator<u32, _> = Generator::new(|co| async move {
        make_yield!(co);
        yield_!(1);
        yield_!(2);
        yield_!(3);
    });
    assert_it_eq!(
        fmap(|x| x * 2, source),
        [2, 4, 6],
    );
}

#[test]
fn fmap_over_a_recursive_generator ()
{
    let source: RecursiveGenerator<u32> = RecursiveGenerator::new(|co| async move {
        co.yield_(1).await;
        co.yield_from(RecursiveGenerator::new(|co| async move {
            co.yield_(2).await;
        })).await;
        co.yield_(3).await;
    });
    assert_it_eq!(
        fmap(|x| x * 10, source),
        [10, 20, 30],
    );
}

#[test]
fn fmap_is_lazy ()
{
    let ran = Rc::new(Cell::new(false));
    let source: Generator<u8, _> = Generator::new(|co| {
        let ran = Rc::clone(&ran);
        async move {
            ran.set(true);
            co.yield_(1).await;
        }
    });
    let mut mapped = fmap(|x: u8| x + 1, source);
    assert!(ran.get().not());
    assert_eq!(mapped.next(), Some(2));
    assert!(ran.get());
}

macro_rules! assert_it_eq {(
    $left:expr, $right:expr $(, $($msg:expr $(,)?)?)?
) => (
    assert_eq!(
        $left.into_iter().collect::<Vec<_>>(),
        $right,
        $($($msg ,)?)?
    )
)}
use assert_it_eq;

use ::core::ops::Not;
