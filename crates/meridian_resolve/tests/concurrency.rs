//! Concurrent first-time resolution.
//!
//! These tests verify that cached lifetimes construct once no matter how many
//! threads race for the first instance.

mod common;

use core::time::Duration;
use std::sync::{Arc, Barrier};
use std::thread;

use common::{Counter, DisposalLog, Tracked};
use meridian_resolve::prelude::*;

const THREADS: usize = 8;

#[derive(Debug)]
struct Slow(usize);

/// Registers `Slow` with a factory that counts builds and lingers long enough
/// for the other threads to pile up behind it.
fn slow_container(lifetime: Lifetime, builds: &Counter) -> Container {
    let builds = builds.clone();
    let mut builder = ContainerBuilder::new();
    builder.register::<Slow>(lifetime, move |_| {
        let build = builds.bump();
        thread::sleep(Duration::from_millis(20));
        Ok(Instance::new(Slow(build)))
    });
    builder.build()
}

fn race<T: Send + 'static>(
    threads: usize,
    scope_for: impl Fn(usize) -> Scope,
    body: impl Fn(Scope) -> T + Send + Sync + 'static,
) -> Vec<T> {
    let barrier = Arc::new(Barrier::new(threads));
    let body = Arc::new(body);

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let body = Arc::clone(&body);
            let scope = scope_for(i);
            thread::spawn(move || {
                barrier.wait();
                body(scope)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect()
}

#[test]
fn singleton_factory_runs_once_under_contention() {
    let builds = Counter::new();
    let container = slow_container(Lifetime::Singleton, &builds);

    let results = race(
        THREADS,
        |_| container.create_scope(),
        |scope| scope.get::<Slow>().unwrap(),
    );

    assert_eq!(builds.get(), 1);
    assert!(results.iter().all(|slow| Arc::ptr_eq(slow, &results[0])));
}

#[test]
fn scoped_factory_runs_once_per_scope_under_contention() {
    let builds = Counter::new();
    let container = slow_container(Lifetime::Scoped, &builds);
    let shared = container.create_scope();

    let results = race(
        THREADS,
        |_| shared.clone(),
        |scope| scope.get::<Slow>().unwrap(),
    );

    assert_eq!(builds.get(), 1);
    assert!(results.iter().all(|slow| Arc::ptr_eq(slow, &results[0])));
}

#[test]
fn scoped_singleton_children_share_one_build() {
    let builds = Counter::new();
    let container = slow_container(Lifetime::ScopedSingleton, &builds);
    let parent = container.create_scope();

    let results = race(
        THREADS,
        |_| parent.clone(),
        |scope| scope.get::<Slow>().unwrap(),
    );
    let inherited = race(
        THREADS,
        |_| parent.create_child(),
        |scope| scope.get::<Slow>().unwrap(),
    );

    assert_eq!(builds.get(), 1);
    assert!(results.iter().chain(&inherited).all(|slow| Arc::ptr_eq(slow, &results[0])));
}

#[test]
fn child_waits_for_parent_build_in_progress() {
    let builds = Counter::new();
    let started = Arc::new(Barrier::new(2));
    let mut builder = ContainerBuilder::new();
    {
        let builds = builds.clone();
        let started = Arc::clone(&started);
        builder.scoped_singleton::<Slow>(move |_| {
            let build = builds.bump();
            if build == 1 {
                started.wait();
            }
            thread::sleep(Duration::from_millis(100));
            Ok(Instance::new(Slow(build)))
        });
    }
    let container = builder.build();
    let parent = container.create_scope();
    let child = parent.create_child();

    let owner = {
        let parent = parent.clone();
        thread::spawn(move || parent.get::<Slow>().unwrap())
    };
    started.wait();
    let inherited = child.get::<Slow>().unwrap();
    let owned = owner.join().expect("Thread panicked");

    assert_eq!(builds.get(), 1);
    assert!(Arc::ptr_eq(&owned, &inherited));
}

#[test]
fn separate_scopes_build_independently_in_parallel() {
    let builds = Counter::new();
    let container = slow_container(Lifetime::Scoped, &builds);

    let results = race(
        THREADS,
        |_| container.create_scope(),
        |scope| scope.get::<Slow>().unwrap().0,
    );

    assert_eq!(builds.get(), THREADS);
    let mut seen = results;
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), THREADS);
}

#[test]
fn concurrent_singleton_from_sibling_scopes_is_disposed_once() {
    let log = DisposalLog::new();
    let mut builder = ContainerBuilder::new();
    {
        let log = log.clone();
        builder.singleton::<Tracked>(move |_| {
            thread::sleep(Duration::from_millis(10));
            Ok(Tracked::instance("resource", &log))
        });
    }
    let container = builder.build();

    let results = race(
        2,
        |_| container.create_scope(),
        |scope| {
            let resolved = scope.get::<Tracked>().unwrap();
            scope.dispose();
            resolved
        },
    );
    assert!(Arc::ptr_eq(&results[0], &results[1]));
    assert!(log.is_empty());

    container.dispose();
    assert_eq!(log.count("resource"), 1);
}

#[test]
fn failed_build_lets_a_waiter_try_again() {
    let attempts = Counter::new();
    let counted = attempts.clone();
    let mut builder = ContainerBuilder::new();
    builder.singleton::<Slow>(move |_| {
        let attempt = counted.bump();
        thread::sleep(Duration::from_millis(10));
        if attempt == 1 {
            return Err(ResolveError::factory("first attempt fails"));
        }
        Ok(Instance::new(Slow(attempt)))
    });
    let container = builder.build();

    let results = race(
        THREADS,
        |_| container.create_scope(),
        |scope| scope.get::<Slow>().ok(),
    );

    let successes: Vec<_> = results.into_iter().flatten().collect();
    assert_eq!(successes.len(), THREADS - 1);
    assert!(successes.iter().all(|slow| slow.0 == 2));
    assert_eq!(attempts.get(), 2);
}
