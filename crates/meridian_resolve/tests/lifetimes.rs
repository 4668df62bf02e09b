//! Caching behavior of each lifetime across the scope tree.

mod common;

use std::sync::Arc;

use common::{Counter, DisposalLog, Tracked};
use meridian_resolve::prelude::*;

#[derive(Debug)]
struct Token(usize);

fn container_with(lifetime: Lifetime, builds: &Counter) -> Container {
    let builds = builds.clone();
    let mut builder = ContainerBuilder::new();
    builder.register::<Token>(lifetime, move |_| Ok(Instance::new(Token(builds.bump()))));
    builder.build()
}

// ─────────────────────────────────────────────────────────────────────────────
// Transient
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn transient_builds_every_time() {
    let builds = Counter::new();
    let container = container_with(Lifetime::Transient, &builds);
    let scope = container.create_scope();

    let first = scope.get::<Token>().unwrap();
    let second = scope.get::<Token>().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(builds.get(), 2);
}

#[test]
fn transient_disposables_are_tracked_by_requesting_scope() {
    let log = DisposalLog::new();
    let factory_log = log.clone();
    let mut builder = ContainerBuilder::new();
    builder.transient::<Tracked>(move |_| Ok(Tracked::instance("transient", &factory_log)));
    let container = builder.build();

    let scope = container.create_scope();
    scope.get::<Tracked>().unwrap();
    scope.get::<Tracked>().unwrap();
    assert_eq!(scope.disposer_count(), 2);
    assert_eq!(container.root().disposer_count(), 0);

    scope.dispose();
    assert_eq!(log.count("transient"), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scoped
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scoped_is_shared_within_a_scope() {
    let builds = Counter::new();
    let container = container_with(Lifetime::Scoped, &builds);
    let scope = container.create_scope();

    let first = scope.get::<Token>().unwrap();
    let second = scope.get::<Token>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(builds.get(), 1);
}

#[test]
fn scoped_differs_between_siblings_and_children() {
    let builds = Counter::new();
    let container = container_with(Lifetime::Scoped, &builds);
    let left = container.create_scope();
    let right = container.create_scope();
    let child = left.create_child();

    let a = left.get::<Token>().unwrap();
    let b = right.get::<Token>().unwrap();
    let c = child.get::<Token>().unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(builds.get(), 3);
}

#[test]
fn scoped_factory_can_resolve_from_same_scope() {
    #[derive(Debug)]
    struct Inner;
    #[derive(Debug)]
    struct Outer {
        inner: Arc<Inner>,
    }

    let mut builder = ContainerBuilder::new();
    builder.scoped::<Inner>(|_| Ok(Instance::new(Inner)));
    builder.scoped::<Outer>(|scope| {
        Ok(Instance::new(Outer {
            inner: scope.get::<Inner>()?,
        }))
    });
    let container = builder.build();
    let scope = container.create_scope();

    let outer = scope.get::<Outer>().unwrap();
    let inner = scope.get::<Inner>().unwrap();
    assert!(Arc::ptr_eq(&outer.inner, &inner));
}

// ─────────────────────────────────────────────────────────────────────────────
// ScopedSingleton
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scoped_singleton_is_inherited_by_descendants() {
    let builds = Counter::new();
    let container = container_with(Lifetime::ScopedSingleton, &builds);
    let parent = container.create_scope();
    let child = parent.create_child();
    let grandchild = child.create_child();

    let from_parent = parent.get::<Token>().unwrap();
    let from_grandchild = grandchild.get::<Token>().unwrap();
    let from_child = child.get::<Token>().unwrap();

    assert!(Arc::ptr_eq(&from_parent, &from_grandchild));
    assert!(Arc::ptr_eq(&from_parent, &from_child));
    assert_eq!(builds.get(), 1);
}

#[test]
fn scoped_singleton_branches_without_common_instance_build_independently() {
    let builds = Counter::new();
    let container = container_with(Lifetime::ScopedSingleton, &builds);
    let left = container.create_scope().create_child();
    let right = container.create_scope().create_child();

    let a = left.get::<Token>().unwrap();
    let b = right.get::<Token>().unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(builds.get(), 2);
}

#[test]
fn scoped_singleton_resolved_in_child_is_not_seen_by_parent() {
    let builds = Counter::new();
    let container = container_with(Lifetime::ScopedSingleton, &builds);
    let parent = container.create_scope();
    let child = parent.create_child();

    let from_child = child.get::<Token>().unwrap();
    let from_parent = parent.get::<Token>().unwrap();

    assert!(!Arc::ptr_eq(&from_child, &from_parent));
    assert_eq!(builds.get(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Singleton
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn singleton_is_shared_by_every_scope() {
    let builds = Counter::new();
    let container = container_with(Lifetime::Singleton, &builds);
    let a = container.create_scope();
    let b = container.create_scope().create_child();

    let first = a.get::<Token>().unwrap();
    let second = b.get::<Token>().unwrap();
    let third = container.get::<Token>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &third));
    assert_eq!(first.0, 1);
    assert_eq!(builds.get(), 1);
}

#[test]
fn failing_singleton_factory_can_succeed_later() {
    let attempts = Counter::new();
    let counted = attempts.clone();
    let mut builder = ContainerBuilder::new();
    builder.singleton::<Token>(move |_| {
        let attempt = counted.bump();
        if attempt == 1 {
            return Err(ResolveError::factory("warming up"));
        }
        Ok(Instance::new(Token(attempt)))
    });
    let container = builder.build();

    let error = container.get::<Token>().unwrap_err();
    assert!(matches!(error, ResolveError::Factory(_)));

    let token = container.get::<Token>().unwrap();
    assert_eq!(token.0, 2);
    let again = container.get::<Token>().unwrap();
    assert!(Arc::ptr_eq(&token, &again));
    assert_eq!(attempts.get(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-ins
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn builtins_resolve_to_the_requesting_context() {
    let container = ContainerBuilder::new().build();
    let scope = container.create_scope();

    let resolved_scope = scope.get::<Scope>().unwrap();
    let locator = scope.get::<Locator>().unwrap();
    let resolved_container = scope.get::<Container>().unwrap();

    assert!(resolved_scope.ptr_eq(&scope));
    assert!(locator.scope().ptr_eq(&scope));
    assert!(resolved_container.root().ptr_eq(container.root()));
    assert_eq!(scope.disposer_count(), 0);
}

#[test]
fn factory_can_take_a_locator() {
    #[derive(Debug)]
    struct Lazy {
        locator: Arc<Locator>,
    }

    let mut builder = ContainerBuilder::new();
    builder.singleton::<Token>(|_| Ok(Instance::new(Token(9))));
    builder.transient::<Lazy>(|scope| {
        Ok(Instance::new(Lazy {
            locator: scope.get::<Locator>()?,
        }))
    });
    let container = builder.build();
    let scope = container.create_scope();

    let lazy = scope.get::<Lazy>().unwrap();
    assert!(lazy.locator.contains::<Token>());
    assert_eq!(lazy.locator.get::<Token>().unwrap().0, 9);
}

#[test]
fn hook_sees_requested_type_and_scope() {
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);
    let mut builder = ContainerBuilder::new();
    builder
        .scoped::<Token>(|_| Ok(Instance::new(Token(0))))
        .on_resolving(move |requested, scope| {
            recorded.lock().push((requested.name(), scope.id()));
            Ok(())
        });
    let container = builder.build();
    let scope = container.create_scope();

    scope.get::<Token>().unwrap();
    scope.get::<Token>().unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|(name, id)| name.ends_with("Token") && *id == scope.id()));
}

#[test]
fn hook_error_prevents_construction() {
    let builds = Counter::new();
    let counted = builds.clone();
    let mut builder = ContainerBuilder::new();
    builder
        .transient::<Token>(move |_| Ok(Instance::new(Token(counted.bump()))))
        .on_resolving(|_, _| Err(ResolveError::factory("denied")));
    let container = builder.build();

    let error = container.create_scope().get::<Token>().unwrap_err();
    assert!(matches!(error, ResolveError::Factory(_)));
    assert_eq!(builds.get(), 0);
}
