//! 生命周期与实例身份
mod common;

use common::{address, clocks, Clock, SystemClock, TimeSource};
use di_abstractions::{Assembly, ConstructorDescriptor, TypeDescriptor};
use di_common::Directive;
use di_composition::CompositionBuilder;
use std::sync::Arc;

#[test]
fn test_singleton_is_shared_across_every_interface() {
    let (provider, _) = CompositionBuilder::new().add_assembly(clocks()).build().unwrap();
    let resolver = provider.resolver();

    let concrete = resolver.get::<SystemClock>("SystemClock").unwrap();
    let clock = resolver.get_interface::<dyn Clock>("IClock").unwrap();
    let source = resolver.get_interface::<dyn TimeSource>("ITimeSource").unwrap();

    assert_eq!(clock.now(), 1_700_000_000);
    assert_eq!(source.ticks(), 42);
    assert_eq!(address(&concrete), address(&clock));
    assert_eq!(address(&concrete), address(&source));
}

#[test]
fn test_singleton_identity_holds_inside_scopes() {
    let (provider, _) = CompositionBuilder::new().add_assembly(clocks()).build().unwrap();
    let root = provider.resolver().get_interface::<dyn Clock>("IClock").unwrap();

    let scope = provider.create_scope();
    let scoped = scope.resolver().get_interface::<dyn TimeSource>("ITimeSource").unwrap();
    assert_eq!(address(&root), address(&scoped));
}

#[derive(Default)]
struct RequestContext;

fn requests(lifetime: Directive) -> Assembly {
    Assembly::new("Requests").with_type(
        TypeDescriptor::class("RequestContext")
            .with_directive(lifetime)
            .with_constructor(ConstructorDescriptor::default_of::<RequestContext>()),
    )
}

#[test]
fn test_scoped_instance_is_shared_only_within_its_scope() {
    let (provider, _) = CompositionBuilder::new()
        .add_assembly(requests(Directive::scoped()))
        .build()
        .unwrap();

    let first_scope = provider.create_scope();
    let a = first_scope.resolver().get::<RequestContext>("RequestContext").unwrap();
    let b = first_scope.resolver().get::<RequestContext>("RequestContext").unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let second_scope = provider.create_scope();
    let c = second_scope.resolver().get::<RequestContext>("RequestContext").unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
}

#[test]
fn test_transient_instance_is_never_shared() {
    let (provider, _) = CompositionBuilder::new()
        .add_assembly(requests(Directive::transient()))
        .build()
        .unwrap();
    let resolver = provider.resolver();

    let a = resolver.get::<RequestContext>("RequestContext").unwrap();
    let b = resolver.get::<RequestContext>("RequestContext").unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}
