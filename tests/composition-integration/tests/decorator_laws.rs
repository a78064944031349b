//! 装饰器链的组合规律
mod common;

use common::{gateways, greet_all, greetings, handler_of, handlers, Gateway, Handler};
use di_abstractions::{Assembly, ConstructorDescriptor, ParamDescriptor, TypeDescriptor};
use di_common::{DiagnosticCode, Directive};
use di_composition::CompositionBuilder;

#[test]
fn test_lower_order_sits_closer_to_the_service() {
    let (provider, composition) = CompositionBuilder::new().add_assembly(gateways()).build().unwrap();

    let gateway = provider.resolver().get_interface::<dyn Gateway>("IGateway").unwrap();
    assert_eq!(gateway.send(), "o2(o1(o0(base)))");
    assert_eq!(composition.report.decorations, 3);
}

#[test]
fn test_every_registration_is_decorated() {
    let (provider, _) = CompositionBuilder::new().add_assembly(greetings()).build().unwrap();
    assert_eq!(greet_all(&provider), vec!["Decorated: A", "Decorated: B"]);
}

#[test]
fn test_decoration_is_stable_across_builds() {
    let first = {
        let (provider, _) = CompositionBuilder::new().add_assembly(gateways()).build().unwrap();
        provider.resolver().get_interface::<dyn Gateway>("IGateway").unwrap().send()
    };
    for _ in 0..5 {
        let (provider, _) = CompositionBuilder::new().add_assembly(gateways()).build().unwrap();
        let again = provider.resolver().get_interface::<dyn Gateway>("IGateway").unwrap().send();
        assert_eq!(again, first);
    }
}

#[test]
fn test_open_decorators_wrap_each_closed_service() {
    let (provider, composition) = CompositionBuilder::new().add_assembly(handlers()).build().unwrap();
    let resolver = provider.resolver();

    let order = resolver.get_interface::<dyn Handler>(handler_of("Order")).unwrap();
    assert_eq!(order.handle(), "Metrics(Logged(Handler(Order)))");

    let payment = resolver.get_interface::<dyn Handler>(handler_of("Payment")).unwrap();
    assert_eq!(payment.handle(), "Metrics(Logged(Handler(Payment)))");

    // 两个封闭服务各两层
    assert_eq!(composition.report.decorations, 4);
    assert_eq!(composition.facts.decorators.len(), 2);
    assert!(composition.facts.decorators.iter().all(|d| d.open));
}

#[test]
fn test_decorator_without_target_is_reported() {
    let lonely = Assembly::new("Lonely").with_type(
        TypeDescriptor::class("AuditingGreeter")
            .implements("IAudit")
            .with_directive(Directive::decorator_for("IAudit", 0))
            .with_constructor(ConstructorDescriptor::new(
                vec![ParamDescriptor::service("inner", "IAudit")],
                |_| Ok(()),
            )),
    );

    let (_, composition) = CompositionBuilder::new().add_assembly(lonely).build().unwrap();
    assert_eq!(composition.report.decorations, 0);
    assert_eq!(
        composition
            .report
            .diagnostics
            .with_code(DiagnosticCode::OrphanDecorator)
            .len(),
        1
    );
}
