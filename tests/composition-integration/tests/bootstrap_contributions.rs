//! 引导注册表：编译单元在加载时登记静态类型表
mod common;

use common::{clocks, greet_all, greetings, Clock};
use di_abstractions::{Assembly, BindingSet, DiscoveryRequest, TypeCatalogProvider};
use di_composition::{
    current_override, scope_override, with_override, BootstrapRegistry, CatalogContribution,
    CombinedCatalog, CompositionBuilder, DiscoveryStrategy, ReflectionCatalogProvider,
    StaticCatalogTable,
};
use std::sync::Arc;

/// 模拟生成器的输出：类型表与可执行绑定
fn generated(id: &str, assembly: Assembly, host: Option<&str>) -> CatalogContribution {
    let mut request = DiscoveryRequest::new(vec![Arc::new(assembly.clone())]);
    if let Some(host) = host {
        request = request.with_host(host);
    }
    let discovery = ReflectionCatalogProvider::new().discover(&request).unwrap();

    let mut table = StaticCatalogTable::new();
    if let Some(host) = host {
        table = table.with_host(host);
    }
    let table = table.with_assembly(assembly.name.clone(), discovery.facts).unwrap();
    CatalogContribution::new(id, table, BindingSet::from_assemblies([&assembly]))
}

#[ctor::ctor]
fn register_greetings() {
    BootstrapRegistry::global().register("greetings", || {
        generated("greetings", greetings(), Some("Greetings"))
    });
}

#[ctor::ctor]
fn register_clocks() {
    BootstrapRegistry::global().register("clocks", || generated("clocks", clocks(), None));
}

fn static_builder() -> CompositionBuilder {
    CompositionBuilder::new()
        .strategy(DiscoveryStrategy::Static)
        .host("Greetings")
        .add_assembly(greetings())
        .add_assembly(clocks())
}

fn clocks_only() -> Arc<CombinedCatalog> {
    Arc::new(CombinedCatalog::combine(vec![generated("clocks", clocks(), None)]))
}

#[test]
fn test_contributions_registered_at_load_time_are_combined() {
    let registry = BootstrapRegistry::global();
    assert!(registry.len() >= 2);

    let combined = registry.combined();
    assert!(combined.contributors().iter().any(|id| id == "greetings"));
    assert!(combined.contributors().iter().any(|id| id == "clocks"));

    let (provider, composition) = static_builder().build().unwrap();
    assert_eq!(composition.report.strategy, "static");
    assert_eq!(composition.facts.candidates.len(), 3);
    assert_eq!(greet_all(&provider), vec!["Decorated: A", "Decorated: B"]);
    assert_eq!(
        provider.resolver().get_interface::<dyn Clock>("IClock").unwrap().now(),
        1_700_000_000
    );
}

#[test]
fn test_duplicate_contribution_is_ignored() {
    let registered = BootstrapRegistry::global().register("clocks", || {
        generated("clocks", Assembly::new("Clocks"), None)
    });
    assert!(!registered);
}

#[test]
fn test_sync_override_replaces_registry_view() {
    let (_, composition) = with_override(clocks_only(), || static_builder().build().unwrap());
    assert_eq!(composition.facts.candidates.len(), 1);
    assert!(current_override().is_none());
}

#[tokio::test]
async fn test_override_survives_await_points() {
    let replacement = clocks_only();
    let expected = replacement.clone();

    let candidates = scope_override(replacement, async move {
        tokio::task::yield_now().await;
        let seen = current_override().unwrap();
        assert!(Arc::ptr_eq(&seen, &expected));
        static_builder().build().unwrap().1.facts.candidates.len()
    })
    .await;

    assert_eq!(candidates, 1);
    assert!(current_override().is_none());
}

#[tokio::test]
async fn test_override_does_not_leak_into_other_tasks() {
    let (overridden, plain) = tokio::join!(
        scope_override(clocks_only(), async {
            tokio::task::yield_now().await;
            let spawned = tokio::spawn(async { current_override().is_none() }).await.unwrap();
            (current_override().is_some(), spawned)
        }),
        async {
            tokio::task::yield_now().await;
            current_override().is_none()
        }
    );

    let (inside, spawned_without_override) = overridden;
    assert!(inside);
    assert!(spawned_without_override);
    assert!(plain);
}
