//! 引导注册表
//!
//! 各个独立编译的单元在进程启动时登记自己的静态类型表与绑定，
//! 组合视图在首次使用时合并并缓存。登记新的贡献会使缓存失效。
//!
//! 单个执行上下文（例如一个测试）可以通过 [`with_override`] 或
//! [`scope_override`] 替换组合视图，替换只在该调用链内可见，
//! 作用域结束时自动恢复。

use crate::catalog::{StaticCatalogProvider, StaticCatalogTable};
use di_abstractions::BindingSet;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// 单个编译单元的贡献
#[derive(Debug, Clone, Default)]
pub struct CatalogContribution {
    pub id: String,
    pub table: StaticCatalogTable,
    pub bindings: BindingSet,
}

impl CatalogContribution {
    pub fn new(id: impl Into<String>, table: StaticCatalogTable, bindings: BindingSet) -> Self {
        Self {
            id: id.into(),
            table,
            bindings,
        }
    }
}

/// 产生贡献的函数
pub type ContributionFn = Arc<dyn Fn() -> CatalogContribution + Send + Sync>;

/// 合并后的组合视图
#[derive(Debug, Clone, Default)]
pub struct CombinedCatalog {
    table: StaticCatalogTable,
    bindings: BindingSet,
    contributors: Vec<String>,
}

impl CombinedCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 合并贡献：程序集与绑定都按首次出现保留
    pub fn combine(contributions: impl IntoIterator<Item = CatalogContribution>) -> Self {
        let mut combined = Self::empty();
        for contribution in contributions {
            if combined.contributors.contains(&contribution.id) {
                continue;
            }
            if combined.table.host.is_none() {
                combined.table.host = contribution.table.host.clone();
            }
            for assembly in contribution.table.assemblies {
                if combined.table.facts_for(&assembly.name).is_none() {
                    combined.table.assemblies.push(assembly);
                } else {
                    debug!("程序集 {} 已由先前的贡献提供，忽略 {}", assembly.name, contribution.id);
                }
            }
            combined.bindings.merge(&contribution.bindings);
            combined.contributors.push(contribution.id);
        }
        combined
    }

    pub fn table(&self) -> &StaticCatalogTable {
        &self.table
    }

    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    /// 参与合并的贡献标识，按登记顺序
    pub fn contributors(&self) -> &[String] {
        &self.contributors
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    /// 以组合视图构造静态目录提供者
    pub fn provider(&self) -> StaticCatalogProvider {
        StaticCatalogProvider::new(self.table.clone(), self.bindings.clone())
    }
}

#[derive(Default)]
struct Contributors {
    generation: u64,
    entries: Vec<(String, ContributionFn)>,
}

/// 引导注册表
///
/// 登记受互斥锁保护；组合视图采用双重检查的惰性缓存。
/// 贡献函数在合并时调用，函数内不得再次登记。
#[derive(Default)]
pub struct BootstrapRegistry {
    contributors: Mutex<Contributors>,
    cache: RwLock<Option<(u64, Arc<CombinedCatalog>)>>,
}

static GLOBAL_REGISTRY: Lazy<BootstrapRegistry> = Lazy::new(BootstrapRegistry::new);

impl BootstrapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进程级注册表
    pub fn global() -> &'static BootstrapRegistry {
        &GLOBAL_REGISTRY
    }

    /// 登记贡献；同一标识只登记一次，返回是否为新登记
    pub fn register<F>(&self, id: impl Into<String>, contribution: F) -> bool
    where
        F: Fn() -> CatalogContribution + Send + Sync + 'static,
    {
        let id = id.into();
        let mut contributors = self.contributors.lock();
        if contributors.entries.iter().any(|(existing, _)| *existing == id) {
            debug!("贡献已登记，忽略: {}", id);
            return false;
        }
        debug!("登记贡献: {}", id);
        contributors.entries.push((id, Arc::new(contribution)));
        contributors.generation += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.contributors.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 组合视图
    pub fn combined(&self) -> Arc<CombinedCatalog> {
        let generation = self.contributors.lock().generation;
        if let Some((cached, catalog)) = self.cache.read().as_ref() {
            if *cached == generation {
                return catalog.clone();
            }
        }

        let mut cache = self.cache.write();
        let (generation, entries) = {
            let contributors = self.contributors.lock();
            (contributors.generation, contributors.entries.clone())
        };
        if let Some((cached, catalog)) = cache.as_ref() {
            if *cached == generation {
                return catalog.clone();
            }
        }

        info!("开始合并引导贡献: {} 个", entries.len());
        let combined = Arc::new(CombinedCatalog::combine(
            entries.iter().map(|(_, contribution)| contribution()),
        ));
        info!(
            "引导贡献合并完成: 程序集 {} 个, 绑定 {} 个",
            combined.table().assemblies.len(),
            combined.bindings().len()
        );
        *cache = Some((generation, combined.clone()));
        combined
    }
}

impl std::fmt::Debug for BootstrapRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let contributors = self.contributors.lock();
        let ids: Vec<&str> = contributors.entries.iter().map(|(id, _)| id.as_str()).collect();
        f.debug_struct("BootstrapRegistry")
            .field("contributors", &ids)
            .field("generation", &contributors.generation)
            .finish()
    }
}

tokio::task_local! {
    static CATALOG_OVERRIDE: Arc<CombinedCatalog>;
}

/// 在同步调用链内替换组合视图
pub fn with_override<R>(catalog: Arc<CombinedCatalog>, f: impl FnOnce() -> R) -> R {
    CATALOG_OVERRIDE.sync_scope(catalog, f)
}

/// 在异步调用链内替换组合视图，跨 `.await` 保持可见
pub async fn scope_override<F>(catalog: Arc<CombinedCatalog>, future: F) -> F::Output
where
    F: Future,
{
    CATALOG_OVERRIDE.scope(catalog, future).await
}

/// 当前调用链上的替换视图
pub fn current_override() -> Option<Arc<CombinedCatalog>> {
    CATALOG_OVERRIDE.try_with(|catalog| catalog.clone()).ok()
}

/// 组合上下文
///
/// 显式传递的组合视图优先，其次是调用链上的替换视图，最后才回退到注册表。
#[derive(Debug, Clone, Default)]
pub struct CompositionContext {
    catalog: Option<Arc<CombinedCatalog>>,
    registry: Option<Arc<BootstrapRegistry>>,
}

impl CompositionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog: Arc<CombinedCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// 使用独立的注册表代替进程级注册表
    pub fn with_registry(mut self, registry: Arc<BootstrapRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn catalog(&self) -> Arc<CombinedCatalog> {
        if let Some(catalog) = &self.catalog {
            return catalog.clone();
        }
        if let Some(catalog) = current_override() {
            return catalog;
        }
        match &self.registry {
            Some(registry) => registry.combined(),
            None => BootstrapRegistry::global().combined(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{CandidateType, CatalogFacts, RegistrationMode};
    use di_common::{Lifetime, TypeKey};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn table(assembly: &str, implementation: &str) -> StaticCatalogTable {
        let facts = CatalogFacts {
            candidates: vec![CandidateType {
                implementation: TypeKey::named(implementation),
                interfaces: Vec::new(),
                lifetime: Lifetime::Singleton,
                parameters: Vec::new(),
                keys: Vec::new(),
                assembly: assembly.to_string(),
                constructor: 0,
                mode: RegistrationMode::Direct,
                source: None,
            }],
            ..CatalogFacts::default()
        };
        StaticCatalogTable::new().with_assembly(assembly, facts).unwrap()
    }

    fn contribution(id: &str, assembly: &str, implementation: &str) -> CatalogContribution {
        CatalogContribution::new(id, table(assembly, implementation), BindingSet::new())
    }

    #[test]
    fn test_combine_keeps_first_seen() {
        let combined = CombinedCatalog::combine(vec![
            contribution("orders", "Orders", "OrderService"),
            contribution("billing", "Billing", "Invoicer"),
            contribution("orders-again", "Orders", "Shadow"),
        ]);
        assert_eq!(combined.table().assembly_names(), vec!["Orders", "Billing"]);
        let orders = combined.table().facts_for("Orders").unwrap();
        assert_eq!(orders.candidates[0].implementation, TypeKey::named("OrderService"));
        assert_eq!(combined.contributors().len(), 3);
    }

    #[test]
    fn test_registry_caches_until_new_contribution() {
        let registry = BootstrapRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        assert!(registry.register("orders", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            contribution("orders", "Orders", "OrderService")
        }));
        assert!(!registry.register("orders", || contribution("orders", "Orders", "Shadow")));

        let first = registry.combined();
        let second = registry.combined();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        registry.register("billing", || contribution("billing", "Billing", "Invoicer"));
        let third = registry.combined();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.table().assembly_names(), vec!["Orders", "Billing"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sync_override_is_scoped() {
        let registry = Arc::new(BootstrapRegistry::new());
        registry.register("orders", || contribution("orders", "Orders", "OrderService"));
        let context = CompositionContext::new().with_registry(registry);

        let replacement = Arc::new(CombinedCatalog::combine(vec![contribution("fake", "Fake", "Stub")]));
        let inside = with_override(replacement, || context.catalog());
        assert_eq!(inside.table().assembly_names(), vec!["Fake"]);

        assert!(current_override().is_none());
        assert_eq!(context.catalog().table().assembly_names(), vec!["Orders"]);
    }

    #[test]
    fn test_explicit_catalog_wins_over_override() {
        let explicit = Arc::new(CombinedCatalog::combine(vec![contribution("a", "A", "X")]));
        let context = CompositionContext::new().with_catalog(explicit);
        let replacement = Arc::new(CombinedCatalog::combine(vec![contribution("b", "B", "Y")]));
        let chosen = with_override(replacement, || context.catalog());
        assert_eq!(chosen.table().assembly_names(), vec!["A"]);
    }

    #[test]
    fn test_override_restored_after_panic() {
        let replacement = Arc::new(CombinedCatalog::empty());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: () = with_override(replacement, || panic!("boom"));
        }));
        assert!(result.is_err());
        assert!(current_override().is_none());
    }
}
