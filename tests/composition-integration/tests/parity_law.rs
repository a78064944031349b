//! 静态类型表与动态扫描的一致性
mod common;

use common::{greet_all, greetings, handler_of, handlers, Handler};
use di_abstractions::{
    instance, Assembly, BindingSet, ConstructorDescriptor, DiscoveryRequest, GeneratedFactory,
    Interceptor, InterceptorChain, Invocation, Next, ParamDescriptor, ReturnValue,
    TypeCatalogProvider, TypeDescriptor,
};
use di_common::well_known::{self, factory_of};
use di_common::{DependencyResult, DiagnosticCode, Directive, TypeKey};
use di_composition::{
    CatalogContribution, CombinedCatalog, CompositionBuilder, CompositionContext, DiscoveryStrategy,
    ReflectionCatalogProvider, StaticCatalogProvider, StaticCatalogTable,
};
use di_impl::ServiceProvider;
use parking_lot::Mutex;
use std::sync::Arc;

/// 手写的 Greetings 类型表，与生成器的输出格式相同
const GREETINGS_TABLE: &str = r#"{
    "host": "Greetings",
    "assemblies": [
        {
            "name": "Greetings",
            "candidates": [
                {
                    "implementation": {"name": "ServiceA"},
                    "interfaces": [{"name": "IGreeter"}],
                    "lifetime": "singleton",
                    "assembly": "Greetings"
                },
                {
                    "implementation": {"name": "ServiceB"},
                    "interfaces": [{"name": "IGreeter"}],
                    "lifetime": "singleton",
                    "assembly": "Greetings"
                }
            ],
            "plugins": [
                {
                    "implementation": {"name": "ServiceA"},
                    "interfaces": [{"name": "IGreeter"}],
                    "assembly": "Greetings"
                },
                {
                    "implementation": {"name": "ServiceB"},
                    "interfaces": [{"name": "IGreeter"}],
                    "assembly": "Greetings"
                }
            ],
            "decorators": [
                {
                    "decorator": {"name": "PrefixingGreeter"},
                    "target": {"name": "IGreeter"},
                    "order": 0,
                    "parameters": [
                        {"name": "inner", "type": {"name": "IGreeter"}}
                    ],
                    "assembly": "Greetings"
                }
            ]
        }
    ]
}"#;

fn request() -> DiscoveryRequest {
    DiscoveryRequest::new(vec![Arc::new(greetings())]).with_host("Greetings")
}

#[test]
fn test_handwritten_table_matches_dynamic_scan() {
    let dynamic = ReflectionCatalogProvider::new().discover(&request()).unwrap();

    let table = StaticCatalogTable::from_json(GREETINGS_TABLE).unwrap();
    let provider = StaticCatalogProvider::new(table, BindingSet::from_assemblies([&greetings()]));
    let generated = provider.discover(&request()).unwrap();

    assert_eq!(generated.facts.parity_view(), dynamic.facts.parity_view());
}

#[test]
fn test_generated_table_roundtrips_through_json() {
    let dynamic = ReflectionCatalogProvider::new().discover(&request()).unwrap();
    let table = StaticCatalogTable::new()
        .with_host("Greetings")
        .with_assembly("Greetings", dynamic.facts.clone())
        .unwrap();

    let reloaded = StaticCatalogTable::from_json(&table.to_json().unwrap()).unwrap();
    let facts = reloaded.facts_for("Greetings").unwrap();
    assert_eq!(facts.parity_view(), dynamic.facts.parity_view());
}

#[test]
fn test_both_strategies_compose_the_same_container() {
    let (dynamic_provider, dynamic) = CompositionBuilder::new()
        .host("Greetings")
        .add_assembly(greetings())
        .build()
        .unwrap();

    let catalog = Arc::new(CombinedCatalog::combine(vec![CatalogContribution::new(
        "greetings",
        StaticCatalogTable::from_json(GREETINGS_TABLE).unwrap(),
        BindingSet::from_assemblies([&greetings()]),
    )]));
    let (static_provider, generated) = CompositionBuilder::new()
        .strategy(DiscoveryStrategy::Static)
        .host("Greetings")
        .add_assembly(greetings())
        .with_context(CompositionContext::new().with_catalog(catalog))
        .build()
        .unwrap();

    assert_eq!(dynamic.report.strategy, "reflection");
    assert_eq!(generated.report.strategy, "static");
    assert_eq!(generated.facts.parity_view(), dynamic.facts.parity_view());
    assert_eq!(generated.plugins, dynamic.plugins);
    assert_eq!(greet_all(&static_provider), greet_all(&dynamic_provider));
    assert_eq!(static_provider.registrations().len(), dynamic_provider.registrations().len());
}

#[test]
fn test_table_from_another_host_is_rejected() {
    let table = StaticCatalogTable::from_json(GREETINGS_TABLE).unwrap();
    let provider = StaticCatalogProvider::new(table, BindingSet::new());
    let other_host = DiscoveryRequest::new(vec![Arc::new(greetings())]).with_host("Shop.Host");
    assert!(provider.discover(&other_host).is_err());
}

// ---------- 覆盖键控、生成工厂、拦截、开放泛型与宿主可见性的夹具 ----------

trait Store: Send + Sync {
    fn region(&self) -> &str;
}

struct RegionStore(&'static str);

impl Store for RegionStore {
    fn region(&self) -> &str {
        self.0
    }
}

struct Replicator {
    primary: Arc<dyn Store>,
    backup: Arc<dyn Store>,
}

trait Job: Send + Sync {
    fn describe(&self) -> String;
}

struct ExportJob {
    store: Arc<dyn Store>,
    batch: u32,
}

impl Job for ExportJob {
    fn describe(&self) -> String {
        format!("export #{} to {}", self.batch, self.store.region())
    }
}

trait Ledger: Send + Sync {
    fn post(&self, amount: i64) -> DependencyResult<i64>;
}

#[derive(Default)]
struct MemoryLedger {
    total: Mutex<i64>,
}

impl Ledger for MemoryLedger {
    fn post(&self, amount: i64) -> DependencyResult<i64> {
        let mut total = self.total.lock();
        *total += amount;
        Ok(*total)
    }
}

struct LedgerProxy {
    inner: Arc<dyn Ledger>,
    chain: Arc<InterceptorChain>,
}

impl Ledger for LedgerProxy {
    fn post(&self, amount: i64) -> DependencyResult<i64> {
        let inner = self.inner.clone();
        self.chain
            .invoke("post", vec![Box::new(amount)], move |invocation| {
                let amount = invocation.cloned_argument::<i64>(0)?;
                Ok(ReturnValue::value(inner.post(amount)?))
            })?
            .into_value::<i64>()
    }
}

#[derive(Default)]
struct Doubling;

impl Interceptor for Doubling {
    fn intercept(&self, invocation: &mut Invocation, next: Next<'_>) -> DependencyResult<ReturnValue> {
        if let Some(amount) = invocation.argument_mut::<i64>(0) {
            *amount *= 2;
        }
        next.proceed(invocation)
    }
}

trait Report: Send + Sync {
    fn title(&self) -> String;
}

struct NamedReport(&'static str);

impl Report for NamedReport {
    fn title(&self) -> String {
        self.0.to_string()
    }
}

fn store(name: &str, region: &'static str, key: &str) -> TypeDescriptor {
    TypeDescriptor::class(name)
        .implements_as::<RegionStore, dyn Store, _>("IStore", |c| c)
        .with_directive(Directive::Keyed(key.to_string()))
        .with_constructor(ConstructorDescriptor::new(Vec::new(), move |_| Ok(RegionStore(region))))
}

fn report(name: &'static str) -> TypeDescriptor {
    TypeDescriptor::class(name)
        .implements_as::<NamedReport, dyn Report, _>("IReport", |c| c)
        .with_constructor(ConstructorDescriptor::new(Vec::new(), move |_| Ok(NamedReport(name))))
}

fn shop() -> Assembly {
    Assembly::new("Shop").with_types([
        TypeDescriptor::class("Doubling")
            .implements_as::<Doubling, dyn Interceptor, _>(well_known::interceptor(), |c| c)
            .with_constructor(ConstructorDescriptor::default_of::<Doubling>()),
        store("EastStore", "east", "primary"),
        store("WestStore", "west", "backup"),
        TypeDescriptor::class("Replicator")
            .with_directive(Directive::singleton())
            .with_constructor(ConstructorDescriptor::new(
                vec![
                    ParamDescriptor::service("primary", "IStore").keyed("primary"),
                    ParamDescriptor::service("backup", "IStore").keyed("backup"),
                ],
                |args| {
                    Ok(Replicator {
                        primary: args.interface::<dyn Store>(0)?,
                        backup: args.interface::<dyn Store>(1)?,
                    })
                },
            )),
        TypeDescriptor::class("ExportJob")
            .implements_as::<ExportJob, dyn Job, _>("IJob", |c| c)
            .with_directive(Directive::GenerateFactory)
            .with_constructor(ConstructorDescriptor::new(
                vec![
                    ParamDescriptor::service("store", "IStore").keyed("primary"),
                    ParamDescriptor::runtime("batch", "u32"),
                ],
                |args| {
                    Ok(ExportJob {
                        store: args.interface::<dyn Store>(0)?,
                        batch: *args.service::<u32>(1)?,
                    })
                },
            )),
        TypeDescriptor::class("MemoryLedger")
            .implements_as::<MemoryLedger, dyn Ledger, _>("ILedger", |c| c)
            .with_directive(Directive::scoped())
            .with_method("post", vec![Directive::intercept("Doubling")])
            .with_proxy::<dyn Ledger, _>("ILedger", |inner, chain| Arc::new(LedgerProxy { inner, chain }))
            .with_constructor(ConstructorDescriptor::default_of::<MemoryLedger>()),
    ])
}

/// 外部程序集，未声明参与发现
fn vendor() -> Assembly {
    Assembly::new("Vendor").with_types([report("PublicReport"), report("HiddenReport").internal()])
}

/// 外部程序集，声明参与发现
fn partner() -> Assembly {
    Assembly::new("Partner")
        .participating()
        .with_type(report("PartnerReport").internal())
}

fn storefront() -> Vec<Assembly> {
    vec![shop(), handlers(), vendor(), partner()]
}

/// 独立手写的类型表，覆盖 storefront 的全部事实
const STOREFRONT_TABLE: &str = r#"{
    "host": "Shop",
    "assemblies": [
        {
            "name": "Shop",
            "candidates": [
                {
                    "implementation": {"name": "EastStore"},
                    "interfaces": [{"name": "IStore"}],
                    "lifetime": "singleton",
                    "keys": ["primary"],
                    "assembly": "Shop"
                },
                {
                    "implementation": {"name": "WestStore"},
                    "interfaces": [{"name": "IStore"}],
                    "lifetime": "singleton",
                    "keys": ["backup"],
                    "assembly": "Shop"
                },
                {
                    "implementation": {"name": "Replicator"},
                    "lifetime": "singleton",
                    "parameters": [
                        {"name": "primary", "type": {"name": "IStore"}, "key": "primary"},
                        {"name": "backup", "type": {"name": "IStore"}, "key": "backup"}
                    ],
                    "assembly": "Shop"
                },
                {
                    "implementation": {"name": "ExportJob"},
                    "interfaces": [{"name": "IJob"}],
                    "lifetime": "singleton",
                    "parameters": [
                        {"name": "store", "type": {"name": "IStore"}, "key": "primary"},
                        {"name": "batch", "type": {"name": "u32"}, "source": "runtime"}
                    ],
                    "mode": "generated_factory",
                    "assembly": "Shop"
                },
                {
                    "implementation": {"name": "MemoryLedger"},
                    "interfaces": [{"name": "ILedger"}],
                    "lifetime": "scoped",
                    "assembly": "Shop"
                }
            ],
            "plugins": [
                {"implementation": {"name": "EastStore"}, "interfaces": [{"name": "IStore"}], "assembly": "Shop"},
                {"implementation": {"name": "WestStore"}, "interfaces": [{"name": "IStore"}], "assembly": "Shop"},
                {"implementation": {"name": "MemoryLedger"}, "interfaces": [{"name": "ILedger"}], "assembly": "Shop"}
            ],
            "interceptors": [
                {
                    "intercepted": {"name": "MemoryLedger"},
                    "interfaces": [{"name": "ILedger"}],
                    "methods": [
                        {"name": "post", "interceptors": [{"name": "Doubling"}]}
                    ],
                    "lifetime": "scoped",
                    "activations": [
                        {"interceptor": {"name": "Doubling"}}
                    ]
                }
            ]
        },
        {
            "name": "Handlers",
            "candidates": [
                {
                    "implementation": {"name": "OrderHandler"},
                    "interfaces": [{"name": "IHandler", "args": [{"name": "Order"}]}],
                    "lifetime": "singleton",
                    "assembly": "Handlers"
                },
                {
                    "implementation": {"name": "PaymentHandler"},
                    "interfaces": [{"name": "IHandler", "args": [{"name": "Payment"}]}],
                    "lifetime": "singleton",
                    "assembly": "Handlers"
                }
            ],
            "plugins": [
                {
                    "implementation": {"name": "OrderHandler"},
                    "interfaces": [{"name": "IHandler", "args": [{"name": "Order"}]}],
                    "assembly": "Handlers"
                },
                {
                    "implementation": {"name": "PaymentHandler"},
                    "interfaces": [{"name": "IHandler", "args": [{"name": "Payment"}]}],
                    "assembly": "Handlers"
                }
            ],
            "decorators": [
                {
                    "decorator": {"name": "MetricsHandler", "args": [{"param": 0}]},
                    "target": {"name": "IHandler", "args": [{"param": 0}]},
                    "order": 2,
                    "open": true,
                    "parameters": [
                        {"name": "inner", "type": {"name": "IHandler", "args": [{"param": 0}]}}
                    ],
                    "assembly": "Handlers"
                },
                {
                    "decorator": {"name": "LoggingHandler", "args": [{"param": 0}]},
                    "target": {"name": "IHandler", "args": [{"param": 0}]},
                    "order": 1,
                    "open": true,
                    "parameters": [
                        {"name": "inner", "type": {"name": "IHandler", "args": [{"param": 0}]}}
                    ],
                    "assembly": "Handlers"
                }
            ]
        },
        {
            "name": "Vendor",
            "candidates": [
                {
                    "implementation": {"name": "PublicReport"},
                    "interfaces": [{"name": "IReport"}],
                    "lifetime": "singleton",
                    "assembly": "Vendor"
                }
            ],
            "plugins": [
                {"implementation": {"name": "PublicReport"}, "interfaces": [{"name": "IReport"}], "assembly": "Vendor"}
            ]
        },
        {
            "name": "Partner",
            "candidates": [
                {
                    "implementation": {"name": "PartnerReport"},
                    "interfaces": [{"name": "IReport"}],
                    "lifetime": "singleton",
                    "assembly": "Partner"
                }
            ],
            "plugins": [
                {"implementation": {"name": "PartnerReport"}, "interfaces": [{"name": "IReport"}], "assembly": "Partner"}
            ]
        }
    ]
}"#;

fn storefront_bindings() -> BindingSet {
    let assemblies = storefront();
    BindingSet::from_assemblies(assemblies.iter())
}

fn storefront_request() -> DiscoveryRequest {
    DiscoveryRequest::new(storefront().into_iter().map(Arc::new).collect()).with_host("Shop")
}

/// 排序后的注册摘要
fn registrations(provider: &ServiceProvider) -> Vec<String> {
    let mut summaries: Vec<String> = provider
        .registrations()
        .iter()
        .map(|r| {
            format!(
                "{} <- {} [{}] x{}",
                r.service,
                r.implementation.as_ref().map(ToString::to_string).unwrap_or_default(),
                r.lifetime,
                r.decorations
            )
        })
        .collect();
    summaries.sort();
    summaries
}

/// 在一个作用域内使用每一类注册
fn exercise(provider: &ServiceProvider) -> Vec<String> {
    let scope = provider.create_scope();
    let resolver = scope.resolver();

    let replicator = resolver.get::<Replicator>("Replicator").unwrap();
    let factory = resolver
        .get::<GeneratedFactory>(factory_of(&TypeKey::named("IJob")))
        .unwrap();
    let job = factory.create_interface::<dyn Job>(vec![instance(7u32)]).unwrap();
    let ledger = resolver.get_interface::<dyn Ledger>("ILedger").unwrap();

    let mut observed = vec![
        format!("{}/{}", replicator.primary.region(), replicator.backup.region()),
        job.describe(),
        ledger.post(5).unwrap().to_string(),
    ];
    for entity in ["Order", "Payment"] {
        observed.push(resolver.get_interface::<dyn Handler>(handler_of(entity)).unwrap().handle());
    }
    let mut reports: Vec<String> = resolver
        .get_all::<dyn Report>("IReport")
        .unwrap()
        .iter()
        .map(|r| r.title())
        .collect();
    reports.sort();
    observed.extend(reports);
    observed
}

#[test]
fn test_handwritten_storefront_table_matches_dynamic_scan() {
    let dynamic = ReflectionCatalogProvider::new().discover(&storefront_request()).unwrap();

    let table = StaticCatalogTable::from_json(STOREFRONT_TABLE).unwrap();
    let provider = StaticCatalogProvider::new(table, storefront_bindings());
    let generated = provider.discover(&storefront_request()).unwrap();

    assert_eq!(generated.facts.parity_view(), dynamic.facts.parity_view());

    // 非参与的外部程序集中的内部类型只在诊断中出现
    assert!(dynamic.facts.candidate(&TypeKey::named("HiddenReport")).is_none());
    assert!(dynamic.facts.candidate(&TypeKey::named("PartnerReport")).is_some());
    let inaccessible = dynamic.facts.diagnostics.with_code(DiagnosticCode::InaccessibleType);
    assert_eq!(inaccessible.len(), 1);
    assert_eq!(inaccessible[0].type_name.as_deref(), Some("HiddenReport"));
}

#[test]
fn test_storefront_strategies_compose_the_same_registrations() {
    let (dynamic_provider, dynamic) = CompositionBuilder::new()
        .host("Shop")
        .add_assemblies(storefront())
        .build()
        .unwrap();

    let catalog = Arc::new(CombinedCatalog::combine(vec![CatalogContribution::new(
        "storefront",
        StaticCatalogTable::from_json(STOREFRONT_TABLE).unwrap(),
        storefront_bindings(),
    )]));
    let (static_provider, generated) = CompositionBuilder::new()
        .strategy(DiscoveryStrategy::Static)
        .host("Shop")
        .add_assemblies(storefront())
        .with_context(CompositionContext::new().with_catalog(catalog))
        .build()
        .unwrap();

    assert_eq!(generated.facts.parity_view(), dynamic.facts.parity_view());
    assert_eq!(generated.plugins, dynamic.plugins);
    assert_eq!(generated.report.factories, dynamic.report.factories);
    assert_eq!(generated.report.decorations, dynamic.report.decorations);
    assert_eq!(generated.report.proxies, dynamic.report.proxies);
    assert_eq!(registrations(&static_provider), registrations(&dynamic_provider));

    let observed = exercise(&dynamic_provider);
    assert_eq!(
        observed,
        vec![
            "east/west",
            "export #7 to east",
            "10",
            "Metrics(Logged(Handler(Order)))",
            "Metrics(Logged(Handler(Payment)))",
            "PartnerReport",
            "PublicReport",
        ]
    );
    assert_eq!(exercise(&static_provider), observed);
}
