//! 键控服务、生成工厂与验证诊断的端到端场景

use di_abstractions::{
    instance, Assembly, ConstructorDescriptor, GeneratedFactory, ParamDescriptor, TypeDescriptor,
};
use di_common::well_known::factory_of;
use di_common::{DiagnosticCode, DiagnosticSeverity, Directive, ServiceKey, TypeKey};
use di_composition::CompositionBuilder;
use std::sync::Arc;

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

fn store(name: &str, region: &'static str, key: &str) -> TypeDescriptor {
    TypeDescriptor::class(name)
        .implements_as::<RegionStore, dyn Store, _>("IStore", |c| c)
        .with_directive(Directive::Keyed(key.to_string()))
        .with_constructor(ConstructorDescriptor::new(Vec::new(), move |_| Ok(RegionStore(region))))
}

fn storage() -> Assembly {
    Assembly::new("Storage").with_types([
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
    ])
}

#[test]
fn test_keyed_parameters_receive_keyed_registrations() {
    let (provider, composition) = CompositionBuilder::new().add_assembly(storage()).build().unwrap();
    let resolver = provider.resolver();

    let replicator = resolver.get::<Replicator>("Replicator").unwrap();
    assert_eq!(replicator.primary.region(), "east");
    assert_eq!(replicator.backup.region(), "west");

    assert_eq!(resolver.get_keyed::<dyn Store>("IStore", "backup").unwrap().region(), "west");
    assert!(!resolver.is_registered(&ServiceKey::of("IStore")));
    assert!(composition
        .report
        .diagnostics
        .with_code(DiagnosticCode::UnresolvedKeyedDependency)
        .is_empty());
}

#[test]
fn test_unknown_key_is_informational() {
    let assembly = storage().with_type(
        TypeDescriptor::class("Archiver")
            .with_directive(Directive::transient())
            .with_constructor(ConstructorDescriptor::new(
                vec![ParamDescriptor::service("cold", "IStore").keyed("cold").optional()],
                |args| Ok(args.optional_interface::<dyn Store>(0)?.is_some()),
            )),
    );

    let (provider, composition) = CompositionBuilder::new().add_assembly(assembly).build().unwrap();
    let unresolved = composition
        .report
        .diagnostics
        .with_code(DiagnosticCode::UnresolvedKeyedDependency);
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].severity, DiagnosticSeverity::Info);
    assert!(!composition.report.has_warnings());

    // 可选依赖缺失时为空
    let has_cold = provider.resolver().get::<bool>("Archiver").unwrap();
    assert!(!*has_cold);
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

fn jobs() -> Assembly {
    storage().with_type(
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
    )
}

#[test]
fn test_generated_factory_combines_container_and_runtime_arguments() {
    let (provider, composition) = CompositionBuilder::new().add_assembly(jobs()).build().unwrap();
    assert_eq!(composition.report.factories, 2);

    let resolver = provider.resolver();
    assert!(!resolver.is_registered(&ServiceKey::of("ExportJob")));

    let factory = resolver
        .get::<GeneratedFactory>(factory_of(&TypeKey::named("IJob")))
        .unwrap();
    assert_eq!(factory.runtime_params(), &["batch".to_string()]);

    let job = factory.create_interface::<dyn Job>(vec![instance(3u32)]).unwrap();
    assert_eq!(job.describe(), "export #3 to east");
    assert!(factory.create(Vec::new()).is_err());

    let concrete = resolver
        .get::<GeneratedFactory>(factory_of(&TypeKey::named("ExportJob")))
        .unwrap();
    assert_eq!(concrete.create_as::<ExportJob>(vec![instance(9u32)]).unwrap().batch, 9);
}
