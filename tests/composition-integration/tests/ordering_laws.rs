//! 插件与程序集排序的确定性
mod common;

use common::{greetings, plugins, EXPECTED_PLUGIN_ORDER};
use di_abstractions::Assembly;
use di_common::TypeKey;
use di_composition::{AssemblyOrder, AssemblyPredicate, CompositionBuilder, CompositionOptions};

#[test]
fn test_plugins_follow_order_then_name() {
    let (_, composition) = CompositionBuilder::new().add_assembly(plugins()).build().unwrap();
    assert_eq!(composition.plugins.names(), EXPECTED_PLUGIN_ORDER);

    let startup = composition.plugins.implementing(&TypeKey::named("IStartupTask"));
    assert_eq!(startup.len(), EXPECTED_PLUGIN_ORDER.len());
}

#[test]
fn test_plugin_order_is_identical_across_builds() {
    let baseline = CompositionBuilder::new()
        .add_assembly(plugins())
        .build()
        .unwrap()
        .1
        .plugins;

    for _ in 0..10 {
        let (_, again) = CompositionBuilder::new().add_assembly(plugins()).build().unwrap();
        assert_eq!(again.plugins, baseline);
    }
}

#[test]
fn test_matching_assemblies_are_composed_first() {
    let orderer = AssemblyOrder::by(AssemblyPredicate::contains("X")).build();
    let (_, composition) = CompositionBuilder::new()
        .add_assemblies(["Zeta", "b.X", "Alpha", "a.X"].map(Assembly::new))
        .with_assembly_order(orderer)
        .build()
        .unwrap();

    assert_eq!(composition.report.assemblies, vec!["a.X", "b.X", "Alpha", "Zeta"]);
}

#[test]
fn test_tiers_follow_rule_declaration_order() {
    let orderer = AssemblyOrder::by(AssemblyPredicate::suffix(".Core"))
        .then_by(AssemblyPredicate::prefix("Vendor."))
        .unwrap()
        .build();
    let sorted = orderer.sort_names(&["zeta", "Vendor.Plugins", "Alpha", "Shop.Core"]);
    assert_eq!(sorted, vec!["Shop.Core", "Vendor.Plugins", "Alpha", "zeta"]);
}

#[test]
fn test_then_by_without_rule_is_rejected() {
    assert!(di_composition::AssemblyOrderBuilder::new()
        .then_by(AssemblyPredicate::exact("App"))
        .is_err());
}

#[test]
fn test_configured_rules_drive_assembly_order() {
    let options = CompositionOptions::from_toml_str(
        r#"
        [[assembly_order]]
        match = "prefix"
        value = "Plugins"
        "#,
    )
    .unwrap();

    let (_, composition) = CompositionBuilder::new()
        .with_options(options)
        .add_assembly(greetings())
        .add_assembly(plugins())
        .build()
        .unwrap();
    assert_eq!(composition.report.assemblies, vec!["Plugins", "Greetings"]);
}
