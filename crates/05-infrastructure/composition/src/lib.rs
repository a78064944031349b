//! # 发现与组合核心
//!
//! 根据一组程序集决定哪些类型成为可注入服务、各自的生命周期、构造依赖，
//! 以及装饰器链和拦截代理，最终生成一组确定的注册指令填充到容器中。
//!
//! ## 主要功能
//!
//! - **程序集排序**: 按分层规则排列候选程序集
//! - **类型发现**: 动态扫描与静态类型表两种可互换的实现
//! - **生命周期与构造函数**: 声明式指令的统一解释
//! - **装饰器链**: 按顺序包裹每一个已有注册，支持开放泛型展开
//! - **拦截代理**: 每个被拦截类型共享一条拦截器链
//! - **插件排序**: 按优先级与名称确定执行顺序
//! - **引导注册表**: 汇总各编译单元贡献的静态类型表
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use di_composition::CompositionBuilder;
//! use di_abstractions::Assembly;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (provider, composition) = CompositionBuilder::new()
//!         .host("Shop.Host")
//!         .add_assembly(Assembly::new("Shop.Host"))
//!         .build()?;
//!
//!     println!("{}", composition.report);
//!     let _resolver = provider.resolver();
//!     Ok(())
//! }
//! ```

pub mod assembly_order;
pub mod bootstrap;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod constructor;
pub mod decorator_chain;
pub mod interceptor_proxy;
pub mod lifetime;
pub mod logging;
pub mod plugin_order;
pub mod populator;
pub mod qualifier;
pub mod report;
pub mod validation;

pub use assembly_order::{
    AssemblyOrder, AssemblyOrderBuilder, AssemblyOrderRule, AssemblyOrderer, AssemblyPredicate,
};
pub use bootstrap::{
    current_override, scope_override, with_override, BootstrapRegistry, CatalogContribution,
    CombinedCatalog, CompositionContext,
};
pub use builder::{Composition, CompositionBuilder};
pub use catalog::{AssemblyFacts, ReflectionCatalogProvider, StaticCatalogProvider, StaticCatalogTable};
pub use config::{CompositionOptions, DiscoveryStrategy};
pub use constructor::{ConstructorResolver, ConstructorSelection};
pub use decorator_chain::{DecoratorChain, DecoratorChainBuilder};
pub use interceptor_proxy::{InterceptionPlan, InterceptorProxyComposer, InterfaceProxy};
pub use lifetime::LifetimeClassifier;
pub use logging::LoggingConfig;
pub use plugin_order::{OrderedPlugins, PluginOrderer};
pub use populator::{ContainerPopulator, PopulationSummary};
pub use qualifier::{TypeDecision, TypeQualifier, TypeRole};
pub use report::CompositionReport;
pub use validation::CompositionValidator;

// 重新导出错误类型
pub use di_common::{CompositionError, CompositionResult};

#[cfg(test)]
mod tests;
