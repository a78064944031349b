//! 组合构建器
//!
//! 串起整个组合流程：程序集排序、发现、排除、校验、容器填充、插件排序。

use crate::assembly_order::AssemblyOrderer;
use crate::bootstrap::{BootstrapRegistry, CompositionContext};
use crate::catalog::ReflectionCatalogProvider;
use crate::config::{CompositionOptions, DiscoveryStrategy};
use crate::logging::LoggingConfig;
use crate::plugin_order::{OrderedPlugins, PluginOrderer};
use crate::populator::ContainerPopulator;
use crate::report::CompositionReport;
use crate::validation::CompositionValidator;
use di_abstractions::{
    Assembly, AssemblyProvider, CatalogFacts, DiscoveryRequest, ServiceCollection,
    TypeCatalogProvider,
};
use di_common::{CompositionError, CompositionResult, DiagnosticSeverity};
use di_impl::{ServiceCollectionImpl, ServiceProvider};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 组合结果
#[derive(Debug, Clone)]
pub struct Composition {
    /// 排除之后实际用于填充的事实
    pub facts: CatalogFacts,
    pub plugins: OrderedPlugins,
    pub report: CompositionReport,
}

/// 组合构建器
///
/// 使用建造者模式配置一次组合
pub struct CompositionBuilder {
    options: CompositionOptions,
    /// 直接添加的程序集
    assemblies: Vec<Arc<Assembly>>,
    /// 程序集提供者列表
    assembly_providers: Vec<Box<dyn AssemblyProvider>>,
    /// 显式的程序集排序器，优先于配置中的规则
    orderer: Option<AssemblyOrderer>,
    /// 显式的目录提供者，优先于配置中的策略
    catalog_provider: Option<Arc<dyn TypeCatalogProvider>>,
    context: CompositionContext,
    logging: Option<LoggingConfig>,
}

impl CompositionBuilder {
    /// 创建新的组合构建器
    pub fn new() -> Self {
        Self {
            options: CompositionOptions::default(),
            assemblies: Vec::new(),
            assembly_providers: Vec::new(),
            orderer: None,
            catalog_provider: None,
            context: CompositionContext::new(),
            logging: None,
        }
    }

    pub fn with_options(mut self, options: CompositionOptions) -> Self {
        self.options = options;
        self
    }

    /// 从配置文件与环境变量加载选项
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> CompositionResult<Self> {
        self.options = CompositionOptions::load(Some(path.as_ref()))?;
        Ok(self)
    }

    pub fn options(&self) -> &CompositionOptions {
        &self.options
    }

    pub fn strategy(mut self, strategy: DiscoveryStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    /// 设置执行发现的宿主程序集
    pub fn host(mut self, assembly: impl Into<String>) -> Self {
        self.options.host_assembly = Some(assembly.into());
        self
    }

    pub fn add_assembly(mut self, assembly: Assembly) -> Self {
        debug!("添加程序集: {}", assembly.name);
        self.assemblies.push(Arc::new(assembly));
        self
    }

    pub fn add_assemblies(mut self, assemblies: impl IntoIterator<Item = Assembly>) -> Self {
        self.assemblies.extend(assemblies.into_iter().map(Arc::new));
        self
    }

    /// 添加程序集提供者
    pub fn with_assembly_provider<T: AssemblyProvider + 'static>(mut self, provider: T) -> Self {
        self.assembly_providers.push(Box::new(provider));
        self
    }

    pub fn with_assembly_order(mut self, orderer: AssemblyOrderer) -> Self {
        self.orderer = Some(orderer);
        self
    }

    /// 使用指定的目录提供者
    pub fn with_catalog_provider<T: TypeCatalogProvider + 'static>(mut self, provider: T) -> Self {
        self.catalog_provider = Some(Arc::new(provider));
        self
    }

    pub fn with_context(mut self, context: CompositionContext) -> Self {
        self.context = context;
        self
    }

    /// 静态策略使用独立的引导注册表
    pub fn with_registry(mut self, registry: Arc<BootstrapRegistry>) -> Self {
        self.context = self.context.with_registry(registry);
        self
    }

    /// 组合前初始化日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// 组合到给定的服务集合
    pub fn compose<C>(&self, services: &mut C) -> CompositionResult<Composition>
    where
        C: ServiceCollection + ?Sized,
    {
        if let Some(logging) = &self.logging {
            logging.init();
        }
        info!("开始组合");

        let orderer = match &self.orderer {
            Some(orderer) => orderer.clone(),
            None => self.options.assembly_orderer()?,
        };
        let assemblies = orderer.sort(self.collect_assemblies());
        let names: Vec<String> = assemblies.iter().map(|a| a.name.clone()).collect();
        info!("程序集排序完成: {:?}", names);

        let mut request = DiscoveryRequest::new(assemblies);
        if let Some(host) = &self.options.host_assembly {
            request = request.with_host(host.clone());
        }

        let provider = self.catalog_provider();
        let discovery = provider.discover(&request)?;
        let bindings = discovery.bindings;
        let mut facts = discovery.facts;
        self.exclude(&mut facts);

        let mut diagnostics = facts.diagnostics.clone();
        if self.options.validation.enabled {
            diagnostics.extend(CompositionValidator::new(&facts).validate());
        }
        for diagnostic in diagnostics.iter().filter(|d| d.severity >= DiagnosticSeverity::Warning) {
            warn!("组合诊断 {}", diagnostic);
        }
        if self.options.validation.fail_on_warnings
            && diagnostics.has_at_least(DiagnosticSeverity::Warning)
        {
            return Err(CompositionError::ValidationFailed {
                message: format!(
                    "存在 {} 条警告",
                    diagnostics
                        .iter()
                        .filter(|d| d.severity >= DiagnosticSeverity::Warning)
                        .count()
                ),
            });
        }

        let summary = ContainerPopulator::new(&facts, &bindings).populate(services)?;
        diagnostics.extend(summary.diagnostics.clone());

        let plugins = PluginOrderer::order(&facts.plugins);
        debug!("插件顺序: {:?}", plugins.names());

        let report = CompositionReport::new(provider.name(), names, &facts, &summary, diagnostics);
        info!("组合完成: {}", report);
        Ok(Composition {
            facts,
            plugins,
            report,
        })
    }

    /// 组合到新的容器并构建服务提供者
    pub fn build(&self) -> CompositionResult<(ServiceProvider, Composition)> {
        let mut services = ServiceCollectionImpl::new();
        let composition = self.compose(&mut services)?;
        Ok((services.build(), composition))
    }

    /// 直接添加的程序集在前，按名称去重
    fn collect_assemblies(&self) -> Vec<Arc<Assembly>> {
        let mut seen = HashSet::new();
        self.assemblies
            .iter()
            .cloned()
            .chain(self.assembly_providers.iter().flat_map(|p| p.assemblies()))
            .filter(|assembly| seen.insert(assembly.name.clone()))
            .collect()
    }

    fn catalog_provider(&self) -> Arc<dyn TypeCatalogProvider> {
        if let Some(provider) = &self.catalog_provider {
            return provider.clone();
        }
        match self.options.strategy {
            DiscoveryStrategy::Dynamic => Arc::new(ReflectionCatalogProvider::new()),
            DiscoveryStrategy::Static => Arc::new(self.context.catalog().provider()),
        }
    }

    fn exclude(&self, facts: &mut CatalogFacts) {
        if self.options.exclude_types.is_empty() {
            return;
        }
        let options = &self.options;
        let keep = |name: String| {
            let excluded = options.is_excluded(&name);
            if excluded {
                debug!("按配置排除类型: {}", name);
            }
            !excluded
        };
        facts.candidates.retain(|c| keep(c.implementation.to_string()));
        facts.plugins.retain(|p| keep(p.implementation.to_string()));
        facts.decorators.retain(|d| keep(d.decorator.to_string()));
        facts.interceptors.retain(|i| keep(i.intercepted.to_string()));
    }
}

impl Default for CompositionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
