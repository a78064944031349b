//! 容器填充
//!
//! 把发现事实与可执行绑定转换为注册指令。顺序固定：
//! 候选类型（具体类型、接口或生成工厂）、拦截器实例、装饰器链。

use crate::decorator_chain::{DecoratorChain, DecoratorChainBuilder};
use crate::interceptor_proxy::{InterceptionPlan, InterceptorProxyComposer, InterfaceProxy};
use di_abstractions::{
    decorator, instance, Arguments, BindingSet, CandidateType, CatalogFacts, ConstructorParameter,
    CreateFn, DecoratorDescriptor, GeneratedFactory, Instance, LazyInstance, ParameterShape,
    ParameterSource, RegistrationMode, ResolvedArg, Resolver, ServiceCollection,
    ServiceRegistration, TypeBinding,
};
use di_common::well_known::factory_of;
use di_common::{
    CompositionError, CompositionResult, DependencyError, DependencyResult, Diagnostic,
    DiagnosticCode, Diagnostics, Lifetime, ServiceKey, TypeKey,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 按参数描述解析构造参数
///
/// `runtime` 依次填入运行时参数；`inner` 为装饰器的内层参数位置与实例。
pub fn resolve_arguments(
    parameters: &[ConstructorParameter],
    resolver: &Resolver,
    runtime: Vec<Instance>,
    inner: Option<(usize, Instance)>,
) -> DependencyResult<Arguments> {
    let mut runtime = runtime.into_iter();
    let mut values = Vec::with_capacity(parameters.len());

    for (position, parameter) in parameters.iter().enumerate() {
        if let Some((index, instance)) = &inner {
            if *index == position {
                values.push(ResolvedArg::Service(instance.clone()));
                continue;
            }
        }

        let key = parameter.service_key();
        let value = match (parameter.source, parameter.shape) {
            (ParameterSource::Runtime, _) => {
                let value = runtime.next().ok_or_else(|| {
                    DependencyError::creation_failed(
                        parameter.ty.to_string(),
                        format!("缺少运行时参数: {}", parameter.name),
                    )
                })?;
                ResolvedArg::Runtime(value)
            }
            (_, ParameterShape::Collection) => ResolvedArg::Many(resolver.resolve_all(&key)?),
            (_, ParameterShape::Lazy) => {
                ResolvedArg::Lazy(LazyInstance::new(resolver.clone(), key, parameter.optional))
            }
            (ParameterSource::DefaultValue, _) => optional(resolver.try_resolve(&key)?),
            _ if parameter.optional => optional(resolver.try_resolve(&key)?),
            _ => ResolvedArg::Service(resolver.resolve(&key)?),
        };
        values.push(value);
    }

    Ok(Arguments::new(values))
}

fn optional(found: Option<Instance>) -> ResolvedArg {
    found.map_or(ResolvedArg::Absent, ResolvedArg::Service)
}

/// 填充结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationSummary {
    /// 新增注册数量
    pub registrations: usize,
    /// 生成工厂注册数量
    pub factories: usize,
    /// 被装饰的注册数量（按层计）
    pub decorations: usize,
    /// 接口代理数量
    pub proxies: usize,
    pub diagnostics: Diagnostics,
}

/// 容器填充器
pub struct ContainerPopulator<'a> {
    facts: &'a CatalogFacts,
    bindings: &'a BindingSet,
}

impl<'a> ContainerPopulator<'a> {
    pub fn new(facts: &'a CatalogFacts, bindings: &'a BindingSet) -> Self {
        Self { facts, bindings }
    }

    /// 填充服务集合
    pub fn populate<C>(&self, services: &mut C) -> CompositionResult<PopulationSummary>
    where
        C: ServiceCollection + ?Sized,
    {
        info!("开始填充容器: {} 个候选类型", self.facts.candidates.len());
        let before = services.len();
        let mut summary = PopulationSummary::default();

        let plans: Vec<Arc<InterceptionPlan>> = self
            .facts
            .interceptors
            .iter()
            .map(InterceptorProxyComposer::plan)
            .collect();

        for candidate in &self.facts.candidates {
            let binding = self.binding_for(&candidate.implementation)?;
            match candidate.mode {
                RegistrationMode::Direct => {
                    let plan = plans.iter().find(|p| p.intercepted() == &candidate.implementation);
                    summary.proxies += self.register_direct(services, candidate, &binding, plan)?;
                }
                RegistrationMode::GeneratedFactory => {
                    summary.factories += self.register_factories(services, candidate, &binding);
                }
            }
        }

        for plan in &plans {
            for registration in InterceptorProxyComposer::registrations(plan, self.bindings)? {
                services.add(registration);
            }
        }

        let chains = DecoratorChainBuilder::build_chains(&self.facts.decorators, &self.facts.candidates);
        for chain in &chains {
            self.apply_chain(services, chain, &mut summary)?;
        }

        summary.registrations = services.len() - before;
        info!(
            "容器填充完成: 注册 {} 个, 生成工厂 {} 个, 装饰 {} 层, 代理 {} 个",
            summary.registrations, summary.factories, summary.decorations, summary.proxies
        );
        Ok(summary)
    }

    fn binding_for(&self, key: &TypeKey) -> CompositionResult<Arc<TypeBinding>> {
        if let Some(binding) = self.bindings.resolve(key) {
            return Ok(binding);
        }
        if key.arity() > 0 && self.bindings.contains(&key.definition()) {
            return Err(CompositionError::GenericClosureFailed {
                type_name: key.to_string(),
            });
        }
        Err(CompositionError::missing_binding(key.to_string(), "没有可执行绑定"))
    }

    fn keys(candidate: &CandidateType) -> Vec<Option<String>> {
        if candidate.keys.is_empty() {
            vec![None]
        } else {
            candidate.keys.iter().cloned().map(Some).collect()
        }
    }

    /// 注册具体类型与接口，返回代理数量
    fn register_direct<C>(
        &self,
        services: &mut C,
        candidate: &CandidateType,
        binding: &Arc<TypeBinding>,
        plan: Option<&Arc<InterceptionPlan>>,
    ) -> CompositionResult<usize>
    where
        C: ServiceCollection + ?Sized,
    {
        let proxies: HashMap<TypeKey, InterfaceProxy> = match plan {
            Some(plan) => candidate
                .interfaces
                .iter()
                .map(|iface| {
                    InterceptorProxyComposer::build_proxy(plan, binding, iface)
                        .map(|proxy| (iface.clone(), proxy))
                })
                .collect::<CompositionResult<_>>()?,
            None => HashMap::new(),
        };

        for key in Self::keys(candidate) {
            let concrete = ServiceKey::with_key(candidate.implementation.clone(), key.clone());
            let activation = binding.clone();
            let parameters = candidate.parameters.clone();
            let constructor = candidate.constructor;
            services.add(
                ServiceRegistration::new(concrete.clone(), candidate.lifetime, move |resolver: &Resolver| {
                    let args = resolve_arguments(&parameters, resolver, Vec::new(), None)?;
                    activation.activate(constructor, &args)
                })
                .with_implementation(candidate.implementation.clone()),
            );
            debug!("注册服务: {} ({})", concrete, candidate.lifetime);

            for iface in &candidate.interfaces {
                let service = ServiceKey::with_key(iface.clone(), key.clone());
                let view = binding.clone();
                let interface = iface.clone();
                let source = concrete.clone();
                let proxy = proxies.get(iface).cloned();
                services.add(
                    ServiceRegistration::new(service.clone(), candidate.lifetime, move |resolver: &Resolver| {
                        let concrete = resolver.resolve(&source)?;
                        let viewed = view.view(&interface, concrete)?;
                        match &proxy {
                            Some(proxy) => proxy.wrap(viewed, resolver),
                            None => Ok(viewed),
                        }
                    })
                    .with_implementation(candidate.implementation.clone()),
                );
                debug!("注册服务: {} -> {} ({})", service, candidate.implementation, candidate.lifetime);
            }
        }

        Ok(proxies.len())
    }

    /// 注册生成工厂，返回工厂注册数量
    fn register_factories<C>(
        &self,
        services: &mut C,
        candidate: &CandidateType,
        binding: &Arc<TypeBinding>,
    ) -> usize
    where
        C: ServiceCollection + ?Sized,
    {
        let runtime_params: Vec<String> = candidate
            .parameters
            .iter()
            .filter(|p| p.source == ParameterSource::Runtime)
            .map(|p| p.name.clone())
            .collect();
        let targets: Vec<TypeKey> = std::iter::once(candidate.implementation.clone())
            .chain(candidate.interfaces.iter().cloned())
            .collect();

        let mut count = 0;
        for key in Self::keys(candidate) {
            for target in &targets {
                let binding = binding.clone();
                let parameters = candidate.parameters.clone();
                let constructor = candidate.constructor;
                let runtime_params = runtime_params.clone();
                let produced = target.clone();
                let service = ServiceKey::with_key(factory_of(target), key.clone());

                services.add(
                    ServiceRegistration::new(service.clone(), Lifetime::Singleton, move |resolver: &Resolver| {
                        let resolver = resolver.clone();
                        let binding = binding.clone();
                        let parameters = parameters.clone();
                        let view_as = produced.clone();
                        let create: CreateFn = Arc::new(move |runtime: Vec<Instance>| {
                            let args = resolve_arguments(&parameters, &resolver, runtime, None)?;
                            let created = binding.activate(constructor, &args)?;
                            binding.view(&view_as, created)
                        });
                        Ok(instance(GeneratedFactory::new(
                            produced.clone(),
                            runtime_params.clone(),
                            create,
                        )))
                    })
                    .with_implementation(candidate.implementation.clone()),
                );
                debug!("注册生成工厂: {}", service);
                count += 1;
            }
        }
        count
    }

    fn apply_chain<C>(
        &self,
        services: &mut C,
        chain: &DecoratorChain,
        summary: &mut PopulationSummary,
    ) -> CompositionResult<()>
    where
        C: ServiceCollection + ?Sized,
    {
        for descriptor in &chain.decorators {
            let factory = self.decorator_factory(descriptor)?;
            let decorated = services.decorate(&chain.service, factory);
            if decorated == 0 {
                summary.diagnostics.push(
                    Diagnostic::info(
                        DiagnosticCode::OrphanDecorator,
                        format!("{} 没有可装饰的 {} 注册", descriptor.decorator, chain.service),
                    )
                    .with_type(descriptor.decorator.to_string())
                    .with_assembly(descriptor.assembly.clone()),
                );
            } else {
                debug!(
                    "应用装饰器: {} -> {} ({} 个注册)",
                    descriptor.decorator, chain.service, decorated
                );
            }
            summary.decorations += decorated;
        }
        Ok(())
    }

    fn decorator_factory(
        &self,
        descriptor: &DecoratorDescriptor,
    ) -> CompositionResult<di_abstractions::DecoratorFactory> {
        let binding = self.binding_for(&descriptor.decorator)?;
        let inner = descriptor.inner_parameter().ok_or_else(|| {
            CompositionError::invalid_directive(
                descriptor.decorator.to_string(),
                format!("装饰器构造函数缺少类型为 {} 的内层参数", descriptor.target),
            )
        })?;
        let parameters = descriptor.parameters.clone();
        let constructor = descriptor.constructor;
        let target = descriptor.target.clone();

        Ok(decorator(move |wrapped: Instance, resolver: &Resolver| {
            let args = resolve_arguments(&parameters, resolver, Vec::new(), Some((inner, wrapped)))?;
            let created = binding.activate(constructor, &args)?;
            binding.view(&target, created)
        }))
    }
}
