//! 拦截代理组合
//!
//! 每个被拦截类型生成一个 [`InterceptionPlan`]，该类型的所有接口代理共享它。
//! 拦截器实例与拦截器链都以被拦截类型为键注册，生命周期与被拦截服务一致，
//! 因此链的缓存归属于容器或作用域，而不是计划本身。

use crate::populator::resolve_arguments;
use di_abstractions::{
    downcast, downcast_interface, instance, BindingSet, Instance, Interceptor, InterceptorChain,
    InterceptorDescriptor, ProxyFactory, Resolver, ServiceRegistration, TypeBinding,
};
use di_common::{well_known, CompositionError, CompositionResult, DependencyResult, ServiceKey, TypeKey};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 单个被拦截类型的拦截计划
#[derive(Debug)]
pub struct InterceptionPlan {
    descriptor: InterceptorDescriptor,
}

impl InterceptionPlan {
    pub fn new(descriptor: InterceptorDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn intercepted(&self) -> &TypeKey {
        &self.descriptor.intercepted
    }

    pub fn descriptor(&self) -> &InterceptorDescriptor {
        &self.descriptor
    }

    /// 拦截器实例的注册标识
    pub fn registration_key(&self, interceptor: &TypeKey) -> ServiceKey {
        ServiceKey::keyed(interceptor.clone(), self.descriptor.intercepted.to_string())
    }

    /// 拦截器链的注册标识
    pub fn chain_key(&self) -> ServiceKey {
        ServiceKey::keyed(well_known::interceptor_chain(), self.descriptor.intercepted.to_string())
    }

    /// 从容器获取拦截器链
    ///
    /// 单例在每个容器内只构建一次，作用域类型在每个作用域内只构建一次。
    pub fn chain(&self, resolver: &Resolver) -> DependencyResult<Arc<InterceptorChain>> {
        downcast::<InterceptorChain>(&resolver.resolve(&self.chain_key())?)
    }

    fn build(&self, resolver: &Resolver) -> DependencyResult<InterceptorChain> {
        let mut resolved: HashMap<TypeKey, Arc<dyn Interceptor>> = HashMap::new();
        for interceptor in self.descriptor.all_interceptors() {
            let instance = resolver.resolve(&self.registration_key(&interceptor))?;
            resolved.insert(interceptor, downcast_interface::<dyn Interceptor>(&instance)?);
        }
        let pick = |keys: Vec<TypeKey>| -> Vec<Arc<dyn Interceptor>> {
            keys.iter().filter_map(|k| resolved.get(k).cloned()).collect()
        };

        let default = pick(self.descriptor.interceptors.clone());
        let per_method = self
            .descriptor
            .methods
            .iter()
            .map(|m| (m.name.clone(), pick(self.descriptor.interceptors_for(&m.name))))
            .collect();

        debug!("构建拦截器链: {}", self.descriptor.intercepted);
        Ok(InterceptorChain::new(
            self.descriptor.intercepted.clone(),
            default,
            per_method,
        ))
    }
}

/// 单个接口的代理
#[derive(Clone)]
pub struct InterfaceProxy {
    interface: TypeKey,
    plan: Arc<InterceptionPlan>,
    factory: ProxyFactory,
}

impl InterfaceProxy {
    pub fn interface(&self) -> &TypeKey {
        &self.interface
    }

    /// 用代理包裹接口视图
    pub fn wrap(&self, view: Instance, resolver: &Resolver) -> DependencyResult<Instance> {
        let chain = self.plan.chain(resolver)?;
        (self.factory)(view, chain)
    }
}

/// 拦截代理组合器
pub struct InterceptorProxyComposer;

impl InterceptorProxyComposer {
    pub fn plan(descriptor: &InterceptorDescriptor) -> Arc<InterceptionPlan> {
        Arc::new(InterceptionPlan::new(descriptor.clone()))
    }

    /// 为被拦截类型的某个接口构建代理
    pub fn build_proxy(
        plan: &Arc<InterceptionPlan>,
        binding: &TypeBinding,
        interface: &TypeKey,
    ) -> CompositionResult<InterfaceProxy> {
        let factory = binding.proxy(interface).cloned().ok_or_else(|| {
            CompositionError::missing_binding(
                plan.intercepted().to_string(),
                format!("接口 {} 没有拦截代理工厂", interface),
            )
        })?;
        Ok(InterfaceProxy {
            interface: interface.clone(),
            plan: plan.clone(),
            factory,
        })
    }

    /// 拦截器实例与拦截器链的注册指令
    pub fn registrations(
        plan: &Arc<InterceptionPlan>,
        bindings: &BindingSet,
    ) -> CompositionResult<Vec<ServiceRegistration>> {
        let descriptor = plan.descriptor();
        let contract = well_known::interceptor();
        let mut registrations = Vec::new();

        for interceptor in descriptor.all_interceptors() {
            let activation = descriptor.activation(&interceptor).ok_or_else(|| {
                CompositionError::missing_binding(
                    interceptor.to_string(),
                    format!("{} 的拦截器缺少激活信息", descriptor.intercepted),
                )
            })?;
            let binding = bindings.resolve(&interceptor).ok_or_else(|| {
                CompositionError::missing_binding(interceptor.to_string(), "拦截器没有可执行绑定")
            })?;
            if !binding.has_upcast(&contract) {
                return Err(CompositionError::missing_binding(
                    interceptor.to_string(),
                    format!("拦截器没有到 {} 的转换", contract),
                ));
            }

            let parameters = activation.parameters.clone();
            let constructor = activation.constructor;
            let contract = contract.clone();
            let registration = ServiceRegistration::new(
                plan.registration_key(&interceptor),
                descriptor.lifetime,
                move |resolver: &Resolver| {
                    let args = resolve_arguments(&parameters, resolver, Vec::new(), None)?;
                    let instance = binding.activate(constructor, &args)?;
                    binding.view(&contract, instance)
                },
            )
            .with_implementation(interceptor.clone());
            registrations.push(registration);
        }

        let chain_plan = plan.clone();
        registrations.push(
            ServiceRegistration::new(plan.chain_key(), descriptor.lifetime, move |resolver: &Resolver| {
                Ok(instance(chain_plan.build(resolver)?))
            })
            .with_implementation(well_known::interceptor_chain()),
        );

        Ok(registrations)
    }
}
