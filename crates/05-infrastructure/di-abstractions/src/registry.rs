//! 注册指令
//!
//! 组合过程的输出：服务标识、生命周期以及构造实例的工厂闭包。创建后不再修改。

use crate::instance::Instance;
use crate::resolver::Resolver;
use di_common::{DependencyResult, Lifetime, ServiceKey, TypeKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 服务工厂函数类型
pub type ServiceFactory = Arc<dyn Fn(&Resolver) -> DependencyResult<Instance> + Send + Sync>;

/// 装饰器工厂函数类型，输入被装饰的内层实例，输出外层实例
pub type DecoratorFactory =
    Arc<dyn Fn(Instance, &Resolver) -> DependencyResult<Instance> + Send + Sync>;

/// 以闭包创建装饰器工厂
pub fn decorator<F>(decorate: F) -> DecoratorFactory
where
    F: Fn(Instance, &Resolver) -> DependencyResult<Instance> + Send + Sync + 'static,
{
    Arc::new(decorate)
}

/// 服务注册信息
#[derive(Clone)]
pub struct ServiceRegistration {
    /// 服务标识
    pub service: ServiceKey,
    /// 生命周期
    pub lifetime: Lifetime,
    /// 实现类型
    pub implementation: Option<TypeKey>,
    /// 实例工厂
    pub factory: ServiceFactory,
}

impl ServiceRegistration {
    pub fn new<F>(service: impl Into<ServiceKey>, lifetime: Lifetime, factory: F) -> Self
    where
        F: Fn(&Resolver) -> DependencyResult<Instance> + Send + Sync + 'static,
    {
        Self {
            service: service.into(),
            lifetime,
            implementation: None,
            factory: Arc::new(factory),
        }
    }

    /// 以已有工厂创建
    pub fn from_factory(service: ServiceKey, lifetime: Lifetime, factory: ServiceFactory) -> Self {
        Self {
            service,
            lifetime,
            implementation: None,
            factory,
        }
    }

    pub fn with_implementation(mut self, implementation: TypeKey) -> Self {
        self.implementation = Some(implementation);
        self
    }

    /// 调用工厂创建实例
    pub fn create(&self, resolver: &Resolver) -> DependencyResult<Instance> {
        (self.factory)(resolver)
    }

    /// 注册摘要
    pub fn info(&self) -> RegistrationInfo {
        RegistrationInfo {
            service: self.service.clone(),
            lifetime: self.lifetime,
            implementation: self.implementation.clone(),
            decorations: 0,
        }
    }
}

impl std::fmt::Debug for ServiceRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistration")
            .field("service", &self.service)
            .field("lifetime", &self.lifetime)
            .field("implementation", &self.implementation)
            .field("factory", &"<function>")
            .finish()
    }
}

/// 注册摘要，用于报告与断言
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationInfo {
    pub service: ServiceKey,
    pub lifetime: Lifetime,
    pub implementation: Option<TypeKey>,
    /// 已叠加的装饰层数
    pub decorations: usize,
}
