//! 依赖解析抽象接口
//!
//! 组合结果中的工厂闭包只通过 [`Resolver`] 访问容器，不关心容器的具体实现。

use crate::instance::{downcast, downcast_interface, Instance};
use di_common::{DependencyError, DependencyResult, ServiceKey, TypeKey};
use std::any::Any;
use std::sync::Arc;

/// 依赖来源 trait
///
/// 由外部容器实现，解析时按服务标识查找注册。
pub trait DependencySource: Send + Sync {
    /// 解析单个服务；存在多个注册时返回最后一个
    fn resolve(&self, key: &ServiceKey) -> DependencyResult<Instance>;

    /// 解析单个服务，未注册时返回 `None`
    fn try_resolve(&self, key: &ServiceKey) -> DependencyResult<Option<Instance>>;

    /// 按注册顺序解析全部实现
    fn resolve_all(&self, key: &ServiceKey) -> DependencyResult<Vec<Instance>>;

    /// 检查是否存在注册
    fn is_registered(&self, key: &ServiceKey) -> bool;
}

/// 解析器
///
/// 对 [`DependencySource`] 的轻量包装，可随工厂闭包自由克隆。
#[derive(Clone)]
pub struct Resolver {
    source: Arc<dyn DependencySource>,
}

impl Resolver {
    pub fn new(source: Arc<dyn DependencySource>) -> Self {
        Self { source }
    }

    pub fn resolve(&self, key: &ServiceKey) -> DependencyResult<Instance> {
        self.source.resolve(key)
    }

    pub fn try_resolve(&self, key: &ServiceKey) -> DependencyResult<Option<Instance>> {
        self.source.try_resolve(key)
    }

    pub fn resolve_all(&self, key: &ServiceKey) -> DependencyResult<Vec<Instance>> {
        self.source.resolve_all(key)
    }

    pub fn is_registered(&self, key: &ServiceKey) -> bool {
        self.source.is_registered(key)
    }

    /// 以具体类型解析
    pub fn get<T: Any + Send + Sync>(&self, service: impl Into<TypeKey>) -> DependencyResult<Arc<T>> {
        downcast::<T>(&self.resolve(&ServiceKey::of(service))?)
    }

    /// 以接口解析
    pub fn get_interface<I: ?Sized + Send + Sync + 'static>(
        &self,
        service: impl Into<TypeKey>,
    ) -> DependencyResult<Arc<I>> {
        downcast_interface::<I>(&self.resolve(&ServiceKey::of(service))?)
    }

    /// 以接口解析键控服务
    pub fn get_keyed<I: ?Sized + Send + Sync + 'static>(
        &self,
        service: impl Into<TypeKey>,
        key: impl Into<String>,
    ) -> DependencyResult<Arc<I>> {
        downcast_interface::<I>(&self.resolve(&ServiceKey::keyed(service, key))?)
    }

    /// 以接口解析全部实现
    pub fn get_all<I: ?Sized + Send + Sync + 'static>(
        &self,
        service: impl Into<TypeKey>,
    ) -> DependencyResult<Vec<Arc<I>>> {
        self.resolve_all(&ServiceKey::of(service))?
            .iter()
            .map(downcast_interface::<I>)
            .collect()
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").field("source", &"<dependency source>").finish()
    }
}

/// 解析上下文
///
/// 记录当前解析链，用于检测循环依赖。
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// 当前解析链
    pub resolution_chain: Vec<ServiceKey>,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加服务到解析链
    pub fn push(&mut self, key: &ServiceKey) -> DependencyResult<()> {
        if self.resolution_chain.contains(key) {
            let chain = self
                .resolution_chain
                .iter()
                .chain(std::iter::once(key))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(DependencyError::CircularDependency {
                dependency_chain: chain,
            });
        }
        self.resolution_chain.push(key.clone());
        Ok(())
    }

    /// 从解析链中移除最近的服务
    pub fn pop(&mut self) {
        self.resolution_chain.pop();
    }

    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }
}
