//! 生成工厂
//!
//! 构造函数含运行时参数的类型不直接注册，而是注册 `Factory<T>`。
//! 调用方传入运行时参数，其余参数由容器解析。

use crate::instance::{downcast, downcast_interface, Instance};
use di_common::{DependencyResult, TypeKey};
use std::any::Any;
use std::sync::Arc;

/// 工厂创建函数类型，参数为按声明顺序排列的运行时参数
pub type CreateFn = Arc<dyn Fn(Vec<Instance>) -> DependencyResult<Instance> + Send + Sync>;

/// 生成工厂
#[derive(Clone)]
pub struct GeneratedFactory {
    target: TypeKey,
    runtime_params: Vec<String>,
    create: CreateFn,
}

impl GeneratedFactory {
    pub fn new(target: TypeKey, runtime_params: Vec<String>, create: CreateFn) -> Self {
        Self {
            target,
            runtime_params,
            create,
        }
    }

    /// 工厂产出的服务类型
    pub fn target(&self) -> &TypeKey {
        &self.target
    }

    /// 运行时参数名称
    pub fn runtime_params(&self) -> &[String] {
        &self.runtime_params
    }

    /// 以运行时参数创建实例
    pub fn create(&self, runtime: Vec<Instance>) -> DependencyResult<Instance> {
        (self.create)(runtime)
    }

    /// 创建具体类型实例
    pub fn create_as<T: Any + Send + Sync>(&self, runtime: Vec<Instance>) -> DependencyResult<Arc<T>> {
        downcast::<T>(&self.create(runtime)?)
    }

    /// 创建接口视图
    pub fn create_interface<I: ?Sized + Send + Sync + 'static>(
        &self,
        runtime: Vec<Instance>,
    ) -> DependencyResult<Arc<I>> {
        downcast_interface::<I>(&self.create(runtime)?)
    }
}

impl std::fmt::Debug for GeneratedFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedFactory")
            .field("target", &self.target)
            .field("runtime_params", &self.runtime_params)
            .field("create", &"<function>")
            .finish()
    }
}
