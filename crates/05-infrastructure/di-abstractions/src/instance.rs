//! 类型擦除的服务实例
//!
//! 约定：具体类型 `C` 的实例以 `C` 本身存放；接口视图以 `Arc<dyn I>` 存放。
//! 两者都被擦除为 [`Instance`]。

use crate::resolver::Resolver;
use di_common::{DependencyError, DependencyResult, ServiceKey};
use once_cell::sync::OnceCell;
use std::any::{type_name, Any};
use std::sync::Arc;

/// 类型擦除的服务实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 包装具体类型实例
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// 包装接口视图
pub fn interface_view<I: ?Sized + Send + Sync + 'static>(service: Arc<I>) -> Instance {
    Arc::new(service)
}

/// 还原具体类型实例
pub fn downcast<T: Any + Send + Sync>(instance: &Instance) -> DependencyResult<Arc<T>> {
    instance
        .clone()
        .downcast::<T>()
        .map_err(|_| DependencyError::type_mismatch(type_name::<T>(), "具体类型实例"))
}

/// 还原接口视图
pub fn downcast_interface<I: ?Sized + Send + Sync + 'static>(
    instance: &Instance,
) -> DependencyResult<Arc<I>> {
    instance
        .downcast_ref::<Arc<I>>()
        .cloned()
        .ok_or_else(|| DependencyError::type_mismatch(type_name::<Arc<I>>(), "接口视图"))
}

/// 已解析的构造参数
#[derive(Clone)]
pub enum ResolvedArg {
    /// 单个服务实例
    Service(Instance),
    /// 可选依赖缺失，或值类型使用默认值
    Absent,
    /// 集合依赖的全部实例
    Many(Vec<Instance>),
    /// 延迟解析的单个实例
    Lazy(LazyInstance),
    /// 调用方在生成工厂上传入的运行时参数
    Runtime(Instance),
}

impl std::fmt::Debug for ResolvedArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(_) => f.write_str("Service(..)"),
            Self::Absent => f.write_str("Absent"),
            Self::Many(items) => write!(f, "Many({})", items.len()),
            Self::Lazy(lazy) => write!(f, "Lazy({})", lazy.key()),
            Self::Runtime(_) => f.write_str("Runtime(..)"),
        }
    }
}

/// 传给激活器的构造参数列表
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<ResolvedArg>,
}

impl Arguments {
    pub fn new(values: Vec<ResolvedArg>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 原始参数
    pub fn raw(&self, index: usize) -> Option<&ResolvedArg> {
        self.values.get(index)
    }

    fn single(&self, index: usize) -> DependencyResult<Option<&Instance>> {
        match self.values.get(index) {
            Some(ResolvedArg::Service(instance)) | Some(ResolvedArg::Runtime(instance)) => {
                Ok(Some(instance))
            }
            Some(ResolvedArg::Absent) => Ok(None),
            Some(other) => Err(DependencyError::type_mismatch(
                "单个实例",
                format!("{:?}", other),
            )),
            None => Err(DependencyError::creation_failed(
                "Arguments",
                format!("参数索引越界: {}", index),
            )),
        }
    }

    /// 具体类型参数
    pub fn service<T: Any + Send + Sync>(&self, index: usize) -> DependencyResult<Arc<T>> {
        self.optional::<T>(index)?
            .ok_or_else(|| DependencyError::not_registered(type_name::<T>()))
    }

    /// 接口参数
    pub fn interface<I: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> DependencyResult<Arc<I>> {
        self.optional_interface::<I>(index)?
            .ok_or_else(|| DependencyError::not_registered(type_name::<I>()))
    }

    /// 可选的具体类型参数
    pub fn optional<T: Any + Send + Sync>(&self, index: usize) -> DependencyResult<Option<Arc<T>>> {
        self.single(index)?.map(downcast::<T>).transpose()
    }

    /// 可选的接口参数
    pub fn optional_interface<I: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> DependencyResult<Option<Arc<I>>> {
        self.single(index)?.map(downcast_interface::<I>).transpose()
    }

    /// 集合参数（接口视图）
    pub fn all<I: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DependencyResult<Vec<Arc<I>>> {
        match self.values.get(index) {
            Some(ResolvedArg::Many(items)) => items.iter().map(downcast_interface::<I>).collect(),
            Some(ResolvedArg::Absent) => Ok(Vec::new()),
            other => Err(DependencyError::type_mismatch("集合参数", format!("{:?}", other))),
        }
    }

    /// 延迟参数
    pub fn lazy(&self, index: usize) -> DependencyResult<LazyInstance> {
        match self.values.get(index) {
            Some(ResolvedArg::Lazy(lazy)) => Ok(lazy.clone()),
            other => Err(DependencyError::type_mismatch("延迟参数", format!("{:?}", other))),
        }
    }

    /// 值类型参数，缺失时使用默认值
    pub fn value_or<V: Any + Send + Sync + Clone>(&self, index: usize, default: V) -> DependencyResult<V> {
        Ok(self
            .optional::<V>(index)?
            .map(|value| value.as_ref().clone())
            .unwrap_or(default))
    }
}

struct LazyInner {
    resolver: Resolver,
    key: ServiceKey,
    optional: bool,
    cell: OnceCell<Option<Instance>>,
}

/// 延迟解析的单个实例，首次访问时解析并缓存
#[derive(Clone)]
pub struct LazyInstance {
    inner: Arc<LazyInner>,
}

impl LazyInstance {
    pub fn new(resolver: Resolver, key: ServiceKey, optional: bool) -> Self {
        Self {
            inner: Arc::new(LazyInner {
                resolver,
                key,
                optional,
                cell: OnceCell::new(),
            }),
        }
    }

    pub fn key(&self) -> &ServiceKey {
        &self.inner.key
    }

    /// 是否已经解析
    pub fn is_created(&self) -> bool {
        self.inner.cell.get().is_some()
    }

    /// 获取实例；可选依赖缺失时返回 `None`
    pub fn get(&self) -> DependencyResult<Option<Instance>> {
        self.inner
            .cell
            .get_or_try_init(|| {
                if self.inner.optional {
                    self.inner.resolver.try_resolve(&self.inner.key)
                } else {
                    self.inner.resolver.resolve(&self.inner.key).map(Some)
                }
            })
            .map(Clone::clone)
    }

    /// 获取接口视图
    pub fn get_interface<I: ?Sized + Send + Sync + 'static>(&self) -> DependencyResult<Arc<I>> {
        match self.get()? {
            Some(instance) => downcast_interface::<I>(&instance),
            None => Err(DependencyError::not_registered(self.inner.key.to_string())),
        }
    }
}
