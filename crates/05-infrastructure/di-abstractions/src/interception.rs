//! 方法拦截运行时
//!
//! 代理把每次方法调用包装为 [`Invocation`]，依次交给拦截器链处理，
//! 链尾调用真实实现。拦截器可以修改参数、短路返回或后处理返回值，
//! 返回值可以是同步值，也可以是尚未完成的异步结果。

use di_common::{DependencyError, DependencyResult, TypeKey};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// 类型擦除的参数或返回值
pub type ArgValue = Box<dyn Any + Send>;

/// 尚未完成的异步返回值
pub type PendingValue = BoxFuture<'static, DependencyResult<ArgValue>>;

/// 方法返回值
pub enum ReturnValue {
    /// 无返回值
    Unit,
    /// 同步返回值
    Value(ArgValue),
    /// 异步返回值
    Pending(PendingValue),
}

impl ReturnValue {
    pub fn value<T: Any + Send>(value: T) -> Self {
        Self::Value(Box::new(value))
    }

    pub fn pending<T, F>(future: F) -> Self
    where
        T: Any + Send,
        F: Future<Output = DependencyResult<T>> + Send + 'static,
    {
        Self::Pending(future.map(|r| r.map(|v| Box::new(v) as ArgValue)).boxed())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// 读取同步返回值
    pub fn value_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Value(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// 取出同步返回值
    pub fn into_value<T: Any>(self) -> DependencyResult<T> {
        match self {
            Self::Value(value) => downcast_value::<T>(value),
            Self::Unit => downcast_value::<T>(Box::new(())),
            Self::Pending(_) => Err(DependencyError::type_mismatch(type_name::<T>(), "异步返回值")),
        }
    }

    /// 等待并取出返回值，同步值直接返回
    pub async fn resolve<T: Any>(self) -> DependencyResult<T> {
        match self {
            Self::Pending(future) => downcast_value::<T>(future.await?),
            other => other.into_value::<T>(),
        }
    }

    /// 后处理返回值；异步返回值在完成后处理
    pub fn map<F>(self, post: F) -> DependencyResult<Self>
    where
        F: FnOnce(ArgValue) -> DependencyResult<ArgValue> + Send + 'static,
    {
        Ok(match self {
            Self::Unit => Self::Unit,
            Self::Value(value) => Self::Value(post(value)?),
            Self::Pending(future) => Self::Pending(async move { post(future.await?) }.boxed()),
        })
    }
}

impl std::fmt::Debug for ReturnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unit => f.write_str("Unit"),
            Self::Value(_) => f.write_str("Value(..)"),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

fn downcast_value<T: Any>(value: ArgValue) -> DependencyResult<T> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| DependencyError::type_mismatch(type_name::<T>(), "返回值"))
}

/// 一次方法调用
pub struct Invocation {
    target: TypeKey,
    method: String,
    arguments: Vec<ArgValue>,
}

impl Invocation {
    pub fn new(target: TypeKey, method: impl Into<String>, arguments: Vec<ArgValue>) -> Self {
        Self {
            target,
            method: method.into(),
            arguments,
        }
    }

    /// 被拦截的实现类型
    pub fn target(&self) -> &TypeKey {
        &self.target
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    pub fn argument<T: Any>(&self, index: usize) -> Option<&T> {
        self.arguments.get(index)?.downcast_ref::<T>()
    }

    pub fn argument_mut<T: Any>(&mut self, index: usize) -> Option<&mut T> {
        self.arguments.get_mut(index)?.downcast_mut::<T>()
    }

    /// 替换参数
    pub fn set_argument<T: Any + Send>(&mut self, index: usize, value: T) -> DependencyResult<()> {
        let method = self.method.clone();
        let slot = self.arguments.get_mut(index).ok_or_else(|| DependencyError::InvocationFailed {
            method,
            message: format!("参数索引越界: {}", index),
        })?;
        *slot = Box::new(value);
        Ok(())
    }

    /// 取出参数的副本，真实实现读取参数时使用
    pub fn cloned_argument<T: Any + Clone>(&self, index: usize) -> DependencyResult<T> {
        self.argument::<T>(index)
            .cloned()
            .ok_or_else(|| DependencyError::InvocationFailed {
                method: self.method.clone(),
                message: format!("第 {} 个参数不是 {}", index, type_name::<T>()),
            })
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("target", &self.target)
            .field("method", &self.method)
            .field("arguments", &self.arguments.len())
            .finish()
    }
}

/// 拦截器 trait
pub trait Interceptor: Send + Sync {
    /// 处理调用；调用 `next.proceed` 继续链路，不调用即短路
    fn intercept(&self, invocation: &mut Invocation, next: Next<'_>) -> DependencyResult<ReturnValue>;
}

/// 链尾的真实调用
pub type InvocationTarget<'a> = dyn Fn(&mut Invocation) -> DependencyResult<ReturnValue> + 'a;

/// 链路中剩余的部分
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Interceptor>],
    target: &'a InvocationTarget<'a>,
}

impl<'a> Next<'a> {
    pub fn proceed(self, invocation: &mut Invocation) -> DependencyResult<ReturnValue> {
        match self.remaining.split_first() {
            Some((first, rest)) => first.intercept(
                invocation,
                Next {
                    remaining: rest,
                    target: self.target,
                },
            ),
            None => (self.target)(invocation),
        }
    }
}

/// 拦截器链
///
/// 每个被拦截类型构建一次，由该类型的全部接口代理共享。
pub struct InterceptorChain {
    target: TypeKey,
    default: Vec<Arc<dyn Interceptor>>,
    per_method: HashMap<String, Vec<Arc<dyn Interceptor>>>,
}

impl InterceptorChain {
    /// `default` 作用于未单独列出的方法，`per_method` 为方法的完整拦截器列表
    pub fn new(
        target: TypeKey,
        default: Vec<Arc<dyn Interceptor>>,
        per_method: HashMap<String, Vec<Arc<dyn Interceptor>>>,
    ) -> Self {
        Self {
            target,
            default,
            per_method,
        }
    }

    pub fn target(&self) -> &TypeKey {
        &self.target
    }

    pub fn interceptors_for(&self, method: &str) -> &[Arc<dyn Interceptor>] {
        self.per_method
            .get(method)
            .map(Vec::as_slice)
            .unwrap_or(&self.default)
    }

    pub fn is_intercepted(&self, method: &str) -> bool {
        !self.interceptors_for(method).is_empty()
    }

    /// 以拦截器链调用方法
    pub fn invoke<F>(&self, method: &str, arguments: Vec<ArgValue>, target: F) -> DependencyResult<ReturnValue>
    where
        F: Fn(&mut Invocation) -> DependencyResult<ReturnValue>,
    {
        let mut invocation = Invocation::new(self.target.clone(), method, arguments);
        let next = Next {
            remaining: self.interceptors_for(method),
            target: &target,
        };
        next.proceed(&mut invocation)
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("target", &self.target)
            .field("default", &self.default.len())
            .field("per_method", &self.per_method.keys().collect::<Vec<_>>())
            .finish()
    }
}
