//! 可执行绑定
//!
//! 事实模型是纯数据，真正构造实例所需的闭包按实现类型收集在 [`BindingSet`] 中。
//! 动态策略从类型元数据提取绑定；静态策略由代码生成器随类型表一同提供。

use crate::instance::{Arguments, Instance};
use crate::interception::InterceptorChain;
use crate::reflection::{Assembly, TypeDescriptor};
use di_common::{DependencyError, DependencyResult, TypeKey};
use std::collections::HashMap;
use std::sync::Arc;

/// 激活器：由已解析的构造参数创建具体实例
pub type Activator = Arc<dyn Fn(&Arguments) -> DependencyResult<Instance> + Send + Sync>;

/// 向上转换：由具体实例得到接口视图
pub type Upcast = Arc<dyn Fn(Instance) -> DependencyResult<Instance> + Send + Sync>;

/// 代理工厂：由接口视图与拦截链得到代理后的接口视图
pub type ProxyFactory =
    Arc<dyn Fn(Instance, Arc<InterceptorChain>) -> DependencyResult<Instance> + Send + Sync>;

/// 开放泛型封闭器
pub type GenericCloser = Arc<dyn Fn(&[TypeKey]) -> Option<TypeDescriptor> + Send + Sync>;

/// 单个实现类型的绑定
#[derive(Clone)]
pub struct TypeBinding {
    key: TypeKey,
    activators: Vec<Activator>,
    upcasts: Vec<(TypeKey, Upcast)>,
    proxies: Vec<(TypeKey, ProxyFactory)>,
    closer: Option<GenericCloser>,
}

impl TypeBinding {
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            activators: Vec::new(),
            upcasts: Vec::new(),
            proxies: Vec::new(),
            closer: None,
        }
    }

    pub fn with_activator(mut self, activator: Activator) -> Self {
        self.activators.push(activator);
        self
    }

    pub fn with_upcast(mut self, interface: TypeKey, upcast: Upcast) -> Self {
        self.upcasts.push((interface, upcast));
        self
    }

    pub fn with_proxy(mut self, interface: TypeKey, proxy: ProxyFactory) -> Self {
        self.proxies.push((interface, proxy));
        self
    }

    pub fn with_closer(mut self, closer: GenericCloser) -> Self {
        self.closer = Some(closer);
        self
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn activator(&self, constructor: usize) -> Option<&Activator> {
        self.activators.get(constructor)
    }

    pub fn proxy(&self, interface: &TypeKey) -> Option<&ProxyFactory> {
        self.proxies.iter().find(|(k, _)| k == interface).map(|(_, p)| p)
    }

    pub fn has_upcast(&self, interface: &TypeKey) -> bool {
        self.upcasts.iter().any(|(k, _)| k == interface)
    }

    /// 调用指定构造函数
    pub fn activate(&self, constructor: usize, args: &Arguments) -> DependencyResult<Instance> {
        let activator = self.activator(constructor).ok_or_else(|| {
            DependencyError::creation_failed(
                self.key.to_string(),
                format!("缺少第 {} 个构造函数的激活器", constructor),
            )
        })?;
        activator(args)
    }

    /// 得到接口视图；未提供向上转换时直接返回具体实例
    pub fn view(&self, interface: &TypeKey, instance: Instance) -> DependencyResult<Instance> {
        match self.upcasts.iter().find(|(k, _)| k == interface) {
            Some((_, upcast)) => upcast(instance),
            None => Ok(instance),
        }
    }

    /// 按泛型实参封闭
    pub fn close(&self, args: &[TypeKey]) -> Option<TypeBinding> {
        let closer = self.closer.as_ref()?;
        closer(args).map(|descriptor| TypeBinding::from(&descriptor))
    }
}

impl From<&TypeDescriptor> for TypeBinding {
    fn from(descriptor: &TypeDescriptor) -> Self {
        let mut binding = TypeBinding::new(descriptor.key.clone());
        for constructor in &descriptor.constructors {
            binding = binding.with_activator(constructor.activator.clone());
        }
        for interface in &descriptor.interfaces {
            if let Some(upcast) = &interface.upcast {
                binding = binding.with_upcast(interface.key.clone(), upcast.clone());
            }
        }
        for (interface, proxy) in &descriptor.proxies {
            binding = binding.with_proxy(interface.clone(), proxy.clone());
        }
        binding.closer = descriptor.closer.clone();
        binding
    }
}

impl std::fmt::Debug for TypeBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeBinding")
            .field("key", &self.key)
            .field("activators", &self.activators.len())
            .field("upcasts", &self.upcasts.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("proxies", &self.proxies.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("generic", &self.closer.is_some())
            .finish()
    }
}

/// 绑定集合，按实现类型索引
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    bindings: Vec<Arc<TypeBinding>>,
    index: HashMap<TypeKey, usize>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从程序集提取全部绑定
    pub fn from_assemblies<'a>(assemblies: impl IntoIterator<Item = &'a Assembly>) -> Self {
        let mut set = Self::new();
        for assembly in assemblies {
            for descriptor in &assembly.types {
                set.insert(TypeBinding::from(descriptor));
            }
        }
        set
    }

    /// 添加绑定；同一类型已存在时保留先出现的绑定，返回是否插入
    pub fn insert(&mut self, binding: TypeBinding) -> bool {
        self.insert_shared(Arc::new(binding))
    }

    fn insert_shared(&mut self, binding: Arc<TypeBinding>) -> bool {
        if self.index.contains_key(binding.key()) {
            return false;
        }
        self.index.insert(binding.key().clone(), self.bindings.len());
        self.bindings.push(binding);
        true
    }

    /// 合并另一组绑定，保持先出现优先
    pub fn merge(&mut self, other: &BindingSet) {
        for binding in &other.bindings {
            self.insert_shared(binding.clone());
        }
    }

    pub fn get(&self, key: &TypeKey) -> Option<Arc<TypeBinding>> {
        self.index.get(key).map(|&i| self.bindings[i].clone())
    }

    /// 查找绑定；封闭泛型类型找不到时通过其开放定义封闭
    pub fn resolve(&self, key: &TypeKey) -> Option<Arc<TypeBinding>> {
        if let Some(binding) = self.get(key) {
            return Some(binding);
        }
        if key.arity() == 0 || key.is_open() {
            return None;
        }
        self.get(&key.definition())?.close(key.args()).map(Arc::new)
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.bindings.iter().map(|b| b.key())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
