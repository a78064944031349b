//! 服务提供者与作用域
//!
//! 单例在提供者内至多创建一次，作用域服务在每个作用域内至多创建一次，
//! 瞬时服务每次解析都重新创建。装饰层在缓存之前叠加。

use crate::collection::CollectedRegistration;
use di_abstractions::{
    DecoratorFactory, DependencySource, Instance, RegistrationInfo, ResolveContext, Resolver,
    ServiceFactory,
};
use di_common::{DependencyError, DependencyResult, Lifetime, ServiceKey};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

struct Registered {
    service: ServiceKey,
    lifetime: Lifetime,
    info: RegistrationInfo,
    factory: ServiceFactory,
    decorators: Vec<DecoratorFactory>,
    singleton: OnceCell<Instance>,
}

struct ProviderCore {
    entries: Vec<Registered>,
    index: HashMap<ServiceKey, Vec<usize>>,
}

/// 作用域状态
struct ScopeState {
    id: Uuid,
    instances: Mutex<HashMap<usize, Arc<OnceCell<Instance>>>>,
}

/// 单次解析调用的上下文，内部解析共享同一条解析链
#[derive(Clone)]
struct ResolutionFrame {
    core: Arc<ProviderCore>,
    scope: Option<Arc<ScopeState>>,
    context: Arc<Mutex<ResolveContext>>,
}

impl ResolutionFrame {
    fn new(core: Arc<ProviderCore>, scope: Option<Arc<ScopeState>>) -> Self {
        Self {
            core,
            scope,
            context: Arc::new(Mutex::new(ResolveContext::new())),
        }
    }

    /// 单例依赖始终从根解析，避免捕获作用域实例
    fn root(&self) -> Self {
        Self {
            core: self.core.clone(),
            scope: None,
            context: self.context.clone(),
        }
    }

    fn resolver(&self) -> Resolver {
        Resolver::new(Arc::new(self.clone()))
    }

    fn indices(&self, key: &ServiceKey) -> &[usize] {
        self.core.index.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    fn instantiate(&self, index: usize) -> DependencyResult<Instance> {
        let entry = &self.core.entries[index];
        self.context.lock().push(&entry.service)?;
        let result = self.lookup(index, entry);
        self.context.lock().pop();
        result
    }

    fn lookup(&self, index: usize, entry: &Registered) -> DependencyResult<Instance> {
        match entry.lifetime {
            Lifetime::Singleton => {
                let root = self.root();
                entry
                    .singleton
                    .get_or_try_init(|| root.create(entry))
                    .map(Clone::clone)
            }
            Lifetime::Scoped => {
                let scope = self.scope.as_ref().ok_or_else(|| DependencyError::ScopeMismatch {
                    expected: format!("作用域 ({})", entry.service),
                    actual: "根提供者".to_string(),
                })?;
                let cell = scope
                    .instances
                    .lock()
                    .entry(index)
                    .or_insert_with(|| Arc::new(OnceCell::new()))
                    .clone();
                cell.get_or_try_init(|| self.create(entry)).map(Clone::clone)
            }
            Lifetime::Transient => self.create(entry),
        }
    }

    fn create(&self, entry: &Registered) -> DependencyResult<Instance> {
        debug!("创建实例: {} ({})", entry.service, entry.lifetime);
        let resolver = self.resolver();
        let mut instance = (entry.factory)(&resolver)?;
        for decorator in &entry.decorators {
            instance = decorator(instance, &resolver)?;
        }
        Ok(instance)
    }
}

impl DependencySource for ResolutionFrame {
    fn resolve(&self, key: &ServiceKey) -> DependencyResult<Instance> {
        match self.indices(key).last() {
            Some(&index) => self.instantiate(index),
            None => Err(DependencyError::not_registered(key.to_string())),
        }
    }

    fn try_resolve(&self, key: &ServiceKey) -> DependencyResult<Option<Instance>> {
        match self.indices(key).last() {
            Some(&index) => self.instantiate(index).map(Some),
            None => Ok(None),
        }
    }

    fn resolve_all(&self, key: &ServiceKey) -> DependencyResult<Vec<Instance>> {
        self.indices(key)
            .iter()
            .map(|&index| self.instantiate(index))
            .collect()
    }

    fn is_registered(&self, key: &ServiceKey) -> bool {
        !self.indices(key).is_empty()
    }
}

/// 服务提供者
#[derive(Clone)]
pub struct ServiceProvider {
    core: Arc<ProviderCore>,
}

impl ServiceProvider {
    pub(crate) fn from_entries(entries: Vec<CollectedRegistration>) -> Self {
        let mut index: HashMap<ServiceKey, Vec<usize>> = HashMap::new();
        let entries: Vec<Registered> = entries
            .into_iter()
            .enumerate()
            .map(|(i, collected)| {
                let info = RegistrationInfo {
                    decorations: collected.decorators.len(),
                    ..collected.registration.info()
                };
                index
                    .entry(collected.registration.service.clone())
                    .or_default()
                    .push(i);
                Registered {
                    service: collected.registration.service,
                    lifetime: collected.registration.lifetime,
                    info,
                    factory: collected.registration.factory,
                    decorators: collected.decorators,
                    singleton: OnceCell::new(),
                }
            })
            .collect();

        Self {
            core: Arc::new(ProviderCore { entries, index }),
        }
    }

    /// 根解析器
    pub fn resolver(&self) -> Resolver {
        Resolver::new(Arc::new(self.clone()))
    }

    /// 创建新作用域
    pub fn create_scope(&self) -> ServiceScope {
        let state = Arc::new(ScopeState {
            id: Uuid::new_v4(),
            instances: Mutex::new(HashMap::new()),
        });
        debug!("创建作用域: {}", state.id);
        ServiceScope {
            core: self.core.clone(),
            state,
        }
    }

    /// 全部注册摘要，按注册顺序
    pub fn registrations(&self) -> Vec<RegistrationInfo> {
        self.core.entries.iter().map(|e| e.info.clone()).collect()
    }

    /// 指定服务的注册数量
    pub fn count(&self, key: &ServiceKey) -> usize {
        self.core.index.get(key).map_or(0, Vec::len)
    }

    fn frame(&self) -> ResolutionFrame {
        ResolutionFrame::new(self.core.clone(), None)
    }
}

impl DependencySource for ServiceProvider {
    fn resolve(&self, key: &ServiceKey) -> DependencyResult<Instance> {
        self.frame().resolve(key)
    }

    fn try_resolve(&self, key: &ServiceKey) -> DependencyResult<Option<Instance>> {
        self.frame().try_resolve(key)
    }

    fn resolve_all(&self, key: &ServiceKey) -> DependencyResult<Vec<Instance>> {
        self.frame().resolve_all(key)
    }

    fn is_registered(&self, key: &ServiceKey) -> bool {
        self.core.index.contains_key(key)
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registrations", &self.core.entries.len())
            .finish()
    }
}

/// 服务作用域
#[derive(Clone)]
pub struct ServiceScope {
    core: Arc<ProviderCore>,
    state: Arc<ScopeState>,
}

impl ServiceScope {
    /// 作用域标识
    pub fn id(&self) -> Uuid {
        self.state.id
    }

    /// 作用域解析器
    pub fn resolver(&self) -> Resolver {
        Resolver::new(Arc::new(self.clone()))
    }

    /// 已创建的作用域实例数量
    pub fn instance_count(&self) -> usize {
        self.state
            .instances
            .lock()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    fn frame(&self) -> ResolutionFrame {
        ResolutionFrame::new(self.core.clone(), Some(self.state.clone()))
    }
}

impl DependencySource for ServiceScope {
    fn resolve(&self, key: &ServiceKey) -> DependencyResult<Instance> {
        self.frame().resolve(key)
    }

    fn try_resolve(&self, key: &ServiceKey) -> DependencyResult<Option<Instance>> {
        self.frame().try_resolve(key)
    }

    fn resolve_all(&self, key: &ServiceKey) -> DependencyResult<Vec<Instance>> {
        self.frame().resolve_all(key)
    }

    fn is_registered(&self, key: &ServiceKey) -> bool {
        self.core.index.contains_key(key)
    }
}

impl std::fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceScope").field("id", &self.state.id).finish()
    }
}
