//! 服务集合实现

use crate::provider::ServiceProvider;
use di_abstractions::{DecoratorFactory, RegistrationInfo, ServiceCollection, ServiceRegistration};
use di_common::{ServiceKey, TypeKey};
use tracing::{debug, info};

/// 集合中的单个注册及其装饰层
#[derive(Clone)]
pub(crate) struct CollectedRegistration {
    pub(crate) registration: ServiceRegistration,
    /// 按应用顺序排列，最后一个为最外层
    pub(crate) decorators: Vec<DecoratorFactory>,
}

/// 内存服务集合
#[derive(Clone, Default)]
pub struct ServiceCollectionImpl {
    entries: Vec<CollectedRegistration>,
}

impl ServiceCollectionImpl {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 构建服务提供者
    pub fn build(self) -> ServiceProvider {
        info!("构建服务提供者，共 {} 个注册", self.entries.len());
        ServiceProvider::from_entries(self.entries)
    }
}

impl ServiceCollection for ServiceCollectionImpl {
    fn add(&mut self, registration: ServiceRegistration) {
        debug!(
            "添加注册: {} ({})",
            registration.service, registration.lifetime
        );
        self.entries.push(CollectedRegistration {
            registration,
            decorators: Vec::new(),
        });
    }

    fn decorate(&mut self, service: &TypeKey, decorator: DecoratorFactory) -> usize {
        let mut decorated = 0;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| &e.registration.service.service == service)
        {
            entry.decorators.push(decorator.clone());
            decorated += 1;
        }
        debug!("装饰服务: {}，影响 {} 个注册", service, decorated);
        decorated
    }

    fn contains(&self, key: &ServiceKey) -> bool {
        self.entries.iter().any(|e| &e.registration.service == key)
    }

    fn registrations(&self) -> Vec<RegistrationInfo> {
        self.entries
            .iter()
            .map(|e| RegistrationInfo {
                decorations: e.decorators.len(),
                ..e.registration.info()
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for ServiceCollectionImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCollectionImpl")
            .field("registrations", &self.entries.len())
            .finish()
    }
}
