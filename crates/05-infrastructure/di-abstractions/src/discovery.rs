//! 类型目录抽象接口
//!
//! 一个接口，两种可互换的实现（动态扫描与静态类型表），在容器构建时选定。
//! 调用方不得根据当前策略分支。

use crate::binding::BindingSet;
use crate::facts::CatalogFacts;
use crate::reflection::Assembly;
use di_common::CompositionResult;
use std::sync::Arc;

/// 发现请求
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRequest {
    /// 已排序的程序集
    pub assemblies: Vec<Arc<Assembly>>,
    /// 执行发现的程序集；为空时不做可访问性限制
    pub host: Option<String>,
}

impl DiscoveryRequest {
    pub fn new(assemblies: Vec<Arc<Assembly>>) -> Self {
        Self {
            assemblies,
            host: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn assembly_names(&self) -> Vec<&str> {
        self.assemblies.iter().map(|a| a.name.as_str()).collect()
    }

    /// 程序集是否为外部程序集
    pub fn is_foreign(&self, assembly: &str) -> bool {
        self.host.as_deref().is_some_and(|host| host != assembly)
    }
}

/// 发现结果：事实与可执行绑定
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub facts: CatalogFacts,
    pub bindings: BindingSet,
}

impl Discovery {
    pub fn new(facts: CatalogFacts, bindings: BindingSet) -> Self {
        Self { facts, bindings }
    }
}

/// 类型目录提供者 trait
pub trait TypeCatalogProvider: Send + Sync {
    /// 提供者名称
    fn name(&self) -> &str;

    /// 对给定程序集产生候选类型、插件、装饰器和拦截器事实
    fn discover(&self, request: &DiscoveryRequest) -> CompositionResult<Discovery>;
}
