//! 程序集提供者抽象接口
//!
//! 在排序之前提供原始的候选程序集列表。

use crate::reflection::Assembly;
use std::sync::Arc;

/// 程序集提供者 trait
pub trait AssemblyProvider: Send + Sync {
    /// 原始程序集列表，顺序无意义
    fn assemblies(&self) -> Vec<Arc<Assembly>>;
}

/// 固定列表的程序集提供者
#[derive(Debug, Clone, Default)]
pub struct FixedAssemblyProvider {
    assemblies: Vec<Arc<Assembly>>,
}

impl FixedAssemblyProvider {
    pub fn new(assemblies: impl IntoIterator<Item = Assembly>) -> Self {
        Self {
            assemblies: assemblies.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn with_assembly(mut self, assembly: Assembly) -> Self {
        self.assemblies.push(Arc::new(assembly));
        self
    }
}

impl AssemblyProvider for FixedAssemblyProvider {
    fn assemblies(&self) -> Vec<Arc<Assembly>> {
        self.assemblies.clone()
    }
}

impl<F> AssemblyProvider for F
where
    F: Fn() -> Vec<Arc<Assembly>> + Send + Sync,
{
    fn assemblies(&self) -> Vec<Arc<Assembly>> {
        self()
    }
}
