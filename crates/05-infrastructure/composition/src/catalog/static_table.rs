//! 静态发现：读取预先生成的类型表
//!
//! 类型表由外部代码生成器产生，按程序集名称分组存放事实；
//! 可执行绑定随类型表一同提供。

use di_abstractions::{BindingSet, CatalogFacts, Discovery, DiscoveryRequest, TypeCatalogProvider};
use di_common::{CompositionError, CompositionResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// 单个程序集的事实
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyFacts {
    pub name: String,
    #[serde(flatten)]
    pub facts: CatalogFacts,
}

/// 静态类型表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticCatalogTable {
    /// 生成类型表时的宿主程序集
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default)]
    pub assemblies: Vec<AssemblyFacts>,
}

impl StaticCatalogTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// 添加程序集事实；同名程序集已存在时报错
    pub fn with_assembly(mut self, name: impl Into<String>, facts: CatalogFacts) -> CompositionResult<Self> {
        let name = name.into();
        if self.facts_for(&name).is_some() {
            return Err(CompositionError::InvalidTable {
                message: format!("程序集重复: {}", name),
            });
        }
        self.assemblies.push(AssemblyFacts { name, facts });
        Ok(self)
    }

    /// 从 JSON 读取
    pub fn from_json(json: &str) -> CompositionResult<Self> {
        let table: Self = serde_json::from_str(json).map_err(|e| CompositionError::InvalidTable {
            message: format!("JSON 解析失败: {}", e),
        })?;
        table.validate()?;
        Ok(table)
    }

    /// 输出 JSON
    pub fn to_json(&self) -> CompositionResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CompositionError::InvalidTable {
            message: format!("JSON 序列化失败: {}", e),
        })
    }

    pub fn facts_for(&self, assembly: &str) -> Option<&CatalogFacts> {
        self.assemblies
            .iter()
            .find(|a| a.name == assembly)
            .map(|a| &a.facts)
    }

    pub fn assembly_names(&self) -> Vec<&str> {
        self.assemblies.iter().map(|a| a.name.as_str()).collect()
    }

    fn validate(&self) -> CompositionResult<()> {
        let mut seen = HashSet::new();
        for assembly in &self.assemblies {
            if !seen.insert(assembly.name.as_str()) {
                return Err(CompositionError::InvalidTable {
                    message: format!("程序集重复: {}", assembly.name),
                });
            }
        }
        Ok(())
    }
}

/// 基于静态类型表的目录提供者
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogProvider {
    table: StaticCatalogTable,
    bindings: BindingSet,
}

impl StaticCatalogProvider {
    pub fn new(table: StaticCatalogTable, bindings: BindingSet) -> Self {
        Self { table, bindings }
    }

    pub fn table(&self) -> &StaticCatalogTable {
        &self.table
    }

    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }
}

impl TypeCatalogProvider for StaticCatalogProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn discover(&self, request: &DiscoveryRequest) -> CompositionResult<Discovery> {
        if let (Some(generated), Some(current)) = (&self.table.host, &request.host) {
            if generated != current {
                return Err(CompositionError::InvalidTable {
                    message: format!("类型表生成于宿主 {}，当前宿主为 {}", generated, current),
                });
            }
        }

        info!("开始静态发现，程序集: {:?}", request.assembly_names());

        let mut facts = CatalogFacts::new();
        for assembly in &request.assemblies {
            match self.table.facts_for(&assembly.name) {
                Some(assembly_facts) => facts.extend(assembly_facts.clone()),
                None => debug!("类型表中没有程序集 {}", assembly.name),
            }
        }

        info!(
            "静态发现完成: 候选类型 {} 个, 插件 {} 个, 装饰器 {} 个, 拦截类型 {} 个",
            facts.candidates.len(),
            facts.plugins.len(),
            facts.decorators.len(),
            facts.interceptors.len()
        );
        Ok(Discovery::new(facts, self.bindings.clone()))
    }
}
