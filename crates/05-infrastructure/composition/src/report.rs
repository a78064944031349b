//! 组合报告

use crate::populator::PopulationSummary;
use chrono::{DateTime, Utc};
use di_abstractions::CatalogFacts;
use di_common::{CompositionError, CompositionResult, DiagnosticSeverity, Diagnostics};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 一次组合的结果统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionReport {
    pub composed_at: DateTime<Utc>,
    /// 使用的目录提供者
    pub strategy: String,
    /// 排序后的程序集
    pub assemblies: Vec<String>,
    pub candidates: usize,
    pub plugins: usize,
    pub decorators: usize,
    pub interceptors: usize,
    pub registrations: usize,
    pub factories: usize,
    pub decorations: usize,
    pub proxies: usize,
    pub diagnostics: Diagnostics,
}

impl CompositionReport {
    pub fn new(
        strategy: impl Into<String>,
        assemblies: Vec<String>,
        facts: &CatalogFacts,
        summary: &PopulationSummary,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            composed_at: Utc::now(),
            strategy: strategy.into(),
            assemblies,
            candidates: facts.candidates.len(),
            plugins: facts.plugins.len(),
            decorators: facts.decorators.len(),
            interceptors: facts.interceptors.len(),
            registrations: summary.registrations,
            factories: summary.factories,
            decorations: summary.decorations,
            proxies: summary.proxies,
            diagnostics,
        }
    }

    pub fn warnings(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .count()
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.has_at_least(DiagnosticSeverity::Warning)
    }

    pub fn to_json(&self) -> CompositionResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CompositionError::ValidationFailed {
            message: format!("报告序列化失败: {}", e),
        })
    }
}

impl fmt::Display for CompositionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] 程序集 {} 个, 候选类型 {} 个, 注册 {} 个, 装饰 {} 层, 代理 {} 个, 插件 {} 个, 诊断 {} 条",
            self.strategy,
            self.assemblies.len(),
            self.candidates,
            self.registrations,
            self.decorations,
            self.proxies,
            self.plugins,
            self.diagnostics.len()
        )
    }
}
