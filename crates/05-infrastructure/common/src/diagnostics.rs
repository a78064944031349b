//! 发现与组合阶段的诊断信息
//!
//! 诊断不会中断组合过程，只有 [`crate::CompositionError`] 才是致命错误。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Info,
    Warning,
    Error,
}

/// 诊断代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// 外部程序集中的非公开类型本可成为候选类型
    InaccessibleType,
    /// 外部程序集包含插件形态的内部类型但未参与发现契约
    MissingParticipationContract,
    /// 类型没有可注入的构造函数
    NoInjectableConstructor,
    /// 键控依赖在发现结果中找不到对应注册
    UnresolvedKeyedDependency,
    /// 长生命周期服务依赖短生命周期服务
    LifetimeMismatch,
    /// 候选类型之间的构造依赖成环
    CircularDependency,
    /// 装饰器没有可装饰的注册
    OrphanDecorator,
    /// 拦截声明所在的类型只注册生成工厂，拦截不生效
    InterceptionNotApplied,
}

impl DiagnosticCode {
    /// 稳定的诊断编号
    pub fn id(self) -> &'static str {
        match self {
            Self::InaccessibleType => "LDI001",
            Self::MissingParticipationContract => "LDI002",
            Self::NoInjectableConstructor => "LDI003",
            Self::UnresolvedKeyedDependency => "LDI004",
            Self::LifetimeMismatch => "LDI005",
            Self::CircularDependency => "LDI006",
            Self::OrphanDecorator => "LDI007",
            Self::InterceptionNotApplied => "LDI008",
        }
    }
}

/// 单条诊断
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: DiagnosticSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            type_name: None,
            assembly: None,
        }
    }

    pub fn info(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, DiagnosticSeverity::Info, message)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, DiagnosticSeverity::Warning, message)
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_assembly(mut self, assembly: impl Into<String>) -> Self {
        self.assembly = Some(assembly.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}: {}", self.code.id(), self.severity, self.message)
    }
}

/// 诊断集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 按诊断代码筛选
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<&Diagnostic> {
        self.items.iter().filter(|d| d.code == code).collect()
    }

    /// 是否存在不低于指定级别的诊断
    pub fn has_at_least(&self, severity: DiagnosticSeverity) -> bool {
        self.items.iter().any(|d| d.severity >= severity)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
