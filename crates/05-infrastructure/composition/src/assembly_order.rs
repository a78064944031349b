//! 程序集排序
//!
//! 按规则把程序集分层：每个程序集归入第一个匹配规则所在的层，
//! 没有匹配任何规则的程序集组成最后一层。层内按名称排序（忽略大小写，
//! 相同时按原始名称序数比较），各层按序拼接。

use di_abstractions::Assembly;
use di_common::{CompositionError, CompositionResult};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// 程序集名称谓词
#[derive(Clone)]
pub enum AssemblyPredicate {
    Contains(String),
    Prefix(String),
    Suffix(String),
    Exact(String),
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl AssemblyPredicate {
    pub fn contains(value: impl Into<String>) -> Self {
        Self::Contains(value.into())
    }

    pub fn prefix(value: impl Into<String>) -> Self {
        Self::Prefix(value.into())
    }

    pub fn suffix(value: impl Into<String>) -> Self {
        Self::Suffix(value.into())
    }

    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    pub fn matches(&self, assembly: &str) -> bool {
        match self {
            Self::Contains(value) => assembly.contains(value.as_str()),
            Self::Prefix(value) => assembly.starts_with(value.as_str()),
            Self::Suffix(value) => assembly.ends_with(value.as_str()),
            Self::Exact(value) => assembly == value,
            Self::Custom(predicate) => predicate(assembly),
        }
    }
}

impl fmt::Debug for AssemblyPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(v) => write!(f, "contains({:?})", v),
            Self::Prefix(v) => write!(f, "prefix({:?})", v),
            Self::Suffix(v) => write!(f, "suffix({:?})", v),
            Self::Exact(v) => write!(f, "exact({:?})", v),
            Self::Custom(_) => f.write_str("custom(<function>)"),
        }
    }
}

/// 排序规则：谓词 + 层序号
#[derive(Debug, Clone)]
pub struct AssemblyOrderRule {
    pub predicate: AssemblyPredicate,
    pub tier: usize,
}

/// 程序集排序器
#[derive(Debug, Clone, Default)]
pub struct AssemblyOrderer {
    rules: Vec<AssemblyOrderRule>,
}

impl AssemblyOrderer {
    /// 无规则排序器：所有程序集在同一层，仅按名称排序
    pub fn unordered() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[AssemblyOrderRule] {
        &self.rules
    }

    /// 程序集所在层
    pub fn tier_of(&self, assembly: &str) -> usize {
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(assembly))
            .map_or(self.rules.len(), |rule| rule.tier)
    }

    /// 排序程序集
    pub fn sort(&self, assemblies: Vec<Arc<Assembly>>) -> Vec<Arc<Assembly>> {
        let mut keyed: Vec<(usize, Arc<Assembly>)> = assemblies
            .into_iter()
            .map(|assembly| (self.tier_of(&assembly.name), assembly))
            .collect();
        keyed.sort_by(|(ta, a), (tb, b)| ta.cmp(tb).then_with(|| compare_names(&a.name, &b.name)));
        keyed.into_iter().map(|(_, assembly)| assembly).collect()
    }

    /// 排序程序集名称
    pub fn sort_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut keyed: Vec<(usize, &str)> = names
            .iter()
            .map(|name| (self.tier_of(name.as_ref()), name.as_ref()))
            .collect();
        keyed.sort_by(|(ta, a), (tb, b)| ta.cmp(tb).then_with(|| compare_names(a, b)));
        keyed.into_iter().map(|(_, name)| name.to_string()).collect()
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// 排序规则构建器
///
/// 初始为空状态，必须先调用 `by` 进入有规则状态，之后才能调用 `then_by`。
#[derive(Debug, Clone, Default)]
pub struct AssemblyOrderBuilder {
    rules: Vec<AssemblyOrderRule>,
}

impl AssemblyOrderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 第一条规则
    pub fn by(mut self, predicate: AssemblyPredicate) -> CompositionResult<Self> {
        if !self.rules.is_empty() {
            return Err(CompositionError::builder_misuse(
                "已存在排序规则，后续规则请使用 then_by",
            ));
        }
        self.rules.push(AssemblyOrderRule { predicate, tier: 0 });
        Ok(self)
    }

    /// 追加规则
    pub fn then_by(mut self, predicate: AssemblyPredicate) -> CompositionResult<Self> {
        if self.rules.is_empty() {
            return Err(CompositionError::builder_misuse(
                "调用 then_by 之前必须先调用 by",
            ));
        }
        let tier = self.rules.len();
        self.rules.push(AssemblyOrderRule { predicate, tier });
        Ok(self)
    }

    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }

    pub fn build(self) -> AssemblyOrderer {
        AssemblyOrderer { rules: self.rules }
    }
}

/// 排序入口
pub struct AssemblyOrder;

impl AssemblyOrder {
    /// 以第一条规则开始
    pub fn by(predicate: AssemblyPredicate) -> AssemblyOrderBuilder {
        AssemblyOrderBuilder {
            rules: vec![AssemblyOrderRule { predicate, tier: 0 }],
        }
    }
}
