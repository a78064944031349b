//! 组合配置
//!
//! 配置来源依次为：可选的 TOML 文件、带前缀的环境变量（后者覆盖前者）。
//! 环境变量用 `__` 分隔层级，例如 `LORN_DI_VALIDATION__FAIL_ON_WARNINGS=true`。

use crate::assembly_order::{AssemblyOrderBuilder, AssemblyOrderer, AssemblyPredicate};
use crate::logging::LoggingConfig;
use di_common::{CompositionResult, ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// 默认环境变量前缀
pub const ENV_PREFIX: &str = "LORN_DI";

/// 发现策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryStrategy {
    /// 启动时扫描程序集
    #[default]
    Dynamic,
    /// 读取引导注册表中的静态类型表
    Static,
}

/// 程序集名称匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Contains,
    Prefix,
    Suffix,
    Exact,
}

/// 程序集排序规则配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyOrderOptions {
    #[serde(rename = "match")]
    pub kind: MatchKind,
    pub value: String,
}

impl AssemblyOrderOptions {
    pub fn predicate(&self) -> AssemblyPredicate {
        match self.kind {
            MatchKind::Contains => AssemblyPredicate::contains(self.value.clone()),
            MatchKind::Prefix => AssemblyPredicate::prefix(self.value.clone()),
            MatchKind::Suffix => AssemblyPredicate::suffix(self.value.clone()),
            MatchKind::Exact => AssemblyPredicate::exact(self.value.clone()),
        }
    }
}

/// 校验配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    pub enabled: bool,
    /// 存在警告时是否终止组合
    pub fail_on_warnings: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_on_warnings: false,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// 组合选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionOptions {
    pub strategy: DiscoveryStrategy,
    /// 执行发现的宿主程序集
    pub host_assembly: Option<String>,
    pub assembly_order: Vec<AssemblyOrderOptions>,
    /// 排除的类型名称，支持 `*` 通配
    pub exclude_types: Vec<String>,
    pub validation: ValidationOptions,
    pub logging: LoggingOptions,
}

impl CompositionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用默认前缀加载
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        Self::load_from(path, ENV_PREFIX)
    }

    /// 从可选文件与指定前缀的环境变量加载
    pub fn load_from(path: Option<&Path>, env_prefix: &str) -> ConfigResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            info!("加载组合配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::ParseError { source: Box::new(e) })?;

        let options: Self = settings
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError { source: Box::new(e) })?;
        options.validate()?;
        debug!("组合配置加载完成: {:?}", options);
        Ok(options)
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let options: Self =
            toml::from_str(text).map_err(|e| ConfigError::ParseError { source: Box::new(e) })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(rule) = self.assembly_order.iter().find(|r| r.value.is_empty()) {
            return Err(ConfigError::ValidationError {
                message: format!("程序集排序规则的匹配值为空: {:?}", rule.kind),
            });
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::ValidationError {
                message: format!("未知的日志级别: {}", self.logging.level),
            });
        }
        if self.exclude_types.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::ValidationError {
                message: "排除模式不能为空".to_string(),
            });
        }
        Ok(())
    }

    /// 按配置规则构造程序集排序器
    pub fn assembly_orderer(&self) -> CompositionResult<AssemblyOrderer> {
        let mut builder = AssemblyOrderBuilder::new();
        for rule in &self.assembly_order {
            builder = if builder.has_rules() {
                builder.then_by(rule.predicate())?
            } else {
                builder.by(rule.predicate())?
            };
        }
        Ok(builder.build())
    }

    /// 类型名称是否被排除
    pub fn is_excluded(&self, type_name: &str) -> bool {
        self.exclude_types
            .iter()
            .any(|pattern| wildcard_match(pattern, type_name))
    }

    pub fn logging_config(&self) -> LoggingConfig {
        let level = self
            .logging
            .level
            .parse::<tracing::Level>()
            .unwrap_or(tracing::Level::INFO);
        LoggingConfig {
            level,
            json_format: self.logging.json,
            ..LoggingConfig::default()
        }
    }
}

/// `*` 匹配任意长度（含空）的字符序列
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let (first, rest) = parts.split_at(1);
    let Some(mut remaining) = text.strip_prefix(first[0]) else {
        return false;
    };
    let (middle, last) = rest.split_at(rest.len() - 1);
    for part in middle {
        match remaining.find(part) {
            Some(position) => remaining = &remaining[position + part.len()..],
            None => return false,
        }
    }
    remaining.len() >= last[0].len() && remaining.ends_with(last[0])
}
