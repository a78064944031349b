//! 组件生命周期

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 组件生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// 单例模式 - 整个容器生命周期内只创建一个实例
    Singleton,
    /// 作用域模式 - 在同一作用域内共享实例
    Scoped,
    /// 瞬时模式 - 每次请求都创建新实例
    Transient,
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::Singleton
    }
}

impl Lifetime {
    /// 生命周期长度排序，数值越大存活越久
    pub fn longevity(self) -> u8 {
        match self {
            Self::Transient => 0,
            Self::Scoped => 1,
            Self::Singleton => 2,
        }
    }

    /// 当前生命周期的服务持有 `dependency` 生命周期的依赖是否会导致依赖被"捕获"
    pub fn captures(self, dependency: Lifetime) -> bool {
        self == Self::Singleton && dependency == Self::Scoped
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Singleton => "singleton",
            Self::Scoped => "scoped",
            Self::Transient => "transient",
        };
        f.write_str(name)
    }
}

impl FromStr for Lifetime {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "singleton" => Ok(Self::Singleton),
            "scoped" => Ok(Self::Scoped),
            "transient" => Ok(Self::Transient),
            _ => Err(ConfigError::ValidationError {
                message: format!("未知的生命周期: {}", s),
            }),
        }
    }
}
