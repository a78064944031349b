//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 组合错误类型
///
/// 组合过程中的致命错误：要么完整生成注册指令，要么整体失败。
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("生命周期声明冲突: {type_name} 同时声明了 {declared:?}")]
    AmbiguousLifetime {
        type_name: String,
        declared: Vec<String>,
    },

    #[error("构建器使用错误: {message}")]
    BuilderMisuse { message: String },

    #[error("指令无效: {type_name}, 原因: {message}")]
    InvalidDirective { type_name: String, message: String },

    #[error("缺少运行时绑定: {type_name}, 原因: {message}")]
    MissingBinding { type_name: String, message: String },

    #[error("开放泛型封闭失败: {type_name}")]
    GenericClosureFailed { type_name: String },

    #[error("静态类型表无效: {message}")]
    InvalidTable { message: String },

    #[error("组合校验失败: {message}")]
    ValidationFailed { message: String },

    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

impl CompositionError {
    /// 创建构建器使用错误
    pub fn builder_misuse(message: impl Into<String>) -> Self {
        Self::BuilderMisuse {
            message: message.into(),
        }
    }

    /// 创建指令无效错误
    pub fn invalid_directive(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDirective {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// 创建缺少绑定错误
    pub fn missing_binding(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MissingBinding {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

/// 依赖注入错误类型
///
/// 解析阶段由容器或工厂产生。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件未注册: {type_name}")]
    ComponentNotRegistered { type_name: String },

    #[error("组件创建失败: {type_name}, 原因: {message}")]
    ComponentCreationFailed { type_name: String, message: String },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("类型转换失败: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("作用域不匹配: 期望 {expected}, 实际 {actual}")]
    ScopeMismatch { expected: String, actual: String },

    #[error("方法调用失败: {method}, 原因: {message}")]
    InvocationFailed { method: String, message: String },
}

impl DependencyError {
    /// 创建未注册错误
    pub fn not_registered(type_name: impl Into<String>) -> Self {
        Self::ComponentNotRegistered {
            type_name: type_name.into(),
        }
    }

    /// 创建类型转换错误
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// 创建组件创建失败错误
    pub fn creation_failed(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type CompositionResult<T> = Result<T, CompositionError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
