//! # DI Common
//!
//! 依赖注入组合引擎的公共类型。
//!
//! ## 核心类型
//!
//! - [`TypeKey`] / [`ServiceKey`] - 类型与服务标识，支持开放泛型
//! - [`Lifetime`] - 组件生命周期
//! - [`Directive`] - 声明式指令集合
//! - [`Diagnostic`] - 非致命诊断
//! - [`CompositionError`] / [`DependencyError`] - 错误类型

pub mod diagnostics;
pub mod directive;
pub mod errors;
pub mod lifecycle;
pub mod type_key;

pub use diagnostics::*;
pub use directive::*;
pub use errors::*;
pub use lifecycle::*;
pub use type_key::*;
