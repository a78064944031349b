//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义类型元数据、发现事实、可执行绑定与容器接口。
//!
//! ## 核心接口
//!
//! - [`TypeCatalogProvider`] - 类型目录提供者接口
//! - [`AssemblyProvider`] - 程序集提供者接口
//! - [`ServiceCollection`] - 服务集合接口
//! - [`DependencySource`] / [`Resolver`] - 依赖解析接口
//! - [`Interceptor`] - 方法拦截器接口

pub mod binding;
pub mod container;
pub mod discovery;
pub mod facts;
pub mod factory;
pub mod instance;
pub mod interception;
pub mod reflection;
pub mod registry;
pub mod resolver;
pub mod scanner;

pub use binding::*;
pub use container::*;
pub use discovery::*;
pub use facts::*;
pub use factory::*;
pub use instance::*;
pub use interception::*;
pub use reflection::*;
pub use registry::*;
pub use resolver::*;
pub use scanner::*;
