//! # 依赖注入具体实现
//!
//! 提供内存服务集合、服务提供者与作用域实现。
//! 组合核心产生的注册指令由这里承载：生命周期缓存、作用域管理，
//! 以及对某服务类型全部已有注册的装饰。

mod collection;
mod provider;

pub use collection::ServiceCollectionImpl;
pub use provider::{ServiceProvider, ServiceScope};
