//! 类型目录的两种实现
//!
//! - [`ReflectionCatalogProvider`]：组合时检查类型元数据
//! - [`StaticCatalogProvider`]：读取预先生成的类型表
//!
//! 对同一组程序集，两者在 [`di_abstractions::ParityView`] 下结果一致。

pub mod reflection;
pub mod static_table;

pub use reflection::ReflectionCatalogProvider;
pub use static_table::{AssemblyFacts, StaticCatalogProvider, StaticCatalogTable};
