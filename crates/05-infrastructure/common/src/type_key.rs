//! 类型标识
//!
//! 组合引擎不依赖运行时反射，所有类型都通过 [`TypeKey`] 以名称形式标识，
//! 包括开放泛型定义（参数位为占位符）及其封闭形式。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 类型标识
///
/// - `Named`：具名类型，可带有序的泛型实参
/// - `Param`：泛型参数占位符，按位置编号
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeKey {
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeKey>,
    },
    Param {
        param: usize,
    },
}

impl TypeKey {
    /// 创建非泛型类型标识
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// 创建带泛型实参的类型标识
    pub fn generic(name: impl Into<String>, args: Vec<TypeKey>) -> Self {
        Self::Named {
            name: name.into(),
            args,
        }
    }

    /// 创建泛型参数占位符
    pub fn param(index: usize) -> Self {
        Self::Param { param: index }
    }

    /// 创建开放泛型定义，例如 `open("Handler", 1)` 即 `Handler<T0>`
    pub fn open(name: impl Into<String>, arity: usize) -> Self {
        Self::generic(name, (0..arity).map(Self::param).collect())
    }

    /// 类型名称（不含泛型实参）
    pub fn name(&self) -> &str {
        match self {
            Self::Named { name, .. } => name,
            Self::Param { .. } => "T",
        }
    }

    /// 泛型实参
    pub fn args(&self) -> &[TypeKey] {
        match self {
            Self::Named { args, .. } => args,
            Self::Param { .. } => &[],
        }
    }

    /// 泛型元数
    pub fn arity(&self) -> usize {
        self.args().len()
    }

    /// 是否包含未绑定的泛型参数
    pub fn is_open(&self) -> bool {
        match self {
            Self::Named { args, .. } => args.iter().any(TypeKey::is_open),
            Self::Param { .. } => true,
        }
    }

    /// 是否为泛型参数占位符
    pub fn is_param(&self) -> bool {
        matches!(self, Self::Param { .. })
    }

    /// 获取开放泛型定义形式，非泛型类型返回自身
    pub fn definition(&self) -> TypeKey {
        Self::open(self.name(), self.arity())
    }

    /// 获取简短名称（去掉命名空间前缀）
    pub fn short_name(&self) -> &str {
        let name = self.name();
        name.rsplit(['.', ':']).next().unwrap_or(name)
    }

    /// 将开放形式与封闭形式合一，返回泛型参数的绑定结果
    ///
    /// `Handler<T0>` 对 `Handler<Order>` 的结果为 `[Order]`。
    /// 同一参数出现多次时必须绑定到同一类型。
    pub fn bind(&self, closed: &TypeKey) -> Option<Vec<TypeKey>> {
        let mut bindings: Vec<Option<TypeKey>> = Vec::new();
        if !Self::unify(self, closed, &mut bindings) {
            return None;
        }
        bindings.into_iter().collect()
    }

    fn unify(pattern: &TypeKey, closed: &TypeKey, bindings: &mut Vec<Option<TypeKey>>) -> bool {
        match pattern {
            Self::Param { param } => {
                if closed.is_open() {
                    return false;
                }
                if bindings.len() <= *param {
                    bindings.resize(*param + 1, None);
                }
                match &bindings[*param] {
                    Some(bound) => bound == closed,
                    None => {
                        bindings[*param] = Some(closed.clone());
                        true
                    }
                }
            }
            Self::Named { name, args } => match closed {
                Self::Named {
                    name: closed_name,
                    args: closed_args,
                } => {
                    name == closed_name
                        && args.len() == closed_args.len()
                        && args
                            .iter()
                            .zip(closed_args)
                            .all(|(p, c)| Self::unify(p, c, bindings))
                }
                Self::Param { .. } => false,
            },
        }
    }

    /// 用给定实参替换泛型参数占位符
    pub fn substitute(&self, args: &[TypeKey]) -> TypeKey {
        match self {
            Self::Param { param } => args.get(*param).cloned().unwrap_or_else(|| self.clone()),
            Self::Named { name, args: own } => Self::Named {
                name: name.clone(),
                args: own.iter().map(|a| a.substitute(args)).collect(),
            },
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param { param } => write!(f, "T{}", param),
            Self::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

/// 服务标识：服务类型 + 可选键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceKey {
    pub service: TypeKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ServiceKey {
    /// 非键控服务
    pub fn of(service: impl Into<TypeKey>) -> Self {
        Self {
            service: service.into(),
            key: None,
        }
    }

    /// 键控服务
    pub fn keyed(service: impl Into<TypeKey>, key: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            key: Some(key.into()),
        }
    }

    /// 以可选键构造
    pub fn with_key(service: impl Into<TypeKey>, key: Option<String>) -> Self {
        Self {
            service: service.into(),
            key,
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}[{}]", self.service, key),
            None => write!(f, "{}", self.service),
        }
    }
}

impl From<TypeKey> for ServiceKey {
    fn from(service: TypeKey) -> Self {
        Self::of(service)
    }
}

/// 框架内置的约定类型
pub mod well_known {
    use super::TypeKey;

    /// 拦截器契约
    pub const INTERCEPTOR: &str = "IMethodInterceptor";
    /// 生成工厂的服务类型名
    pub const FACTORY: &str = "Factory";
    /// 拦截器链的服务类型名，按被拦截类型键控
    pub const INTERCEPTOR_CHAIN: &str = "InterceptorChain";

    /// 注册接口时忽略的基础设施接口
    const INFRASTRUCTURE_INTERFACES: &[&str] = &[
        INTERCEPTOR,
        "IDisposable",
        "IAsyncDisposable",
        "IEquatable",
        "IComparable",
    ];

    /// 拦截器契约类型
    pub fn interceptor() -> TypeKey {
        TypeKey::named(INTERCEPTOR)
    }

    pub fn interceptor_chain() -> TypeKey {
        TypeKey::named(INTERCEPTOR_CHAIN)
    }

    /// `Factory<T>`
    pub fn factory_of(target: &TypeKey) -> TypeKey {
        TypeKey::generic(FACTORY, vec![target.clone()])
    }

    /// 是否为不参与服务注册的基础设施接口
    pub fn is_infrastructure_interface(key: &TypeKey) -> bool {
        INFRASTRUCTURE_INTERFACES.contains(&key.name())
    }
}
