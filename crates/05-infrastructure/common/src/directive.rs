//! 声明式指令
//!
//! 类型、构造参数和方法上可附加的标注集合。所有指令都是封闭枚举，
//! 由分类器统一解释，调用方不得各自解析。

use crate::lifecycle::Lifetime;
use crate::type_key::TypeKey;
use serde::{Deserialize, Serialize};

/// 类型级与方法级指令
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// 显式生命周期
    Lifetime(Lifetime),
    /// 不参与自动注册
    DoNotRegister,
    /// 仅以指定接口注册（可出现多次）
    RegisterAs(TypeKey),
    /// 以指定键注册（可出现多次）
    Keyed(String),
    /// 装饰封闭服务类型
    DecoratorFor { target: TypeKey, order: i32 },
    /// 装饰开放泛型服务类型
    OpenDecoratorFor { target: TypeKey, order: i32 },
    /// 声明拦截器；类型级作用于全部方法，方法级只作用于该方法
    Intercept(TypeKey),
    /// 插件排序
    PluginOrder(i32),
    /// 跳过构造函数启发式，直接使用声明的参数类型列表
    DeferToContainer(Vec<TypeKey>),
    /// 允许构造函数包含运行时参数，并为其生成工厂
    GenerateFactory,
    /// 自定义标注，插件查询使用
    Attribute(String),
}

impl Directive {
    pub fn singleton() -> Self {
        Self::Lifetime(Lifetime::Singleton)
    }

    pub fn scoped() -> Self {
        Self::Lifetime(Lifetime::Scoped)
    }

    pub fn transient() -> Self {
        Self::Lifetime(Lifetime::Transient)
    }

    pub fn decorator_for(target: impl Into<TypeKey>, order: i32) -> Self {
        Self::DecoratorFor {
            target: target.into(),
            order,
        }
    }

    pub fn open_decorator_for(target: TypeKey, order: i32) -> Self {
        Self::OpenDecoratorFor { target, order }
    }

    pub fn intercept(interceptor: impl Into<TypeKey>) -> Self {
        Self::Intercept(interceptor.into())
    }

    /// 指令名称，用于诊断信息
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Lifetime(_) => "lifetime",
            Self::DoNotRegister => "do_not_register",
            Self::RegisterAs(_) => "register_as",
            Self::Keyed(_) => "keyed",
            Self::DecoratorFor { .. } => "decorator_for",
            Self::OpenDecoratorFor { .. } => "open_decorator_for",
            Self::Intercept(_) => "intercept",
            Self::PluginOrder(_) => "plugin_order",
            Self::DeferToContainer(_) => "defer_to_container",
            Self::GenerateFactory => "generate_factory",
            Self::Attribute(_) => "attribute",
        }
    }

    /// 是否属于显式注册指令
    pub fn is_registration_directive(&self) -> bool {
        matches!(
            self,
            Self::Lifetime(_) | Self::RegisterAs(_) | Self::Keyed(_) | Self::DeferToContainer(_)
        )
    }
}
