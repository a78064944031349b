//! 类型资格判定
//!
//! 指令只在这里被解释。其余组件只读取 [`TypeDecision`]，不直接检查指令。

use crate::lifetime::LifetimeClassifier;
use di_abstractions::{InterceptedMethod, TypeDescriptor, TypeShape};
use di_common::well_known::{self, is_infrastructure_interface};
use di_common::{CompositionError, CompositionResult, Directive, Lifetime, TypeKey};

/// 类型在组合中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRole {
    /// 结构上不可注册：抽象类、接口、值类型、静态类或开放泛型实现
    Ineligible,
    /// 标注了不参与注册
    Excluded,
    /// 没有可注册接口，也没有注册指令
    Unqualified,
    Candidate,
    Decorator,
    Interceptor,
}

/// 装饰目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorTarget {
    pub target: TypeKey,
    pub order: i32,
    pub open: bool,
}

/// 插件形态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginShape {
    pub order: i32,
    pub attributes: Vec<String>,
}

/// 拦截声明
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterceptionDecl {
    /// 类型级拦截器
    pub interceptors: Vec<TypeKey>,
    /// 方法级拦截器
    pub methods: Vec<InterceptedMethod>,
}

impl InterceptionDecl {
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty() && self.methods.is_empty()
    }
}

/// 判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecision {
    pub role: TypeRole,
    pub lifetime: Option<Lifetime>,
    /// 注册使用的接口
    pub interfaces: Vec<TypeKey>,
    pub keys: Vec<String>,
    pub decorates: Vec<DecoratorTarget>,
    pub interception: InterceptionDecl,
    /// 显式声明的构造参数类型列表
    pub deferred: Option<Vec<TypeKey>>,
    pub generate_factory: bool,
    /// 插件形态与是否参与注册无关
    pub plugin: Option<PluginShape>,
}

impl TypeDecision {
    fn with_role(role: TypeRole) -> Self {
        Self {
            role,
            lifetime: None,
            interfaces: Vec::new(),
            keys: Vec::new(),
            decorates: Vec::new(),
            interception: InterceptionDecl::default(),
            deferred: None,
            generate_factory: false,
            plugin: None,
        }
    }

    pub fn is_candidate(&self) -> bool {
        self.role == TypeRole::Candidate
    }
}

/// 类型资格判定器
pub struct TypeQualifier;

impl TypeQualifier {
    /// 判定类型角色
    ///
    /// 顺序：结构形态、排除标注、装饰器、开放泛型、拦截器、候选条件。
    /// 排除标注对装饰器与拦截器同样生效。
    pub fn evaluate(descriptor: &TypeDescriptor) -> CompositionResult<TypeDecision> {
        if descriptor.shape != TypeShape::Class {
            return Ok(TypeDecision::with_role(TypeRole::Ineligible));
        }

        let registerable: Vec<TypeKey> = descriptor
            .interface_keys()
            .into_iter()
            .filter(|key| !is_infrastructure_interface(key))
            .collect();

        let decorates = Self::decorator_targets(descriptor);
        let is_interceptor = descriptor.implements_interface(&well_known::interceptor());

        let structural = if !decorates.is_empty() {
            TypeRole::Decorator
        } else if descriptor.is_open_generic() {
            TypeRole::Ineligible
        } else if is_interceptor {
            TypeRole::Interceptor
        } else if !registerable.is_empty() || descriptor.has_directive(Directive::is_registration_directive) {
            TypeRole::Candidate
        } else {
            TypeRole::Unqualified
        };
        let role = if descriptor.has_directive(|d| matches!(d, Directive::DoNotRegister)) {
            TypeRole::Excluded
        } else {
            structural
        };

        let mut decision = TypeDecision::with_role(role);
        decision.plugin = Self::plugin_shape(descriptor, structural, &registerable);
        if role == TypeRole::Decorator {
            decision.decorates = decorates;
        }

        if role == TypeRole::Candidate {
            decision.lifetime = LifetimeClassifier::classify(descriptor)?;
            decision.interfaces = Self::service_interfaces(descriptor, registerable)?;
            decision.keys = descriptor
                .directives
                .iter()
                .filter_map(|d| match d {
                    Directive::Keyed(key) => Some(key.clone()),
                    _ => None,
                })
                .fold(Vec::new(), |mut keys, key| {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                    keys
                });
            decision.deferred = descriptor.directives.iter().find_map(|d| match d {
                Directive::DeferToContainer(signature) => Some(signature.clone()),
                _ => None,
            });
            decision.generate_factory = descriptor.has_directive(|d| matches!(d, Directive::GenerateFactory));
            decision.interception = Self::interception(descriptor);
        }

        Ok(decision)
    }

    fn decorator_targets(descriptor: &TypeDescriptor) -> Vec<DecoratorTarget> {
        descriptor
            .directives
            .iter()
            .filter_map(|d| match d {
                Directive::DecoratorFor { target, order } => Some(DecoratorTarget {
                    target: target.clone(),
                    order: *order,
                    open: false,
                }),
                Directive::OpenDecoratorFor { target, order } => Some(DecoratorTarget {
                    target: target.clone(),
                    order: *order,
                    open: true,
                }),
                _ => None,
            })
            .collect()
    }

    /// 注册接口：有 `RegisterAs` 时只取声明的子集
    fn service_interfaces(
        descriptor: &TypeDescriptor,
        registerable: Vec<TypeKey>,
    ) -> CompositionResult<Vec<TypeKey>> {
        let explicit: Vec<&TypeKey> = descriptor
            .directives
            .iter()
            .filter_map(|d| match d {
                Directive::RegisterAs(key) => Some(key),
                _ => None,
            })
            .collect();

        if explicit.is_empty() {
            return Ok(registerable);
        }

        let mut interfaces = Vec::with_capacity(explicit.len());
        for key in explicit {
            if !descriptor.implements_interface(key) {
                return Err(CompositionError::invalid_directive(
                    descriptor.key.to_string(),
                    format!("register_as 指定的接口 {} 未被实现", key),
                ));
            }
            if !interfaces.contains(key) {
                interfaces.push(key.clone());
            }
        }
        Ok(interfaces)
    }

    fn interception(descriptor: &TypeDescriptor) -> InterceptionDecl {
        let mut decl = InterceptionDecl::default();
        for directive in &descriptor.directives {
            if let Directive::Intercept(interceptor) = directive {
                if !decl.interceptors.contains(interceptor) {
                    decl.interceptors.push(interceptor.clone());
                }
            }
        }
        for method in &descriptor.methods {
            let mut interceptors: Vec<TypeKey> = Vec::new();
            for directive in &method.directives {
                if let Directive::Intercept(interceptor) = directive {
                    if !interceptors.contains(interceptor) {
                        interceptors.push(interceptor.clone());
                    }
                }
            }
            if !interceptors.is_empty() {
                decl.methods.push(InterceptedMethod {
                    name: method.name.clone(),
                    interceptors,
                });
            }
        }
        decl
    }

    /// 插件形态：非开放的具体类，至少一个可注册接口，公开无参构造函数
    fn plugin_shape(
        descriptor: &TypeDescriptor,
        role: TypeRole,
        registerable: &[TypeKey],
    ) -> Option<PluginShape> {
        if matches!(role, TypeRole::Decorator | TypeRole::Interceptor | TypeRole::Ineligible)
            || registerable.is_empty()
        {
            return None;
        }
        let parameterless = descriptor
            .constructors
            .iter()
            .any(|c| c.is_public() && c.params.is_empty());
        if !parameterless {
            return None;
        }

        let order = descriptor
            .directives
            .iter()
            .find_map(|d| match d {
                Directive::PluginOrder(order) => Some(*order),
                _ => None,
            })
            .unwrap_or(0);
        let attributes = descriptor
            .directives
            .iter()
            .filter_map(|d| match d {
                Directive::Attribute(attribute) => Some(attribute.clone()),
                _ => None,
            })
            .collect();

        Some(PluginShape { order, attributes })
    }
}
