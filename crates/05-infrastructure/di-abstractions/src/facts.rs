//! 发现事实模型
//!
//! 两种发现策略产生同一组纯数据事实。事实中不含可执行部分，
//! 可执行部分见 [`crate::binding`]。

use di_common::{Diagnostics, Lifetime, ServiceKey, TypeKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 源码位置
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// 参数包装形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterShape {
    /// 单个实例
    #[default]
    Single,
    /// 全部已注册实现
    Collection,
    /// 延迟解析的单个实例
    Lazy,
}

/// 参数来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSource {
    /// 从容器解析
    #[default]
    Service,
    /// 值类型，使用声明的默认值
    DefaultValue,
    /// 生成工厂的调用方在运行时提供
    Runtime,
}

/// 参数依赖分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Direct,
    Keyed,
    Optional,
    Collection,
    Lazy,
    Runtime,
}

/// 构造参数描述
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstructorParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub shape: ParameterShape,
    #[serde(default)]
    pub source: ParameterSource,
}

impl ConstructorParameter {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeKey>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            key: None,
            optional: false,
            shape: ParameterShape::Single,
            source: ParameterSource::Service,
        }
    }

    pub fn is_keyed(&self) -> bool {
        self.key.is_some()
    }

    /// 解析时使用的服务标识
    pub fn service_key(&self) -> ServiceKey {
        ServiceKey::with_key(self.ty.clone(), self.key.clone())
    }

    /// 依赖分类，由描述结构直接决定
    pub fn kind(&self) -> DependencyKind {
        match (self.source, self.shape) {
            (ParameterSource::Runtime, _) => DependencyKind::Runtime,
            (ParameterSource::DefaultValue, _) => DependencyKind::Optional,
            (_, ParameterShape::Collection) => DependencyKind::Collection,
            (_, ParameterShape::Lazy) => DependencyKind::Lazy,
            _ if self.key.is_some() => DependencyKind::Keyed,
            _ if self.optional => DependencyKind::Optional,
            _ => DependencyKind::Direct,
        }
    }

    /// 参数是否必须在容器中存在注册
    ///
    /// 运行时参数与值类型默认值不经过容器。
    pub fn requires_registration(&self) -> bool {
        match self.kind() {
            DependencyKind::Direct | DependencyKind::Keyed => true,
            DependencyKind::Lazy => self.source == ParameterSource::Service && !self.optional,
            _ => false,
        }
    }

    /// 用泛型实参替换参数类型
    pub fn substitute(&self, args: &[TypeKey]) -> Self {
        Self {
            ty: self.ty.substitute(args),
            ..self.clone()
        }
    }
}

/// 注册方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationMode {
    /// 直接注册实现与接口
    #[default]
    Direct,
    /// 只注册生成的工厂
    GeneratedFactory,
}

/// 候选类型
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateType {
    pub implementation: TypeKey,
    #[serde(default)]
    pub interfaces: Vec<TypeKey>,
    #[serde(default)]
    pub lifetime: Lifetime,
    #[serde(default)]
    pub parameters: Vec<ConstructorParameter>,
    #[serde(default)]
    pub keys: Vec<String>,
    pub assembly: String,
    /// 选中的构造函数在声明顺序中的位置
    #[serde(default)]
    pub constructor: usize,
    #[serde(default)]
    pub mode: RegistrationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
}

impl CandidateType {
    /// 该候选类型产生的全部注册签名
    pub fn signatures(&self) -> Vec<RegistrationSignature> {
        let services: Vec<TypeKey> = match self.mode {
            RegistrationMode::Direct => std::iter::once(self.implementation.clone())
                .chain(self.interfaces.iter().cloned())
                .collect(),
            RegistrationMode::GeneratedFactory => std::iter::once(&self.implementation)
                .chain(self.interfaces.iter())
                .map(di_common::well_known::factory_of)
                .collect(),
        };
        let keys: Vec<Option<String>> = if self.keys.is_empty() {
            vec![None]
        } else {
            self.keys.iter().cloned().map(Some).collect()
        };

        let mut signatures = Vec::with_capacity(services.len() * keys.len());
        for service in &services {
            for key in &keys {
                signatures.push(RegistrationSignature {
                    service: service.clone(),
                    implementation: self.implementation.clone(),
                    lifetime: match self.mode {
                        RegistrationMode::Direct => self.lifetime,
                        RegistrationMode::GeneratedFactory => Lifetime::Singleton,
                    },
                    key: key.clone(),
                });
            }
        }
        signatures
    }

    /// 是否以该服务类型注册
    pub fn provides(&self, service: &TypeKey) -> bool {
        &self.implementation == service || self.interfaces.contains(service)
    }
}

/// 插件描述
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub implementation: TypeKey,
    #[serde(default)]
    pub interfaces: Vec<TypeKey>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub order: i32,
    pub assembly: String,
}

impl PluginDescriptor {
    pub fn implements(&self, interface: &TypeKey) -> bool {
        self.interfaces.contains(interface)
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }
}

/// 装饰器描述
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DecoratorDescriptor {
    pub decorator: TypeKey,
    /// 目标服务类型，开放装饰器为开放泛型形式
    pub target: TypeKey,
    pub order: i32,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub parameters: Vec<ConstructorParameter>,
    #[serde(default)]
    pub constructor: usize,
    pub assembly: String,
}

impl DecoratorDescriptor {
    /// 接收内层实例的参数位置
    pub fn inner_parameter(&self) -> Option<usize> {
        self.parameters.iter().position(|p| p.ty == self.target)
    }
}

/// 被拦截的方法及其专属拦截器
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterceptedMethod {
    pub name: String,
    pub interceptors: Vec<TypeKey>,
}

/// 拦截器类型的激活方式
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterceptorActivation {
    pub interceptor: TypeKey,
    #[serde(default)]
    pub constructor: usize,
    #[serde(default)]
    pub parameters: Vec<ConstructorParameter>,
}

/// 拦截器描述
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterceptorDescriptor {
    pub intercepted: TypeKey,
    #[serde(default)]
    pub interfaces: Vec<TypeKey>,
    /// 类型级拦截器，作用于全部方法
    #[serde(default)]
    pub interceptors: Vec<TypeKey>,
    /// 方法级拦截器
    #[serde(default)]
    pub methods: Vec<InterceptedMethod>,
    #[serde(default)]
    pub lifetime: Lifetime,
    /// 每个拦截器类型如何构造，与 [`Self::all_interceptors`] 一一对应
    #[serde(default)]
    pub activations: Vec<InterceptorActivation>,
}

impl InterceptorDescriptor {
    /// 全部拦截器类型，按声明顺序去重
    pub fn all_interceptors(&self) -> Vec<TypeKey> {
        let mut all: Vec<TypeKey> = Vec::new();
        let declared = self
            .interceptors
            .iter()
            .chain(self.methods.iter().flat_map(|m| m.interceptors.iter()));
        for interceptor in declared {
            if !all.contains(interceptor) {
                all.push(interceptor.clone());
            }
        }
        all
    }

    /// 查找拦截器的激活方式
    pub fn activation(&self, interceptor: &TypeKey) -> Option<&InterceptorActivation> {
        self.activations.iter().find(|a| &a.interceptor == interceptor)
    }

    /// 指定方法生效的拦截器：类型级在前，方法级在后，按标识去重
    pub fn interceptors_for(&self, method: &str) -> Vec<TypeKey> {
        let mut effective = self.interceptors.clone();
        let method_level = self
            .methods
            .iter()
            .filter(|m| m.name == method)
            .flat_map(|m| m.interceptors.iter());
        for interceptor in method_level {
            if !effective.contains(interceptor) {
                effective.push(interceptor.clone());
            }
        }
        effective
    }
}

/// 注册签名：(服务类型, 实现类型, 生命周期, 键)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegistrationSignature {
    pub service: TypeKey,
    pub implementation: TypeKey,
    pub lifetime: Lifetime,
    pub key: Option<String>,
}

/// 一次发现得到的全部事实
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFacts {
    #[serde(default)]
    pub candidates: Vec<CandidateType>,
    #[serde(default)]
    pub plugins: Vec<PluginDescriptor>,
    #[serde(default)]
    pub decorators: Vec<DecoratorDescriptor>,
    #[serde(default)]
    pub interceptors: Vec<InterceptorDescriptor>,
    #[serde(default, skip_serializing_if = "Diagnostics::is_empty")]
    pub diagnostics: Diagnostics,
}

impl CatalogFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加另一组事实，保持先后顺序
    pub fn extend(&mut self, other: CatalogFacts) {
        self.candidates.extend(other.candidates);
        self.plugins.extend(other.plugins);
        self.decorators.extend(other.decorators);
        self.interceptors.extend(other.interceptors);
        self.diagnostics.extend(other.diagnostics);
    }

    /// 查找候选类型
    pub fn candidate(&self, implementation: &TypeKey) -> Option<&CandidateType> {
        self.candidates.iter().find(|c| &c.implementation == implementation)
    }

    /// 注册签名集合
    pub fn registration_signatures(&self) -> BTreeSet<RegistrationSignature> {
        self.candidates.iter().flat_map(CandidateType::signatures).collect()
    }

    /// 与顺序无关的比较视图
    pub fn parity_view(&self) -> ParityView {
        ParityView {
            registrations: self.registration_signatures(),
            plugins: self.plugins.iter().cloned().collect(),
            decorators: self.decorators.iter().cloned().collect(),
            interceptors: self.interceptors.iter().cloned().collect(),
        }
    }
}

/// 事实的集合视图，两种发现策略的结果在此视图下必须相等
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParityView {
    pub registrations: BTreeSet<RegistrationSignature>,
    pub plugins: BTreeSet<PluginDescriptor>,
    pub decorators: BTreeSet<DecoratorDescriptor>,
    pub interceptors: BTreeSet<InterceptorDescriptor>,
}
