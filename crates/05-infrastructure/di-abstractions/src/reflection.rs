//! 原始类型元数据
//!
//! 动态发现策略的输入。每个程序集由若干 [`TypeDescriptor`] 组成，
//! 描述类型的形态、可见性、实现的接口、指令、构造函数与方法，
//! 并携带激活器、向上转换、代理工厂等可执行部分。

use crate::binding::{Activator, GenericCloser, ProxyFactory, Upcast};
use crate::facts::{ParameterShape, SourceLocation};
use crate::instance::{interface_view, Arguments, Instance};
use crate::interception::InterceptorChain;
use di_common::{DependencyError, DependencyResult, Directive, TypeKey};
use std::any::{type_name, Any};
use std::sync::Arc;

/// 类型形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// 具体类
    Class,
    /// 抽象类
    Abstract,
    /// 接口
    Interface,
    /// 值类型，没有有意义的身份
    ValueLike,
    /// 静态类，没有实例
    Static,
}

/// 可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Internal,
}

/// 参数类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamCategory {
    /// 可注入的服务类型
    Service,
    /// 值类型
    Value,
    /// 只能由调用方在运行时提供
    Runtime,
}

/// 构造参数元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: String,
    pub ty: TypeKey,
    pub category: ParamCategory,
    pub shape: ParameterShape,
    pub has_default: bool,
    pub optional: bool,
    pub key: Option<String>,
}

impl ParamDescriptor {
    fn with(name: &str, ty: TypeKey, category: ParamCategory, shape: ParameterShape) -> Self {
        Self {
            name: name.to_string(),
            ty,
            category,
            shape,
            has_default: false,
            optional: false,
            key: None,
        }
    }

    /// 单个服务
    pub fn service(name: &str, ty: impl Into<TypeKey>) -> Self {
        Self::with(name, ty.into(), ParamCategory::Service, ParameterShape::Single)
    }

    /// 全部实现的集合
    pub fn all(name: &str, ty: impl Into<TypeKey>) -> Self {
        Self::with(name, ty.into(), ParamCategory::Service, ParameterShape::Collection)
    }

    /// 延迟解析
    pub fn lazy(name: &str, ty: impl Into<TypeKey>) -> Self {
        Self::with(name, ty.into(), ParamCategory::Service, ParameterShape::Lazy)
    }

    /// 值类型，未声明默认值
    pub fn value(name: &str, ty: impl Into<TypeKey>) -> Self {
        Self::with(name, ty.into(), ParamCategory::Value, ParameterShape::Single)
    }

    /// 带默认值的值类型
    pub fn value_with_default(name: &str, ty: impl Into<TypeKey>) -> Self {
        Self {
            has_default: true,
            ..Self::value(name, ty)
        }
    }

    /// 运行时参数
    pub fn runtime(name: &str, ty: impl Into<TypeKey>) -> Self {
        Self::with(name, ty.into(), ParamCategory::Runtime, ParameterShape::Single)
    }

    /// 键控依赖
    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// 可选依赖，缺失时为空
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// 是否可由容器满足
    pub fn is_injectable(&self) -> bool {
        match self.category {
            ParamCategory::Service => true,
            ParamCategory::Value => self.has_default,
            ParamCategory::Runtime => false,
        }
    }
}

/// 构造函数元数据
#[derive(Clone)]
pub struct ConstructorDescriptor {
    pub visibility: Visibility,
    pub params: Vec<ParamDescriptor>,
    pub activator: Activator,
}

impl ConstructorDescriptor {
    /// 以类型化构造闭包创建公开构造函数
    pub fn new<T, F>(params: Vec<ParamDescriptor>, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> DependencyResult<T> + Send + Sync + 'static,
    {
        let activator: Activator =
            Arc::new(move |args: &Arguments| build(args).map(|value| Arc::new(value) as Instance));
        Self {
            visibility: Visibility::Public,
            params,
            activator,
        }
    }

    /// 无参构造函数
    pub fn default_of<T>() -> Self
    where
        T: Any + Send + Sync + Default,
    {
        Self::new(Vec::new(), |_| Ok(T::default()))
    }

    /// 以已擦除的激活器创建
    pub fn erased(params: Vec<ParamDescriptor>, activator: Activator) -> Self {
        Self {
            visibility: Visibility::Public,
            params,
            activator,
        }
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Internal;
        self
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// 参数类型列表
    pub fn signature(&self) -> Vec<TypeKey> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }
}

impl std::fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("visibility", &self.visibility)
            .field("params", &self.params)
            .finish()
    }
}

/// 实现的接口
#[derive(Clone)]
pub struct InterfaceImpl {
    pub key: TypeKey,
    pub upcast: Option<Upcast>,
}

/// 方法元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub directives: Vec<Directive>,
}

/// 类型元数据
#[derive(Clone)]
pub struct TypeDescriptor {
    pub key: TypeKey,
    pub shape: TypeShape,
    pub visibility: Visibility,
    pub interfaces: Vec<InterfaceImpl>,
    pub directives: Vec<Directive>,
    pub constructors: Vec<ConstructorDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub proxies: Vec<(TypeKey, ProxyFactory)>,
    pub closer: Option<GenericCloser>,
    pub source: Option<SourceLocation>,
}

impl TypeDescriptor {
    fn with_shape(key: impl Into<TypeKey>, shape: TypeShape) -> Self {
        Self {
            key: key.into(),
            shape,
            visibility: Visibility::Public,
            interfaces: Vec::new(),
            directives: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            proxies: Vec::new(),
            closer: None,
            source: None,
        }
    }

    pub fn class(key: impl Into<TypeKey>) -> Self {
        Self::with_shape(key, TypeShape::Class)
    }

    pub fn abstract_class(key: impl Into<TypeKey>) -> Self {
        Self::with_shape(key, TypeShape::Abstract)
    }

    pub fn interface(key: impl Into<TypeKey>) -> Self {
        Self::with_shape(key, TypeShape::Interface)
    }

    pub fn value_like(key: impl Into<TypeKey>) -> Self {
        Self::with_shape(key, TypeShape::ValueLike)
    }

    pub fn static_class(key: impl Into<TypeKey>) -> Self {
        Self::with_shape(key, TypeShape::Static)
    }

    pub fn internal(mut self) -> Self {
        self.visibility = Visibility::Internal;
        self
    }

    /// 声明实现的接口，不提供向上转换
    pub fn implements(mut self, interface: impl Into<TypeKey>) -> Self {
        self.interfaces.push(InterfaceImpl {
            key: interface.into(),
            upcast: None,
        });
        self
    }

    /// 声明实现的接口，并提供从具体类型到接口视图的转换
    pub fn implements_as<C, I, F>(mut self, interface: impl Into<TypeKey>, cast: F) -> Self
    where
        C: Any + Send + Sync,
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>) -> Arc<I> + Send + Sync + 'static,
    {
        let upcast: Upcast = Arc::new(move |instance: Instance| {
            let concrete = instance
                .downcast::<C>()
                .map_err(|_| DependencyError::type_mismatch(type_name::<C>(), "实例"))?;
            Ok(interface_view(cast(concrete)))
        });
        self.interfaces.push(InterfaceImpl {
            key: interface.into(),
            upcast: Some(upcast),
        });
        self
    }

    pub fn with_directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_method(mut self, name: &str, directives: Vec<Directive>) -> Self {
        self.methods.push(MethodDescriptor {
            name: name.to_string(),
            directives,
        });
        self
    }

    /// 为接口提供拦截代理工厂
    pub fn with_proxy<I, F>(mut self, interface: impl Into<TypeKey>, build: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<I>, Arc<InterceptorChain>) -> Arc<I> + Send + Sync + 'static,
    {
        let factory: ProxyFactory = Arc::new(move |view: Instance, chain: Arc<InterceptorChain>| {
            let inner = crate::instance::downcast_interface::<I>(&view)?;
            Ok(interface_view(build(inner, chain)))
        });
        self.proxies.push((interface.into(), factory));
        self
    }

    /// 开放泛型定义按实参封闭为具体类型
    pub fn closes_with<F>(mut self, close: F) -> Self
    where
        F: Fn(&[TypeKey]) -> Option<TypeDescriptor> + Send + Sync + 'static,
    {
        self.closer = Some(Arc::new(close));
        self
    }

    pub fn at(mut self, file: &str, line: u32) -> Self {
        self.source = Some(SourceLocation::new(file, line));
        self
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_open_generic(&self) -> bool {
        self.key.is_open()
    }

    pub fn interface_keys(&self) -> Vec<TypeKey> {
        self.interfaces.iter().map(|i| i.key.clone()).collect()
    }

    pub fn implements_interface(&self, interface: &TypeKey) -> bool {
        self.interfaces.iter().any(|i| &i.key == interface)
    }

    pub fn has_directive(&self, predicate: impl Fn(&Directive) -> bool) -> bool {
        self.directives.iter().any(predicate)
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("shape", &self.shape)
            .field("visibility", &self.visibility)
            .field("interfaces", &self.interface_keys())
            .field("directives", &self.directives)
            .field("constructors", &self.constructors)
            .field("methods", &self.methods)
            .finish()
    }
}

/// 程序集
#[derive(Debug, Clone)]
pub struct Assembly {
    pub name: String,
    /// 参与发现契约：外部程序集的内部类型对发现可见
    pub participates: bool,
    pub types: Vec<TypeDescriptor>,
}

impl Assembly {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            participates: false,
            types: Vec::new(),
        }
    }

    pub fn participating(mut self) -> Self {
        self.participates = true;
        self
    }

    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    pub fn with_types(mut self, descriptors: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        self.types.extend(descriptors);
        self
    }

    pub fn find(&self, key: &TypeKey) -> Option<&TypeDescriptor> {
        self.types.iter().find(|t| &t.key == key)
    }
}
