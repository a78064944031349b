//! 集成测试共享的程序集夹具
#![allow(dead_code)]

use di_abstractions::{Assembly, ConstructorDescriptor, ParamDescriptor, TypeDescriptor};
use di_common::{Directive, TypeKey};
use std::sync::Arc;

// ---------- 问候服务：多注册与装饰 ----------

pub trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

pub struct Fixed(pub &'static str);

impl Greeter for Fixed {
    fn greet(&self) -> String {
        self.0.to_string()
    }
}

pub struct Prefixed(pub Arc<dyn Greeter>);

impl Greeter for Prefixed {
    fn greet(&self) -> String {
        format!("Decorated: {}", self.0.greet())
    }
}

pub fn greeter(name: &str, text: &'static str) -> TypeDescriptor {
    TypeDescriptor::class(name)
        .implements_as::<Fixed, dyn Greeter, _>("IGreeter", |c| c)
        .with_constructor(ConstructorDescriptor::new(Vec::new(), move |_| Ok(Fixed(text))))
}

pub fn prefixing() -> TypeDescriptor {
    TypeDescriptor::class("PrefixingGreeter")
        .implements_as::<Prefixed, dyn Greeter, _>("IGreeter", |c| c)
        .with_directive(Directive::decorator_for("IGreeter", 0))
        .with_constructor(ConstructorDescriptor::new(
            vec![ParamDescriptor::service("inner", "IGreeter")],
            |args| Ok(Prefixed(args.interface::<dyn Greeter>(0)?)),
        ))
}

pub fn greetings() -> Assembly {
    Assembly::new("Greetings").with_types([
        greeter("ServiceA", "A"),
        greeter("ServiceB", "B"),
        prefixing(),
    ])
}

pub fn greet_all(provider: &di_impl::ServiceProvider) -> Vec<String> {
    provider
        .resolver()
        .get_all::<dyn Greeter>("IGreeter")
        .unwrap()
        .iter()
        .map(|g| g.greet())
        .collect()
}

// ---------- 网关：装饰器顺序 ----------

pub trait Gateway: Send + Sync {
    fn send(&self) -> String;
}

#[derive(Default)]
pub struct BaseGateway;

impl Gateway for BaseGateway {
    fn send(&self) -> String {
        "base".to_string()
    }
}

pub struct Layer {
    label: String,
    inner: Arc<dyn Gateway>,
}

impl Gateway for Layer {
    fn send(&self) -> String {
        format!("{}({})", self.label, self.inner.send())
    }
}

fn layer(name: &str, label: &'static str, order: i32) -> TypeDescriptor {
    TypeDescriptor::class(name)
        .implements_as::<Layer, dyn Gateway, _>("IGateway", |c| c)
        .with_directive(Directive::decorator_for("IGateway", order))
        .with_constructor(ConstructorDescriptor::new(
            vec![ParamDescriptor::service("inner", "IGateway")],
            move |args| {
                Ok(Layer {
                    label: label.to_string(),
                    inner: args.interface::<dyn Gateway>(0)?,
                })
            },
        ))
}

/// 装饰器故意乱序声明
pub fn gateways() -> Assembly {
    Assembly::new("Gateways").with_types([
        layer("OuterGateway", "o2", 2),
        TypeDescriptor::class("BaseGateway")
            .implements_as::<BaseGateway, dyn Gateway, _>("IGateway", |c| c)
            .with_constructor(ConstructorDescriptor::default_of::<BaseGateway>()),
        layer("InnerGateway", "o0", 0),
        layer("MiddleGateway", "o1", 1),
    ])
}

// ---------- 开放泛型处理器 ----------

pub trait Handler: Send + Sync {
    fn handle(&self) -> String;
}

pub struct EntityHandler(String);

impl Handler for EntityHandler {
    fn handle(&self) -> String {
        format!("Handler({})", self.0)
    }
}

pub struct Wrapping {
    label: &'static str,
    inner: Arc<dyn Handler>,
}

impl Handler for Wrapping {
    fn handle(&self) -> String {
        format!("{}({})", self.label, self.inner.handle())
    }
}

pub fn handler_of(entity: &str) -> TypeKey {
    TypeKey::generic("IHandler", vec![TypeKey::named(entity)])
}

fn entity_handler(entity: &'static str) -> TypeDescriptor {
    TypeDescriptor::class(format!("{}Handler", entity))
        .implements_as::<EntityHandler, dyn Handler, _>(handler_of(entity), |c| c)
        .with_constructor(ConstructorDescriptor::new(Vec::new(), move |_| {
            Ok(EntityHandler(entity.to_string()))
        }))
}

fn wrapping_constructor(label: &'static str, service: TypeKey) -> ConstructorDescriptor {
    ConstructorDescriptor::new(vec![ParamDescriptor::service("inner", service)], move |args| {
        Ok(Wrapping {
            label,
            inner: args.interface::<dyn Handler>(0)?,
        })
    })
}

/// 开放泛型装饰器，按实参封闭为具体装饰器
fn open_wrapping(name: &'static str, label: &'static str, order: i32) -> TypeDescriptor {
    let open_service = TypeKey::open("IHandler", 1);
    TypeDescriptor::class(TypeKey::open(name, 1))
        .implements(open_service.clone())
        .with_directive(Directive::open_decorator_for(open_service.clone(), order))
        .with_constructor(wrapping_constructor(label, open_service))
        .closes_with(move |args| {
            let service = TypeKey::generic("IHandler", args.to_vec());
            Some(
                TypeDescriptor::class(TypeKey::generic(name, args.to_vec()))
                    .implements_as::<Wrapping, dyn Handler, _>(service.clone(), |c| c)
                    .with_constructor(wrapping_constructor(label, service)),
            )
        })
}

pub fn handlers() -> Assembly {
    Assembly::new("Handlers").with_types([
        entity_handler("Order"),
        entity_handler("Payment"),
        open_wrapping("MetricsHandler", "Metrics", 2),
        open_wrapping("LoggingHandler", "Logged", 1),
    ])
}

// ---------- 插件 ----------

#[derive(Default)]
pub struct Task;

fn plugin(name: &str, order: Option<i32>) -> TypeDescriptor {
    let descriptor = TypeDescriptor::class(name)
        .implements("IStartupTask")
        .with_constructor(ConstructorDescriptor::default_of::<Task>());
    match order {
        Some(order) => descriptor.with_directive(Directive::PluginOrder(order)),
        None => descriptor,
    }
}

/// 插件故意乱序声明，期望顺序见 [`EXPECTED_PLUGIN_ORDER`]
pub fn plugins() -> Assembly {
    Assembly::new("Plugins").with_types([
        plugin("Warmup", Some(50)),
        plugin("ZetaTask", None),
        plugin("Migrate", Some(-100)),
        plugin("Shutdown", Some(100)),
        plugin("AlphaTask", Some(0)),
        plugin("Seed", Some(-50)),
    ])
}

pub const EXPECTED_PLUGIN_ORDER: [&str; 6] =
    ["Migrate", "Seed", "AlphaTask", "ZetaTask", "Warmup", "Shutdown"];

// ---------- 多接口单例 ----------

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

pub trait TimeSource: Send + Sync {
    fn ticks(&self) -> u64;
}

#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        1_700_000_000
    }
}

impl TimeSource for SystemClock {
    fn ticks(&self) -> u64 {
        42
    }
}

pub fn clocks() -> Assembly {
    Assembly::new("Clocks").with_type(
        TypeDescriptor::class("SystemClock")
            .implements_as::<SystemClock, dyn Clock, _>("IClock", |c| c)
            .implements_as::<SystemClock, dyn TimeSource, _>("ITimeSource", |c| c)
            .with_directive(Directive::singleton())
            .with_constructor(ConstructorDescriptor::default_of::<SystemClock>()),
    )
}

/// 实例的数据指针，用于跨接口比较身份
pub fn address<T: ?Sized>(value: &Arc<T>) -> *const u8 {
    Arc::as_ptr(value) as *const u8
}
