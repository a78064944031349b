//! 演示用的商店程序集

use di_abstractions::{
    Assembly, ConstructorDescriptor, Interceptor, InterceptorChain, Invocation, Next,
    ParamDescriptor, ReturnValue, TypeDescriptor,
};
use di_common::{well_known, DependencyResult, Directive};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        1_700_000_000
    }
}

pub trait PriceCalculator: Send + Sync {
    fn price(&self, cents: u64) -> u64;
}

#[derive(Default)]
pub struct ListPrice;

impl PriceCalculator for ListPrice {
    fn price(&self, cents: u64) -> u64 {
        cents
    }
}

/// 九折
pub struct Discount(Arc<dyn PriceCalculator>);

impl PriceCalculator for Discount {
    fn price(&self, cents: u64) -> u64 {
        self.0.price(cents) * 9 / 10
    }
}

/// 加税
pub struct WithTax(Arc<dyn PriceCalculator>);

impl PriceCalculator for WithTax {
    fn price(&self, cents: u64) -> u64 {
        self.0.price(cents) * 108 / 100
    }
}

pub trait PaymentGateway: Send + Sync {
    fn charge(&self, cents: u64) -> DependencyResult<u64>;
    fn charged(&self) -> u64;
}

#[derive(Default)]
pub struct CardGateway {
    total: Mutex<u64>,
}

impl PaymentGateway for CardGateway {
    fn charge(&self, cents: u64) -> DependencyResult<u64> {
        let mut total = self.total.lock();
        *total += cents;
        Ok(*total)
    }

    fn charged(&self) -> u64 {
        *self.total.lock()
    }
}

struct GatewayProxy {
    inner: Arc<dyn PaymentGateway>,
    chain: Arc<InterceptorChain>,
}

impl PaymentGateway for GatewayProxy {
    fn charge(&self, cents: u64) -> DependencyResult<u64> {
        let inner = self.inner.clone();
        self.chain
            .invoke("charge", vec![Box::new(cents)], move |invocation| {
                let cents = invocation.cloned_argument::<u64>(0)?;
                Ok(ReturnValue::value(inner.charge(cents)?))
            })?
            .into_value::<u64>()
    }

    fn charged(&self) -> u64 {
        self.inner.charged()
    }
}

/// 记录每次扣款
#[derive(Default)]
pub struct AuditInterceptor;

impl Interceptor for AuditInterceptor {
    fn intercept(&self, invocation: &mut Invocation, next: Next<'_>) -> DependencyResult<ReturnValue> {
        info!("审计: 调用 {}", invocation.method());
        next.proceed(invocation)
    }
}

/// 每个请求一个上下文
pub struct OrderContext {
    pub opened_at: u64,
}

pub trait StartupTask: Send + Sync {
    fn run(&self) -> String;
}

pub struct Step(&'static str);

impl StartupTask for Step {
    fn run(&self) -> String {
        format!("执行启动任务 {}", self.0)
    }
}

fn step(name: &'static str, order: i32) -> TypeDescriptor {
    TypeDescriptor::class(name)
        .implements_as::<Step, dyn StartupTask, _>("IStartupTask", |c| c)
        .with_directive(Directive::PluginOrder(order))
        .with_constructor(ConstructorDescriptor::new(Vec::new(), move |_| Ok(Step(name))))
}

fn price_layer<D, F>(name: &str, order: i32, wrap: F) -> TypeDescriptor
where
    D: PriceCalculator + 'static,
    F: Fn(Arc<dyn PriceCalculator>) -> D + Send + Sync + 'static,
{
    TypeDescriptor::class(name)
        .implements_as::<D, dyn PriceCalculator, _>("IPriceCalculator", |c| c)
        .with_directive(Directive::decorator_for("IPriceCalculator", order))
        .with_constructor(ConstructorDescriptor::new(
            vec![ParamDescriptor::service("inner", "IPriceCalculator")],
            move |args| Ok(wrap(args.interface::<dyn PriceCalculator>(0)?)),
        ))
}

pub fn assemblies() -> Vec<Assembly> {
    vec![
        Assembly::new("Shop.Host").with_types([
            step("MigrateDatabase", -100),
            step("WarmCaches", 50),
        ]),
        Assembly::new("Shop.Core").with_types([
            TypeDescriptor::class("SystemClock")
                .implements_as::<SystemClock, dyn Clock, _>("IClock", |c| c)
                .with_constructor(ConstructorDescriptor::default_of::<SystemClock>()),
            TypeDescriptor::class("ListPrice")
                .implements_as::<ListPrice, dyn PriceCalculator, _>("IPriceCalculator", |c| c)
                .with_constructor(ConstructorDescriptor::default_of::<ListPrice>()),
            TypeDescriptor::class("LegacyPrice")
                .implements_as::<ListPrice, dyn PriceCalculator, _>("IPriceCalculator", |c| c)
                .with_constructor(ConstructorDescriptor::default_of::<ListPrice>()),
            price_layer("TaxLayer", 1, WithTax),
            price_layer("DiscountLayer", 0, Discount),
            TypeDescriptor::class("OrderContext")
                .with_directive(Directive::scoped())
                .with_constructor(ConstructorDescriptor::new(
                    vec![ParamDescriptor::service("clock", "IClock")],
                    |args| {
                        Ok(OrderContext {
                            opened_at: args.interface::<dyn Clock>(0)?.now(),
                        })
                    },
                )),
        ]),
        Assembly::new("Shop.Payments").with_types([
            TypeDescriptor::class("AuditInterceptor")
                .implements_as::<AuditInterceptor, dyn Interceptor, _>(well_known::interceptor(), |c| c)
                .with_constructor(ConstructorDescriptor::default_of::<AuditInterceptor>()),
            TypeDescriptor::class("CardGateway")
                .implements_as::<CardGateway, dyn PaymentGateway, _>("IPaymentGateway", |c| c)
                .with_directive(Directive::intercept("AuditInterceptor"))
                .with_proxy::<dyn PaymentGateway, _>("IPaymentGateway", |inner, chain| {
                    Arc::new(GatewayProxy { inner, chain })
                })
                .with_constructor(ConstructorDescriptor::default_of::<CardGateway>()),
        ]),
        Assembly::new("Vendor.Plugins")
            .participating()
            .with_type(step("SeedCatalog", 0).internal()),
    ]
}
