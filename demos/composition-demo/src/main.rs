//! # 组合演示
//!
//! 读取配置、初始化日志，组合一个小型商店应用，按插件顺序执行启动任务，
//! 再并发处理几笔订单，每笔订单使用独立的作用域。

mod shop;

use anyhow::Result;
use clap::Parser;
use di_abstractions::FixedAssemblyProvider;
use di_common::TypeKey;
use di_composition::{Composition, CompositionBuilder, CompositionOptions};
use di_impl::ServiceProvider;
use shop::{OrderContext, PaymentGateway, PriceCalculator, Step, StartupTask};
use std::path::Path;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "composition-demo")]
#[command(about = "Lorn DI 组合演示")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config/composition.toml")]
    config: String,

    /// 日志级别，覆盖配置文件
    #[arg(long)]
    log_level: Option<String>,

    /// 以 JSON 输出组合报告
    #[arg(long)]
    json: bool,

    /// 并发处理的订单数量
    #[arg(long, default_value_t = 3)]
    orders: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let path = Path::new(&args.config);
    let options = CompositionOptions::load(path.exists().then_some(path))?;

    let mut logging = options.logging_config();
    if let Some(level) = &args.log_level {
        logging.level = level.parse()?;
    }
    logging.init();
    info!("启动组合演示");
    if !path.exists() {
        warn!("配置文件不存在，使用默认配置: {}", args.config);
    }

    let (provider, composition) = CompositionBuilder::new()
        .with_options(options)
        .with_assembly_provider(FixedAssemblyProvider::new(shop::assemblies()))
        .build()?;

    println!("{}", composition.report);
    if args.json {
        println!("{}", composition.report.to_json()?);
    }

    run_startup_tasks(&provider, &composition)?;
    process_orders(&provider, args.orders).await?;

    info!("演示结束");
    Ok(())
}

/// 按插件顺序执行启动任务
fn run_startup_tasks(provider: &ServiceProvider, composition: &Composition) -> Result<()> {
    let resolver = provider.resolver();
    for plugin in composition.plugins.implementing(&TypeKey::named("IStartupTask")) {
        let task = resolver.get::<Step>(plugin.implementation.clone())?;
        println!("[{:>4}] {}", plugin.order, task.run());
    }
    Ok(())
}

/// 每笔订单在独立作用域内处理
async fn process_orders(provider: &ServiceProvider, count: u64) -> Result<()> {
    let mut handles = Vec::new();
    for id in 1..=count {
        let provider = provider.clone();
        handles.push(tokio::spawn(async move {
            let scope = provider.create_scope();
            let resolver = scope.resolver();
            let context = resolver.get::<OrderContext>("OrderContext")?;
            let calculator = resolver.get_interface::<dyn PriceCalculator>("IPriceCalculator")?;
            let gateway = resolver.get_interface::<dyn PaymentGateway>("IPaymentGateway")?;

            let price = calculator.price(id * 1_000);
            gateway.charge(price)?;
            info!("订单 {} 处理完成: 金额 {}, 开单时间 {}", id, price, context.opened_at);
            Ok::<u64, anyhow::Error>(price)
        }));
    }

    let mut total = 0;
    for handle in handles {
        total += handle.await??;
    }

    let gateway = provider
        .resolver()
        .get_interface::<dyn PaymentGateway>("IPaymentGateway")?;
    println!("共处理 {} 笔订单, 合计 {}, 网关累计 {}", count, total, gateway.charged());
    Ok(())
}
