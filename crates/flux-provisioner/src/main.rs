use anyhow::Result;
use clap::Parser;
use flux_provisioner::{logging, shutdown, ProvisionerConfig, Scheduler};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config/provisioner.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 配置错误在启动阶段直接退出
    let config = ProvisionerConfig::load(&args.config)?;
    logging::init(&config.logging)?;

    info!(
        config = ?args.config,
        rules_url = %config.rules_url,
        collector = %config.zabbix_addr,
        "Starting FLUX LLD provisioner"
    );

    let scheduler = Scheduler::from_config(&config)?;
    let (handle, listener) = shutdown::channel();

    tokio::spawn(async move {
        if let Err(e) = handle.trigger_on_system_signal().await {
            error!("Failed to listen for shutdown signals: {}", e);
            // 保持发送端存活，否则调度器会立即退出
            std::future::pending::<()>().await;
        }
    });

    scheduler.run(listener).await;

    info!("FLUX LLD provisioner stopped");
    Ok(())
}
