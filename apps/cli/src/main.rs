//! # Cartesian CLI
//!
//! 笛卡尔控制器的命令行工具：检查配置，或在模拟硬件上运行控制循环。
//!
//! ```bash
//! # 检查配置（运动链、自由度、限位）
//! cartesian-cli check --config config/planar_arm.toml
//!
//! # 以恒定误差运行 500 个周期
//! cartesian-cli run --config config/planar_arm.toml --ticks 500 \
//!     --error 0.0,0.05,0.0,0.0,0.0,0.0 --start 0.3,0.9,-0.6
//!
//! # 实时运行，第 100 个周期暂停，第 200 个周期恢复
//! cartesian-cli run --config config/planar_arm.toml --ticks 300 --realtime \
//!     --error 0.05,0.0,0.0,0.0,0.0,0.0 --pause-after 100 --resume-after 200
//! ```
//!
//! 日志级别由 `RUST_LOG` 控制，默认 `cartesian_cli=info,cartesian_control=info`。

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{CheckCommand, RunCommand};

/// Cartesian CLI - 笛卡尔控制器命令行工具
#[derive(Parser, Debug)]
#[command(name = "cartesian-cli")]
#[command(about = "Check controller configurations and run the Cartesian controller on simulated hardware", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 检查配置文件
    Check {
        #[command(flatten)]
        args: CheckCommand,
    },

    /// 在模拟硬件上运行控制循环
    Run {
        #[command(flatten)]
        args: RunCommand,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cartesian_cli=info,cartesian_control=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { args } => args.execute(),
        Commands::Run { args } => args.execute(),
    }
}
