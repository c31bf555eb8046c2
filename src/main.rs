//! # appcontainer-pipes
//!
//! Windows CLI 工具，用于定位 AppContainer 进程的会话命名管道。
//!
//! ## 功能
//! - 获取一次系统进程快照
//! - 找出所有运行在 AppContainer 中的进程
//! - 输出每个进程对应的 `\\.\pipe\Sessions\<id>\<object-path>` 管道路径
//!
//! ## 使用
//! ```bash
//! # 基础扫描（无权访问的进程会被静默跳过）
//! appcontainer-pipes scan
//!
//! # 只看某个会话中的 WebView2 进程
//! appcontainer-pipes scan --session 1 --name msedgewebview2
//!
//! # JSON / CSV 格式输出
//! appcontainer-pipes scan --format json
//! appcontainer-pipes scan --format csv
//!
//! # 查看被跳过的进程及原因
//! RUST_LOG=appcontainer_pipes=trace appcontainer-pipes scan
//! ```

use std::io;
use std::process;

use anyhow::Result;
use appcontainer_pipes::AppContainerPipe;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod report;

use report::{Filter, OutputFormat};

// ========================================
// CLI 参数定义
// ========================================

/// AppContainer 会话命名管道定位工具
#[derive(Parser)]
#[command(name = "appcontainer-pipes")]
#[command(version)]
#[command(about = "Windows CLI tool to locate the session named pipes of AppContainer processes")]
struct Cli {
    /// 子命令
    #[command(subcommand)]
    command: Commands,
}

/// 支持的子命令
#[derive(Subcommand)]
enum Commands {
    /// 扫描所有 AppContainer 进程的命名管道
    Scan {
        /// 只显示该会话中的管道
        #[arg(long, value_name = "ID")]
        session: Option<u32>,

        /// 只显示进程名包含该子串的结果（不区分大小写）
        #[arg(long, value_name = "SUBSTR")]
        name: Option<String>,

        /// 输出格式
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// 显示调试信息
        #[arg(long)]
        debug: bool,
    },
}

// ========================================
// 主函数
// ========================================

fn main() {
    // 解析命令行参数
    let cli = Cli::parse();

    // 执行对应的子命令
    let result = match cli.command {
        Commands::Scan {
            session,
            name,
            format,
            debug,
        } => {
            init_logging(debug);
            run_scan(&Filter { session, name }, format)
        }
    };

    // 处理错误
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// 初始化日志
///
/// 日志写到 stderr，stdout 只留给扫描结果。`RUST_LOG` 优先于 `--debug`。
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ========================================
// 扫描命令实现
// ========================================

/// 执行扫描命令
fn run_scan(filter: &Filter, format: OutputFormat) -> Result<()> {
    // 1. 扫描
    let pipes = collect_pipes()?;
    tracing::debug!(total = pipes.len(), "scan complete");

    // 2. 过滤
    let pipes = filter.apply(pipes);

    // 3. 输出
    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::render(&pipes, format, &mut out)
}

#[cfg(windows)]
fn collect_pipes() -> Result<Vec<AppContainerPipe>> {
    Ok(appcontainer_pipes::scan_detailed()?)
}

#[cfg(not(windows))]
fn collect_pipes() -> Result<Vec<AppContainerPipe>> {
    anyhow::bail!("AppContainer scanning is only supported on Windows")
}
