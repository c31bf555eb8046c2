//! # 输出模块
//!
//! 负责扫描结果的过滤和渲染，支持三种格式：
//! - table: 人类可读的表格（默认）
//! - json: JSON 数组
//! - csv: 带表头的 CSV

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use anyhow::Result;
use appcontainer_pipes::AppContainerPipe;

// ========================================
// 输出格式
// ========================================

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// 表格
    #[default]
    Table,
    /// JSON 数组
    Json,
    /// CSV
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

// ========================================
// 过滤条件
// ========================================

/// 扫描结果过滤条件
#[derive(Debug, Clone, Default)]
pub struct Filter {
    /// 只保留该会话中的管道
    pub session: Option<u32>,
    /// 只保留进程名包含该子串的结果（ASCII 不区分大小写）
    pub name: Option<String>,
}

impl Filter {
    pub fn matches(&self, pipe: &AppContainerPipe) -> bool {
        if let Some(session) = self.session {
            if pipe.session_id != session {
                return false;
            }
        }
        if let Some(ref name) = self.name {
            let needle = name.to_ascii_lowercase();
            if !pipe.exe_name.to_ascii_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }

    /// 按过滤条件筛选，保持原有顺序
    pub fn apply(&self, pipes: Vec<AppContainerPipe>) -> Vec<AppContainerPipe> {
        pipes.into_iter().filter(|p| self.matches(p)).collect()
    }
}

// ========================================
// 渲染
// ========================================

/// CSV 表头，与 `AppContainerPipe` 的字段顺序一致
const CSV_HEADER: [&str; 6] = [
    "pid",
    "parent_pid",
    "exe_name",
    "session_id",
    "object_path",
    "pipe_path",
];

/// 按指定格式把结果写到 `out`
pub fn render<W: Write>(
    pipes: &[AppContainerPipe],
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    match format {
        OutputFormat::Table => render_table(pipes, out),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, pipes)?;
            writeln!(out)?;
            Ok(())
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            if pipes.is_empty() {
                // serialize 只在写第一行时输出表头，空结果需要手动写
                writer.write_record(CSV_HEADER)?;
            }
            for pipe in pipes {
                writer.serialize(pipe)?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}

fn render_table<W: Write>(pipes: &[AppContainerPipe], out: &mut W) -> Result<()> {
    // 1. 打印表头
    write_row(out, "PID", "NAME", "SESSION", "PIPE")?;

    // 2. 打印每行数据，同时按会话计数
    let mut per_session: BTreeMap<u32, usize> = BTreeMap::new();
    for pipe in pipes {
        *per_session.entry(pipe.session_id).or_insert(0) += 1;
        write_row(
            out,
            pipe.pid,
            truncate(&pipe.exe_name, 30),
            pipe.session_id,
            &pipe.pipe_path,
        )?;
    }

    // 3. 汇总
    writeln!(out, "\nTotal: {} app container pipes", pipes.len())?;
    for (session, count) in per_session {
        writeln!(out, "  session {}: {}", session, count)?;
    }
    Ok(())
}

/// 按固定列宽写一行表格
fn write_row<W: Write>(
    out: &mut W,
    pid: impl fmt::Display,
    name: impl fmt::Display,
    session: impl fmt::Display,
    pipe: impl fmt::Display,
) -> io::Result<()> {
    writeln!(out, "{:<8}\t{:<30}\t{:<8}\t{}", pid, name, session, pipe)
}

/// 超长字符串截断为 `max_width` 个字符，末尾加 ".."
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let head: String = s.chars().take(max_width.saturating_sub(2)).collect();
        format!("{}..", head)
    } else {
        s.to_string()
    }
}
