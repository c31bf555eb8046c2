//! # 扫描编排模块
//!
//! 核心逻辑所在，负责：
//! 1. 获取一次系统进程快照
//! 2. 逐个打开进程及其 token
//! 3. 过滤出 AppContainer token
//! 4. 为每个 AppContainer 进程推导会话命名管道路径
//!
//! ## 错误策略
//! - 快照获取失败、第一个条目读取失败：整次扫描失败
//! - 单个进程的任何失败（进程已退出、权限不足、token 缺少信息）：静默跳过
//!
//! 扫描是单线程顺序执行的，结果顺序即快照枚举顺序。

use std::iter;

use tracing::{debug, trace};

use crate::error::{OsError, ScanError};
use crate::facility::{ProcessEntry, ProcessFacility, ProcessSnapshot};
use crate::pipe::{AppContainerPipe, PipePath};

// ========================================
// 核心扫描函数
// ========================================

/// 执行一次完整扫描，返回每个 AppContainer 进程的详细结果
///
/// ## 流程
/// 1. 获取进程快照
/// 2. 读取第一个条目
/// 3. 对每个条目：打开进程 -> 打开 token -> 检查 AppContainer 标志 -> 推导路径
/// 4. 快照耗尽后释放快照句柄
///
/// ## 返回
/// 按枚举顺序排列的结果（可能为空，可能有重复路径）
pub fn scan_with<F: ProcessFacility>(facility: &F) -> Result<Vec<AppContainerPipe>, ScanError> {
    // 1. 获取快照，失败则整次扫描失败
    let mut snapshot = facility
        .snapshot()
        .map_err(ScanError::SnapshotUnavailable)?;
    debug!("acquired process snapshot");

    // 2. 读取第一个条目；提前返回时 snapshot 离开作用域，句柄照样释放
    let first = snapshot.first().map_err(ScanError::EnumerationFailed)?;

    // 3. 遍历快照，每个条目的句柄在 inspect_entry 返回前全部释放
    let mut scanned = 0usize;
    let pipes: Vec<AppContainerPipe> = iter::successors(Some(first), |_| snapshot.next_entry())
        .inspect(|_| scanned += 1)
        .filter_map(|entry| inspect_entry(facility, &entry))
        .collect();

    // 4. 释放快照
    drop(snapshot);

    debug!(scanned, found = pipes.len(), "process scan finished");
    Ok(pipes)
}

/// 只返回管道路径字符串
pub fn scan_paths_with<F: ProcessFacility>(facility: &F) -> Result<Vec<String>, ScanError> {
    Ok(scan_with(facility)?
        .into_iter()
        .map(|pipe| pipe.pipe_path)
        .collect())
}

// ========================================
// 单个进程检查
// ========================================

/// 检查单个进程，若是 AppContainer 且能推导出路径则返回结果
///
/// token 先于进程句柄声明之后创建，因此按 token -> 进程 的顺序释放。
fn inspect_entry<F: ProcessFacility>(
    facility: &F,
    entry: &ProcessEntry,
) -> Option<AppContainerPipe> {
    let process = facility
        .open_process(entry.pid)
        .map_err(|e| skip(entry, "OpenProcess", &e))
        .ok()?;

    let token = facility
        .open_token(&process)
        .map_err(|e| skip(entry, "OpenProcessToken", &e))
        .ok()?;

    let is_app_container = facility
        .is_app_container(&token)
        .map_err(|e| skip(entry, "TokenIsAppContainer", &e))
        .ok()?;
    if !is_app_container {
        return None;
    }

    let path = derive_path(facility, &token, entry)?;
    debug!(pid = entry.pid, exe = %entry.exe_name, pipe = %path, "found app container pipe");

    Some(AppContainerPipe::new(entry, path))
}

/// 从 AppContainer token 推导会话命名管道路径
///
/// 任何一步失败都只是"没有路径"，不影响整次扫描。
fn derive_path<F: ProcessFacility>(
    facility: &F,
    token: &F::Token,
    entry: &ProcessEntry,
) -> Option<PipePath> {
    let session_id = facility
        .session_id(token)
        .map_err(|e| skip(entry, "TokenSessionId", &e))
        .ok()?;

    let object_path = facility
        .app_container_object_path(token)
        .map_err(|e| skip(entry, "GetAppContainerNamedObjectPath", &e))
        .ok()?;

    let path = PipePath::from_wide(session_id, &object_path);
    if path.is_none() {
        trace!(pid = entry.pid, "object path is not valid UTF-16, skipping");
    }
    path
}

fn skip(entry: &ProcessEntry, call: &str, err: &OsError) {
    trace!(
        pid = entry.pid,
        exe = %entry.exe_name,
        call,
        code = err.code(),
        "skipping process: {}",
        err.message()
    );
}
