//! # 系统设施抽象
//!
//! 扫描器依赖的三类系统能力：
//! - 进程快照（first / next 迭代）
//! - 以查询权限打开进程
//! - 打开进程 token 并查询 AppContainer 相关信息
//!
//! 扫描逻辑只依赖这里的 trait，真实实现在 `win32` 模块，测试使用内存中的假实现。
//!
//! ## 句柄所有权
//! `Snapshot`、`Process`、`Token` 都是拥有句柄的守卫类型，`Drop` 时释放底层句柄。
//! 扫描器因此不需要手动成对调用 open/close。

#[cfg(test)]
pub(crate) mod fake;

use crate::error::OsError;

// ========================================
// 进程条目
// ========================================

/// 快照中的一个进程条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    /// 进程 ID
    pub pid: u32,
    /// 父进程 ID
    pub parent_pid: u32,
    /// 可执行文件名（不含路径）
    pub exe_name: String,
}

// ========================================
// 设施 trait
// ========================================

/// 一次进程快照
///
/// 实现者在 `Drop` 时关闭快照句柄。
pub trait ProcessSnapshot {
    /// 读取第一个进程条目
    fn first(&mut self) -> Result<ProcessEntry, OsError>;

    /// 读取下一个进程条目，快照耗尽时返回 `None`
    fn next_entry(&mut self) -> Option<ProcessEntry>;
}

/// 扫描所需的全部系统调用
pub trait ProcessFacility {
    type Snapshot: ProcessSnapshot;
    /// 进程句柄守卫
    type Process;
    /// token 句柄守卫
    type Token;

    /// 获取系统范围内的进程快照
    fn snapshot(&self) -> Result<Self::Snapshot, OsError>;

    /// 以查询权限打开进程
    fn open_process(&self, pid: u32) -> Result<Self::Process, OsError>;

    /// 以 `TOKEN_QUERY` 权限打开进程 token
    fn open_token(&self, process: &Self::Process) -> Result<Self::Token, OsError>;

    /// token 是否属于 AppContainer
    fn is_app_container(&self, token: &Self::Token) -> Result<bool, OsError>;

    /// token 所在的会话 ID
    fn session_id(&self, token: &Self::Token) -> Result<u32, OsError>;

    /// AppContainer 私有命名空间的对象路径（UTF-16，可能以 NUL 结尾）
    fn app_container_object_path(&self, token: &Self::Token) -> Result<Vec<u16>, OsError>;
}
