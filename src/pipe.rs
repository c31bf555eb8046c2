//! # 管道路径构造
//!
//! AppContainer 进程的会话命名管道位于：
//!
//! ```text
//! \\.\pipe\Sessions\<session-id>\<named-object-path>
//! ```
//!
//! 其中 `<named-object-path>` 由 `GetAppContainerNamedObjectPath` 返回（UTF-16）。
//! 这个模块是纯函数，不涉及任何系统调用，编码转换只发生在这里。

use std::fmt;

use serde::Serialize;

use crate::facility::ProcessEntry;

// ========================================
// 常量定义
// ========================================

/// 会话命名管道的固定前缀
pub const SESSION_PIPE_PREFIX: &str = r"\\.\pipe\Sessions\";

/// 查询 AppContainer 对象路径时使用的缓冲区长度（UTF-16 字符数）
pub const OBJECT_PATH_MAX_CHARS: usize = 1024;

// ========================================
// 路径结构
// ========================================

/// 一个已拆分的会话管道路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipePath {
    /// 会话 ID
    pub session_id: u32,
    /// AppContainer 私有命名空间中的对象路径
    pub object_path: String,
}

impl PipePath {
    /// 从 token 查询到的原始数据构造路径
    ///
    /// `object_path` 在第一个 NUL 处截断；不是合法 UTF-16 时返回 `None`，
    /// 宁可跳过也不产生损坏的路径。
    pub fn from_wide(session_id: u32, object_path: &[u16]) -> Option<Self> {
        Some(Self {
            session_id,
            object_path: wide_to_string(object_path)?,
        })
    }

    /// 把完整路径拆回会话 ID 和对象路径
    ///
    /// 会话 ID 必须是十进制且没有前导零（`0` 本身除外）。
    pub fn parse(path: &str) -> Option<Self> {
        let rest = path.strip_prefix(SESSION_PIPE_PREFIX)?;
        let (session, object_path) = rest.split_once('\\')?;

        if session.is_empty() || !session.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if session.len() > 1 && session.starts_with('0') {
            return None;
        }

        Some(Self {
            session_id: session.parse().ok()?,
            object_path: object_path.to_string(),
        })
    }
}

impl fmt::Display for PipePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}\\{}",
            SESSION_PIPE_PREFIX, self.session_id, self.object_path
        )
    }
}

/// 把以 NUL 结尾（或不含 NUL）的 UTF-16 缓冲区转换为 String
///
/// 使用严格转换：孤立代理项会导致失败而不是被替换成 U+FFFD。
pub fn wide_to_string(buf: &[u16]) -> Option<String> {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16(&buf[..end]).ok()
}

// ========================================
// 扫描结果
// ========================================

/// 单个 AppContainer 进程的扫描结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppContainerPipe {
    /// 进程 ID
    pub pid: u32,
    /// 父进程 ID（快照时刻的值，父进程可能已退出）
    pub parent_pid: u32,
    /// 可执行文件名
    pub exe_name: String,
    /// 会话 ID
    pub session_id: u32,
    /// AppContainer 对象路径
    pub object_path: String,
    /// 完整的命名管道路径
    pub pipe_path: String,
}

impl AppContainerPipe {
    pub fn new(entry: &ProcessEntry, path: PipePath) -> Self {
        let pipe_path = path.to_string();
        Self {
            pid: entry.pid,
            parent_pid: entry.parent_pid,
            exe_name: entry.exe_name.clone(),
            session_id: path.session_id,
            object_path: path.object_path,
            pipe_path,
        }
    }
}
