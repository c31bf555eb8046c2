//! # 错误类型
//!
//! 扫描只有两种致命错误会交给调用方：
//! - `SnapshotUnavailable`: 无法获取进程快照
//! - `EnumerationFailed`: 快照中连第一个进程都读不到
//!
//! 其他失败（打不开进程、打不开 token、查询失败）都在扫描循环内部被吞掉，
//! 只表现为"这个进程没有结果"。

use std::fmt;

use thiserror::Error;

// ========================================
// 系统错误
// ========================================

/// 操作系统返回的错误码及其系统描述文本
///
/// 描述文本原样保留，不做二次包装。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsError {
    code: u32,
    message: String,
}

impl OsError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 系统错误码（Windows 上即 `GetLastError()` 的值）
    pub fn code(&self) -> u32 {
        self.code
    }

    /// 系统默认语言下的错误描述
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (os error {})", self.message, self.code)
    }
}

impl std::error::Error for OsError {}

// ========================================
// 扫描错误
// ========================================

/// 会中止整次扫描的错误
#[derive(Debug, Error)]
pub enum ScanError {
    /// 创建进程快照失败
    #[error("CreateToolhelp32Snapshot: {0}")]
    SnapshotUnavailable(#[source] OsError),

    /// 读取快照中的第一个进程失败
    #[error("Process32First: {0}")]
    EnumerationFailed(#[source] OsError),
}

impl ScanError {
    /// 取出底层的系统错误
    pub fn os_error(&self) -> &OsError {
        match self {
            ScanError::SnapshotUnavailable(e) | ScanError::EnumerationFailed(e) => e,
        }
    }
}
