//! # appcontainer-pipes
//!
//! 枚举本机所有进程，找出运行在 AppContainer 中的进程，并推导出每个进程
//! 所在会话的命名管道路径：
//!
//! ```text
//! \\.\pipe\Sessions\<session-id>\<app-container-named-object-path>
//! ```
//!
//! 典型用途是定位沙箱组件（如 WebView2 渲染进程）暴露的调试管道，供外部工具连接。
//!
//! ## 使用
//! ```no_run
//! # #[cfg(windows)]
//! # fn main() -> Result<(), appcontainer_pipes::ScanError> {
//! for path in appcontainer_pipes::scan()? {
//!     println!("{}", path);
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(windows))]
//! # fn main() {}
//! ```
//!
//! 扫描逻辑对系统调用的依赖都通过 [`ProcessFacility`] 注入，
//! 真实实现是 `win32::Win32Facility`（仅 Windows）。

pub mod error;
pub mod facility;
pub mod pipe;
pub mod scan;

#[cfg(windows)]
pub mod win32;

pub use error::{OsError, ScanError};
pub use facility::{ProcessEntry, ProcessFacility, ProcessSnapshot};
pub use pipe::{AppContainerPipe, PipePath, SESSION_PIPE_PREFIX};
pub use scan::{scan_paths_with, scan_with};

/// 扫描所有 AppContainer 进程，返回其会话命名管道路径
///
/// 结果按进程枚举顺序排列，可能为空，可能包含重复路径。
/// 只有获取快照失败或读不到第一个进程时才返回错误。
#[cfg(windows)]
pub fn scan() -> Result<Vec<String>, ScanError> {
    scan::scan_paths_with(&win32::Win32Facility)
}

/// 同 [`scan`]，但返回每个进程的详细信息
#[cfg(windows)]
pub fn scan_detailed() -> Result<Vec<AppContainerPipe>, ScanError> {
    scan::scan_with(&win32::Win32Facility)
}
