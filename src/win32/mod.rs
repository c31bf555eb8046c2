//! # Windows 模块
//!
//! 这个模块包含所有 Windows 特定的实现：Toolhelp32 进程快照、进程 token 查询
//! 以及系统错误文本格式化。只在 Windows 上编译。

mod message;
mod token;
mod toolhelp;

pub use message::{format_message, last_error};
pub use token::{ProcessHandle, TokenHandle, Win32Facility};
pub use toolhelp::ToolhelpSnapshot;
