//! # Toolhelp32 进程快照
//!
//! 封装 `CreateToolhelp32Snapshot` / `Process32FirstW` / `Process32NextW`。
//! 快照句柄由 `OwnedHandle` 持有，`ToolhelpSnapshot` 被丢弃时自动关闭。

use std::mem;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};

use tracing::debug;
use windows_sys::Win32::Foundation::{ERROR_NO_MORE_FILES, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};

use super::message::last_error;
use crate::error::OsError;
use crate::facility::{ProcessEntry, ProcessSnapshot};

/// 一次系统进程快照
pub struct ToolhelpSnapshot {
    handle: OwnedHandle,
    entry: PROCESSENTRY32W,
}

impl ToolhelpSnapshot {
    /// 获取系统中所有进程的快照
    pub fn new() -> Result<Self, OsError> {
        // 参数2: 0 表示当前进程（对 TH32CS_SNAPPROCESS 无意义，快照总是包含全部进程）
        let raw = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        if raw == INVALID_HANDLE_VALUE {
            return Err(last_error());
        }

        // 使用前必须设置 dwSize
        let mut entry: PROCESSENTRY32W = unsafe { mem::zeroed() };
        entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

        Ok(Self {
            handle: unsafe { OwnedHandle::from_raw_handle(raw) },
            entry,
        })
    }

    fn current(&self) -> ProcessEntry {
        let name = &self.entry.szExeFile;
        let end = name.iter().position(|&c| c == 0).unwrap_or(name.len());

        ProcessEntry {
            pid: self.entry.th32ProcessID,
            parent_pid: self.entry.th32ParentProcessID,
            // 进程名只用于展示，允许有损转换
            exe_name: String::from_utf16_lossy(&name[..end]),
        }
    }
}

impl ProcessSnapshot for ToolhelpSnapshot {
    fn first(&mut self) -> Result<ProcessEntry, OsError> {
        let ok = unsafe { Process32FirstW(self.handle.as_raw_handle(), &mut self.entry) };
        if ok == 0 {
            return Err(last_error());
        }
        Ok(self.current())
    }

    fn next_entry(&mut self) -> Option<ProcessEntry> {
        let ok = unsafe { Process32NextW(self.handle.as_raw_handle(), &mut self.entry) };
        if ok == 0 {
            let err = last_error();
            if err.code() != ERROR_NO_MORE_FILES {
                debug!(code = err.code(), "Process32NextW stopped early: {}", err.message());
            }
            return None;
        }
        Some(self.current())
    }
}
