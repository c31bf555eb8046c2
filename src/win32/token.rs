//! # 进程与 token 查询
//!
//! 封装 `OpenProcess`、`OpenProcessToken`、`GetTokenInformation` 和
//! `GetAppContainerNamedObjectPath`，提供 `ProcessFacility` 的 Windows 实现。
//!
//! ## 错误处理
//! 所有函数返回 `OsError`（错误码 + 系统描述），由扫描器决定是否跳过。
//! 句柄都包在 `OwnedHandle` 中，不存在手动 `CloseHandle` 的路径。

use std::ffi::c_void;
use std::mem;
use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};
use std::ptr;

use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::Security::Isolation::GetAppContainerNamedObjectPath;
use windows_sys::Win32::Security::{
    GetTokenInformation, TokenIsAppContainer, TokenSessionId, TOKEN_INFORMATION_CLASS,
    TOKEN_QUERY,
};
use windows_sys::Win32::System::Threading::{
    OpenProcess, OpenProcessToken, PROCESS_QUERY_INFORMATION,
};

use super::message::last_error;
use super::toolhelp::ToolhelpSnapshot;
use crate::error::OsError;
use crate::facility::ProcessFacility;
use crate::pipe::OBJECT_PATH_MAX_CHARS;

// ========================================
// 句柄守卫
// ========================================

/// 以查询权限打开的进程句柄
pub struct ProcessHandle(OwnedHandle);

/// 以 `TOKEN_QUERY` 权限打开的 token 句柄
pub struct TokenHandle(OwnedHandle);

impl TokenHandle {
    fn raw(&self) -> HANDLE {
        self.0.as_raw_handle()
    }

    /// 查询一个 32 位的 token 信息（`TokenIsAppContainer`、`TokenSessionId` 都是 DWORD）
    fn query_u32(&self, class: TOKEN_INFORMATION_CLASS) -> Result<u32, OsError> {
        let mut value: u32 = 0;
        let mut return_length: u32 = 0;

        let ok = unsafe {
            GetTokenInformation(
                self.raw(),
                class,
                &mut value as *mut u32 as *mut c_void,
                mem::size_of::<u32>() as u32,
                &mut return_length,
            )
        };

        if ok == 0 {
            return Err(last_error());
        }
        Ok(value)
    }
}

// ========================================
// Windows 设施
// ========================================

/// 基于 Win32 API 的进程设施
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Facility;

impl ProcessFacility for Win32Facility {
    type Snapshot = ToolhelpSnapshot;
    type Process = ProcessHandle;
    type Token = TokenHandle;

    fn snapshot(&self) -> Result<ToolhelpSnapshot, OsError> {
        ToolhelpSnapshot::new()
    }

    fn open_process(&self, pid: u32) -> Result<ProcessHandle, OsError> {
        // 参数2: FALSE 表示句柄不可继承
        let raw = unsafe { OpenProcess(PROCESS_QUERY_INFORMATION, 0, pid) };
        if raw.is_null() {
            return Err(last_error());
        }
        Ok(ProcessHandle(unsafe { OwnedHandle::from_raw_handle(raw) }))
    }

    fn open_token(&self, process: &ProcessHandle) -> Result<TokenHandle, OsError> {
        let mut raw: HANDLE = ptr::null_mut();
        let ok = unsafe { OpenProcessToken(process.0.as_raw_handle(), TOKEN_QUERY, &mut raw) };
        if ok == 0 || raw.is_null() {
            return Err(last_error());
        }
        Ok(TokenHandle(unsafe { OwnedHandle::from_raw_handle(raw) }))
    }

    fn is_app_container(&self, token: &TokenHandle) -> Result<bool, OsError> {
        token.query_u32(TokenIsAppContainer).map(|flag| flag != 0)
    }

    fn session_id(&self, token: &TokenHandle) -> Result<u32, OsError> {
        token.query_u32(TokenSessionId)
    }

    fn app_container_object_path(&self, token: &TokenHandle) -> Result<Vec<u16>, OsError> {
        let mut buf = vec![0u16; OBJECT_PATH_MAX_CHARS];
        let mut return_length: u32 = 0;

        // 参数2: NULL 表示使用 token 自身的 AppContainer SID
        let ok = unsafe {
            GetAppContainerNamedObjectPath(
                token.raw(),
                ptr::null_mut(),
                buf.len() as u32,
                buf.as_mut_ptr(),
                &mut return_length,
            )
        };

        if ok == 0 {
            return Err(last_error());
        }

        // 缓冲区预先清零，结果总以 NUL 结尾；截断由 PipePath::from_wide 处理
        Ok(buf)
    }
}
