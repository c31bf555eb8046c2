//! 系统错误文本
//!
//! 用 `FormatMessageW` 把 `GetLastError()` 的错误码转换为系统默认语言的描述。

use std::ptr;

use windows_sys::Win32::Foundation::GetLastError;
use windows_sys::Win32::System::Diagnostics::Debug::{
    FormatMessageW, FORMAT_MESSAGE_FROM_SYSTEM, FORMAT_MESSAGE_IGNORE_INSERTS,
};

use crate::error::OsError;

/// MAKELANGID(LANG_NEUTRAL, SUBLANG_DEFAULT)
const LANG_USER_DEFAULT: u32 = 0x0400;

/// 消息缓冲区长度（UTF-16 字符数）
const MESSAGE_MAX_CHARS: usize = 512;

/// 读取调用线程的最后一个系统错误
///
/// 必须紧跟在失败的系统调用之后调用，中间不能有其他系统调用。
pub fn last_error() -> OsError {
    let code = unsafe { GetLastError() };
    OsError::new(code, format_message(code))
}

/// 获取错误码对应的系统描述，去掉末尾的换行
pub fn format_message(code: u32) -> String {
    let mut buf = [0u16; MESSAGE_MAX_CHARS];

    let len = unsafe {
        FormatMessageW(
            FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
            ptr::null(),
            code,
            LANG_USER_DEFAULT,
            buf.as_mut_ptr(),
            buf.len() as u32,
            ptr::null(),
        )
    };

    if len == 0 {
        return format!("Unknown error 0x{:08X}", code);
    }

    String::from_utf16_lossy(&buf[..len as usize])
        .trim_end()
        .to_string()
}
