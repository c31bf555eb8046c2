//! 测试用的内存进程表
//!
//! 记录每个句柄的打开与关闭，用来断言扫描不泄漏句柄、释放顺序正确。

use std::cell::RefCell;
use std::rc::Rc;

use super::{ProcessEntry, ProcessFacility, ProcessSnapshot};
use crate::error::OsError;

pub const ERROR_ACCESS_DENIED: u32 = 5;
pub const ERROR_NO_MORE_FILES: u32 = 18;
pub const ERROR_INVALID_PARAMETER: u32 = 87;
pub const ERROR_NOT_ENOUGH_MEMORY: u32 = 8;

fn os_error(code: u32) -> OsError {
    let message = match code {
        ERROR_ACCESS_DENIED => "Access is denied.",
        ERROR_NO_MORE_FILES => "There are no more files.",
        ERROR_INVALID_PARAMETER => "The parameter is incorrect.",
        ERROR_NOT_ENOUGH_MEMORY => {
            "Not enough memory resources are available to process this command."
        }
        _ => "Unknown error.",
    };
    OsError::new(code, message)
}

// ========================================
// 句柄事件记录
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    SnapshotOpened,
    SnapshotClosed,
    ProcessOpened(u32),
    ProcessClosed(u32),
    TokenOpened(u32),
    TokenClosed(u32),
}

#[derive(Debug, Default)]
pub struct Ledger {
    pub events: Vec<Event>,
}

impl Ledger {
    fn count(&self, opened: impl Fn(&Event) -> bool, closed: impl Fn(&Event) -> bool) -> isize {
        self.events.iter().fold(0, |acc, e| {
            if opened(e) {
                acc + 1
            } else if closed(e) {
                acc - 1
            } else {
                acc
            }
        })
    }

    /// 仍未关闭的快照、进程、token 句柄数
    pub fn outstanding(&self) -> (isize, isize, isize) {
        (
            self.count(
                |e| *e == Event::SnapshotOpened,
                |e| *e == Event::SnapshotClosed,
            ),
            self.count(
                |e| matches!(e, Event::ProcessOpened(_)),
                |e| matches!(e, Event::ProcessClosed(_)),
            ),
            self.count(
                |e| matches!(e, Event::TokenOpened(_)),
                |e| matches!(e, Event::TokenClosed(_)),
            ),
        )
    }
}

// ========================================
// 假进程
// ========================================

/// 一个假进程及其 token 的行为
#[derive(Debug, Clone)]
pub struct FakeProcess {
    pub pid: u32,
    pub parent_pid: u32,
    pub exe_name: String,
    /// `OpenProcess` 失败时的错误码
    pub open_error: Option<u32>,
    /// `OpenProcessToken` 失败时的错误码
    pub token_error: Option<u32>,
    pub is_app_container: Result<bool, u32>,
    pub session_id: Result<u32, u32>,
    pub object_path: Result<Vec<u16>, u32>,
}

impl FakeProcess {
    /// 可访问的普通进程
    pub fn regular(pid: u32, exe_name: &str) -> Self {
        Self {
            pid,
            parent_pid: 0,
            exe_name: exe_name.to_string(),
            open_error: None,
            token_error: None,
            is_app_container: Ok(false),
            session_id: Ok(1),
            object_path: Err(ERROR_INVALID_PARAMETER),
        }
    }

    /// 运行在 AppContainer 中的进程
    pub fn app_container(pid: u32, exe_name: &str, session_id: u32, object_path: &str) -> Self {
        let mut wide: Vec<u16> = object_path.encode_utf16().collect();
        wide.push(0);
        Self {
            is_app_container: Ok(true),
            session_id: Ok(session_id),
            object_path: Ok(wide),
            ..Self::regular(pid, exe_name)
        }
    }

    /// 无权打开的受保护进程
    pub fn protected(pid: u32, exe_name: &str) -> Self {
        Self {
            open_error: Some(ERROR_ACCESS_DENIED),
            ..Self::regular(pid, exe_name)
        }
    }

    pub fn child_of(mut self, parent_pid: u32) -> Self {
        self.parent_pid = parent_pid;
        self
    }

    pub fn token_denied(mut self) -> Self {
        self.token_error = Some(ERROR_ACCESS_DENIED);
        self
    }

    pub fn flag_query_fails(mut self) -> Self {
        self.is_app_container = Err(ERROR_INVALID_PARAMETER);
        self
    }

    pub fn session_query_fails(mut self) -> Self {
        self.session_id = Err(ERROR_INVALID_PARAMETER);
        self
    }

    pub fn object_path_fails(mut self) -> Self {
        self.object_path = Err(ERROR_NOT_ENOUGH_MEMORY);
        self
    }

    pub fn raw_object_path(mut self, wide: Vec<u16>) -> Self {
        self.object_path = Ok(wide);
        self
    }

    fn entry(&self) -> ProcessEntry {
        ProcessEntry {
            pid: self.pid,
            parent_pid: self.parent_pid,
            exe_name: self.exe_name.clone(),
        }
    }
}

// ========================================
// 假设施
// ========================================

#[derive(Debug, Default)]
pub struct FakeFacility {
    processes: Vec<FakeProcess>,
    snapshot_error: Option<u32>,
    first_error: Option<u32>,
    ledger: Rc<RefCell<Ledger>>,
}

impl FakeFacility {
    pub fn new(processes: Vec<FakeProcess>) -> Self {
        Self {
            processes,
            ..Self::default()
        }
    }

    pub fn fail_snapshot(mut self, code: u32) -> Self {
        self.snapshot_error = Some(code);
        self
    }

    pub fn fail_first(mut self, code: u32) -> Self {
        self.first_error = Some(code);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.ledger.borrow().events.clone()
    }

    pub fn outstanding(&self) -> (isize, isize, isize) {
        self.ledger.borrow().outstanding()
    }

    fn record(&self, event: Event) {
        self.ledger.borrow_mut().events.push(event);
    }
}

pub struct FakeSnapshot {
    entries: Vec<ProcessEntry>,
    cursor: usize,
    first_error: Option<u32>,
    ledger: Rc<RefCell<Ledger>>,
}

impl ProcessSnapshot for FakeSnapshot {
    fn first(&mut self) -> Result<ProcessEntry, OsError> {
        if let Some(code) = self.first_error {
            return Err(os_error(code));
        }
        self.cursor = 0;
        self.entries
            .first()
            .cloned()
            .ok_or_else(|| os_error(ERROR_NO_MORE_FILES))
    }

    fn next_entry(&mut self) -> Option<ProcessEntry> {
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }
}

impl Drop for FakeSnapshot {
    fn drop(&mut self) {
        self.ledger.borrow_mut().events.push(Event::SnapshotClosed);
    }
}

pub struct FakeProcessHandle {
    process: FakeProcess,
    ledger: Rc<RefCell<Ledger>>,
}

impl Drop for FakeProcessHandle {
    fn drop(&mut self) {
        self.ledger
            .borrow_mut()
            .events
            .push(Event::ProcessClosed(self.process.pid));
    }
}

pub struct FakeTokenHandle {
    process: FakeProcess,
    ledger: Rc<RefCell<Ledger>>,
}

impl Drop for FakeTokenHandle {
    fn drop(&mut self) {
        self.ledger
            .borrow_mut()
            .events
            .push(Event::TokenClosed(self.process.pid));
    }
}

impl ProcessFacility for FakeFacility {
    type Snapshot = FakeSnapshot;
    type Process = FakeProcessHandle;
    type Token = FakeTokenHandle;

    fn snapshot(&self) -> Result<FakeSnapshot, OsError> {
        if let Some(code) = self.snapshot_error {
            return Err(os_error(code));
        }
        self.record(Event::SnapshotOpened);
        Ok(FakeSnapshot {
            entries: self.processes.iter().map(FakeProcess::entry).collect(),
            cursor: 0,
            first_error: self.first_error,
            ledger: Rc::clone(&self.ledger),
        })
    }

    fn open_process(&self, pid: u32) -> Result<FakeProcessHandle, OsError> {
        let process = self
            .processes
            .iter()
            .find(|p| p.pid == pid)
            .cloned()
            .ok_or_else(|| os_error(ERROR_INVALID_PARAMETER))?;
        if let Some(code) = process.open_error {
            return Err(os_error(code));
        }
        self.record(Event::ProcessOpened(pid));
        Ok(FakeProcessHandle {
            process,
            ledger: Rc::clone(&self.ledger),
        })
    }

    fn open_token(&self, process: &FakeProcessHandle) -> Result<FakeTokenHandle, OsError> {
        if let Some(code) = process.process.token_error {
            return Err(os_error(code));
        }
        self.record(Event::TokenOpened(process.process.pid));
        Ok(FakeTokenHandle {
            process: process.process.clone(),
            ledger: Rc::clone(&self.ledger),
        })
    }

    fn is_app_container(&self, token: &FakeTokenHandle) -> Result<bool, OsError> {
        token.process.is_app_container.map_err(os_error)
    }

    fn session_id(&self, token: &FakeTokenHandle) -> Result<u32, OsError> {
        token.process.session_id.map_err(os_error)
    }

    fn app_container_object_path(&self, token: &FakeTokenHandle) -> Result<Vec<u16>, OsError> {
        token.process.object_path.clone().map_err(os_error)
    }
}
