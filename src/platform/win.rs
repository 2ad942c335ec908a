//! Windows backend using ToolHelp32 snapshots and VirtualQueryEx
//!
//! The "status record" for a process is synthesized in the procfs
//! layout (a labelled `Name:` field) so the locator's matching rules
//! behave identically on both platforms.

use crate::core::types::{
    Address, MemoryRegion, ProcessId, Protection, SigError, SigResult,
};
use crate::platform::ProcessSource;
use std::mem;
use std::path::PathBuf;
use tracing::debug;
use winapi::shared::minwindef::FALSE;
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::memoryapi::{ReadProcessMemory, VirtualQueryEx};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::psapi::GetMappedFileNameW;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};
use winapi::um::winnt::{
    HANDLE, MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE, PAGE_EXECUTE_READ,
    PAGE_EXECUTE_READWRITE, PAGE_EXECUTE_WRITECOPY, PAGE_GUARD, PAGE_NOACCESS, PAGE_READONLY,
    PAGE_READWRITE, PAGE_WRITECOPY, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

/// Owned process handle closed on drop
struct Handle(HANDLE);

impl Handle {
    fn open_for_read(pid: ProcessId) -> SigResult<Self> {
        let raw = unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, FALSE, pid) };
        if raw.is_null() {
            return Err(SigError::permission_denied(
                pid,
                std::io::Error::last_os_error().to_string(),
            ));
        }
        Ok(Handle(raw))
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.0.is_null() && self.0 != INVALID_HANDLE_VALUE {
            unsafe {
                CloseHandle(self.0);
            }
        }
    }
}

fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

fn protection_from_page_flags(protect: u32) -> Protection {
    if protect & PAGE_GUARD != 0 || protect & PAGE_NOACCESS != 0 {
        return Protection::default();
    }
    Protection {
        read: protect
            & (PAGE_READONLY
                | PAGE_READWRITE
                | PAGE_WRITECOPY
                | PAGE_EXECUTE_READ
                | PAGE_EXECUTE_READWRITE
                | PAGE_EXECUTE_WRITECOPY)
            != 0,
        write: protect
            & (PAGE_READWRITE | PAGE_WRITECOPY | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY)
            != 0,
        execute: protect
            & (PAGE_EXECUTE | PAGE_EXECUTE_READ | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY)
            != 0,
        shared: false,
    }
}

/// Process source backed by the Windows ToolHelp32 and psapi APIs.
///
/// The process snapshot is cached: `processes` refreshes it and
/// `status_text` serves from it, so enumerating and then querying
/// every candidate costs one snapshot, not one per pid. A pid absent
/// from the cache triggers a single refresh before failing.
#[derive(Debug, Default)]
pub struct WinSource {
    snapshot: std::cell::RefCell<Vec<(ProcessId, String)>>,
}

impl WinSource {
    pub fn new() -> Self {
        WinSource::default()
    }

    fn refresh_snapshot(&self) -> SigResult<()> {
        *self.snapshot.borrow_mut() = self.snapshot_entries()?;
        Ok(())
    }

    fn cached_status(&self, pid: ProcessId) -> Option<String> {
        self.snapshot
            .borrow()
            .iter()
            .find(|(entry_pid, _)| *entry_pid == pid)
            .map(|(pid, name)| format!("Name:\t{name}\nPid:\t{pid}\n"))
    }

    fn snapshot_entries(&self) -> SigResult<Vec<(ProcessId, String)>> {
        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
            if snapshot == INVALID_HANDLE_VALUE {
                return Err(SigError::Backend(
                    "CreateToolhelp32Snapshot failed".to_string(),
                ));
            }
            let snapshot = Handle(snapshot);

            let mut entries = Vec::new();
            let mut entry: PROCESSENTRY32W = mem::zeroed();
            entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

            if Process32FirstW(snapshot.0, &mut entry) == FALSE {
                return Ok(entries);
            }
            loop {
                entries.push((entry.th32ProcessID, wide_to_string(&entry.szExeFile)));
                if Process32NextW(snapshot.0, &mut entry) == FALSE {
                    break;
                }
            }
            Ok(entries)
        }
    }
}

impl ProcessSource for WinSource {
    fn processes(&self) -> SigResult<Vec<ProcessId>> {
        self.refresh_snapshot()?;
        let mut pids: Vec<ProcessId> = self
            .snapshot
            .borrow()
            .iter()
            .map(|(pid, _)| *pid)
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    fn status_text(&self, pid: ProcessId) -> SigResult<String> {
        if let Some(status) = self.cached_status(pid) {
            return Ok(status);
        }
        self.refresh_snapshot()?;
        self.cached_status(pid)
            .ok_or_else(|| SigError::ProcessNotFound(pid.to_string()))
    }

    fn memory_map(&self, pid: ProcessId) -> SigResult<Vec<MemoryRegion>> {
        let handle = Handle::open_for_read(pid)?;
        let mut regions = Vec::new();
        let mut current: usize = 0;

        loop {
            let mut mbi: MEMORY_BASIC_INFORMATION = unsafe { mem::zeroed() };
            let written = unsafe {
                VirtualQueryEx(
                    handle.0,
                    current as *const _,
                    &mut mbi,
                    mem::size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };
            if written == 0 {
                break;
            }

            let base = mbi.BaseAddress as usize;
            let size = mbi.RegionSize;
            if size == 0 {
                break;
            }

            if mbi.State == MEM_COMMIT {
                let mut name_buf = [0u16; 1024];
                let path = unsafe {
                    let len = GetMappedFileNameW(
                        handle.0,
                        mbi.BaseAddress,
                        name_buf.as_mut_ptr(),
                        name_buf.len() as u32,
                    );
                    if len > 0 {
                        Some(PathBuf::from(wide_to_string(&name_buf)))
                    } else {
                        None
                    }
                };

                match MemoryRegion::new(
                    Address::new(base),
                    size,
                    protection_from_page_flags(mbi.Protect),
                    path,
                ) {
                    Ok(region) => regions.push(region),
                    Err(err) => debug!(error = %err, base, "skipping degenerate region"),
                }
            }

            current = match base.checked_add(size) {
                Some(next) => next,
                None => break,
            };
        }

        Ok(regions)
    }

    fn read_memory(&self, pid: ProcessId, address: Address, buf: &mut [u8]) -> SigResult<usize> {
        let handle = Handle::open_for_read(pid)?;
        let mut read: usize = 0;
        let ok = unsafe {
            ReadProcessMemory(
                handle.0,
                address.as_usize() as *const _,
                buf.as_mut_ptr() as *mut _,
                buf.len(),
                &mut read,
            )
        };
        if ok == FALSE {
            return Err(SigError::read_failed(
                address,
                std::io::Error::last_os_error().to_string(),
            ));
        }
        Ok(read)
    }
}
