// Thu Aug 27 2026 - Alex

use crate::memory::{MemoryError, MemoryReader};
use libc::{c_void, iovec, pid_t, process_vm_readv};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

/// Raw byte access to another process's (or our own) address space.
///
/// Reads go through `process_vm_readv` and fall back to `/proc/<pid>/mem`
/// where the syscall is unavailable or denied. A failed read is an error the
/// caller is expected to treat as "zero bytes from this range", never a
/// crash; the target is live and its mappings shift under us.
pub struct ProcessMemory {
    pid: pid_t,
}

impl ProcessMemory {
    pub fn attach(pid: pid_t) -> Result<Self, MemoryError> {
        if !std::path::Path::new(&format!("/proc/{}", pid)).exists() {
            return Err(MemoryError::ProcessNotFound(pid));
        }
        Ok(Self { pid })
    }

    pub fn current_process() -> Self {
        Self {
            pid: std::process::id() as pid_t,
        }
    }

    pub fn pid(&self) -> pid_t {
        self.pid
    }

    fn read_via_procfs(&self, addr: u64, buffer: &mut [u8]) -> Result<(), MemoryError> {
        let mut mem = File::open(format!("/proc/{}/mem", self.pid))?;
        mem.seek(SeekFrom::Start(addr))?;
        mem.read_exact(buffer)
            .map_err(|_| MemoryError::ReadFailed(addr))
    }
}

impl MemoryReader for ProcessMemory {
    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut buffer = vec![0u8; len];
        if len == 0 {
            return Ok(buffer);
        }

        let local = iovec {
            iov_base: buffer.as_mut_ptr() as *mut c_void,
            iov_len: len,
        };
        let remote = iovec {
            iov_base: addr as *mut c_void,
            iov_len: len,
        };

        let read = unsafe { process_vm_readv(self.pid, &local, 1, &remote, 1, 0) };
        if read == len as isize {
            return Ok(buffer);
        }

        if read < 0 {
            match std::io::Error::last_os_error().raw_os_error() {
                Some(libc::ENOSYS) | Some(libc::EPERM) => {
                    self.read_via_procfs(addr, &mut buffer)?;
                    return Ok(buffer);
                }
                _ => return Err(MemoryError::ReadFailed(addr)),
            }
        }

        Err(MemoryError::ShortRead(addr, read as usize, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_own_memory() {
        let marker: [u8; 16] = *b"memprobe-marker!";
        let reader = ProcessMemory::current_process();

        let bytes = reader
            .read_bytes(marker.as_ptr() as u64, marker.len())
            .unwrap();
        assert_eq!(bytes, marker);
    }

    #[test]
    fn test_read_zero_bytes() {
        let reader = ProcessMemory::current_process();
        let bytes = reader.read_bytes(0x10, 0).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_read_unmapped_address_fails() {
        let reader = ProcessMemory::current_process();
        assert!(reader.read_bytes(0x10, 64).is_err());
    }

    #[test]
    fn test_attach_missing_process() {
        assert!(matches!(
            ProcessMemory::attach(-1),
            Err(MemoryError::ProcessNotFound(_))
        ));
    }
}
