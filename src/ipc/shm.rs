// Thu Aug 27 2026 - Alex

use crate::ipc::ChannelError;
use log::debug;
use memmap2::MmapRaw;
use std::ffi::CString;
use std::fs::File;
use std::os::fd::FromRawFd;

/// A named POSIX shared-memory segment mapped into this process.
///
/// The creating side allocates and owns the backing storage and unlinks it
/// on drop; an attaching side maps existing storage by name and on drop only
/// unmaps. Any stale segment under the same name is removed before creation.
pub struct SharedSegment {
    name: CString,
    map: MmapRaw,
    creator: bool,
    // Keeps the shm fd alive for the lifetime of the mapping.
    _file: File,
}

impl SharedSegment {
    pub fn create(name: &str, size: usize) -> Result<Self, ChannelError> {
        let c_name = segment_name(name)?;

        unsafe {
            libc::shm_unlink(c_name.as_ptr());
        }

        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                0o600,
            )
        };
        if fd < 0 {
            return Err(ChannelError::CreateFailed(
                name.to_string(),
                std::io::Error::last_os_error(),
            ));
        }

        let file = unsafe { File::from_raw_fd(fd) };
        file.set_len(size as u64).map_err(ChannelError::ResizeFailed)?;

        let map = MmapRaw::map_raw(&file).map_err(ChannelError::MapFailed)?;
        debug!("created shared segment {} ({} bytes)", name, size);

        Ok(Self {
            name: c_name,
            map,
            creator: true,
            _file: file,
        })
    }

    pub fn open(name: &str) -> Result<Self, ChannelError> {
        let c_name = segment_name(name)?;

        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, 0) };
        if fd < 0 {
            return Err(ChannelError::OpenFailed(
                name.to_string(),
                std::io::Error::last_os_error(),
            ));
        }

        let file = unsafe { File::from_raw_fd(fd) };
        let map = MmapRaw::map_raw(&file).map_err(ChannelError::MapFailed)?;
        debug!("attached shared segment {} ({} bytes)", name, map.len());

        Ok(Self {
            name: c_name,
            map,
            creator: false,
            _file: file,
        })
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.map.as_mut_ptr()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.len() == 0
    }

    pub fn is_creator(&self) -> bool {
        self.creator
    }
}

impl Drop for SharedSegment {
    fn drop(&mut self) {
        if self.creator {
            unsafe {
                libc::shm_unlink(self.name.as_ptr());
            }
        }
    }
}

fn segment_name(name: &str) -> Result<CString, ChannelError> {
    if name.is_empty() {
        return Err(ChannelError::InvalidName(name.to_string()));
    }
    let normalized = if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{}", name)
    };
    CString::new(normalized).map_err(|_| ChannelError::InvalidName(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::tests::unique_name;

    #[test]
    fn test_create_and_open() {
        let name = unique_name("segment");
        let owner = SharedSegment::create(&name, 4096).unwrap();
        assert!(owner.is_creator());
        assert_eq!(owner.len(), 4096);

        unsafe { owner.as_ptr().write(0xAA) };

        let attached = SharedSegment::open(&name).unwrap();
        assert!(!attached.is_creator());
        assert_eq!(attached.len(), 4096);
        assert_eq!(unsafe { attached.as_ptr().read() }, 0xAA);
    }

    #[test]
    fn test_creator_drop_unlinks() {
        let name = unique_name("unlink");
        {
            let _owner = SharedSegment::create(&name, 4096).unwrap();
        }
        assert!(SharedSegment::open(&name).is_err());
    }

    #[test]
    fn test_attacher_drop_leaves_segment() {
        let name = unique_name("leave");
        let _owner = SharedSegment::create(&name, 4096).unwrap();
        {
            let _attached = SharedSegment::open(&name).unwrap();
        }
        assert!(SharedSegment::open(&name).is_ok());
    }

    #[test]
    fn test_open_missing_fails() {
        assert!(SharedSegment::open(&unique_name("missing")).is_err());
    }
}
