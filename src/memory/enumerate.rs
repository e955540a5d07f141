// Thu Aug 27 2026 - Alex

use crate::memory::{MemoryError, MemoryRegion, Protection, RegionKind, RegionState};
use libc::pid_t;
use log::{debug, warn};
use std::fs;

/// Walks the virtual address space of a process and reports it as an
/// address-ascending, non-overlapping, contiguous sequence of regions. Gaps
/// between mappings come back as free regions so that each region's end is
/// the next region's start.
pub struct RegionEnumerator {
    pid: pid_t,
}

impl RegionEnumerator {
    pub fn new(pid: pid_t) -> Self {
        Self { pid }
    }

    pub fn current_process() -> Self {
        Self::new(std::process::id() as pid_t)
    }

    pub fn pid(&self) -> pid_t {
        self.pid
    }

    /// Enumerate all regions. A query failure mid-walk truncates the result
    /// rather than failing the call; a live target losing a mapping between
    /// two lines is normal, not an error.
    pub fn enumerate(&self) -> Vec<MemoryRegion> {
        let path = format!("/proc/{}/maps", self.pid);
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("failed to read {}: {}", path, e);
                return Vec::new();
            }
        };

        let mut regions = Vec::new();
        let mut cursor: u64 = 0;

        for line in contents.lines() {
            let mapping = match parse_maps_line(line) {
                Ok(m) => m,
                Err(e) => {
                    // Truncated or malformed entry ends the walk with what
                    // we have so far.
                    warn!("stopping enumeration: {}", e);
                    break;
                }
            };

            if mapping.base() < cursor {
                warn!("stopping enumeration at out-of-order mapping {}", mapping);
                break;
            }

            if mapping.base() > cursor {
                regions.push(MemoryRegion::new(
                    cursor,
                    mapping.base() - cursor,
                    Protection::empty(),
                    RegionState::Free,
                    RegionKind::Private,
                ));
            }

            cursor = mapping.end();
            regions.push(mapping);
        }

        debug!("enumerated {} regions for pid {}", regions.len(), self.pid);
        regions
    }
}

fn parse_maps_line(line: &str) -> Result<MemoryRegion, MemoryError> {
    let invalid = || MemoryError::InvalidMapsEntry(line.to_string());
    let mut fields = line.split_whitespace();

    let range = fields.next().ok_or_else(invalid)?;
    let perms = fields.next().ok_or_else(invalid)?;
    let _offset = fields.next().ok_or_else(invalid)?;
    let _dev = fields.next().ok_or_else(invalid)?;
    let inode: u64 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(invalid)?;
    let pathname = fields.next().unwrap_or("");

    let (start_str, end_str) = range.split_once('-').ok_or_else(invalid)?;
    let start = u64::from_str_radix(start_str, 16).map_err(|_| invalid())?;
    let end = u64::from_str_radix(end_str, 16).map_err(|_| invalid())?;
    if end <= start {
        return Err(invalid());
    }

    let mut protection = Protection::empty();
    let perms = perms.as_bytes();
    if perms.first() == Some(&b'r') {
        protection |= Protection::READ;
    }
    if perms.get(1) == Some(&b'w') {
        protection |= Protection::WRITE;
    }
    if perms.get(2) == Some(&b'x') {
        protection |= Protection::EXECUTE;
    }

    let kind = if inode != 0 && pathname.starts_with('/') {
        if protection.is_executable() {
            RegionKind::Image
        } else {
            RegionKind::Mapped
        }
    } else {
        RegionKind::Private
    };

    Ok(MemoryRegion::new(
        start,
        end - start,
        protection,
        RegionState::Committed,
        kind,
    ))
}
