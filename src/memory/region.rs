// Thu Aug 27 2026 - Alex

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Protection: u32 {
        const READ = 1;
        const WRITE = 2;
        const EXECUTE = 4;
        const GUARD = 8;
    }
}

impl Protection {
    pub fn is_readable(self) -> bool {
        self.contains(Self::READ)
    }

    pub fn is_writable(self) -> bool {
        self.contains(Self::WRITE)
    }

    pub fn is_executable(self) -> bool {
        self.contains(Self::EXECUTE)
    }

    pub fn is_guarded(self) -> bool {
        self.contains(Self::GUARD)
    }

    pub fn is_no_access(self) -> bool {
        !self.intersects(Self::READ | Self::WRITE | Self::EXECUTE)
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.is_readable() { 'r' } else { '-' },
            if self.is_writable() { 'w' } else { '-' },
            if self.is_executable() { 'x' } else { '-' },
            if self.is_guarded() { 'g' } else { '-' },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionState {
    Free,
    Committed,
}

impl fmt::Display for RegionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Committed => write!(f, "committed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    Private,
    Mapped,
    Image,
}

impl RegionKind {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Private => 0,
            Self::Mapped => 1,
            Self::Image => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Private),
            1 => Some(Self::Mapped),
            2 => Some(Self::Image),
            _ => None,
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Mapped => write!(f, "mapped"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// One contiguous range of a process's address space with uniform
/// protection/state/kind, as reported by the OS at enumeration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    base: u64,
    size: u64,
    protection: Protection,
    state: RegionState,
    kind: RegionKind,
}

impl MemoryRegion {
    pub fn new(base: u64, size: u64, protection: Protection, state: RegionState, kind: RegionKind) -> Self {
        Self {
            base,
            size,
            protection,
            state,
            kind,
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn end(&self) -> u64 {
        self.base + self.size
    }

    pub fn protection(&self) -> Protection {
        self.protection
    }

    pub fn state(&self) -> RegionState {
        self.state
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.end()
    }

    /// Whether the region should be scanned: committed, accessible, not a
    /// guard page.
    pub fn is_in_scope(&self) -> bool {
        self.state == RegionState::Committed
            && !self.protection.is_no_access()
            && !self.protection.is_guarded()
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:016x}-0x{:016x} {} {} {}",
            self.base,
            self.end(),
            self.protection,
            self.state,
            self.kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protection_flags() {
        let rw = Protection::READ | Protection::WRITE;
        assert!(rw.is_readable());
        assert!(rw.is_writable());
        assert!(!rw.is_executable());
        assert!(!rw.is_no_access());
        assert!(Protection::empty().is_no_access());
        assert_eq!(rw.to_string(), "rw--");
    }

    #[test]
    fn test_region_scope() {
        let committed = MemoryRegion::new(
            0x1000,
            0x1000,
            Protection::READ,
            RegionState::Committed,
            RegionKind::Private,
        );
        assert!(committed.is_in_scope());
        assert!(committed.contains(0x1fff));
        assert!(!committed.contains(0x2000));

        let guarded = MemoryRegion::new(
            0x2000,
            0x1000,
            Protection::READ | Protection::GUARD,
            RegionState::Committed,
            RegionKind::Private,
        );
        assert!(!guarded.is_in_scope());

        let free = MemoryRegion::new(
            0x3000,
            0x1000,
            Protection::empty(),
            RegionState::Free,
            RegionKind::Private,
        );
        assert!(!free.is_in_scope());
    }

    #[test]
    fn test_region_kind_round_trip() {
        for kind in [RegionKind::Private, RegionKind::Mapped, RegionKind::Image] {
            assert_eq!(RegionKind::from_u8(kind.to_u8()), Some(kind));
        }
        assert_eq!(RegionKind::from_u8(7), None);
    }
}
