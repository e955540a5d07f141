// Thu Aug 27 2026 - Alex

use crate::memory::{MemoryReader, MemoryRegion, RegionEnumerator};
use crate::scan::{Occurrence, Pattern};
use log::{debug, trace};
use rayon::prelude::*;
use std::sync::Arc;

/// Fans a pattern search out over memory regions in parallel and merges the
/// per-region results. Tasks share nothing mutable; each one reads its
/// region and searches independently, so match order across regions is
/// whatever the join produces while offsets within a region stay ascending.
pub struct ScanOrchestrator {
    reader: Arc<dyn MemoryReader>,
    exclusions: Vec<u64>,
}

impl ScanOrchestrator {
    pub fn new(reader: Arc<dyn MemoryReader>) -> Self {
        Self {
            reader,
            exclusions: Vec::new(),
        }
    }

    /// Addresses whose containing regions are dropped from results. Used to
    /// keep the scanner from reporting matches inside its own IPC segments.
    pub fn with_exclusions(mut self, addresses: Vec<u64>) -> Self {
        self.exclusions = addresses;
        self
    }

    /// Scan the given regions. Regions out of scope or containing an
    /// excluded address are skipped; a region whose read fails (protection
    /// changed, mapping gone) contributes zero occurrences.
    pub fn find_pattern(&self, pattern: &Pattern, regions: &[MemoryRegion]) -> Vec<Occurrence> {
        let eligible: Vec<&MemoryRegion> = regions
            .iter()
            .filter(|r| r.is_in_scope())
            .filter(|r| !self.exclusions.iter().any(|&addr| r.contains(addr)))
            .collect();

        debug!(
            "scanning {} of {} regions for a {}-byte pattern",
            eligible.len(),
            regions.len(),
            pattern.len()
        );

        eligible
            .par_iter()
            .flat_map_iter(|region| self.scan_region(pattern, region))
            .collect()
    }

    /// Enumerate the process once and scan every in-scope region.
    pub fn scan_process(&self, pattern: &Pattern, enumerator: &RegionEnumerator) -> Vec<Occurrence> {
        let regions = enumerator.enumerate();
        self.find_pattern(pattern, &regions)
    }

    fn scan_region(&self, pattern: &Pattern, region: &MemoryRegion) -> Vec<Occurrence> {
        let data = match self.reader.read_bytes(region.base(), region.size() as usize) {
            Ok(data) => data,
            Err(e) => {
                trace!("region {} dropped from scan: {}", region, e);
                return Vec::new();
            }
        };

        pattern
            .search_all(&data)
            .into_iter()
            .map(|offset| Occurrence {
                base_address: region.base(),
                offset: offset as u64,
                region_size: region.size(),
                data_size: pattern.len() as u64,
                kind: region.kind(),
            })
            .collect()
    }
}
