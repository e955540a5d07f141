// Thu Aug 27 2026 - Alex

use crate::scan::error::ScanError;
use crate::scan::simd;
use std::fmt;

/// An immutable byte pattern with its precomputed Horspool skip table.
///
/// The table maps every byte value to a skip distance: the default is the
/// pattern length, and each pattern byte except the last gets the distance
/// from its last occurrence to the end. The last byte is deliberately left
/// at the default so a repeated final byte still skips correctly.
#[derive(Clone)]
pub struct Pattern {
    bytes: Vec<u8>,
    skip: [usize; 256],
}

impl Pattern {
    pub fn new(bytes: &[u8]) -> Result<Self, ScanError> {
        if bytes.is_empty() {
            return Err(ScanError::EmptyPattern);
        }
        Ok(Self {
            bytes: bytes.to_vec(),
            skip: build_skip_table(bytes),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn skip_table(&self) -> &[usize; 256] {
        &self.skip
    }

    /// All start offsets where the pattern matches `haystack`, ascending,
    /// including overlapping matches. A haystack shorter than the pattern
    /// yields no matches.
    ///
    /// The scan inspects the haystack byte aligned with the pattern's last
    /// position: a byte-search locates the next candidate ending in the
    /// pattern's last byte, the full window is then compared, and on a
    /// mismatch the candidate advances by the skip entry for that last-
    /// position byte. A full match advances by one so overlaps are kept.
    pub fn search_all(&self, haystack: &[u8]) -> Vec<usize> {
        let mut matches = Vec::new();
        let len = self.bytes.len();
        if len == 0 || haystack.len() < len {
            return matches;
        }

        let last = self.bytes[len - 1];
        let mut pos = 0;

        while pos + len <= haystack.len() {
            let search_start = pos + len - 1;

            let rel = match simd::find_byte(&haystack[search_start..], last) {
                Some(r) => r,
                None => return matches,
            };

            let candidate_end = search_start + rel;
            let candidate = candidate_end - (len - 1);

            if simd::compare_eq(&haystack[candidate..candidate + len], &self.bytes) {
                matches.push(candidate);
                pos = candidate + 1;
            } else {
                pos = candidate + self.skip[haystack[candidate_end] as usize];
            }
        }

        matches
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern").field("bytes", &self.bytes).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: Vec<String> = self.bytes.iter().map(|b| format!("{:02X}", b)).collect();
        write!(f, "{}", hex.join(" "))
    }
}

fn build_skip_table(bytes: &[u8]) -> [usize; 256] {
    let len = bytes.len();
    let mut skip = [len; 256];
    for (i, &b) in bytes[..len - 1].iter().enumerate() {
        skip[b as usize] = len - 1 - i;
    }
    skip
}
