// Thu Aug 27 2026 - Alex

//! Byte-search and wide-compare primitives behind a portable interface.
//! The accelerated path is selected once at first use from runtime CPU
//! detection and produces bit-identical results to the scalar fallback.

#[cfg(target_arch = "x86_64")]
use once_cell::sync::Lazy;

#[cfg(target_arch = "x86_64")]
static HAS_AVX2: Lazy<bool> = Lazy::new(|| is_x86_feature_detected!("avx2"));

/// Index of the first occurrence of `needle` in `haystack`.
pub fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    #[cfg(target_arch = "x86_64")]
    if *HAS_AVX2 {
        return unsafe { find_byte_avx2(haystack, needle) };
    }
    find_byte_scalar(haystack, needle)
}

/// Whether two equal-length slices hold the same bytes.
pub fn compare_eq(a: &[u8], b: &[u8]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    #[cfg(target_arch = "x86_64")]
    if *HAS_AVX2 {
        return unsafe { compare_eq_avx2(a, b) };
    }
    compare_eq_scalar(a, b)
}

fn find_byte_scalar(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

fn compare_eq_scalar(a: &[u8], b: &[u8]) -> bool {
    a == b
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn find_byte_avx2(haystack: &[u8], needle: u8) -> Option<usize> {
    use std::arch::x86_64::*;

    let key = _mm256_set1_epi8(needle as i8);
    let mut i = 0;

    while i + 32 <= haystack.len() {
        let block = _mm256_loadu_si256(haystack.as_ptr().add(i) as *const __m256i);
        let mask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(block, key)) as u32;
        if mask != 0 {
            return Some(i + mask.trailing_zeros() as usize);
        }
        i += 32;
    }

    haystack[i..].iter().position(|&b| b == needle).map(|p| i + p)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn compare_eq_avx2(a: &[u8], b: &[u8]) -> bool {
    use std::arch::x86_64::*;

    let mut i = 0;

    while i + 32 <= a.len() {
        let lhs = _mm256_loadu_si256(a.as_ptr().add(i) as *const __m256i);
        let rhs = _mm256_loadu_si256(b.as_ptr().add(i) as *const __m256i);
        let mask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(lhs, rhs)) as u32;
        if mask != u32::MAX {
            return false;
        }
        i += 32;
    }

    a[i..] == b[i..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn test_find_byte_matches_scalar() {
        let data = sample(1000);
        for needle in [0u8, 1, 93, 250, 255] {
            assert_eq!(find_byte(&data, needle), find_byte_scalar(&data, needle));
        }
    }

    #[test]
    fn test_find_byte_positions() {
        let mut data = vec![0u8; 100];
        data[77] = 0xAB;
        assert_eq!(find_byte(&data, 0xAB), Some(77));
        assert_eq!(find_byte(&data, 0xCD), None);
        assert_eq!(find_byte(&[], 0), None);

        // Match inside the scalar tail after the 32-byte blocks.
        let mut long = vec![0u8; 70];
        long[69] = 1;
        assert_eq!(find_byte(&long, 1), Some(69));
    }

    #[test]
    fn test_compare_eq_widths() {
        for len in [0, 1, 15, 16, 31, 32, 33, 63, 64, 65, 200] {
            let a = sample(len);
            let mut b = a.clone();
            assert!(compare_eq(&a, &b), "len {}", len);
            assert_eq!(compare_eq(&a, &b), compare_eq_scalar(&a, &b));

            if len > 0 {
                b[len - 1] ^= 0xFF;
                assert!(!compare_eq(&a, &b), "len {}", len);
                b[len - 1] ^= 0xFF;
                b[0] ^= 0x01;
                assert!(!compare_eq(&a, &b), "len {}", len);
            }
        }
    }
}
