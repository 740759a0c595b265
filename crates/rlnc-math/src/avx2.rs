use core::arch::x86_64::*;

use crate::{scalar, Gf256};

/// dest ^= factor * src, 32 bytes per iteration via split-nibble shuffles.
///
/// # Safety
/// The caller must have verified AVX2 support on the running CPU.
#[target_feature(enable = "avx2")]
pub unsafe fn row_add_scaled_avx2(dest: &mut [u8], src: &[u8], factor: u8) {
    let len = dest.len().min(src.len());
    let (low, high) = scalar::nibble_tables(factor);

    let tbl_lo = _mm256_broadcastsi128_si256(_mm_loadu_si128(low.as_ptr() as *const __m128i));
    let tbl_hi = _mm256_broadcastsi128_si256(_mm_loadu_si128(high.as_ptr() as *const __m128i));
    let mask = _mm256_set1_epi8(0x0F);

    let mut i = 0;
    while i + 32 <= len {
        let s_ptr = src.as_ptr().add(i) as *const __m256i;
        let d_ptr = dest.as_mut_ptr().add(i) as *mut __m256i;

        let v_src = _mm256_loadu_si256(s_ptr);
        let v_dest = _mm256_loadu_si256(d_ptr);

        let lo = _mm256_and_si256(v_src, mask);
        let hi = _mm256_and_si256(_mm256_srli_epi64(v_src, 4), mask);

        let product = _mm256_xor_si256(
            _mm256_shuffle_epi8(tbl_lo, lo),
            _mm256_shuffle_epi8(tbl_hi, hi),
        );
        _mm256_storeu_si256(d_ptr, _mm256_xor_si256(v_dest, product));
        i += 32;
    }

    if i < len {
        scalar::row_add_scaled(&mut dest[i..len], &src[i..len], Gf256(factor));
    }
}
