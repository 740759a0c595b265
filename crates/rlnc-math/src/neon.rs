use core::arch::aarch64::*;

use crate::{scalar, Gf256};

/// dest ^= factor * src, 16 bytes per iteration via table lookups.
///
/// # Safety
/// NEON must be available; it is part of the aarch64 baseline.
#[target_feature(enable = "neon")]
pub unsafe fn row_add_scaled_neon(dest: &mut [u8], src: &[u8], factor: u8) {
    let len = dest.len().min(src.len());
    let (low, high) = scalar::nibble_tables(factor);

    let tbl_lo = vld1q_u8(low.as_ptr());
    let tbl_hi = vld1q_u8(high.as_ptr());
    let mask = vdupq_n_u8(0x0F);

    let mut i = 0;
    while i + 16 <= len {
        let s_ptr = src.as_ptr().add(i);
        let d_ptr = dest.as_mut_ptr().add(i);

        let v_src = vld1q_u8(s_ptr);
        let v_dest = vld1q_u8(d_ptr);

        let lo = vandq_u8(v_src, mask);
        let hi = vshrq_n_u8(v_src, 4);

        let product = veorq_u8(vqtbl1q_u8(tbl_lo, lo), vqtbl1q_u8(tbl_hi, hi));
        vst1q_u8(d_ptr, veorq_u8(v_dest, product));
        i += 16;
    }

    if i < len {
        scalar::row_add_scaled(&mut dest[i..len], &src[i..len], Gf256(factor));
    }
}
