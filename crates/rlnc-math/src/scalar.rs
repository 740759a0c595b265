use crate::tables::TABLES;
use crate::Gf256;

/// dest ^= src
#[inline]
pub fn row_add(dest: &mut [u8], src: &[u8]) {
    for (d, s) in dest.iter_mut().zip(src) {
        *d ^= *s;
    }
}

/// dest ^= factor * src, one table lookup per byte.
#[inline]
pub fn row_add_scaled(dest: &mut [u8], src: &[u8], factor: Gf256) {
    if factor.0 == 0 {
        return;
    }
    let log_f = TABLES.log[factor.0 as usize] as usize;
    for (d, &s) in dest.iter_mut().zip(src) {
        if s != 0 {
            *d ^= TABLES.exp[TABLES.log[s as usize] as usize + log_f];
        }
    }
}

/// dest = factor * dest
#[inline]
pub fn row_scale(dest: &mut [u8], factor: Gf256) {
    match factor.0 {
        0 => dest.fill(0),
        1 => {}
        f => {
            let log_f = TABLES.log[f as usize] as usize;
            for d in dest.iter_mut().filter(|d| **d != 0) {
                *d = TABLES.exp[TABLES.log[*d as usize] as usize + log_f];
            }
        }
    }
}

/// Shift-and-add multiply modulo 0x11D. Needs no tables, so the SIMD
/// kernels use it for their nibble lookups and tests use it as a reference.
pub const fn mul_reference(a: u8, b: u8) -> u8 {
    let mut p = 0u8;
    let mut a = a;
    let mut b = b;
    let mut i = 0;
    while i < 8 {
        if (b & 1) != 0 {
            p ^= a;
        }
        let carry = (a & 0x80) != 0;
        a <<= 1;
        if carry {
            a ^= 0x1D;
        }
        b >>= 1;
        i += 1;
    }
    p
}

/// Products of `factor` with every low nibble and every high nibble.
/// a * f = lo(a) * f ^ hi(a) * f, since multiplication is GF(2)-linear.
pub fn nibble_tables(factor: u8) -> ([u8; 16], [u8; 16]) {
    let mut low = [0u8; 16];
    let mut high = [0u8; 16];
    for j in 0..16u8 {
        low[j as usize] = mul_reference(j, factor);
        high[j as usize] = mul_reference(j << 4, factor);
    }
    (low, high)
}
