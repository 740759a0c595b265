#![no_std]
#![allow(unsafe_code)]
#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod matrix;
pub mod scalar;
pub mod tables;

pub use matrix::CodingMatrix;
pub use tables::TABLES;

#[cfg(target_arch = "x86_64")]
mod avx2;

#[cfg(target_arch = "aarch64")]
mod neon;

use rlnc_core::{CodingError, CodingResult};
use zeroize::Zeroize;

/// An element of GF(2^8) over the binary8 polynomial 0x11D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Zeroize)]
#[repr(transparent)]
pub struct Gf256(pub u8);

impl Gf256 {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);

    #[inline(always)]
    pub fn add(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }

    /// Characteristic 2: subtraction is addition.
    #[inline(always)]
    pub fn sub(self, rhs: Self) -> Self {
        self.add(rhs)
    }

    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        if self.0 == 0 || rhs.0 == 0 {
            return Self::ZERO;
        }
        let idx = (TABLES.log[self.0 as usize] as usize) + (TABLES.log[rhs.0 as usize] as usize);
        Self(TABLES.exp[idx])
    }

    pub fn invert(self) -> CodingResult<Self> {
        if self.0 == 0 {
            return Err(CodingError::DivisionByZero);
        }
        let log_a = TABLES.log[self.0 as usize] as usize;
        Ok(Self(TABLES.exp[255 - log_a]))
    }

    pub fn div(self, rhs: Self) -> CodingResult<Self> {
        Ok(self.mul(rhs.invert()?))
    }

    #[inline(always)]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u8> for Gf256 {
    fn from(v: u8) -> Self {
        Self(v)
    }
}

impl From<Gf256> for u8 {
    fn from(v: Gf256) -> Self {
        v.0
    }
}

impl core::ops::Add for Gf256 { type Output = Self; fn add(self, rhs: Self) -> Self { Gf256::add(self, rhs) } }
impl core::ops::Sub for Gf256 { type Output = Self; fn sub(self, rhs: Self) -> Self { Gf256::sub(self, rhs) } }
impl core::ops::Mul for Gf256 { type Output = Self; fn mul(self, rhs: Self) -> Self { Gf256::mul(self, rhs) } }
impl core::ops::AddAssign for Gf256 { fn add_assign(&mut self, rhs: Self) { *self = *self + rhs; } }
impl core::ops::MulAssign for Gf256 { fn mul_assign(&mut self, rhs: Self) { *self = *self * rhs; } }

/// dest ^= factor * src over the shorter of the two slices.
#[inline]
pub fn row_add_scaled(dest: &mut [u8], src: &[u8], factor: Gf256) {
    if factor.0 == 0 || dest.is_empty() {
        return;
    }
    if factor.0 == 1 {
        scalar::row_add(dest, src);
        return;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if avx2_available() {
            // SAFETY: AVX2 presence checked just above.
            unsafe { avx2::row_add_scaled_avx2(dest, src, factor.0) };
            return;
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: NEON is mandatory on aarch64.
        unsafe { neon::row_add_scaled_neon(dest, src, factor.0) };
        return;
    }

    #[cfg(not(target_arch = "aarch64"))]
    scalar::row_add_scaled(dest, src, factor);
}

/// dest ^= src
#[inline]
pub fn row_add(dest: &mut [u8], src: &[u8]) {
    scalar::row_add(dest, src);
}

/// dest = factor * dest
#[inline]
pub fn row_scale(dest: &mut [u8], factor: Gf256) {
    scalar::row_scale(dest, factor);
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn avx2_available() -> bool {
    #[cfg(feature = "std")]
    {
        std::is_x86_feature_detected!("avx2")
    }
    #[cfg(not(feature = "std"))]
    {
        cfg!(target_feature = "avx2")
    }
}

/// Name of the kernel `row_add_scaled` dispatches to on this machine.
pub fn active_kernel() -> &'static str {
    if cfg!(target_arch = "aarch64") {
        return "neon [16B/iter]";
    }

    #[cfg(target_arch = "x86_64")]
    {
        if avx2_available() {
            return "avx2 [32B/iter]";
        }
    }

    "scalar [1B/iter]"
}
