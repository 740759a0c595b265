use alloc::vec::Vec;

use rlnc_core::{CodingError, CodingResult};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{row_add_scaled, scalar, Gf256};

/// Dense row-major matrix of GF(2^8) coefficients.
///
/// Rows are plain byte slices so they can be fed straight to the row kernels.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CodingMatrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl CodingMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: alloc::vec![0u8; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::new(n, n);
        for i in 0..n {
            m.set(i, i, Gf256::ONE);
        }
        m
    }

    /// Builds a matrix from `rows` equally long coefficient rows.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R], cols: usize) -> CodingResult<Self> {
        let mut m = Self::new(rows.len(), cols);
        for (r, row) in rows.iter().enumerate() {
            m.set_row(r, row.as_ref())?;
        }
        Ok(m)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, r: usize, c: usize) -> Option<Gf256> {
        if r >= self.rows || c >= self.cols {
            return None;
        }
        Some(Gf256(self.data[r * self.cols + c]))
    }

    pub fn set(&mut self, r: usize, c: usize, val: Gf256) {
        if r < self.rows && c < self.cols {
            self.data[r * self.cols + c] = val.0;
        }
    }

    #[inline]
    pub fn row(&self, r: usize) -> &[u8] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, r: usize) -> &mut [u8] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn set_row(&mut self, r: usize, values: &[u8]) -> CodingResult<()> {
        if values.len() != self.cols {
            return Err(CodingError::SizeMismatch { expected: self.cols, actual: values.len() });
        }
        if r >= self.rows {
            return Err(CodingError::SymbolIndexOutOfRange { index: r, symbols: self.rows });
        }
        self.row_mut(r).copy_from_slice(values);
        Ok(())
    }

    pub fn clear_row(&mut self, r: usize) {
        if r < self.rows {
            self.row_mut(r).fill(0);
        }
    }

    /// Mutable access to two distinct rows at once.
    pub fn two_rows_mut(&mut self, a: usize, b: usize) -> (&mut [u8], &mut [u8]) {
        assert!(a != b, "rows must differ");
        let cols = self.cols;
        if a < b {
            let (head, tail) = self.data.split_at_mut(b * cols);
            (&mut head[a * cols..(a + 1) * cols], &mut tail[..cols])
        } else {
            let (head, tail) = self.data.split_at_mut(a * cols);
            (&mut tail[..cols], &mut head[b * cols..(b + 1) * cols])
        }
    }

    /// Y = A * X
    pub fn mul_vec(&self, x: &[Gf256]) -> CodingResult<Vec<Gf256>> {
        if x.len() != self.cols {
            return Err(CodingError::SizeMismatch { expected: self.cols, actual: x.len() });
        }

        let mut y = alloc::vec![Gf256::ZERO; self.rows];
        for (r, out) in y.iter_mut().enumerate() {
            let mut acc = Gf256::ZERO;
            for (&coeff, &val) in self.row(r).iter().zip(x) {
                acc += Gf256(coeff) * val;
            }
            *out = acc;
        }
        Ok(y)
    }

    /// Rank via Gaussian elimination on a scratch copy.
    pub fn rank(&self) -> usize {
        let mut a = self.clone();
        let mut rank = 0;

        for col in 0..a.cols {
            if rank == a.rows {
                break;
            }
            let Some(pivot) = (rank..a.rows).find(|&r| a.data[r * a.cols + col] != 0) else {
                continue;
            };
            if pivot != rank {
                let (x, y) = a.two_rows_mut(pivot, rank);
                x.swap_with_slice(y);
            }

            let inv = match Gf256(a.data[rank * a.cols + col]).invert() {
                Ok(inv) => inv,
                Err(_) => continue,
            };
            scalar::row_scale(a.row_mut(rank), inv);

            for r in (rank + 1)..a.rows {
                let factor = Gf256(a.data[r * a.cols + col]);
                if factor != Gf256::ZERO {
                    let (dst, src) = a.two_rows_mut(r, rank);
                    row_add_scaled(dst, src, factor);
                }
            }
            rank += 1;
        }
        rank
    }
}
