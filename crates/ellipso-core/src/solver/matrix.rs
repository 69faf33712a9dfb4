//! Minimal 2×2 complex matrix for the characteristic-matrix method.

use std::ops::Mul;

use num_complex::Complex64;

/// Row-major 2×2 complex matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat2(pub [[Complex64; 2]; 2]);

impl Mat2 {
    pub fn identity() -> Self {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        Mat2([[one, zero], [zero, one]])
    }

    /// Interface matrix $\begin{pmatrix}1 & r\\ r & 1\end{pmatrix}$.
    ///
    /// The physical matrix carries a factor $1/t$, which cancels in the
    /// ratio $M_{10}/M_{00}$ and is dropped.
    pub fn interface(r: Complex64) -> Self {
        let one = Complex64::new(1.0, 0.0);
        Mat2([[one, r], [r, one]])
    }

    /// Propagation matrix $\mathrm{diag}(e^{-i\beta}, e^{i\beta})$ scaled by
    /// $e^{i\beta}$, i.e. $\mathrm{diag}(1, e^{2i\beta})$.
    ///
    /// The scale factor cancels in $M_{10}/M_{00}$; keeping it out stops the
    /// entries from growing with $\mathrm{Im}\,\beta$ in thick absorbers.
    pub fn propagation(beta: Complex64) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        let phase = (Complex64::i() * 2.0 * beta).exp();
        Mat2([[Complex64::new(1.0, 0.0), zero], [zero, phase]])
    }

    pub fn is_finite(&self) -> bool {
        self.0
            .iter()
            .flatten()
            .all(|z| z.re.is_finite() && z.im.is_finite())
    }
}

impl Mul for Mat2 {
    type Output = Mat2;

    fn mul(self, rhs: Mat2) -> Mat2 {
        let a = &self.0;
        let b = &rhs.0;
        Mat2([
            [
                a[0][0] * b[0][0] + a[0][1] * b[1][0],
                a[0][0] * b[0][1] + a[0][1] * b[1][1],
            ],
            [
                a[1][0] * b[0][0] + a[1][1] * b[1][0],
                a[1][0] * b[0][1] + a[1][1] * b[1][1],
            ],
        ])
    }
}
