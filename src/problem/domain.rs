//! Spectral bases and the domain they span.
//!
//! A domain is an ordered list of one-dimensional bases. The last axis is
//! the coupled direction for boundary value problems; Fourier and SinCos
//! bases are separable, Chebyshev is not. Each basis knows its collocation
//! grid and the name of the derivative operator acting along its axis.

use nalgebra::DVector;
use strum_macros::{Display, EnumString};

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_metadata::{AxisMeta, Meta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum BasisKind {
    Chebyshev,
    Fourier,
    SinCos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Basis {
    pub name: String,
    pub kind: BasisKind,
    pub size: usize,
    pub interval: (f64, f64),
}

impl Basis {
    pub fn chebyshev(name: &str, size: usize, interval: (f64, f64)) -> Self {
        Basis {
            name: name.to_string(),
            kind: BasisKind::Chebyshev,
            size,
            interval,
        }
    }

    pub fn fourier(name: &str, size: usize, interval: (f64, f64)) -> Self {
        Basis {
            name: name.to_string(),
            kind: BasisKind::Fourier,
            size,
            interval,
        }
    }

    pub fn sin_cos(name: &str, size: usize, interval: (f64, f64)) -> Self {
        Basis {
            name: name.to_string(),
            kind: BasisKind::SinCos,
            size,
            interval,
        }
    }

    /// Separable bases diagonalize their derivative operator, so equations
    /// may couple them only through pointwise multiplication.
    pub fn separable(&self) -> bool {
        matches!(self.kind, BasisKind::Fourier | BasisKind::SinCos)
    }

    /// SinCos expansions carry a definite parity about the axis origin.
    pub fn has_parity(&self) -> bool {
        self.kind == BasisKind::SinCos
    }

    /// Name of the derivative operator along this axis, `dx` for basis `x`.
    pub fn diff_name(&self) -> String {
        format!("d{}", self.name)
    }

    /// Collocation grid mapped into the basis interval, ascending.
    pub fn grid(&self) -> DVector<f64> {
        let (a, b) = self.interval;
        let n = self.size;
        let point = |i: usize| -> f64 {
            match self.kind {
                // Gauss-Chebyshev nodes, interior to the interval
                BasisKind::Chebyshev => {
                    let native = (std::f64::consts::PI * (i as f64 + 0.5) / n as f64).cos();
                    a + (b - a) * (1.0 - native) / 2.0
                }
                // evenly spaced, right endpoint excluded
                BasisKind::Fourier => a + (b - a) * i as f64 / n as f64,
                BasisKind::SinCos => a + (b - a) * (i as f64 + 0.5) / n as f64,
            }
        };
        DVector::from_fn(n, |i, _| point(i))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub bases: Vec<Basis>,
}

impl Domain {
    pub fn new(bases: Vec<Basis>) -> Result<Self, String> {
        if bases.is_empty() {
            return Err("a domain needs at least one basis".to_string());
        }
        for (i, basis) in bases.iter().enumerate() {
            if bases[..i].iter().any(|other| other.name == basis.name) {
                return Err(format!("duplicate basis name '{}'", basis.name));
            }
        }
        Ok(Domain { bases })
    }

    pub fn dim(&self) -> usize {
        self.bases.len()
    }

    /// Which axes constrain parity metadata.
    pub fn parity_axes(&self) -> Vec<bool> {
        self.bases.iter().map(|b| b.has_parity()).collect()
    }

    /// Axes whose modes an equation may couple, everything non-separable.
    pub fn coupled_axes(&self) -> Vec<usize> {
        self.bases
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.separable())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn basis(&self, axis: usize) -> Option<&Basis> {
        self.bases.get(axis)
    }

    /// A problem variable living on the full domain, unconstrained metadata.
    pub fn new_field(&self, name: &str) -> Expr {
        Expr::Field {
            name: name.to_string(),
            meta: Meta::for_field(self.dim()),
        }
    }

    /// The coordinate array of one axis as an expression leaf. It is
    /// constant along every other axis and odd about the origin of its own
    /// axis when that axis carries parity.
    pub fn grid_array(&self, axis: usize) -> Result<Expr, String> {
        let basis = self
            .basis(axis)
            .ok_or_else(|| format!("axis {} out of range for {}-d domain", axis, self.dim()))?;
        let meta = Meta(
            (0..self.dim())
                .map(|j| {
                    if j == axis {
                        AxisMeta {
                            scale: 1.0,
                            constant: false,
                            parity: if basis.has_parity() { -1 } else { 0 },
                        }
                    } else {
                        AxisMeta::constant(self.bases[j].has_parity())
                    }
                })
                .collect(),
        );
        Ok(Expr::Grid {
            name: basis.name.clone(),
            axis,
            meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn xz_domain() -> Domain {
        Domain::new(vec![
            Basis::fourier("x", 8, (0.0, 2.0 * std::f64::consts::PI)),
            Basis::chebyshev("z", 16, (-1.0, 1.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_basis_names_rejected() {
        let result = Domain::new(vec![
            Basis::fourier("x", 8, (0.0, 1.0)),
            Basis::chebyshev("x", 8, (0.0, 1.0)),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_separability() {
        let domain = xz_domain();
        assert!(domain.bases[0].separable());
        assert!(!domain.bases[1].separable());
        assert_eq!(domain.coupled_axes(), vec![1]);
    }

    #[test]
    fn test_diff_names() {
        let domain = xz_domain();
        assert_eq!(domain.bases[0].diff_name(), "dx");
        assert_eq!(domain.bases[1].diff_name(), "dz");
    }

    #[test]
    fn test_fourier_grid() {
        let basis = Basis::fourier("x", 4, (0.0, 1.0));
        let grid = basis.grid();
        assert_eq!(grid.len(), 4);
        assert_relative_eq!(grid[0], 0.0);
        assert_relative_eq!(grid[1], 0.25);
        assert_relative_eq!(grid[3], 0.75);
    }

    #[test]
    fn test_chebyshev_grid_interior_and_ascending() {
        let basis = Basis::chebyshev("z", 16, (-1.0, 1.0));
        let grid = basis.grid();
        assert!(grid[0] > -1.0 && grid[15] < 1.0);
        for i in 1..16 {
            assert!(grid[i] > grid[i - 1]);
        }
    }

    #[test]
    fn test_grid_array_metadata() {
        let domain = Domain::new(vec![
            Basis::sin_cos("x", 8, (0.0, 1.0)),
            Basis::chebyshev("z", 8, (-1.0, 1.0)),
        ])
        .unwrap();
        let x = domain.grid_array(0).unwrap();
        match x {
            Expr::Grid { axis, meta, .. } => {
                assert_eq!(axis, 0);
                assert!(!meta.0[0].constant);
                assert_eq!(meta.0[0].parity, -1);
                assert!(meta.0[1].constant);
            }
            other => panic!("expected Grid, got {:?}", other),
        }
        assert!(domain.grid_array(2).is_err());
    }
}
