//! # Symbolic Metadata Module
//!
//! Per-axis attributes attached to every field placed in a parsing namespace
//! and propagated through symbolic expression construction:
//!
//! - **scale**: grid scaling factor; carried along but never checked (the
//!   solve happens in coefficient space)
//! - **constant**: whether the quantity is constant along the axis
//! - **parity**: symmetry along the axis (+1 even, -1 odd, 0 unconstrained)
//!
//! Metadata is computed for a whole expression tree by `Expr::meta`, which
//! dispatches on the variant tag. Propagation is checked, never inferred:
//! when a combination has no defined rule (incompatible parities inside a
//! sum, an odd base under a non-integer power) the computation returns an
//! error instead of defaulting.

use crate::symbolic::symbolic_engine::Expr;

/// Metadata of one quantity along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisMeta {
    pub scale: f64,
    pub constant: bool,
    pub parity: i8,
}

impl AxisMeta {
    /// A spatially varying quantity with no symmetry constraint.
    pub fn unconstrained() -> Self {
        AxisMeta {
            scale: 1.0,
            constant: false,
            parity: 0,
        }
    }

    /// A quantity constant along the axis. On a parity basis a constant is
    /// even, elsewhere parity stays unconstrained.
    pub fn constant(parity_axis: bool) -> Self {
        AxisMeta {
            scale: 1.0,
            constant: true,
            parity: if parity_axis { 1 } else { 0 },
        }
    }
}

/// Per-axis metadata of one quantity, one entry per domain axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Meta(pub Vec<AxisMeta>);

impl Meta {
    /// Default metadata for a freshly declared field: varying, unconstrained.
    pub fn for_field(dim: usize) -> Self {
        Meta(vec![AxisMeta::unconstrained(); dim])
    }

    /// Metadata of a scalar or numeric constant: constant along every axis.
    pub fn for_constant(parity_axes: &[bool]) -> Self {
        Meta(
            parity_axes
                .iter()
                .map(|&p| AxisMeta::constant(p))
                .collect(),
        )
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }
}

fn combine_parity_additive(lp: i8, rp: i8, axis: usize) -> Result<i8, String> {
    if lp == rp {
        Ok(lp)
    } else if lp == 0 || rp == 0 {
        Ok(0)
    } else {
        Err(format!(
            "incompatible parities {} and {} in a sum along axis {}",
            lp, rp, axis
        ))
    }
}

impl Expr {
    /// Computes the propagated per-axis metadata of the expression tree.
    ///
    /// `parity_axes` has one entry per domain axis, true where the basis
    /// carries a parity constraint. Fails when a subexpression combines
    /// metadata in a way that has no defined propagation rule.
    pub fn meta(&self, parity_axes: &[bool]) -> Result<Meta, String> {
        let dim = parity_axes.len();
        match self {
            Expr::Const(_) | Expr::Scalar(_) => Ok(Meta::for_constant(parity_axes)),
            Expr::Field { name, meta } | Expr::Grid { name, meta, .. } => {
                if meta.dim() != dim {
                    return Err(format!(
                        "'{}' carries metadata for {} axes, domain has {}",
                        name,
                        meta.dim(),
                        dim
                    ));
                }
                Ok(meta.clone())
            }
            Expr::Add(lhs, rhs) | Expr::Sub(lhs, rhs) => {
                let l = lhs.meta(parity_axes)?;
                let r = rhs.meta(parity_axes)?;
                let mut out = Vec::with_capacity(dim);
                for axis in 0..dim {
                    out.push(AxisMeta {
                        scale: l.0[axis].scale.max(r.0[axis].scale),
                        constant: l.0[axis].constant && r.0[axis].constant,
                        parity: combine_parity_additive(l.0[axis].parity, r.0[axis].parity, axis)?,
                    });
                }
                Ok(Meta(out))
            }
            Expr::Mul(lhs, rhs) | Expr::Div(lhs, rhs) => {
                let l = lhs.meta(parity_axes)?;
                let r = rhs.meta(parity_axes)?;
                let mut out = Vec::with_capacity(dim);
                for axis in 0..dim {
                    out.push(AxisMeta {
                        scale: l.0[axis].scale.max(r.0[axis].scale),
                        constant: l.0[axis].constant && r.0[axis].constant,
                        parity: l.0[axis].parity * r.0[axis].parity,
                    });
                }
                Ok(Meta(out))
            }
            Expr::Pow(base, exp) => {
                let b = base.meta(parity_axes)?;
                let e = exp.meta(parity_axes)?;
                let mut out = Vec::with_capacity(dim);
                for axis in 0..dim {
                    let bp = b.0[axis].parity;
                    let parity = match (bp, &**exp) {
                        (0, _) => 0,
                        (1, _) => 1,
                        (-1, Expr::Const(n)) if n.fract() == 0.0 => {
                            if (*n as i64) % 2 == 0 { 1 } else { -1 }
                        }
                        (-1, _) => {
                            return Err(format!(
                                "no parity rule for an odd base under exponent '{}' along axis {}",
                                exp, axis
                            ));
                        }
                        _ => 0,
                    };
                    out.push(AxisMeta {
                        scale: b.0[axis].scale.max(e.0[axis].scale),
                        constant: b.0[axis].constant && e.0[axis].constant,
                        parity,
                    });
                }
                Ok(Meta(out))
            }
            Expr::Exp(arg) | Expr::Ln(arg) => {
                let mut m = arg.meta(parity_axes)?;
                for axis_meta in m.0.iter_mut() {
                    // exp/ln of an odd quantity has no definite symmetry
                    if axis_meta.parity == -1 {
                        axis_meta.parity = 0;
                    }
                }
                Ok(m)
            }
            // sin preserves parity, cos of anything with definite parity is even
            Expr::sin(arg) => arg.meta(parity_axes),
            Expr::cos(arg) => {
                let mut m = arg.meta(parity_axes)?;
                for axis_meta in m.0.iter_mut() {
                    if axis_meta.parity != 0 {
                        axis_meta.parity = 1;
                    }
                }
                Ok(m)
            }
            Expr::Diff { axis, arg, .. } => {
                let mut m = arg.meta(parity_axes)?;
                // differentiation flips parity along its own axis
                m.0[*axis].parity = -m.0[*axis].parity;
                Ok(m)
            }
            Expr::TimeDeriv { arg, .. } => arg.meta(parity_axes),
        }
    }
}
