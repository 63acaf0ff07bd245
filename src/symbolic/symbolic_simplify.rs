//! # Symbolic Simplification Module
//!
//! Bottom-up algebraic cleanup of expression trees: constant folding and the
//! usual identity rules (x + 0 = x, x * 1 = x, x * 0 = 0, x ** 1 = x,
//! x ** 0 = 1, 0 / x = 0, linear operators of zero are zero).
//!
//! Simplification here is deliberately conservative: it never reorders or
//! collects terms, it only removes structure that the Frechet computation
//! and the mass-matrix isolation leave behind (products with the ε that was
//! just set to zero, unit powers from the power rule, unit coefficients from
//! eigenvalue substitution).

use crate::symbolic::symbolic_engine::Expr;

impl Expr {
    /// Applies identity rules and constant folding recursively, bottom-up.
    pub fn simplify_(&self) -> Expr {
        match self {
            Expr::Const(_) | Expr::Scalar(_) | Expr::Field { .. } | Expr::Grid { .. } => {
                self.clone()
            }
            Expr::Add(lhs, rhs) => {
                let l = lhs.simplify_();
                let r = rhs.simplify_();
                if l.is_zero() {
                    r
                } else if r.is_zero() {
                    l
                } else if let (Expr::Const(a), Expr::Const(b)) = (&l, &r) {
                    Expr::Const(a + b)
                } else {
                    Expr::Add(l.boxed(), r.boxed())
                }
            }
            Expr::Sub(lhs, rhs) => {
                let l = lhs.simplify_();
                let r = rhs.simplify_();
                if r.is_zero() {
                    l
                } else if let (Expr::Const(a), Expr::Const(b)) = (&l, &r) {
                    Expr::Const(a - b)
                } else if l.is_zero() {
                    Expr::Mul(Expr::Const(-1.0).boxed(), r.boxed())
                } else {
                    Expr::Sub(l.boxed(), r.boxed())
                }
            }
            Expr::Mul(lhs, rhs) => {
                let l = lhs.simplify_();
                let r = rhs.simplify_();
                if l.is_zero() || r.is_zero() {
                    Expr::zero()
                } else if l.is_one() {
                    r
                } else if r.is_one() {
                    l
                } else if let (Expr::Const(a), Expr::Const(b)) = (&l, &r) {
                    Expr::Const(a * b)
                } else {
                    Expr::Mul(l.boxed(), r.boxed())
                }
            }
            Expr::Div(lhs, rhs) => {
                let l = lhs.simplify_();
                let r = rhs.simplify_();
                if l.is_zero() && !r.is_zero() {
                    Expr::zero()
                } else if r.is_one() {
                    l
                } else if let (Expr::Const(a), Expr::Const(b)) = (&l, &r) {
                    if b.abs() > crate::global::THRESHOLD {
                        Expr::Const(a / b)
                    } else {
                        Expr::Div(l.boxed(), r.boxed())
                    }
                } else {
                    Expr::Div(l.boxed(), r.boxed())
                }
            }
            Expr::Pow(base, exp) => {
                let b = base.simplify_();
                let e = exp.simplify_();
                if e.is_one() {
                    b
                } else if e.is_zero() {
                    Expr::Const(1.0)
                } else if b.is_zero() {
                    Expr::zero()
                } else if let (Expr::Const(a), Expr::Const(n)) = (&b, &e) {
                    Expr::Const(a.powf(*n))
                } else {
                    Expr::Pow(b.boxed(), e.boxed())
                }
            }
            Expr::Exp(arg) => {
                let a = arg.simplify_();
                match a {
                    Expr::Const(v) => Expr::Const(v.exp()),
                    _ => Expr::Exp(a.boxed()),
                }
            }
            Expr::Ln(arg) => {
                let a = arg.simplify_();
                match a {
                    Expr::Const(v) if v > 0.0 => Expr::Const(v.ln()),
                    _ => Expr::Ln(a.boxed()),
                }
            }
            Expr::sin(arg) => {
                let a = arg.simplify_();
                match a {
                    Expr::Const(v) => Expr::Const(v.sin()),
                    _ => Expr::sin(a.boxed()),
                }
            }
            Expr::cos(arg) => {
                let a = arg.simplify_();
                match a {
                    Expr::Const(v) => Expr::Const(v.cos()),
                    _ => Expr::cos(a.boxed()),
                }
            }
            Expr::Diff {
                op,
                axis,
                separable,
                arg,
            } => {
                let a = arg.simplify_();
                // a linear operator applied to zero vanishes
                if a.is_zero() {
                    Expr::zero()
                } else {
                    Expr::Diff {
                        op: op.clone(),
                        axis: *axis,
                        separable: *separable,
                        arg: a.boxed(),
                    }
                }
            }
            Expr::TimeDeriv { op, arg } => {
                let a = arg.simplify_();
                if a.is_zero() {
                    Expr::zero()
                } else {
                    Expr::TimeDeriv {
                        op: op.clone(),
                        arg: a.boxed(),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additive_identities() {
        let u = Expr::Scalar("u".to_string());
        assert_eq!((u.clone() + Expr::Const(0.0)).simplify_(), u);
        assert_eq!((Expr::Const(0.0) + u.clone()).simplify_(), u);
        assert_eq!((u.clone() - Expr::Const(0.0)).simplify_(), u);
    }

    #[test]
    fn test_multiplicative_identities() {
        let u = Expr::Scalar("u".to_string());
        assert_eq!((u.clone() * Expr::Const(0.0)).simplify_(), Expr::Const(0.0));
        assert_eq!((u.clone() * Expr::Const(1.0)).simplify_(), u);
        assert_eq!((Expr::Const(1.0) * u.clone()).simplify_(), u);
    }

    #[test]
    fn test_power_identities() {
        let u = Expr::Scalar("u".to_string());
        assert_eq!(u.clone().pow(Expr::Const(1.0)).simplify_(), u);
        assert_eq!(u.clone().pow(Expr::Const(0.0)).simplify_(), Expr::Const(1.0));
    }

    #[test]
    fn test_constant_folding() {
        let e = (Expr::Const(2.0) + Expr::Const(3.0)) * Expr::Const(4.0);
        assert_eq!(e.simplify_(), Expr::Const(20.0));
    }

    #[test]
    fn test_operator_of_zero() {
        let dz = Expr::TimeDeriv {
            op: "dt".to_string(),
            arg: (Expr::Scalar("eps".to_string()) * Expr::Const(0.0)).boxed(),
        };
        assert_eq!(dz.simplify_(), Expr::Const(0.0));
    }
}
