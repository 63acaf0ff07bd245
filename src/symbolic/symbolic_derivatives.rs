//! # Symbolic Derivatives Module
//!
//! Analytic differentiation of expression trees with respect to a named
//! symbol. Implements the standard calculus rules recursively:
//! - Sum rule, product rule, quotient rule
//! - Power rule (with a dedicated branch for constant exponents, which is
//!   what the Frechet computation produces)
//! - Chain rule through the built-in functions
//! - Linearity through bound derivative operators: d/dε dx(f) = dx(df/dε),
//!   valid because ε is a spatial constant
//!
//! The main consumer is the Newton-Kantorovich linearization, which
//! substitutes `var -> var + ε·pert`, differentiates with respect to ε and
//! evaluates at ε = 0.

use crate::symbolic::symbolic_engine::Expr;

impl Expr {
    /// Computes the analytical derivative of the expression with respect to
    /// the named symbol (a scalar or field leaf).
    ///
    /// # Examples
    /// ```rust, ignore
    /// let eps = Expr::Scalar("eps".to_string());
    /// let f = eps.clone() * eps.clone(); // eps^2 as a product
    /// let df = f.sym_diff("eps");        // 1*eps + eps*1 before simplification
    /// ```
    pub fn sym_diff(&self, var: &str) -> Expr {
        match self {
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Scalar(name) | Expr::Field { name, .. } | Expr::Grid { name, .. } => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.sym_diff(var)),
                Box::new(rhs.sym_diff(var)),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.sym_diff(var)),
                Box::new(rhs.sym_diff(var)),
            ),
            Expr::Mul(lhs, rhs) => Expr::Add(
                Box::new(Expr::Mul(Box::new(lhs.sym_diff(var)), rhs.clone())),
                Box::new(Expr::Mul(lhs.clone(), Box::new(rhs.sym_diff(var)))),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(Expr::Sub(
                    Box::new(Expr::Mul(Box::new(lhs.sym_diff(var)), rhs.clone())),
                    Box::new(Expr::Mul(lhs.clone(), Box::new(rhs.sym_diff(var)))),
                )),
                Box::new(Expr::Mul(rhs.clone(), rhs.clone())),
            ),
            Expr::Pow(base, exp) => match &**exp {
                // d/dv b^n = n * b^(n-1) * b'
                Expr::Const(n) => Expr::Mul(
                    Box::new(Expr::Mul(
                        Box::new(Expr::Const(*n)),
                        Box::new(Expr::Pow(base.clone(), Box::new(Expr::Const(n - 1.0)))),
                    )),
                    Box::new(base.sym_diff(var)),
                ),
                // general rule: b^e * (e' * ln(b) + e * b'/b)
                _ => Expr::Mul(
                    Box::new(self.clone()),
                    Box::new(Expr::Add(
                        Box::new(Expr::Mul(
                            Box::new(exp.sym_diff(var)),
                            Box::new(Expr::Ln(base.clone())),
                        )),
                        Box::new(Expr::Mul(
                            exp.clone(),
                            Box::new(Expr::Div(Box::new(base.sym_diff(var)), base.clone())),
                        )),
                    )),
                ),
            },
            Expr::Exp(arg) => Expr::Mul(Box::new(self.clone()), Box::new(arg.sym_diff(var))),
            Expr::Ln(arg) => Expr::Div(Box::new(arg.sym_diff(var)), arg.clone()),
            Expr::sin(arg) => Expr::Mul(
                Box::new(Expr::cos(arg.clone())),
                Box::new(arg.sym_diff(var)),
            ),
            Expr::cos(arg) => Expr::Mul(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(Expr::sin(arg.clone())),
                )),
                Box::new(arg.sym_diff(var)),
            ),
            Expr::Diff {
                op,
                axis,
                separable,
                arg,
            } => Expr::Diff {
                op: op.clone(),
                axis: *axis,
                separable: *separable,
                arg: Box::new(arg.sym_diff(var)),
            },
            Expr::TimeDeriv { op, arg } => Expr::TimeDeriv {
                op: op.clone(),
                arg: Box::new(arg.sym_diff(var)),
            },
        }
    }
}
