//! # Linear Form Module
//!
//! Algebraic expansion, term collection, polynomial-order computation and
//! the canonical linear form required before numerical assembly.
//!
//! ## Purpose
//!
//! The left-hand side of every equation must reduce to a linear operator
//! system over the problem variables. This module provides:
//! - `expand` — distributes products and linear operators over sums until a
//!   flat sum-of-products remains
//! - `as_terms` — collects the additive terms of an expanded expression,
//!   folding subtraction into -1 coefficients
//! - `order` — polynomial order in a set of names (0 independent, 1 linear,
//!   >1 nonlinear); operator applications count their nesting depth, so
//!   `dt(dt(u))` has order 2 in `dt`
//! - `canonical_linear_form` — rewrites an expression as a sum of
//!   (coefficient)·(operator chain applied to a variable) terms with respect
//!   to an ordered variable list, failing on any term that is not exactly
//!   first order

use crate::symbolic::symbolic_engine::Expr;
use itertools::Itertools;

impl Expr {
    /// Distributes products, quotients and bound linear operators over sums,
    /// iterating to a fixed point.
    pub fn expand(&self) -> Expr {
        let once = self.expand_once();
        if once == *self { once } else { once.expand() }
    }

    fn expand_once(&self) -> Expr {
        match self {
            Expr::Const(_) | Expr::Scalar(_) | Expr::Field { .. } | Expr::Grid { .. } => {
                self.clone()
            }
            Expr::Add(lhs, rhs) => Expr::Add(
                lhs.expand_once().boxed(),
                rhs.expand_once().boxed(),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                lhs.expand_once().boxed(),
                rhs.expand_once().boxed(),
            ),
            Expr::Mul(lhs, rhs) => {
                let l = lhs.expand_once();
                let r = rhs.expand_once();
                match (&l, &r) {
                    (Expr::Add(a, b), _) => Expr::Add(
                        Expr::Mul(a.clone(), r.clone().boxed()).boxed(),
                        Expr::Mul(b.clone(), r.boxed()).boxed(),
                    ),
                    (Expr::Sub(a, b), _) => Expr::Sub(
                        Expr::Mul(a.clone(), r.clone().boxed()).boxed(),
                        Expr::Mul(b.clone(), r.boxed()).boxed(),
                    ),
                    (_, Expr::Add(a, b)) => Expr::Add(
                        Expr::Mul(l.clone().boxed(), a.clone()).boxed(),
                        Expr::Mul(l.boxed(), b.clone()).boxed(),
                    ),
                    (_, Expr::Sub(a, b)) => Expr::Sub(
                        Expr::Mul(l.clone().boxed(), a.clone()).boxed(),
                        Expr::Mul(l.boxed(), b.clone()).boxed(),
                    ),
                    _ => Expr::Mul(l.boxed(), r.boxed()),
                }
            }
            Expr::Div(lhs, rhs) => {
                let l = lhs.expand_once();
                let r = rhs.expand_once();
                match &l {
                    Expr::Add(a, b) => Expr::Add(
                        Expr::Div(a.clone(), r.clone().boxed()).boxed(),
                        Expr::Div(b.clone(), r.boxed()).boxed(),
                    ),
                    Expr::Sub(a, b) => Expr::Sub(
                        Expr::Div(a.clone(), r.clone().boxed()).boxed(),
                        Expr::Div(b.clone(), r.boxed()).boxed(),
                    ),
                    _ => Expr::Div(l.boxed(), r.boxed()),
                }
            }
            Expr::Pow(base, exp) => Expr::Pow(
                base.expand_once().boxed(),
                exp.expand_once().boxed(),
            ),
            Expr::Exp(arg) => Expr::Exp(arg.expand_once().boxed()),
            Expr::Ln(arg) => Expr::Ln(arg.expand_once().boxed()),
            Expr::sin(arg) => Expr::sin(arg.expand_once().boxed()),
            Expr::cos(arg) => Expr::cos(arg.expand_once().boxed()),
            Expr::Diff {
                op,
                axis,
                separable,
                arg,
            } => {
                let rebuild = |a: Box<Expr>| Expr::Diff {
                    op: op.clone(),
                    axis: *axis,
                    separable: *separable,
                    arg: a,
                };
                Self::expand_linear_operator(arg.expand_once(), &rebuild)
            }
            Expr::TimeDeriv { op, arg } => {
                let rebuild = |a: Box<Expr>| Expr::TimeDeriv {
                    op: op.clone(),
                    arg: a,
                };
                Self::expand_linear_operator(arg.expand_once(), &rebuild)
            }
        }
    }

    /// Distributes a bound linear operator over sums and pulls constant and
    /// scalar factors out in front.
    fn expand_linear_operator(arg: Expr, rebuild: &dyn Fn(Box<Expr>) -> Expr) -> Expr {
        match arg {
            Expr::Add(a, b) => Expr::Add(rebuild(a).boxed(), rebuild(b).boxed()),
            Expr::Sub(a, b) => Expr::Sub(rebuild(a).boxed(), rebuild(b).boxed()),
            Expr::Mul(a, b) if matches!(*a, Expr::Const(_) | Expr::Scalar(_)) => {
                Expr::Mul(a, rebuild(b).boxed())
            }
            Expr::Mul(a, b) if matches!(*b, Expr::Const(_) | Expr::Scalar(_)) => {
                Expr::Mul(b, rebuild(a).boxed())
            }
            other => rebuild(other.boxed()),
        }
    }

    /// Collects the additive terms of the expression. Subtraction folds into
    /// a -1 coefficient on the subtracted terms. Meant to be called on an
    /// expanded expression.
    pub fn as_terms(&self) -> Vec<Expr> {
        match self {
            Expr::Add(lhs, rhs) => {
                let mut terms = lhs.as_terms();
                terms.extend(rhs.as_terms());
                terms
            }
            Expr::Sub(lhs, rhs) => {
                let mut terms = lhs.as_terms();
                terms.extend(
                    rhs.as_terms()
                        .into_iter()
                        .map(|t| Expr::Mul(Expr::Const(-1.0).boxed(), t.boxed())),
                );
                terms
            }
            _ => vec![self.clone()],
        }
    }

    /// Polynomial order of the expression in the given names: 0 means
    /// independent, 1 linear, greater than 1 nonlinear. Operator names count
    /// their application depth; a denominator or transcendental argument
    /// depending on the names reports order >= 2, so first-order checks
    /// reject it.
    pub fn order(&self, targets: &[&str]) -> usize {
        match self {
            Expr::Const(_) => 0,
            Expr::Scalar(name) | Expr::Field { name, .. } | Expr::Grid { name, .. } => {
                if targets.contains(&name.as_str()) { 1 } else { 0 }
            }
            Expr::Add(lhs, rhs) | Expr::Sub(lhs, rhs) => {
                lhs.order(targets).max(rhs.order(targets))
            }
            Expr::Mul(lhs, rhs) => lhs.order(targets) + rhs.order(targets),
            Expr::Div(lhs, rhs) => {
                let den = rhs.order(targets);
                if den > 0 {
                    lhs.order(targets) + den + 1
                } else {
                    lhs.order(targets)
                }
            }
            Expr::Pow(base, exp) => {
                let b = base.order(targets);
                let e = exp.order(targets);
                match &**exp {
                    Expr::Const(n) if n.fract() == 0.0 && *n >= 0.0 => b * (*n as usize),
                    _ if b == 0 && e == 0 => 0,
                    _ => b + e + 2,
                }
            }
            Expr::Exp(arg) | Expr::Ln(arg) | Expr::sin(arg) | Expr::cos(arg) => {
                if arg.order(targets) > 0 { 2 } else { 0 }
            }
            Expr::Diff { op, arg, .. } | Expr::TimeDeriv { op, arg } => {
                let own = if targets.contains(&op.as_str()) { 1 } else { 0 };
                own + arg.order(targets)
            }
        }
    }

    /// Rewrites the expression as a canonical sum of coefficient·variable
    /// terms with respect to the ordered variable list. Every non-vanishing
    /// term must be exactly first order in the variables.
    pub fn canonical_linear_form(&self, vars: &[&str]) -> Result<Expr, String> {
        let mut out = Vec::new();
        for term in self.expand().as_terms() {
            let term = term.simplify_();
            if term.is_zero() {
                continue;
            }
            let ord = term.order(vars);
            if ord != 1 {
                return Err(format!(
                    "term '{}' has order {} in [{}], expected exactly 1",
                    term,
                    ord,
                    vars.iter().join(", ")
                ));
            }
            let (coeff, varpart) = Self::factor_linear_term(&term, vars)?;
            let coeff = coeff.simplify_();
            out.push(if coeff.is_one() {
                varpart
            } else {
                Expr::Mul(coeff.boxed(), varpart.boxed())
            });
        }
        Ok(Expr::sum_of(out))
    }

    /// Factors one first-order term into (coefficient, operator chain applied
    /// to a variable leaf).
    fn factor_linear_term(term: &Expr, vars: &[&str]) -> Result<(Expr, Expr), String> {
        match term {
            Expr::Field { name, .. } | Expr::Scalar(name)
                if vars.contains(&name.as_str()) =>
            {
                Ok((Expr::Const(1.0), term.clone()))
            }
            Expr::Mul(lhs, rhs) => {
                if lhs.order(vars) > 0 {
                    let (coeff, varpart) = Self::factor_linear_term(lhs, vars)?;
                    Ok((Expr::Mul((**rhs).clone().boxed(), coeff.boxed()), varpart))
                } else {
                    let (coeff, varpart) = Self::factor_linear_term(rhs, vars)?;
                    Ok((Expr::Mul((**lhs).clone().boxed(), coeff.boxed()), varpart))
                }
            }
            Expr::Div(lhs, rhs) => {
                // the order check already guarantees an independent denominator
                let (coeff, varpart) = Self::factor_linear_term(lhs, vars)?;
                Ok((Expr::Div(coeff.boxed(), rhs.clone()), varpart))
            }
            Expr::Diff {
                op,
                axis,
                separable,
                arg,
            } => {
                let (coeff, varpart) = Self::factor_linear_term(arg, vars)?;
                if coeff.is_one() {
                    Ok((
                        Expr::Const(1.0),
                        Expr::Diff {
                            op: op.clone(),
                            axis: *axis,
                            separable: *separable,
                            arg: varpart.boxed(),
                        },
                    ))
                } else {
                    // a non-constant coefficient cannot commute through the
                    // derivative, keep the whole application as the variable part
                    Ok((Expr::Const(1.0), term.clone()))
                }
            }
            Expr::TimeDeriv { op, arg } => {
                let (coeff, varpart) = Self::factor_linear_term(arg, vars)?;
                if coeff.is_one() {
                    Ok((
                        Expr::Const(1.0),
                        Expr::TimeDeriv {
                            op: op.clone(),
                            arg: varpart.boxed(),
                        },
                    ))
                } else {
                    Ok((Expr::Const(1.0), term.clone()))
                }
            }
            _ => Err(format!(
                "cannot factor term '{}' into coefficient * variable over [{}]",
                term,
                vars.iter().join(", ")
            )),
        }
    }
}
