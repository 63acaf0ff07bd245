//! # Symbolic Engine Module
//!
//! Core symbolic expression type of the equation-formulation framework. An
//! equation side is represented as a recursive `Expr` tree whose leaves are
//! numeric constants, scalar symbols (time, eigenvalue, cast parameters),
//! named fields on the domain and coordinate grid arrays, and whose interior
//! nodes are arithmetic operations, built-in functions and bound derivative
//! operators.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Leaves**: `Const(f64)`, `Scalar(name)`, `Field { name, meta }`,
//!   `Grid { name, axis, meta }`
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow`
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`
//! - **Operators**: `Diff { op, axis, separable, arg }` — spatial derivative
//!   bound to a domain axis; `TimeDeriv { op, arg }` — the time derivative of
//!   an initial-value problem
//!
//! ### Key Methods
//! - `has(names)` — symbolic dependency test over field, scalar and operator names
//! - `replace_symbol(name, expr)` — substitute a leaf by an expression
//! - `set_scalar(name, value)` — substitute a leaf by a constant
//! - `strip_operator(op)` — replace an operator application by its argument
//!   (the "substitute the derivative with identity" step of the mass-matrix
//!   isolation)
//! - `split(op)` — partition the expanded expression into the part containing
//!   an operator and the remainder
//!
//! Cross-cutting algorithms live in sibling modules, each an `impl Expr`
//! block dispatching exhaustively on the variant tag: metadata propagation
//! (`symbolic_metadata`), analytic differentiation (`symbolic_derivatives`),
//! simplification (`symbolic_simplify`) and expansion/linear-form reduction
//! (`symbolic_linear_form`). A new variant fails to compile until every
//! dispatch table handles it, which is what keeps propagation explicit.

#![allow(non_camel_case_types)]

use crate::global::THRESHOLD;
use crate::symbolic::symbolic_metadata::Meta;
use std::fmt;

/// Core symbolic expression enum representing one side of an equation as an
/// abstract syntax tree. Uses Box<Expr> for recursive structure.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Numerical constant value
    Const(f64),
    /// Scalar symbol, constant along every axis: time, eigenvalue label,
    /// external parameters cast to operands, the Frechet epsilon
    Scalar(String),
    /// Named field over the domain, with per-axis metadata
    Field { name: String, meta: Meta },
    /// Coordinate grid array of one axis
    Grid {
        name: String,
        axis: usize,
        meta: Meta,
    },
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ** exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Box<Expr>),
    /// Sine function
    sin(Box<Expr>),
    /// Cosine function
    cos(Box<Expr>),
    /// Spatial derivative operator bound to a domain axis. `separable` is
    /// copied from the basis and decides whether the operator counts toward
    /// the coupled differential order.
    Diff {
        op: String,
        axis: usize,
        separable: bool,
        arg: Box<Expr>,
    },
    /// Time derivative operator of an initial-value problem
    TimeDeriv { op: String, arg: Box<Expr> },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Scalar(name) => write!(f, "{}", name),
            Expr::Field { name, .. } => write!(f, "{}", name),
            Expr::Grid { name, .. } => write!(f, "{}", name),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ** {})", base, exp),
            Expr::Exp(arg) => write!(f, "exp({})", arg),
            Expr::Ln(arg) => write!(f, "ln({})", arg),
            Expr::sin(arg) => write!(f, "sin({})", arg),
            Expr::cos(arg) => write!(f, "cos({})", arg),
            Expr::Diff { op, arg, .. } => write!(f, "{}({})", op, arg),
            Expr::TimeDeriv { op, arg } => write!(f, "{}({})", op, arg),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::AddAssign for Expr {
    fn add_assign(&mut self, rhs: Self) {
        *self = Expr::Add(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::SubAssign for Expr {
    fn sub_assign(&mut self, rhs: Self) {
        *self = Expr::Sub(Box::new(self.clone()), Box::new(rhs));
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Const(value)
    }
}

impl Expr {
    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Creates power expression self ** rhs.
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn zero() -> Expr {
        Expr::Const(0.0)
    }

    /// Checks if expression is the zero constant (within threshold).
    pub fn is_zero(&self) -> bool {
        match self {
            Expr::Const(val) => val.abs() < THRESHOLD,
            _ => false,
        }
    }

    /// Checks if expression is the unit constant (within threshold).
    pub fn is_one(&self) -> bool {
        match self {
            Expr::Const(val) => (val - 1.0).abs() < THRESHOLD,
            _ => false,
        }
    }

    /// Name of a symbolic leaf or bound operator node, if any.
    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            Expr::Scalar(name) | Expr::Field { name, .. } | Expr::Grid { name, .. } => Some(name),
            Expr::Diff { op, .. } | Expr::TimeDeriv { op, .. } => Some(op),
            _ => None,
        }
    }

    /// Tests whether the expression depends on any of the given names.
    /// Names match field, scalar and grid leaves as well as the operator
    /// names of derivative applications.
    pub fn has(&self, names: &[&str]) -> bool {
        match self {
            Expr::Const(_) => false,
            Expr::Scalar(name) | Expr::Field { name, .. } | Expr::Grid { name, .. } => {
                names.contains(&name.as_str())
            }
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => lhs.has(names) || rhs.has(names),
            Expr::Exp(arg) | Expr::Ln(arg) | Expr::sin(arg) | Expr::cos(arg) => arg.has(names),
            Expr::Diff { op, arg, .. } | Expr::TimeDeriv { op, arg } => {
                names.contains(&op.as_str()) || arg.has(names)
            }
        }
    }

    /// Substitutes every leaf named `name` with the given expression.
    /// Operator applications are rebuilt around the substituted argument,
    /// so replacing `u` by `δu` maps `dx(u)` to `dx(δu)`.
    pub fn replace_symbol(&self, name: &str, replacement: &Expr) -> Expr {
        match self {
            Expr::Scalar(n) | Expr::Field { name: n, .. } | Expr::Grid { name: n, .. }
                if n == name =>
            {
                replacement.clone()
            }
            Expr::Const(_) | Expr::Scalar(_) | Expr::Field { .. } | Expr::Grid { .. } => {
                self.clone()
            }
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.replace_symbol(name, replacement)),
                Box::new(rhs.replace_symbol(name, replacement)),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.replace_symbol(name, replacement)),
                Box::new(rhs.replace_symbol(name, replacement)),
            ),
            Expr::Mul(lhs, rhs) => Expr::Mul(
                Box::new(lhs.replace_symbol(name, replacement)),
                Box::new(rhs.replace_symbol(name, replacement)),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(lhs.replace_symbol(name, replacement)),
                Box::new(rhs.replace_symbol(name, replacement)),
            ),
            Expr::Pow(base, exp) => Expr::Pow(
                Box::new(base.replace_symbol(name, replacement)),
                Box::new(exp.replace_symbol(name, replacement)),
            ),
            Expr::Exp(arg) => Expr::Exp(Box::new(arg.replace_symbol(name, replacement))),
            Expr::Ln(arg) => Expr::Ln(Box::new(arg.replace_symbol(name, replacement))),
            Expr::sin(arg) => Expr::sin(Box::new(arg.replace_symbol(name, replacement))),
            Expr::cos(arg) => Expr::cos(Box::new(arg.replace_symbol(name, replacement))),
            Expr::Diff {
                op,
                axis,
                separable,
                arg,
            } => Expr::Diff {
                op: op.clone(),
                axis: *axis,
                separable: *separable,
                arg: Box::new(arg.replace_symbol(name, replacement)),
            },
            Expr::TimeDeriv { op, arg } => Expr::TimeDeriv {
                op: op.clone(),
                arg: Box::new(arg.replace_symbol(name, replacement)),
            },
        }
    }

    /// Substitutes a scalar symbol with a constant value.
    pub fn set_scalar(&self, name: &str, value: f64) -> Expr {
        self.replace_symbol(name, &Expr::Const(value))
    }

    /// Replaces every application of the named operator by its argument,
    /// i.e. substitutes the operator with identity. Nested applications are
    /// stripped as well.
    pub fn strip_operator(&self, op_name: &str) -> Expr {
        match self {
            Expr::Const(_) | Expr::Scalar(_) | Expr::Field { .. } | Expr::Grid { .. } => {
                self.clone()
            }
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.strip_operator(op_name)),
                Box::new(rhs.strip_operator(op_name)),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.strip_operator(op_name)),
                Box::new(rhs.strip_operator(op_name)),
            ),
            Expr::Mul(lhs, rhs) => Expr::Mul(
                Box::new(lhs.strip_operator(op_name)),
                Box::new(rhs.strip_operator(op_name)),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(lhs.strip_operator(op_name)),
                Box::new(rhs.strip_operator(op_name)),
            ),
            Expr::Pow(base, exp) => Expr::Pow(
                Box::new(base.strip_operator(op_name)),
                Box::new(exp.strip_operator(op_name)),
            ),
            Expr::Exp(arg) => Expr::Exp(Box::new(arg.strip_operator(op_name))),
            Expr::Ln(arg) => Expr::Ln(Box::new(arg.strip_operator(op_name))),
            Expr::sin(arg) => Expr::sin(Box::new(arg.strip_operator(op_name))),
            Expr::cos(arg) => Expr::cos(Box::new(arg.strip_operator(op_name))),
            Expr::Diff {
                op,
                axis,
                separable,
                arg,
            } => {
                if op == op_name {
                    arg.strip_operator(op_name)
                } else {
                    Expr::Diff {
                        op: op.clone(),
                        axis: *axis,
                        separable: *separable,
                        arg: Box::new(arg.strip_operator(op_name)),
                    }
                }
            }
            Expr::TimeDeriv { op, arg } => {
                if op == op_name {
                    arg.strip_operator(op_name)
                } else {
                    Expr::TimeDeriv {
                        op: op.clone(),
                        arg: Box::new(arg.strip_operator(op_name)),
                    }
                }
            }
        }
    }

    /// Sums a list of terms, Const(0) for an empty list.
    pub fn sum_of(terms: Vec<Expr>) -> Expr {
        let mut iter = terms.into_iter();
        match iter.next() {
            None => Expr::zero(),
            Some(first) => iter.fold(first, |acc, t| acc + t),
        }
    }

    /// Splits the expression by a designated operator or symbol name:
    /// expands, collects additive terms and partitions them into
    /// (terms containing the name, remainder). Used to isolate the
    /// time-derivative and eigenvalue coefficients.
    pub fn split(&self, name: &str) -> (Expr, Expr) {
        let terms = self.expand().as_terms();
        let (with, without): (Vec<Expr>, Vec<Expr>) =
            terms.into_iter().partition(|t| t.has(&[name]));
        (Expr::sum_of(with), Expr::sum_of(without))
    }
}
