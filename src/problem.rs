#![allow(non_snake_case)]
/// spectral bases, their collocation grids and the domain they span
pub mod domain;
/// error taxonomy of the problem layer
pub mod errors;
/// ordered conflict-checked symbol table + substitution macros
pub mod namespace;
///____________________________________________________________________________________________________________________________
/// # Problem core
/// shared state and pipeline of all problem variants: equation records,
/// namespace construction, validators and linear-form preparation
///# Example
/// ```
/// use RustedSpectral::problem::domain::{Basis, Domain};
/// use RustedSpectral::problem::variants::{ProblemVariant, IVP};
/// let domain = Domain::new(vec![Basis::fourier("x", 32, (0.0, 6.28))]).unwrap();
/// let mut problem = IVP::new(domain, &["u"]).unwrap();
/// problem.add_parameter("nu", 0.5).unwrap();
/// problem.add_equation("dt(u) - nu*dx(dx(u)) = 0").unwrap();
/// let spec = problem.build_solver();
/// println!("{} equations for {}", spec.equations.len(), spec.kind);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod problem_base;
/// the four problem variants (initial value, linear/nonlinear boundary
/// value, eigenvalue) and the solver snapshot they produce
pub mod variants;
///
mod problem_tests;
