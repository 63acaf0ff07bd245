#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
/// parsing is namespace-driven: every identifier must be registered before
/// it can appear in an equation string
///# Example
/// ```
/// use RustedSpectral::problem::namespace::{Namespace, NamespaceEntry, OperatorSpec};
/// use RustedSpectral::symbolic::parse_expr::parse_expression;
/// use RustedSpectral::symbolic::symbolic_engine::Expr;
/// use RustedSpectral::symbolic::symbolic_metadata::Meta;
/// let mut ns = Namespace::new();
/// ns.set("u", NamespaceEntry::Expression(Expr::Field { name: "u".to_string(), meta: Meta::for_field(1) })).unwrap();
/// ns.set("dx", NamespaceEntry::Operator(OperatorSpec::Differentiate { name: "dx".to_string(), axis: 0, separable: false })).unwrap();
/// let parsed_expression = parse_expression("dx(u) + 2*u", &ns).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) represents equation sides as symbolic expression trees
/// 2) rewrites the trees (substitution, operator stripping, splitting by a name)
/// 3) turns a symbolic expression into a string expression for printing and control results
///# Example#
/// ```
/// use RustedSpectral::symbolic::symbolic_engine::Expr;
/// use RustedSpectral::symbolic::symbolic_metadata::Meta;
/// let u = Expr::Field { name: "u".to_string(), meta: Meta::for_field(1) };
/// let expr = Expr::Const(2.0) * u.clone() + u.clone().pow(Expr::Const(2.0));
/// println!("expr {}", expr);
/// // substitute u -> u + 1 everywhere
/// let shifted = expr.replace_symbol("u", &(u.clone() + Expr::Const(1.0)));
/// println!("shifted {}", shifted);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
///
mod symbolic_engine_tests;
/// symbolic differentiation with respect to a named leaf; derivative
/// operators commute with it
pub mod symbolic_derivatives;
///________________________________________________________________________________________________________________________________________________
/// expansion into sums of products, linearity order counting and extraction
/// of the canonical coefficient * (operators applied to a variable) form
/// used by the matrix-form builders
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_linear_form;
/// per-axis scale/constant/parity metadata and its propagation through
/// expression trees
pub mod symbolic_metadata;
/// constant folding and removal of arithmetic identities
pub mod symbolic_simplify;
///______________________________________________________________________________________________________________________________________________
/// the collection of utility functions mainly for bracket parsing and proceeding
/// _____________________________________________________________________________________________________________________________________________
pub mod utils;
