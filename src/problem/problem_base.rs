//! Shared state and pipeline plumbing for all problem variants.
//!
//! A problem collects variables, parameters, substitutions and equations over
//! a domain. The namespace used to parse equation strings is built lazily on
//! the first `add_equation`/`add_bc` call and cached; anything that would
//! change it afterwards (parameters, substitutions, variable metadata) is
//! rejected instead of going silently stale.

use log::debug;
use strum_macros::Display;

use crate::problem::domain::Domain;
use crate::problem::errors::ProblemError;
use crate::problem::namespace::{BuiltinFn, Namespace, NamespaceEntry, OperatorSpec};
use crate::symbolic::parse_expr::{parse_expression, split_equation};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_metadata::Meta;

/// Perturbation fields of nonlinear problems are the variable name behind
/// this prefix.
pub const PERTURBATION_PREFIX: &str = "δ";

/// A canonicalized expression that is exactly first order in `vars`: a sum
/// of coefficient * (operator chain applied to a variable) terms.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearForm {
    pub expr: Expr,
    pub vars: Vec<String>,
}

impl LinearForm {
    pub fn zero() -> Self {
        LinearForm {
            expr: Expr::Const(0.0),
            vars: Vec::new(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.expr.is_zero()
    }
}

/// Reduced operator forms of one equation. Which fields are populated
/// depends on the problem variant; unused slots stay zero.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixForms {
    /// mass form, the coefficient of the time derivative or eigenvalue
    pub M: LinearForm,
    /// stiffness form acting on the variables (perturbations for NLBVP)
    pub L: LinearForm,
    /// forcing expression, the right-hand side
    pub F: Expr,
    /// Frechet derivative of F acting on the perturbations
    pub dF: LinearForm,
    /// Newton residual F - L evaluated at the current iterate
    pub F_minus_L: Expr,
}

impl MatrixForms {
    pub fn empty() -> Self {
        MatrixForms {
            M: LinearForm::zero(),
            L: LinearForm::zero(),
            F: Expr::Const(0.0),
            dF: LinearForm::zero(),
            F_minus_L: Expr::Const(0.0),
        }
    }
}

/// One parsed equation or boundary condition, appended atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct EquationRecord {
    pub raw_equation: String,
    pub raw_condition: String,
    pub raw_LHS: String,
    pub raw_RHS: String,
    pub LHS: Expr,
    pub RHS: Expr,
    /// whether the left-hand side applies derivatives along a coupled axis
    pub differential: bool,
    pub forms: MatrixForms,
}

/// Truncation options for non-constant coefficient expansions, stored here
/// and consumed by the solver-construction layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NccOptions {
    pub cutoff: f64,
    pub max_terms: Option<usize>,
}

impl Default for NccOptions {
    fn default() -> Self {
        NccOptions {
            cutoff: 1e-10,
            max_terms: None,
        }
    }
}

/// The per-axis metadata keys and how equation consistency treats each one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MetaKey {
    /// dealiasing scale, never constrained by equations
    Scale,
    /// a constant LHS along an axis forces a constant RHS there
    Constant,
    /// the LHS must carry the RHS parity when the RHS is nonzero and definite
    Parity,
}

pub const META_KEYS: [MetaKey; 3] = [MetaKey::Scale, MetaKey::Constant, MetaKey::Parity];

#[derive(Debug, Clone)]
pub struct ProblemCore {
    pub domain: Domain,
    pub variables: Vec<String>,
    /// per-variable metadata, parallel to `variables`
    pub meta: Vec<Meta>,
    parameters: Vec<(String, Expr)>,
    substitutions: Vec<(String, String)>,
    pub equations: Vec<EquationRecord>,
    pub boundary_conditions: Vec<EquationRecord>,
    pub ncc_options: NccOptions,
    namespace_cache: Option<Namespace>,
}

impl ProblemCore {
    pub fn new(domain: Domain, variables: &[&str]) -> Result<Self, ProblemError> {
        let reserved: Vec<String> = domain
            .bases
            .iter()
            .flat_map(|b| [b.name.clone(), b.diff_name()])
            .collect();
        let mut names: Vec<String> = Vec::with_capacity(variables.len());
        for var in variables {
            if !crate::symbolic::utils::is_valid_identifier(var) {
                return Err(ProblemError::InvalidIdentifier(var.to_string()));
            }
            if names.iter().any(|n| n == var) || reserved.iter().any(|n| n == var) {
                return Err(ProblemError::NameConflict(var.to_string()));
            }
            names.push(var.to_string());
        }
        let dim = domain.dim();
        let meta = vec![Meta::for_field(dim); names.len()];
        Ok(ProblemCore {
            domain,
            variables: names,
            meta,
            parameters: Vec::new(),
            substitutions: Vec::new(),
            equations: Vec::new(),
            boundary_conditions: Vec::new(),
            ncc_options: NccOptions::default(),
            namespace_cache: None,
        })
    }

    pub fn namespace_built(&self) -> bool {
        self.namespace_cache.is_some()
    }

    fn frozen_check(&self, what: &str) -> Result<(), ProblemError> {
        if self.namespace_built() {
            return Err(ProblemError::NamespaceFrozen(what.to_string()));
        }
        Ok(())
    }

    /// Registers a parameter usable in equation strings. Numbers cast to
    /// constant leaves via `Expr::from`.
    pub fn add_parameter(
        &mut self,
        name: &str,
        value: impl Into<Expr>,
    ) -> Result<(), ProblemError> {
        self.frozen_check("add a parameter")?;
        if !crate::symbolic::utils::is_valid_identifier(name) {
            return Err(ProblemError::InvalidIdentifier(name.to_string()));
        }
        if self.parameters.iter().any(|(n, _)| n == name) {
            return Err(ProblemError::NameConflict(name.to_string()));
        }
        self.parameters.push((name.to_string(), value.into()));
        Ok(())
    }

    /// Registers a substitution; `signature` is either a bare name or a call
    /// signature like `"lap(f)"`. Validation happens at namespace build.
    pub fn add_substitution(&mut self, signature: &str, body: &str) -> Result<(), ProblemError> {
        self.frozen_check("add a substitution")?;
        self.substitutions
            .push((signature.to_string(), body.to_string()));
        Ok(())
    }

    fn variable_index(&self, var: &str) -> Result<usize, ProblemError> {
        self.variables
            .iter()
            .position(|v| v == var)
            .ok_or_else(|| ProblemError::InvalidMetadata(format!("unknown variable '{}'", var)))
    }

    /// Declares a variable even (+1) or odd (-1) about the origin of a
    /// parity axis.
    pub fn set_parity(&mut self, var: &str, axis: usize, parity: i8) -> Result<(), ProblemError> {
        self.frozen_check("change variable metadata")?;
        let index = self.variable_index(var)?;
        let basis = self.domain.basis(axis).ok_or_else(|| {
            ProblemError::InvalidMetadata(format!("axis {} out of range", axis))
        })?;
        if !basis.has_parity() {
            return Err(ProblemError::InvalidMetadata(format!(
                "basis '{}' does not carry parity",
                basis.name
            )));
        }
        if parity != 1 && parity != -1 {
            return Err(ProblemError::InvalidMetadata(format!(
                "parity must be +1 or -1, got {}",
                parity
            )));
        }
        self.meta[index].0[axis].parity = parity;
        Ok(())
    }

    /// Declares a variable constant along an axis.
    pub fn set_constant(
        &mut self,
        var: &str,
        axis: usize,
        constant: bool,
    ) -> Result<(), ProblemError> {
        self.frozen_check("change variable metadata")?;
        let index = self.variable_index(var)?;
        if axis >= self.domain.dim() {
            return Err(ProblemError::InvalidMetadata(format!(
                "axis {} out of range",
                axis
            )));
        }
        self.meta[index].0[axis].constant = constant;
        Ok(())
    }

    /// Returns the cached parsing namespace, building it on first use:
    /// grids and their derivative operators, builtin functions, variable
    /// fields, parameters, variant-injected entries, then substitutions.
    pub fn namespace(
        &mut self,
        augmentation: &[(String, NamespaceEntry)],
    ) -> Result<&Namespace, ProblemError> {
        if self.namespace_cache.is_none() {
            let namespace = self.build_namespace(augmentation)?;
            self.namespace_cache = Some(namespace);
        }
        // cache is filled just above
        match self.namespace_cache.as_ref() {
            Some(namespace) => Ok(namespace),
            None => Err(ProblemError::NamespaceFrozen("access namespace".to_string())),
        }
    }

    fn build_namespace(
        &self,
        augmentation: &[(String, NamespaceEntry)],
    ) -> Result<Namespace, ProblemError> {
        debug!("building problem namespace");
        let mut namespace = Namespace::new();
        for (axis, basis) in self.domain.bases.iter().enumerate() {
            let grid = self
                .domain
                .grid_array(axis)
                .map_err(ProblemError::InvalidMetadata)?;
            namespace.set(&basis.name, NamespaceEntry::Expression(grid))?;
            namespace.set(
                &basis.diff_name(),
                NamespaceEntry::Operator(OperatorSpec::Differentiate {
                    name: basis.diff_name(),
                    axis,
                    separable: basis.separable(),
                }),
            )?;
        }
        for (name, builtin) in [
            ("sin", BuiltinFn::Sin),
            ("cos", BuiltinFn::Cos),
            ("exp", BuiltinFn::Exp),
            ("ln", BuiltinFn::Ln),
            ("log", BuiltinFn::Ln),
        ] {
            namespace.set(name, NamespaceEntry::Operator(OperatorSpec::Builtin(builtin)))?;
        }
        for (var, meta) in self.variables.iter().zip(&self.meta) {
            namespace.set(
                var,
                NamespaceEntry::Expression(Expr::Field {
                    name: var.clone(),
                    meta: meta.clone(),
                }),
            )?;
        }
        for (name, expr) in &self.parameters {
            namespace.set(name, NamespaceEntry::Expression(expr.clone()))?;
        }
        for (name, entry) in augmentation {
            namespace.set(name, entry.clone())?;
        }
        namespace.add_substitutions(
            self.substitutions
                .iter()
                .map(|(s, b)| (s.as_str(), b.as_str())),
        )?;
        debug!("namespace entries: {:?}", namespace.names());
        Ok(namespace)
    }

    /// Variable names as borrowed strings, the shape dependency checks want.
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|s| s.as_str()).collect()
    }

    /// Derivative operators along the coupled (non-separable) axes.
    pub fn coupled_diff_names(&self) -> Vec<String> {
        self.domain
            .coupled_axes()
            .into_iter()
            .map(|axis| self.domain.bases[axis].diff_name())
            .collect()
    }

    /// Splits and parses an equation string within `namespace`. `index` is
    /// the position the entry would take in its equation or bc list, so
    /// failures name the offending entry and side.
    pub fn parse_sides(
        namespace: &Namespace,
        equation: &str,
        index: usize,
    ) -> Result<(String, String, Expr, Expr), ProblemError> {
        let (raw_lhs, raw_rhs) = split_equation(equation)
            .map_err(|reason| ProblemError::malformed(equation, index, reason))?;
        debug!("LHS string form: {}", raw_lhs);
        debug!("RHS string form: {}", raw_rhs);
        let lhs = parse_expression(&raw_lhs, namespace)
            .map_err(|reason| ProblemError::parsing(equation, index, "LHS", reason))?;
        let rhs = parse_expression(&raw_rhs, namespace)
            .map_err(|reason| ProblemError::parsing(equation, index, "RHS", reason))?;
        debug!("LHS object form: {}", lhs);
        debug!("RHS object form: {}", rhs);
        Ok((raw_lhs, raw_rhs, lhs, rhs))
    }

    pub fn require_zero(&self, expr: &Expr, equation: &str, what: &str) -> Result<(), ProblemError> {
        if !expr.simplify_().is_zero() {
            return Err(ProblemError::unsupported(
                equation,
                format!("{} must be zero", what),
            ));
        }
        Ok(())
    }

    pub fn require_independent(
        &self,
        expr: &Expr,
        names: &[&str],
        equation: &str,
        what: &str,
    ) -> Result<(), ProblemError> {
        if expr.has(names) {
            return Err(ProblemError::unsupported(
                equation,
                format!("{} must be independent of {:?}", what, names),
            ));
        }
        Ok(())
    }

    /// Checks that `expr` is at most first order in the named operators and
    /// returns the order found.
    pub fn require_first_order(
        &self,
        expr: &Expr,
        ops: &[&str],
        equation: &str,
        what: &str,
    ) -> Result<usize, ProblemError> {
        let order = expr.order(ops);
        if order > 1 {
            return Err(ProblemError::unsupported(
                equation,
                format!("{} appear at order {}, first order required", what, order),
            ));
        }
        Ok(order)
    }

    /// Propagated-metadata agreement between the two equation sides, one
    /// rule per `MetaKey`.
    pub fn check_meta_consistency(
        &self,
        lhs: &Expr,
        rhs: &Expr,
        equation: &str,
    ) -> Result<(), ProblemError> {
        let parity_axes = self.domain.parity_axes();
        let lhs_meta = lhs
            .meta(&parity_axes)
            .map_err(|reason| ProblemError::unsupported(equation, reason))?;
        let rhs_meta = rhs
            .meta(&parity_axes)
            .map_err(|reason| ProblemError::unsupported(equation, reason))?;
        let rhs_nonzero = !rhs.simplify_().is_zero();
        for key in META_KEYS {
            for axis in 0..self.domain.dim() {
                let basis = &self.domain.bases[axis];
                let (l, r) = (&lhs_meta.0[axis], &rhs_meta.0[axis]);
                match key {
                    MetaKey::Scale => {}
                    MetaKey::Constant => {
                        if l.constant && !r.constant {
                            return Err(ProblemError::unsupported(
                                equation,
                                format!(
                                    "LHS is constant along '{}' but RHS is not",
                                    basis.name
                                ),
                            ));
                        }
                    }
                    MetaKey::Parity => {
                        if rhs_nonzero && r.parity != 0 && l.parity != r.parity {
                            return Err(ProblemError::unsupported(
                                equation,
                                format!(
                                    "LHS parity {} does not match RHS parity {} along '{}'",
                                    l.parity, r.parity, basis.name
                                ),
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Boundary conditions must reduce to constants along every coupled
    /// axis so they can pin boundary rows.
    pub fn check_boundary_form(
        &self,
        lhs: &Expr,
        rhs: &Expr,
        equation: &str,
    ) -> Result<(), ProblemError> {
        let parity_axes = self.domain.parity_axes();
        let lhs_meta = lhs
            .meta(&parity_axes)
            .map_err(|reason| ProblemError::unsupported(equation, reason))?;
        let rhs_meta = rhs
            .meta(&parity_axes)
            .map_err(|reason| ProblemError::unsupported(equation, reason))?;
        for axis in self.domain.coupled_axes() {
            let basis = &self.domain.bases[axis];
            if !lhs_meta.0[axis].constant || !rhs_meta.0[axis].constant {
                return Err(ProblemError::unsupported(
                    equation,
                    format!(
                        "boundary condition must be constant along coupled axis '{}'",
                        basis.name
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Canonicalizes `expr` as a linear form over `vars`.
    pub fn prep_linear_form(
        &self,
        expr: &Expr,
        vars: &[&str],
        equation: &str,
        label: &str,
    ) -> Result<LinearForm, ProblemError> {
        let canonical = expr
            .canonical_linear_form(vars)
            .map_err(|reason| ProblemError::unsupported(equation, reason))?;
        debug!("{} linear form: {}", label, canonical);
        Ok(LinearForm {
            expr: canonical,
            vars: vars.iter().map(|v| v.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::domain::Basis;

    fn core() -> ProblemCore {
        let domain = Domain::new(vec![Basis::chebyshev("x", 8, (-1.0, 1.0))]).unwrap();
        ProblemCore::new(domain, &["u"]).unwrap()
    }

    #[test]
    fn test_variable_collides_with_basis() {
        let domain = Domain::new(vec![Basis::chebyshev("x", 8, (-1.0, 1.0))]).unwrap();
        assert!(matches!(
            ProblemCore::new(domain.clone(), &["x"]),
            Err(ProblemError::NameConflict(_))
        ));
        assert!(matches!(
            ProblemCore::new(domain, &["dx"]),
            Err(ProblemError::NameConflict(_))
        ));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let mut core = core();
        core.add_parameter("nu", 0.5).unwrap();
        assert!(matches!(
            core.add_parameter("nu", 1.0),
            Err(ProblemError::NameConflict(_))
        ));
    }

    #[test]
    fn test_mutation_rejected_after_namespace_build() {
        let mut core = core();
        core.namespace(&[]).unwrap();
        assert!(matches!(
            core.add_parameter("nu", 0.5),
            Err(ProblemError::NamespaceFrozen(_))
        ));
        assert!(matches!(
            core.add_substitution("lap(f)", "dx(dx(f))"),
            Err(ProblemError::NamespaceFrozen(_))
        ));
        assert!(matches!(
            core.set_constant("u", 0, true),
            Err(ProblemError::NamespaceFrozen(_))
        ));
    }

    #[test]
    fn test_namespace_contents() {
        let mut core = core();
        core.add_parameter("nu", 0.5).unwrap();
        let ns = core.namespace(&[]).unwrap();
        for name in ["x", "dx", "sin", "cos", "exp", "ln", "u", "nu"] {
            assert!(ns.contains(name), "missing '{}'", name);
        }
    }

    #[test]
    fn test_parity_only_on_parity_bases() {
        let mut core = core();
        assert!(matches!(
            core.set_parity("u", 0, -1),
            Err(ProblemError::InvalidMetadata(_))
        ));
        let domain = Domain::new(vec![Basis::sin_cos("x", 8, (0.0, 1.0))]).unwrap();
        let mut core = ProblemCore::new(domain, &["u"]).unwrap();
        core.set_parity("u", 0, -1).unwrap();
        assert_eq!(core.meta[0].0[0].parity, -1);
        assert!(core.set_parity("u", 0, 2).is_err());
    }
}
