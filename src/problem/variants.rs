//! The four problem variants over the shared core.
//!
//! Each variant fixes three hooks: which extra names it injects into the
//! parsing namespace, which structural conditions its equations must meet,
//! and how a validated equation reduces to matrix forms. The add pipeline
//! itself (split, parse, shared checks, atomic append) is common.
//!
//! - initial value:      M * dt(X) + L * X = F(X, t)
//! - linear BVP:         L * X = F
//! - nonlinear BVP:      L * δX - dF * δX = F - L * X   (Newton-Kantorovich)
//! - eigenvalue:         σ * M * X + L * X = 0

use log::debug;
use strum_macros::Display;

use crate::problem::errors::ProblemError;
use crate::problem::namespace::{NamespaceEntry, OperatorSpec};
use crate::problem::problem_base::{
    EquationRecord, MatrixForms, NccOptions, ProblemCore, PERTURBATION_PREFIX,
};
use crate::problem::domain::Domain;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_metadata::Meta;
use crate::symbolic::utils::is_valid_identifier;

/// Scalar used only while forming Frechet derivatives; it never enters the
/// parsing namespace.
const FRECHET_EPSILON: &str = "ε";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SolverKind {
    InitialValue,
    LinearBoundaryValue,
    NonlinearBoundaryValue,
    Eigenvalue,
}

/// Everything the external solver-construction layer needs from a problem.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSpec {
    pub kind: SolverKind,
    pub variables: Vec<String>,
    pub meta: Vec<Meta>,
    pub equations: Vec<EquationRecord>,
    pub boundary_conditions: Vec<EquationRecord>,
    pub ncc_options: NccOptions,
}

/// Common add-equation/add-bc pipeline with variant hooks.
pub trait ProblemVariant {
    fn core(&self) -> &ProblemCore;
    fn core_mut(&mut self) -> &mut ProblemCore;
    fn kind(&self) -> SolverKind;

    /// Extra namespace entries this variant injects before substitutions
    /// expand, so substitutions may reference them.
    fn augment_namespace(&self) -> Vec<(String, NamespaceEntry)>;

    /// Structural conditions beyond the shared ones.
    fn check_conditions(&self, lhs: &Expr, rhs: &Expr, equation: &str)
        -> Result<(), ProblemError>;

    /// Reduction of a validated equation to matrix forms.
    fn matrix_forms(&self, lhs: &Expr, rhs: &Expr, equation: &str)
        -> Result<MatrixForms, ProblemError>;

    fn add_equation(&mut self, equation: &str) -> Result<(), ProblemError> {
        self.add_equation_with_condition(equation, "True")
    }

    fn add_equation_with_condition(
        &mut self,
        equation: &str,
        condition: &str,
    ) -> Result<(), ProblemError> {
        let record = self.build_record(equation, condition, false)?;
        self.core_mut().equations.push(record);
        Ok(())
    }

    fn add_bc(&mut self, equation: &str) -> Result<(), ProblemError> {
        self.add_bc_with_condition(equation, "True")
    }

    fn add_bc_with_condition(
        &mut self,
        equation: &str,
        condition: &str,
    ) -> Result<(), ProblemError> {
        let record = self.build_record(equation, condition, true)?;
        self.core_mut().boundary_conditions.push(record);
        Ok(())
    }

    /// Full pipeline for one equation; nothing is stored unless every stage
    /// succeeds.
    fn build_record(
        &mut self,
        equation: &str,
        condition: &str,
        is_bc: bool,
    ) -> Result<EquationRecord, ProblemError> {
        debug!("parsing {}: {}", if is_bc { "bc" } else { "equation" }, equation);
        let index = if is_bc {
            self.core().boundary_conditions.len()
        } else {
            self.core().equations.len()
        };
        let augmentation = self.augment_namespace();
        let namespace = self.core_mut().namespace(&augmentation)?.copy();
        let (raw_lhs, raw_rhs, lhs, rhs) = ProblemCore::parse_sides(&namespace, equation, index)?;

        let core = self.core();
        core.check_meta_consistency(&lhs, &rhs, equation)?;
        let coupled = core.coupled_diff_names();
        let coupled_refs: Vec<&str> = coupled.iter().map(|s| s.as_str()).collect();
        core.require_first_order(&lhs, &coupled_refs, equation, "coupled derivatives")?;
        if is_bc {
            core.check_boundary_form(&lhs, &rhs, equation)?;
        }
        self.check_conditions(&lhs, &rhs, equation)?;
        let forms = self.matrix_forms(&lhs, &rhs, equation)?;
        let differential = lhs.has(&coupled_refs);

        Ok(EquationRecord {
            raw_equation: equation.to_string(),
            raw_condition: condition.to_string(),
            raw_LHS: raw_lhs,
            raw_RHS: raw_rhs,
            LHS: lhs,
            RHS: rhs,
            differential,
            forms,
        })
    }

    /// Snapshot handed to the solver-construction layer.
    fn build_solver(&self) -> SolverSpec {
        let core = self.core();
        SolverSpec {
            kind: self.kind(),
            variables: core.variables.clone(),
            meta: core.meta.clone(),
            equations: core.equations.clone(),
            boundary_conditions: core.boundary_conditions.clone(),
            ncc_options: core.ncc_options.clone(),
        }
    }

    // core delegation, so callers never touch the core directly

    fn add_parameter(&mut self, name: &str, value: impl Into<Expr>) -> Result<(), ProblemError>
    where
        Self: Sized,
    {
        self.core_mut().add_parameter(name, value)
    }

    fn add_substitution(&mut self, signature: &str, body: &str) -> Result<(), ProblemError> {
        self.core_mut().add_substitution(signature, body)
    }

    fn set_parity(&mut self, var: &str, axis: usize, parity: i8) -> Result<(), ProblemError> {
        self.core_mut().set_parity(var, axis, parity)
    }

    fn set_constant(&mut self, var: &str, axis: usize, constant: bool) -> Result<(), ProblemError> {
        self.core_mut().set_constant(var, axis, constant)
    }
}

/// M * dt(X) + L * X = F(X, t)
#[derive(Debug, Clone)]
pub struct InitialValueProblem {
    core: ProblemCore,
    time: String,
}

pub type IVP = InitialValueProblem;

impl InitialValueProblem {
    pub fn new(domain: Domain, variables: &[&str]) -> Result<Self, ProblemError> {
        Self::with_time(domain, variables, "t")
    }

    pub fn with_time(domain: Domain, variables: &[&str], time: &str) -> Result<Self, ProblemError> {
        if !is_valid_identifier(time) {
            return Err(ProblemError::InvalidIdentifier(time.to_string()));
        }
        let core = ProblemCore::new(domain, variables)?;
        if core.variables.iter().any(|v| v == time) {
            return Err(ProblemError::NameConflict(time.to_string()));
        }
        Ok(InitialValueProblem {
            core,
            time: time.to_string(),
        })
    }

    /// Name of the time derivative operator, `dt` for time `t`.
    pub fn time_op(&self) -> String {
        format!("d{}", self.time)
    }
}

impl ProblemVariant for InitialValueProblem {
    fn core(&self) -> &ProblemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProblemCore {
        &mut self.core
    }

    fn kind(&self) -> SolverKind {
        SolverKind::InitialValue
    }

    fn augment_namespace(&self) -> Vec<(String, NamespaceEntry)> {
        vec![
            (
                self.time.clone(),
                NamespaceEntry::Expression(Expr::Scalar(self.time.clone())),
            ),
            (
                self.time_op(),
                NamespaceEntry::Operator(OperatorSpec::TimeDerivative {
                    name: self.time_op(),
                }),
            ),
        ]
    }

    fn check_conditions(
        &self,
        lhs: &Expr,
        rhs: &Expr,
        equation: &str,
    ) -> Result<(), ProblemError> {
        let dt = self.time_op();
        self.core
            .require_first_order(lhs, &[dt.as_str()], equation, "time derivatives")?;
        self.core
            .require_independent(lhs, &[self.time.as_str()], equation, "LHS")?;
        self.core
            .require_independent(rhs, &[dt.as_str()], equation, "RHS")?;
        Ok(())
    }

    fn matrix_forms(
        &self,
        lhs: &Expr,
        rhs: &Expr,
        equation: &str,
    ) -> Result<MatrixForms, ProblemError> {
        let dt = self.time_op();
        let vars = self.core.variable_names();
        let (m_raw, l_raw) = lhs.split(&dt);
        // dt terms are first order, so stripping dt leaves the mass operand
        let m_stripped = m_raw.strip_operator(&dt);
        let mut forms = MatrixForms::empty();
        forms.M = self.core.prep_linear_form(&m_stripped, &vars, equation, "M")?;
        forms.L = self.core.prep_linear_form(&l_raw, &vars, equation, "L")?;
        forms.F = rhs.clone();
        Ok(forms)
    }
}

/// L * X = F with F independent of the variables.
#[derive(Debug, Clone)]
pub struct LinearBoundaryValueProblem {
    core: ProblemCore,
}

pub type LBVP = LinearBoundaryValueProblem;

impl LinearBoundaryValueProblem {
    pub fn new(domain: Domain, variables: &[&str]) -> Result<Self, ProblemError> {
        Ok(LinearBoundaryValueProblem {
            core: ProblemCore::new(domain, variables)?,
        })
    }
}

impl ProblemVariant for LinearBoundaryValueProblem {
    fn core(&self) -> &ProblemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProblemCore {
        &mut self.core
    }

    fn kind(&self) -> SolverKind {
        SolverKind::LinearBoundaryValue
    }

    fn augment_namespace(&self) -> Vec<(String, NamespaceEntry)> {
        Vec::new()
    }

    fn check_conditions(
        &self,
        _lhs: &Expr,
        rhs: &Expr,
        equation: &str,
    ) -> Result<(), ProblemError> {
        let vars = self.core.variable_names();
        self.core.require_independent(rhs, &vars, equation, "RHS")
    }

    fn matrix_forms(
        &self,
        lhs: &Expr,
        rhs: &Expr,
        equation: &str,
    ) -> Result<MatrixForms, ProblemError> {
        let vars = self.core.variable_names();
        let mut forms = MatrixForms::empty();
        forms.L = self.core.prep_linear_form(lhs, &vars, equation, "L")?;
        forms.F = rhs.clone();
        Ok(forms)
    }
}

/// Newton-Kantorovich formulation: the linear LHS acts on perturbation
/// fields, the RHS may be nonlinear in the variables and contributes its
/// Frechet derivative dF, and F - L is the residual at the current iterate.
#[derive(Debug, Clone)]
pub struct NonlinearBoundaryValueProblem {
    core: ProblemCore,
}

pub type NLBVP = NonlinearBoundaryValueProblem;

impl NonlinearBoundaryValueProblem {
    pub fn new(domain: Domain, variables: &[&str]) -> Result<Self, ProblemError> {
        Ok(NonlinearBoundaryValueProblem {
            core: ProblemCore::new(domain, variables)?,
        })
    }

    pub fn perturbation_names(&self) -> Vec<String> {
        self.core
            .variables
            .iter()
            .map(|v| format!("{}{}", PERTURBATION_PREFIX, v))
            .collect()
    }

    /// Sum over variables of the directional derivative of `rhs` along the
    /// matching perturbation: substitute var -> var + ε * δvar,
    /// differentiate in ε, set ε to zero.
    fn frechet_differential(&self, rhs: &Expr) -> Expr {
        let mut total = Expr::Const(0.0);
        for (var, meta) in self.core.variables.iter().zip(&self.core.meta) {
            let field = Expr::Field {
                name: var.clone(),
                meta: meta.clone(),
            };
            let perturbation = Expr::Field {
                name: format!("{}{}", PERTURBATION_PREFIX, var),
                meta: meta.clone(),
            };
            let shifted = rhs.replace_symbol(
                var,
                &(field + Expr::Scalar(FRECHET_EPSILON.to_string()) * perturbation),
            );
            let direction = shifted
                .sym_diff(FRECHET_EPSILON)
                .set_scalar(FRECHET_EPSILON, 0.0)
                .simplify_();
            total = total + direction;
        }
        total.simplify_()
    }
}

impl ProblemVariant for NonlinearBoundaryValueProblem {
    fn core(&self) -> &ProblemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProblemCore {
        &mut self.core
    }

    fn kind(&self) -> SolverKind {
        SolverKind::NonlinearBoundaryValue
    }

    fn augment_namespace(&self) -> Vec<(String, NamespaceEntry)> {
        self.core
            .variables
            .iter()
            .zip(&self.core.meta)
            .map(|(var, meta)| {
                let name = format!("{}{}", PERTURBATION_PREFIX, var);
                (
                    name.clone(),
                    NamespaceEntry::Expression(Expr::Field {
                        name,
                        meta: meta.clone(),
                    }),
                )
            })
            .collect()
    }

    fn check_conditions(
        &self,
        _lhs: &Expr,
        _rhs: &Expr,
        _equation: &str,
    ) -> Result<(), ProblemError> {
        Ok(())
    }

    fn matrix_forms(
        &self,
        lhs: &Expr,
        rhs: &Expr,
        equation: &str,
    ) -> Result<MatrixForms, ProblemError> {
        let perturbations = self.perturbation_names();
        let pert_refs: Vec<&str> = perturbations.iter().map(|s| s.as_str()).collect();

        let mut on_perturbations = lhs.clone();
        for ((var, meta), pert) in self
            .core
            .variables
            .iter()
            .zip(&self.core.meta)
            .zip(&perturbations)
        {
            on_perturbations = on_perturbations.replace_symbol(
                var,
                &Expr::Field {
                    name: pert.clone(),
                    meta: meta.clone(),
                },
            );
        }

        let mut forms = MatrixForms::empty();
        forms.L = self
            .core
            .prep_linear_form(&on_perturbations, &pert_refs, equation, "L")?;
        forms.F = rhs.clone();
        let frechet = self.frechet_differential(rhs);
        forms.dF = self
            .core
            .prep_linear_form(&frechet, &pert_refs, equation, "dF")?;
        forms.F_minus_L = (rhs.clone() - lhs.clone()).simplify_();
        Ok(forms)
    }
}

/// σ * M * X + L * X = 0 with the eigenvalue appearing at first order.
#[derive(Debug, Clone)]
pub struct EigenvalueProblem {
    core: ProblemCore,
    eigenvalue: String,
}

pub type EVP = EigenvalueProblem;

impl EigenvalueProblem {
    pub fn new(
        domain: Domain,
        variables: &[&str],
        eigenvalue: &str,
    ) -> Result<Self, ProblemError> {
        if !is_valid_identifier(eigenvalue) {
            return Err(ProblemError::InvalidIdentifier(eigenvalue.to_string()));
        }
        let core = ProblemCore::new(domain, variables)?;
        if core.variables.iter().any(|v| v == eigenvalue) {
            return Err(ProblemError::NameConflict(eigenvalue.to_string()));
        }
        Ok(EigenvalueProblem {
            core,
            eigenvalue: eigenvalue.to_string(),
        })
    }
}

impl ProblemVariant for EigenvalueProblem {
    fn core(&self) -> &ProblemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProblemCore {
        &mut self.core
    }

    fn kind(&self) -> SolverKind {
        SolverKind::Eigenvalue
    }

    fn augment_namespace(&self) -> Vec<(String, NamespaceEntry)> {
        vec![(
            self.eigenvalue.clone(),
            NamespaceEntry::Expression(Expr::Scalar(self.eigenvalue.clone())),
        )]
    }

    fn check_conditions(
        &self,
        lhs: &Expr,
        rhs: &Expr,
        equation: &str,
    ) -> Result<(), ProblemError> {
        self.core.require_zero(rhs, equation, "RHS")?;
        self.core.require_first_order(
            lhs,
            &[self.eigenvalue.as_str()],
            equation,
            "eigenvalue factors",
        )?;
        Ok(())
    }

    fn matrix_forms(
        &self,
        lhs: &Expr,
        _rhs: &Expr,
        equation: &str,
    ) -> Result<MatrixForms, ProblemError> {
        let vars = self.core.variable_names();
        let (m_raw, l_raw) = lhs.split(&self.eigenvalue);
        // the eigenvalue factors out of M, leave the operand behind
        let m_unit = m_raw.set_scalar(&self.eigenvalue, 1.0).simplify_();
        let mut forms = MatrixForms::empty();
        forms.M = self.core.prep_linear_form(&m_unit, &vars, equation, "M")?;
        forms.L = self.core.prep_linear_form(&l_raw, &vars, equation, "L")?;
        Ok(forms)
    }
}
