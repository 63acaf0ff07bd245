/////////////////////////////TESTS////////////////////////////////////////////////////
/*
end-to-end problem formulation tests:
IVP mass/stiffness extraction and strip-to-identity
second order time derivatives rejected, explicit time kept off the LHS
forcing stored as written
coupled derivatives must be first order
LBVP source independence
NLBVP perturbation forms and Frechet derivatives
EVP zero RHS and eigenvalue splitting
boundary conditions constant along coupled axes
metadata consistency (constancy implication, parity equality)
substitution macros inside equations
condition strings, atomicity, frozen namespace
parse errors carry the entry index and the failing side
*/

#[cfg(test)]
mod tests1 {
    use crate::problem::domain::{Basis, Domain};
    use crate::problem::errors::ProblemError;
    use crate::problem::variants::{
        EigenvalueProblem, InitialValueProblem, LinearBoundaryValueProblem,
        NonlinearBoundaryValueProblem, ProblemVariant, SolverKind, EVP, IVP, LBVP, NLBVP,
    };
    use crate::symbolic::symbolic_engine::Expr;
    use crate::symbolic::symbolic_metadata::Meta;

    fn fourier_line() -> Domain {
        Domain::new(vec![Basis::fourier("x", 16, (0.0, 2.0 * std::f64::consts::PI))]).unwrap()
    }

    fn chebyshev_line() -> Domain {
        Domain::new(vec![Basis::chebyshev("z", 16, (-1.0, 1.0))]).unwrap()
    }

    fn field(name: &str) -> Expr {
        Expr::Field {
            name: name.to_string(),
            meta: Meta::for_field(1),
        }
    }

    fn dx(arg: Expr) -> Expr {
        Expr::Diff {
            op: "dx".to_string(),
            axis: 0,
            separable: true,
            arg: arg.boxed(),
        }
    }

    fn dz(arg: Expr) -> Expr {
        Expr::Diff {
            op: "dz".to_string(),
            axis: 0,
            separable: false,
            arg: arg.boxed(),
        }
    }

    #[test]
    fn test_ivp_mass_and_stiffness_forms() {
        let mut problem = InitialValueProblem::new(fourier_line(), &["u"]).unwrap();
        problem.add_equation("dt(u) - dx(dx(u)) = 0").unwrap();
        let record = &problem.core().equations[0];
        // dt is stripped to the identity on its operand
        assert_eq!(record.forms.M.expr, field("u"));
        assert_eq!(
            record.forms.L.expr,
            Expr::Mul(Expr::Const(-1.0).boxed(), dx(dx(field("u"))).boxed())
        );
        assert!(record.forms.F.is_zero());
        // Fourier is separable, nothing couples
        assert!(!record.differential);
    }

    #[test]
    fn test_ivp_numeric_parameter_folds_into_coefficient() {
        let mut problem = IVP::new(fourier_line(), &["u"]).unwrap();
        problem.add_parameter("nu", 0.5).unwrap();
        problem.add_equation("dt(u) - nu*dx(dx(u)) = 0").unwrap();
        let record = &problem.core().equations[0];
        assert_eq!(
            record.forms.L.expr,
            Expr::Mul(Expr::Const(-0.5).boxed(), dx(dx(field("u"))).boxed())
        );
    }

    #[test]
    fn test_ivp_second_order_time_rejected() {
        let mut problem = IVP::new(fourier_line(), &["u"]).unwrap();
        let err = problem.add_equation("dt(dt(u)) = 0").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));
        assert!(problem.core().equations.is_empty());
    }

    #[test]
    fn test_ivp_rhs_may_not_contain_time_derivatives() {
        let mut problem = IVP::new(fourier_line(), &["u"]).unwrap();
        let err = problem.add_equation("dt(u) = dt(u)").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));
    }

    #[test]
    fn test_ivp_lhs_must_be_time_independent() {
        let mut problem = IVP::new(fourier_line(), &["u"]).unwrap();
        let err = problem.add_equation("dt(u) + t*u = 0").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));
        assert!(problem.core().equations.is_empty());
        // the forcing side may still depend on time
        problem.add_equation("dt(u) = t").unwrap();
    }

    #[test]
    fn test_forcing_keeps_rhs_as_written() {
        let mut problem = IVP::new(fourier_line(), &["u"]).unwrap();
        problem.add_equation("dt(u) = sin(x) + 0").unwrap();
        let record = &problem.core().equations[0];
        assert_eq!(record.forms.F, record.RHS);
        assert!(matches!(record.forms.F, Expr::Add(_, _)));
    }

    #[test]
    fn test_coupled_derivatives_must_be_first_order() {
        let mut problem = LinearBoundaryValueProblem::new(chebyshev_line(), &["u", "uz"]).unwrap();
        let err = problem.add_equation("dz(dz(u)) = 0").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));
        // the first-order reduction is accepted and marked differential
        problem.add_equation("uz - dz(u) = 0").unwrap();
        problem.add_equation("dz(uz) = 0").unwrap();
        assert!(problem.core().equations[0].differential);
        assert!(problem.core().equations[1].differential);
    }

    #[test]
    fn test_lbvp_rhs_must_be_independent_of_variables() {
        let mut problem = LBVP::new(chebyshev_line(), &["u", "uz"]).unwrap();
        let err = problem.add_equation("dz(u) = u").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));
    }

    #[test]
    fn test_lbvp_nonlinear_lhs_rejected() {
        let mut problem = LBVP::new(chebyshev_line(), &["u", "uz"]).unwrap();
        let err = problem.add_equation("u*uz = 1").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));
    }

    #[test]
    fn test_nlbvp_frechet_of_square() {
        let mut problem = NonlinearBoundaryValueProblem::new(chebyshev_line(), &["u"]).unwrap();
        problem.add_equation("dz(u) = u**2").unwrap();
        let record = &problem.core().equations[0];
        // the linear part acts on the perturbation field
        assert_eq!(record.forms.L.expr, dz(field("δu")));
        assert_eq!(
            record.forms.dF.expr,
            Expr::Mul(
                Expr::Mul(Expr::Const(2.0).boxed(), field("u").boxed()).boxed(),
                field("δu").boxed()
            )
        );
        assert_eq!(
            record.forms.F,
            field("u").pow(Expr::Const(2.0))
        );
        assert!(record.forms.F_minus_L.has(&["dz"]));
    }

    #[test]
    fn test_nlbvp_frechet_of_sine() {
        let mut problem = NLBVP::new(chebyshev_line(), &["u"]).unwrap();
        problem.add_equation("dz(u) = sin(u)").unwrap();
        let record = &problem.core().equations[0];
        assert_eq!(
            record.forms.dF.expr,
            Expr::Mul(
                Expr::cos(field("u").boxed()).boxed(),
                field("δu").boxed()
            )
        );
    }

    #[test]
    fn test_evp_requires_zero_rhs() {
        let mut problem = EigenvalueProblem::new(fourier_line(), &["u"], "sigma").unwrap();
        let err = problem.add_equation("sigma*u + dx(u) = 1").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));
    }

    #[test]
    fn test_evp_eigenvalue_split_and_unit_scaling() {
        let mut problem = EVP::new(fourier_line(), &["u"], "sigma").unwrap();
        problem.add_equation("sigma*u + dx(u) = 0").unwrap();
        let record = &problem.core().equations[0];
        // the eigenvalue factors out of the mass branch
        assert_eq!(record.forms.M.expr, field("u"));
        assert_eq!(record.forms.L.expr, dx(field("u")));
    }

    #[test]
    fn test_evp_eigenvalue_must_be_first_order() {
        let mut problem = EVP::new(fourier_line(), &["u"], "sigma").unwrap();
        let err = problem.add_equation("sigma*sigma*u + dx(u) = 0").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));
    }

    #[test]
    fn test_bc_must_be_constant_along_coupled_axis() {
        let mut problem = LBVP::new(chebyshev_line(), &["u", "uz"]).unwrap();
        let err = problem.add_bc("u = 0").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));

        let mut problem = LBVP::new(chebyshev_line(), &["u", "uz"]).unwrap();
        problem.set_constant("u", 0, true).unwrap();
        problem.add_bc("u = 0").unwrap();
        assert_eq!(problem.core().boundary_conditions.len(), 1);
    }

    #[test]
    fn test_constant_lhs_forces_constant_rhs() {
        let mut problem = LBVP::new(chebyshev_line(), &["u"]).unwrap();
        problem.set_constant("u", 0, true).unwrap();
        let err = problem.add_equation("u = z").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));
    }

    #[test]
    fn test_parity_mismatch_with_nonzero_rhs_rejected() {
        let parity_line = Domain::new(vec![Basis::sin_cos("x", 16, (0.0, 1.0))]).unwrap();
        let mut problem = LBVP::new(parity_line.clone(), &["u"]).unwrap();
        problem.set_parity("u", 0, -1).unwrap();
        // dx flips the odd field to even, the grid coordinate is odd
        let err = problem.add_equation("dx(u) = x").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));

        let mut problem = LBVP::new(parity_line, &["u"]).unwrap();
        problem.set_parity("u", 0, -1).unwrap();
        // matching parities are fine
        problem.add_equation("u = x").unwrap();
    }

    #[test]
    fn test_indefinite_lhs_parity_cannot_match_definite_rhs() {
        let parity_line = Domain::new(vec![Basis::sin_cos("x", 16, (0.0, 1.0))]).unwrap();
        let mut problem = LBVP::new(parity_line, &["u"]).unwrap();
        // u carries no parity declaration, the grid coordinate is odd
        let err = problem.add_equation("u = x").unwrap_err();
        assert!(matches!(err, ProblemError::UnsupportedEquation { .. }));
    }

    #[test]
    fn test_substitution_macro_in_equation() {
        let mut problem = LBVP::new(chebyshev_line(), &["u", "uz"]).unwrap();
        problem.add_substitution("twice(f)", "2*f").unwrap();
        problem.add_equation("twice(uz) - dz(u) = 0").unwrap();
        let record = &problem.core().equations[0];
        assert!(record.forms.L.expr.has(&["uz"]));
        assert!(record.forms.L.expr.has(&["dz"]));
    }

    #[test]
    fn test_condition_strings_are_stored() {
        let mut problem = IVP::new(fourier_line(), &["u"]).unwrap();
        problem.add_equation("dt(u) = 0").unwrap();
        problem
            .add_equation_with_condition("dt(u) + u = 0", "nx != 0")
            .unwrap();
        assert_eq!(problem.core().equations[0].raw_condition, "True");
        assert_eq!(problem.core().equations[1].raw_condition, "nx != 0");
    }

    #[test]
    fn test_malformed_equation_rejected() {
        let mut problem = IVP::new(fourier_line(), &["u"]).unwrap();
        assert!(matches!(
            problem.add_equation("dt(u) + u"),
            Err(ProblemError::MalformedEquation { .. })
        ));
        assert!(matches!(
            problem.add_equation("dt(u) = 0 = 0"),
            Err(ProblemError::MalformedEquation { .. })
        ));
    }

    #[test]
    fn test_failed_add_is_atomic() {
        let mut problem = IVP::new(fourier_line(), &["u"]).unwrap();
        assert!(matches!(
            problem.add_equation("dt(u) + w = 0"),
            Err(ProblemError::SymbolicParsing { .. })
        ));
        assert!(problem.core().equations.is_empty());
        problem.add_equation("dt(u) = 0").unwrap();
        assert_eq!(problem.core().equations.len(), 1);
    }

    #[test]
    fn test_parse_errors_name_entry_and_side() {
        let mut problem = IVP::new(fourier_line(), &["u"]).unwrap();
        problem.add_equation("dt(u) = 0").unwrap();
        let err = problem.add_equation("dt(u) = w").unwrap_err();
        match err {
            ProblemError::SymbolicParsing { index, side, .. } => {
                assert_eq!(index, 1);
                assert_eq!(side, "RHS");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parameter_mutation_rejected_after_first_equation() {
        let mut problem = IVP::new(fourier_line(), &["u"]).unwrap();
        problem.add_equation("dt(u) = 0").unwrap();
        assert!(matches!(
            problem.add_parameter("nu", 1.0),
            Err(ProblemError::NamespaceFrozen(_))
        ));
    }

    #[test]
    fn test_build_solver_snapshot() {
        let mut problem = LBVP::new(chebyshev_line(), &["u", "uz"]).unwrap();
        problem.set_constant("uz", 0, false).unwrap();
        problem.add_equation("uz - dz(u) = 0").unwrap();
        problem.add_equation("dz(uz) = 1").unwrap();
        let spec = problem.build_solver();
        assert_eq!(spec.kind, SolverKind::LinearBoundaryValue);
        assert_eq!(spec.variables, vec!["u".to_string(), "uz".to_string()]);
        assert_eq!(spec.equations.len(), 2);
        assert!(spec.boundary_conditions.is_empty());
        assert_eq!(spec.ncc_options.cutoff, 1e-10);
    }
}
