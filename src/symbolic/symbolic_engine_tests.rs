/////////////////////////////TESTS////////////////////////////////////////////////////
/*
cross-module engine tests:
Display of operator chains
substitution and operator stripping
splitting a sum by a name
dependency tracking through operators
Newton-Kantorovich directional derivative patterns
metadata propagation through differentiation
order counting through quotients and transcendentals
*/

#[cfg(test)]
mod tests1 {
    use crate::symbolic::symbolic_engine::Expr;
    use crate::symbolic::symbolic_metadata::{AxisMeta, Meta};

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
            separable: false,
            arg: arg.boxed(),
        }
    }

    fn dt(arg: Expr) -> Expr {
        Expr::TimeDeriv {
            op: "dt".to_string(),
            arg: arg.boxed(),
        }
    }

    #[test]
    fn test_display_operator_chain() {
        let expr = dt(field("u")) - dx(dx(field("u")));
        assert_eq!(expr.to_string(), "(dt(u) - dx(dx(u)))");
        let expr = field("u").pow(Expr::Const(2.0));
        assert_eq!(expr.to_string(), "(u ** 2)");
    }

    #[test]
    fn test_from_f64() {
        let expr: Expr = 2.5.into();
        assert_eq!(expr, Expr::Const(2.5));
    }

    #[test]
    fn test_has_matches_operators_and_leaves() {
        let expr = dt(field("u")) + dx(field("v"));
        assert!(expr.has(&["u"]));
        assert!(expr.has(&["dt"]));
        assert!(expr.has(&["dx"]));
        assert!(!expr.has(&["w"]));
        assert!(!expr.has(&["dz"]));
    }

    #[test]
    fn test_replace_symbol_inside_operator() {
        let expr = dx(field("u")) + field("u");
        let replaced = expr.replace_symbol("u", &field("w"));
        assert_eq!(replaced, dx(field("w")) + field("w"));
    }

    #[test]
    fn test_strip_operator_nested() {
        assert_eq!(dt(field("u")).strip_operator("dt"), field("u"));
        assert_eq!(dt(dt(field("u"))).strip_operator("dt"), field("u"));
        // other operators survive
        assert_eq!(dt(dx(field("u"))).strip_operator("dt"), dx(field("u")));
    }

    #[test]
    fn test_split_by_operator_name() {
        let expr = dt(field("u")) - dx(dx(field("u")));
        let (with_dt, without_dt) = expr.split("dt");
        assert!(with_dt.has(&["dt"]));
        assert!(!without_dt.has(&["dt"]));
        assert!(without_dt.has(&["dx"]));
    }

    #[test]
    fn test_split_of_independent_expression() {
        let expr = dx(field("u"));
        let (with_dt, without_dt) = expr.split("dt");
        assert!(with_dt.is_zero());
        assert_eq!(without_dt, dx(field("u")));
    }

    #[test]
    fn test_directional_derivative_of_square() {
        // d/dε (u + ε·δu)**2 at ε = 0 is 2·u·δu
        let rhs = field("u").pow(Expr::Const(2.0));
        let eps = Expr::Scalar("ε".to_string());
        let shifted = rhs.replace_symbol("u", &(field("u") + eps * field("δu")));
        let direction = shifted.sym_diff("ε").set_scalar("ε", 0.0).simplify_();
        assert_eq!(
            direction,
            Expr::Mul(
                Expr::Mul(Expr::Const(2.0).boxed(), field("u").boxed()).boxed(),
                field("δu").boxed()
            )
        );
    }

    #[test]
    fn test_directional_derivative_of_sine() {
        // d/dε sin(u + ε·δu) at ε = 0 is cos(u)·δu
        let rhs = Expr::sin(field("u").boxed());
        let eps = Expr::Scalar("ε".to_string());
        let shifted = rhs.replace_symbol("u", &(field("u") + eps * field("δu")));
        let direction = shifted.sym_diff("ε").set_scalar("ε", 0.0).simplify_();
        assert_eq!(
            direction,
            Expr::Mul(
                Expr::cos(field("u").boxed()).boxed(),
                field("δu").boxed()
            )
        );
    }

    #[test]
    fn test_parity_flips_under_differentiation() {
        // an odd field on a parity axis becomes even under d/dx
        let u = Expr::Field {
            name: "u".to_string(),
            meta: Meta(vec![AxisMeta {
                scale: 1.0,
                constant: false,
                parity: -1,
            }]),
        };
        let parity_axes = [true];
        assert_eq!(u.meta(&parity_axes).unwrap().0[0].parity, -1);
        assert_eq!(dx(u).meta(&parity_axes).unwrap().0[0].parity, 1);
    }

    #[test]
    fn test_order_through_quotient_and_transcendental() {
        let vars = ["u"];
        let linear = Expr::Const(2.0) * dx(field("u"));
        assert_eq!(linear.order(&vars), 1);
        let quotient = Expr::Const(1.0) / field("u");
        assert!(quotient.order(&vars) >= 2);
        let transcendental = Expr::sin(field("u").boxed());
        assert!(transcendental.order(&vars) >= 2);
    }
}
