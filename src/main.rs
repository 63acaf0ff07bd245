#![allow(non_snake_case)]
use RustedSpectral::Utils::logger::init_console_logger;
use RustedSpectral::problem::domain::{Basis, Domain};
use RustedSpectral::problem::variants::{ProblemVariant, EVP, IVP, NLBVP};

fn main() {
    init_console_logger(Some("debug")).unwrap();
    let example = 0;
    match example {
        0 => {
            // 1-d diffusion on a Fourier line, M * dt(X) + L * X = F
            let domain =
                Domain::new(vec![Basis::fourier("x", 64, (0.0, 2.0 * std::f64::consts::PI))])
                    .unwrap();
            let mut problem = IVP::new(domain, &["u"]).unwrap();
            problem.add_parameter("nu", 0.1).unwrap();
            problem.add_equation("dt(u) - nu*dx(dx(u)) = 0").unwrap();
            let spec = problem.build_solver();
            let record = &spec.equations[0];
            println!("equation: {}", record.raw_equation);
            println!("M linear form: {}", record.forms.M.expr);
            println!("L linear form: {}", record.forms.L.expr);
        }
        1 => {
            // nonlinear BVP on a Chebyshev segment, written first order in dz
            let domain = Domain::new(vec![Basis::chebyshev("z", 32, (-1.0, 1.0))]).unwrap();
            let mut problem = NLBVP::new(domain, &["u", "uz"]).unwrap();
            problem.add_substitution("lap(f)", "dz(f)").unwrap();
            problem.add_equation("uz - dz(u) = 0").unwrap();
            problem.add_equation("lap(uz) = u**2").unwrap();
            let spec = problem.build_solver();
            for record in &spec.equations {
                println!("equation: {}", record.raw_equation);
                println!("  L  on perturbations: {}", record.forms.L.expr);
                println!("  dF on perturbations: {}", record.forms.dF.expr);
                println!("  residual F - L: {}", record.forms.F_minus_L);
            }
        }
        2 => {
            // wave eigenmodes, sigma * M * X + L * X = 0
            let domain =
                Domain::new(vec![Basis::fourier("x", 32, (0.0, 2.0 * std::f64::consts::PI))])
                    .unwrap();
            let mut problem = EVP::new(domain, &["u"], "sigma").unwrap();
            problem.add_equation("sigma*u + dx(u) = 0").unwrap();
            let spec = problem.build_solver();
            let record = &spec.equations[0];
            println!("M linear form: {}", record.forms.M.expr);
            println!("L linear form: {}", record.forms.L.expr);
        }
        _ => {
            println!("example not found");
        }
    }
}
