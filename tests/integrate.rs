use flatcas::calculus::{choose, order_for_ilate, unfindable_substitution};
use flatcas::{
    derive, integrate, integrate_with, parse_expr, shrink, Expr, Function, IntegrateOptions,
    IntegrationResult, Operator, Strategy,
};

fn antiderivative(input: &str) -> Option<flatcas::Expr> {
    let expr = parse_expr(input).expect("parse input");
    integrate(&expr, "x").into_result()
}

fn assert_integral_eq(input: &str, expected: &str) {
    let got = antiderivative(input).unwrap_or_else(|| panic!("no antiderivative for {input}"));
    let expected_expr = shrink(parse_expr(expected).expect("parse expected")).0;
    assert_eq!(got, expected_expr, "integral of {input}");
}

#[test]
fn constants_and_powers() {
    assert_integral_eq("3", "3x");
    assert_integral_eq("x^2", "x^3 / 3");
    assert_integral_eq("cos(x)", "sin(x)");
}

#[test]
fn reciprocal_is_a_logarithm() {
    let got = antiderivative("1 / x").expect("antiderivative");
    assert_eq!(got.to_string(), "ln(abs(x))");
}

#[test]
fn self_power_is_not_found() {
    let expr = parse_expr("x^x").expect("parse input");
    assert_eq!(integrate(&expr, "x"), IntegrationResult::NotFound);
    assert!(unfindable_substitution(&expr, "x", 24));
}

#[test]
fn chain_rule_by_substitution() {
    assert_integral_eq("2x * cos(x^2)", "sin(x^2)");
}

#[test]
fn linear_denominator_gives_a_logarithm() {
    assert_integral_eq("1 / (2x + 3)", "ln(abs(2x + 3)) / 2");
}

#[test]
fn algebraic_times_exponential_by_parts() {
    assert_integral_eq("x * e^x", "x * e^x - e^x");
}

#[test]
fn self_referential_by_parts() {
    let expr = parse_expr("e^x * sin(x)").expect("parse input");
    match integrate(&expr, "x") {
        IntegrationResult::Integrated { result, strategy } => {
            assert_eq!(result.to_string(), "(sin(x) * e^x - cos(x) * e^x) / 2");
            assert_eq!(strategy, Strategy::ByParts);
        }
        IntegrationResult::NotFound => panic!("expected an antiderivative"),
    }
}

#[test]
fn depth_limit_blocks_by_parts() {
    let expr = parse_expr("e^x * sin(x)").expect("parse input");
    let options = IntegrateOptions {
        max_depth: 0,
        ..IntegrateOptions::default()
    };
    assert_eq!(integrate_with(&expr, "x", &options), IntegrationResult::NotFound);
}

#[test]
fn substitution_candidates() {
    let expr = parse_expr("sin(3x + 1)").expect("parse input");
    let candidates: Vec<String> = choose(&expr, "x", 24).iter().map(|c| c.to_string()).collect();
    assert_eq!(candidates, vec!["sin(3x + 1)", "3x + 1"]);
}

#[test]
fn ilate_picks_the_logarithm() {
    let ln = parse_expr("ln(x)").expect("parse input");
    let x = parse_expr("x").expect("parse input");
    let (u, dv) = order_for_ilate(&x, &ln, "x").expect("ranked");
    assert_eq!(u, ln);
    assert_eq!(dv, x);
}

/// Floating value of `expr` at `x`; anything the helper does not know is NaN.
fn value(expr: &Expr, x: f64) -> f64 {
    match expr {
        Expr::Number(n) => n.to_f64(),
        Expr::Complex(_) => f64::NAN,
        Expr::Identifier(name) => match name.as_str() {
            "x" => x,
            "e" => std::f64::consts::E,
            "pi" | "PI" => std::f64::consts::PI,
            _ => f64::NAN,
        },
        Expr::Call(call) => {
            let args: Vec<f64> = call.args.iter().map(|a| value(a, x)).collect();
            let a = args[0];
            match call.function {
                Function::Sin => a.sin(),
                Function::Cos => a.cos(),
                Function::Tan => a.tan(),
                Function::Csc => 1.0 / a.sin(),
                Function::Sec => 1.0 / a.cos(),
                Function::Cot => 1.0 / a.tan(),
                Function::Asin => a.asin(),
                Function::Acos => a.acos(),
                Function::Atan => a.atan(),
                Function::Sinh => a.sinh(),
                Function::Cosh => a.cosh(),
                Function::Tanh => a.tanh(),
                Function::Sech => 1.0 / a.cosh(),
                Function::Asinh => a.asinh(),
                Function::Atanh => a.atanh(),
                Function::Ln => a.ln(),
                Function::Log if args.len() == 2 => args[1].ln() / a.ln(),
                Function::Log => a.log10(),
                Function::Abs => a.abs(),
                Function::Sqrt => a.sqrt(),
                Function::Sgn => a.signum(),
                _ => f64::NAN,
            }
        }
        Expr::Node(node) => {
            let v: Vec<f64> = node.operands.iter().map(|o| value(o, x)).collect();
            match node.operator {
                Operator::Add => v.iter().sum(),
                Operator::Multiply => v.iter().product(),
                Operator::Subtract => v[0] - v[1],
                Operator::Divide => v[0] / v[1],
                Operator::Raise => v[0].powf(v[1]),
                _ => f64::NAN,
            }
        }
    }
}

/// The derivative of the antiderivative agrees with the integrand at a few sample points.
fn assert_inverse(input: &str) {
    let integrand = parse_expr(input).expect("parse input");
    let found = antiderivative(input).unwrap_or_else(|| panic!("no antiderivative for {input}"));
    let slope = derive(&found, "x").expect("derivative");
    for x in [0.3, 0.6, 0.9] {
        let (want, got) = (value(&integrand, x), value(&slope, x));
        assert!(
            (want - got).abs() <= 1e-9 * want.abs().max(1.0),
            "d/dx of {found} is {slope}: {got} at {x}, integrand {input} gives {want}"
        );
    }
}

#[test]
fn derivative_undoes_integral() {
    for input in [
        "3x^2 + 2x + 1",
        "x * e^x",
        "e^x * sin(x)",
        "2x * cos(x^2)",
        "1 / (2x + 3)",
        "x * sqrt(x + 1)",
        "atan(x)",
        "x / (1 + x^2)",
        "x^4 / (1 + x^5)",
        "(3x^2 + 2x) * e^(x^3 + x^2)",
        "(3x^2 + 2x) * cos(x^3 + x^2)",
        "sin(x)^2",
        "cos(x)^2",
        "sin(x)^3",
        "cos(x)^3",
        "sec(x)^3",
        "tan(x)^2",
        "cosh(x)^2",
        "x * sin(x)^2",
        "ln(x)^2",
        "sin(x) * cos(3x)",
        "sin(2x) * sin(x)",
        "e^(2x) * sin(3x)",
    ] {
        assert_inverse(input);
    }
}

#[test]
fn derivative_undoes_integral_exactly() {
    for input in ["3x^2 + 2x + 1", "cos(x)", "e^x", "x * e^x", "sinh(x)"] {
        let found = antiderivative(input).unwrap_or_else(|| panic!("no antiderivative for {input}"));
        let slope = derive(&found, "x").expect("derivative");
        assert_eq!(slope, shrink(parse_expr(input).expect("parse input")).0, "integral of {input}");
    }
}

#[test]
fn constant_multiple_of_the_inner_derivative() {
    assert_integral_eq("x / (1 + x^2)", "ln(abs(x^2 + 1)) / 2");
    assert_integral_eq("x^4 / (1 + x^5)", "ln(abs(x^5 + 1)) / 5");
}

#[test]
fn sums_that_factor_into_a_chain_rule() {
    assert_integral_eq("(3x^2 + 2x) * e^(x^3 + x^2)", "e^(x^3 + x^2)");
    assert_integral_eq("(3x^2 + 2x) * cos(x^3 + x^2)", "sin(x^3 + x^2)");
}

#[test]
fn power_reduction() {
    assert_integral_eq("sin(x)^2", "x/2 - sin(x) * cos(x) / 2");
    assert_integral_eq("cos(x)^2", "x/2 + sin(x) * cos(x) / 2");
    assert_integral_eq("tan(x)^2", "tan(x) - x");
    let expr = parse_expr("sin(x)^3").expect("parse input");
    match integrate(&expr, "x") {
        IntegrationResult::Integrated { strategy, .. } => assert_eq!(strategy, Strategy::Reduction),
        IntegrationResult::NotFound => panic!("expected an antiderivative"),
    }
}

#[test]
fn logarithm_squared_by_parts() {
    assert_integral_eq("ln(x)^2", "x * ln(x)^2 - 2 * x * ln(x) + 2x");
}

#[test]
fn imaginary_constants() {
    assert_integral_eq("i", "i * x");
    assert_integral_eq("i^2", "-x");
}
