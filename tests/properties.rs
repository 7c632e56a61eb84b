use std::cmp::Ordering;

use flatcas::expr::{pow, product, sum};
use flatcas::simplify::sort;
use flatcas::{compare, derive, integrate, shrink, Expr};
use proptest::prelude::*;

/// `c * x^k` terms with small positive coefficients.
fn polynomial() -> impl Strategy<Value = Expr> {
    prop::collection::vec((1i64..10, 0i64..4), 1..5).prop_map(|terms| {
        sum(terms
            .into_iter()
            .map(|(c, k)| product(vec![Expr::number(c), pow(Expr::ident("x"), Expr::number(k))]))
            .collect())
    })
}

/// Like `polynomial` but in two symbols with coefficients of either sign.
fn signed_polynomial() -> impl Strategy<Value = Expr> {
    let coefficient = prop_oneof![-9i64..=-1, 1i64..=9];
    prop::collection::vec((coefficient, 0i64..3, 0i64..3), 1..5).prop_map(|terms| {
        sum(terms
            .into_iter()
            .map(|(c, j, k)| {
                product(vec![
                    Expr::number(c),
                    pow(Expr::ident("x"), Expr::number(j)),
                    pow(Expr::ident("y"), Expr::number(k)),
                ])
            })
            .collect())
    })
}

fn leaf() -> impl Strategy<Value = Expr> {
    prop_oneof![
        (-20i64..20).prop_map(Expr::number),
        prop::sample::select(vec!["x", "y", "z"]).prop_map(|name| Expr::ident(name)),
    ]
}

fn tree() -> impl Strategy<Value = Expr> {
    leaf().prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(sum),
            prop::collection::vec(inner, 2..4).prop_map(product),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn compare_is_antisymmetric(a in tree(), b in tree()) {
        prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
        prop_assert_eq!(compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn sort_keeps_every_identifier(expr in tree()) {
        let (sorted, _) = sort(expr.clone());
        prop_assert_eq!(sorted.identifiers(), expr.identifiers());
        prop_assert_eq!(sorted.size(), expr.size());
    }

    #[test]
    fn shrink_is_idempotent_on_polynomials(expr in polynomial()) {
        let (once, _) = shrink(expr);
        let (twice, modified) = shrink(once.clone());
        prop_assert!(!modified);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn shrink_is_idempotent_on_signed_polynomials(expr in signed_polynomial()) {
        let (once, _) = shrink(expr);
        let (twice, modified) = shrink(once.clone());
        prop_assert!(!modified);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn shrink_is_idempotent_on_sums_of_products(expr in tree()) {
        let (once, _) = shrink(expr);
        let (twice, _) = shrink(once.clone());
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn derivative_undoes_integral_of_polynomials(expr in polynomial()) {
        let found = integrate(&expr, "x").into_result().expect("antiderivative");
        prop_assert_eq!(derive(&found, "x").expect("derivative"), shrink(expr).0);
    }

    #[test]
    fn derivative_is_linear(a in polynomial(), b in polynomial()) {
        let together = derive(&sum(vec![a.clone(), b.clone()]), "x").expect("derivative");
        let da = derive(&a, "x").expect("derivative");
        let db = derive(&b, "x").expect("derivative");
        prop_assert_eq!(together, shrink(sum(vec![da, db])).0);
    }
}
