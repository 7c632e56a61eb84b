use crate::error::{CasError, Result};
use crate::expr::{Expr, Function, Operator};
use crate::numeral::{ComplexNumeral, Numeral};
use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while};
use nom::character::complete::{char, digit1, multispace0, satisfy};
use nom::combinator::{all_consuming, map, map_res, not, opt, peek, recognize};
use nom::error::VerboseError;
use nom::multi::{fold_many0, many0, separated_list0};
use nom::sequence::{delimited, pair, preceded, terminated};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Pow;

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Parses infix text into a flat expression tree.
///
/// Sums and products are built n-ary, `-` and `/` stay binary, a numeral directly followed by an
/// identifier or a parenthesis multiplies it (`3x^2`), and `2i` is an imaginary literal.
pub fn parse_expr(input: &str) -> Result<Expr> {
    match all_consuming(ws(parse_bit_or))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(e) => Err(CasError::Parse(format!("{e:?}"))),
    }
}

fn chain<'a>(
    operator: Operator,
    symbol: &'static str,
    next: fn(&'a str) -> ParseResult<'a, Expr>,
) -> impl FnMut(&'a str) -> ParseResult<'a, Expr> {
    move |input| {
        let (rest, (first, tail)) = pair(next, many0(preceded(ws(tag(symbol)), next)))(input)?;
        if tail.is_empty() {
            return Ok((rest, first));
        }
        let mut operands = vec![first];
        operands.extend(tail);
        Ok((rest, Expr::node(operator, operands)))
    }
}

fn parse_bit_or(input: &str) -> ParseResult<'_, Expr> {
    chain(Operator::BitOr, "|", parse_bit_xor)(input)
}

fn parse_bit_xor(input: &str) -> ParseResult<'_, Expr> {
    chain(Operator::BitXor, "^^", parse_bit_and)(input)
}

fn parse_bit_and(input: &str) -> ParseResult<'_, Expr> {
    chain(Operator::BitAnd, "&", parse_shift)(input)
}

fn parse_shift(input: &str) -> ParseResult<'_, Expr> {
    let (rest, init) = parse_add_sub(input)?;
    fold_many0(
        pair(ws(alt((tag("<<"), tag(">>")))), parse_add_sub),
        move || init.clone(),
        |acc, (op, rhs)| {
            let operator = if op == "<<" {
                Operator::LeftShift
            } else {
                Operator::RightShift
            };
            Expr::node(operator, vec![acc, rhs])
        },
    )(rest)
}

fn collapse(operator: Operator, mut run: Vec<Expr>) -> Expr {
    if run.len() == 1 {
        run.remove(0)
    } else {
        Expr::node(operator, run)
    }
}

fn parse_add_sub(input: &str) -> ParseResult<'_, Expr> {
    let (rest, init) = parse_mul_div(input)?;
    let (rest, run) = fold_many0(
        pair(ws(alt((char('+'), char('-')))), parse_mul_div),
        move || vec![init.clone()],
        |mut run, (op, rhs)| match op {
            '+' => {
                run.push(rhs);
                run
            }
            _ => vec![Expr::node(
                Operator::Subtract,
                vec![collapse(Operator::Add, run), rhs],
            )],
        },
    )(rest)?;
    Ok((rest, collapse(Operator::Add, run)))
}

fn parse_mul_div(input: &str) -> ParseResult<'_, Expr> {
    let (rest, init) = parse_unary(input)?;
    let (rest, run) = fold_many0(
        pair(ws(alt((char('*'), char('/'), char('%')))), parse_unary),
        move || vec![init.clone()],
        |mut run, (op, rhs)| match op {
            '*' => {
                run.push(rhs);
                run
            }
            '/' => vec![Expr::node(
                Operator::Divide,
                vec![collapse(Operator::Multiply, run), rhs],
            )],
            _ => vec![Expr::node(
                Operator::Modulus,
                vec![collapse(Operator::Multiply, run), rhs],
            )],
        },
    )(rest)?;
    Ok((rest, collapse(Operator::Multiply, run)))
}

fn parse_unary(input: &str) -> ParseResult<'_, Expr> {
    if let Ok((rest, expr)) = preceded(ws(char('-')), parse_unary)(input) {
        Ok((rest, expr.negate()))
    } else {
        parse_pow(input)
    }
}

fn parse_pow(input: &str) -> ParseResult<'_, Expr> {
    let (rest, base) = parse_primary(input)?;
    let caret = ws(terminated(char('^'), not(char('^'))));
    if let Ok((next, exp)) = preceded(caret, parse_unary)(rest) {
        Ok((next, Expr::node(Operator::Raise, vec![base, exp])))
    } else {
        Ok((rest, base))
    }
}

fn parse_primary(input: &str) -> ParseResult<'_, Expr> {
    alt((parse_parens, parse_numeric, parse_call, parse_identifier))(input)
}

fn parse_parens(input: &str) -> ParseResult<'_, Expr> {
    delimited(ws(char('(')), parse_bit_or, ws(char(')')))(input)
}

fn parse_numeric(input: &str) -> ParseResult<'_, Expr> {
    let (rest, value) = ws(parse_decimal)(input)?;
    if let Ok((rest, _)) = terminated(
        char::<_, VerboseError<&str>>('i'),
        not(satisfy(|c| c.is_alphanumeric() || c == '_')),
    )(rest)
    {
        let imaginary = ComplexNumeral::new(Numeral::zero(), value);
        return Ok((rest, Expr::Complex(imaginary)));
    }
    if peek(satisfy::<_, &str, VerboseError<&str>>(|c| {
        c.is_alphabetic() || c == '_' || c == '('
    }))(rest)
    .is_ok()
    {
        let (rest, factor) = parse_pow(rest)?;
        return Ok((rest, Expr::node(Operator::Multiply, vec![Expr::Number(value), factor])));
    }
    Ok((rest, Expr::Number(value)))
}

fn parse_decimal(input: &str) -> ParseResult<'_, Numeral> {
    map_res(
        pair(digit1, opt(preceded(char('.'), digit1))),
        |(whole, frac): (&str, Option<&str>)| -> std::result::Result<Numeral, num_bigint::ParseBigIntError> {
            let frac = frac.unwrap_or("");
            let digits: BigInt = format!("{whole}{frac}").parse()?;
            let scale = Pow::pow(&BigInt::from(10), frac.len() as u32);
            Ok(Numeral::Exact(BigRational::new(digits, scale)))
        },
    )(input)
}

fn identifier(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

fn parse_call(input: &str) -> ParseResult<'_, Expr> {
    let (rest, name) = ws(identifier)(input)?;
    let (rest, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), parse_bit_or),
        ws(char(')')),
    )(rest)?;
    Ok((rest, Expr::call(Function::from_name(name), args)))
}

fn parse_identifier(input: &str) -> ParseResult<'_, Expr> {
    map(ws(identifier), |name| match name {
        "i" => Expr::Complex(ComplexNumeral::new(Numeral::zero(), Numeral::one())),
        other => Expr::ident(other),
    })(input)
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> ParseResult<'a, O>
where
    F: FnMut(&'a str) -> ParseResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, mul, pow, sub};

    #[test]
    fn sums_are_flat_and_subtraction_binary() {
        let expr = parse_expr("1 + 2 + y - 3").expect("parse");
        let expected = sub(
            Expr::node(
                Operator::Add,
                vec![Expr::number(1), Expr::number(2), Expr::ident("y")],
            ),
            Expr::number(3),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn implicit_coefficient_binds_the_power() {
        let expr = parse_expr("3x^2").expect("parse");
        assert_eq!(
            expr,
            mul(Expr::number(3), pow(Expr::ident("x"), Expr::number(2)))
        );
    }

    #[test]
    fn unary_minus_folds_into_numerals() {
        let expr = parse_expr("4x + -2").expect("parse");
        assert_eq!(
            expr,
            add(mul(Expr::number(4), Expr::ident("x")), Expr::number(-2))
        );
    }

    #[test]
    fn decimals_are_exact() {
        let expr = parse_expr("0.5").expect("parse");
        assert_eq!(expr, Expr::Number(Numeral::rational(1, 2)));
    }

    #[test]
    fn xor_is_not_a_power() {
        let expr = parse_expr("a ^^ b").expect("parse");
        assert!(expr.is_op(Operator::BitXor));
    }

    #[test]
    fn bare_i_is_the_imaginary_unit() {
        let unit = Expr::Complex(ComplexNumeral::new(Numeral::zero(), Numeral::one()));
        assert_eq!(parse_expr("i").expect("parse"), unit);
        assert_eq!(parse_expr("ix").expect("parse"), Expr::ident("ix"));
    }

    #[test]
    fn rejects_dangling_operator() {
        assert!(parse_expr("x +").is_err());
    }
}
