//! Flat n-ary expression trees, the canonical order over them, and the structural queries the
//! rewrite passes build on.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;

use crate::numeral::{ComplexNumeral, Numeral};

/// Identifiers that name mathematical constants rather than unknowns.
pub const CONSTANT_NAMES: [&str; 3] = ["e", "pi", "PI"];

pub fn is_constant_name(name: &str) -> bool {
    CONSTANT_NAMES.contains(&name)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Raise,
    Modulus,
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
}

impl Operator {
    pub fn is_associative(self) -> bool {
        matches!(
            self,
            Operator::Add | Operator::Multiply | Operator::BitAnd | Operator::BitOr | Operator::BitXor
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Raise => "^",
            Operator::Modulus => "%",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^^",
            Operator::LeftShift => "<<",
            Operator::RightShift => ">>",
        }
    }
}

/// Named functions the rewrite rules know about; anything else is carried as `Other`.
///
/// Declaration order is the canonical order between calls of different functions.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Csc,
    Sec,
    Cot,
    Asin,
    Acos,
    Atan,
    Acsc,
    Asec,
    Acot,
    Sinh,
    Cosh,
    Tanh,
    Csch,
    Sech,
    Coth,
    Asinh,
    Acosh,
    Atanh,
    Acsch,
    Asech,
    Acoth,
    Ln,
    Log,
    Abs,
    Sqrt,
    Sgn,
    Other(String),
}

impl Function {
    pub fn from_name(name: &str) -> Function {
        match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "csc" => Function::Csc,
            "sec" => Function::Sec,
            "cot" => Function::Cot,
            "asin" => Function::Asin,
            "acos" => Function::Acos,
            "atan" => Function::Atan,
            "acsc" => Function::Acsc,
            "asec" => Function::Asec,
            "acot" => Function::Acot,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "csch" => Function::Csch,
            "sech" => Function::Sech,
            "coth" => Function::Coth,
            "asinh" => Function::Asinh,
            "acosh" => Function::Acosh,
            "atanh" => Function::Atanh,
            "acsch" => Function::Acsch,
            "asech" => Function::Asech,
            "acoth" => Function::Acoth,
            "ln" => Function::Ln,
            "log" => Function::Log,
            "abs" => Function::Abs,
            "sqrt" => Function::Sqrt,
            "sgn" => Function::Sgn,
            other => Function::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Csc => "csc",
            Function::Sec => "sec",
            Function::Cot => "cot",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Acsc => "acsc",
            Function::Asec => "asec",
            Function::Acot => "acot",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Csch => "csch",
            Function::Sech => "sech",
            Function::Coth => "coth",
            Function::Asinh => "asinh",
            Function::Acosh => "acosh",
            Function::Atanh => "atanh",
            Function::Acsch => "acsch",
            Function::Asech => "asech",
            Function::Acoth => "acoth",
            Function::Ln => "ln",
            Function::Log => "log",
            Function::Abs => "abs",
            Function::Sqrt => "sqrt",
            Function::Sgn => "sgn",
            Function::Other(name) => name,
        }
    }

    pub fn is_trigonometric(&self) -> bool {
        matches!(
            self,
            Function::Sin
                | Function::Cos
                | Function::Tan
                | Function::Csc
                | Function::Sec
                | Function::Cot
        )
    }

    pub fn is_hyperbolic(&self) -> bool {
        matches!(
            self,
            Function::Sinh
                | Function::Cosh
                | Function::Tanh
                | Function::Csch
                | Function::Sech
                | Function::Coth
        )
    }

    pub fn is_inverse_trigonometric(&self) -> bool {
        matches!(
            self,
            Function::Asin
                | Function::Acos
                | Function::Atan
                | Function::Acsc
                | Function::Asec
                | Function::Acot
                | Function::Asinh
                | Function::Acosh
                | Function::Atanh
                | Function::Acsch
                | Function::Asech
                | Function::Acoth
        )
    }

    pub fn is_logarithmic(&self) -> bool {
        matches!(self, Function::Ln | Function::Log)
    }

    pub fn is_odd(&self) -> bool {
        matches!(
            self,
            Function::Sin
                | Function::Tan
                | Function::Csc
                | Function::Cot
                | Function::Asin
                | Function::Atan
                | Function::Acsc
                | Function::Acot
                | Function::Sinh
                | Function::Tanh
                | Function::Csch
                | Function::Coth
                | Function::Asinh
                | Function::Atanh
                | Function::Acsch
                | Function::Acoth
        )
    }

    pub fn is_even(&self) -> bool {
        matches!(
            self,
            Function::Cos | Function::Sec | Function::Cosh | Function::Sech | Function::Abs
        )
    }

    /// `1 / f(u)` as a named function, for the circular and hyperbolic families.
    pub fn reciprocal(&self) -> Option<Function> {
        Some(match self {
            Function::Sin => Function::Csc,
            Function::Cos => Function::Sec,
            Function::Tan => Function::Cot,
            Function::Csc => Function::Sin,
            Function::Sec => Function::Cos,
            Function::Cot => Function::Tan,
            Function::Sinh => Function::Csch,
            Function::Cosh => Function::Sech,
            Function::Tanh => Function::Coth,
            Function::Csch => Function::Sinh,
            Function::Sech => Function::Cosh,
            Function::Coth => Function::Tanh,
            _ => return None,
        })
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Call {
    pub function: Function,
    pub args: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Node {
    pub operator: Operator,
    pub operands: Vec<Expr>,
}

/// An owned expression tree. The derived order is the canonical order: numerals, complex
/// numerals, identifiers, calls, then operator nodes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expr {
    Number(Numeral),
    Complex(ComplexNumeral),
    Identifier(String),
    Call(Call),
    Node(Node),
}

impl Expr {
    pub fn number(value: i64) -> Self {
        Expr::Number(Numeral::integer(value))
    }

    pub fn numeral(value: Numeral) -> Self {
        Expr::Number(value)
    }

    pub fn rational(value: BigRational) -> Self {
        Expr::Number(Numeral::Exact(value))
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        Expr::Number(Numeral::integer(value))
    }

    pub fn nan() -> Self {
        Expr::Number(Numeral::NaN)
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn call(function: Function, args: Vec<Expr>) -> Self {
        Expr::Call(Call { function, args })
    }

    pub fn unary(function: Function, arg: Expr) -> Self {
        Expr::call(function, vec![arg])
    }

    pub fn node(operator: Operator, operands: Vec<Expr>) -> Self {
        Expr::Node(Node { operator, operands })
    }

    pub fn as_number(&self) -> Option<&Numeral> {
        match self {
            Expr::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expr::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_unary(&self, function: &Function) -> Option<&Expr> {
        match self {
            Expr::Call(call) if &call.function == function && call.args.len() == 1 => {
                Some(&call.args[0])
            }
            _ => None,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match self {
            Expr::Node(node) => Some(node.operator),
            _ => None,
        }
    }

    pub fn operands_of(&self, operator: Operator) -> Option<&[Expr]> {
        match self {
            Expr::Node(node) if node.operator == operator => Some(&node.operands),
            _ => None,
        }
    }

    pub fn is_op(&self, operator: Operator) -> bool {
        self.operator() == Some(operator)
    }

    pub fn binary(&self, operator: Operator) -> Option<(&Expr, &Expr)> {
        match self.operands_of(operator) {
            Some([left, right]) => Some((left, right)),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Number(n) if n.is_one())
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Expr::Number(Numeral::NaN))
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(self, Expr::Identifier(n) if n == name)
    }

    /// Negative numeral, product led by a negative numeral, or quotient with a negative numerator.
    pub fn is_negative(&self) -> bool {
        match self {
            Expr::Number(n) => n.is_negative(),
            Expr::Node(Node {
                operator: Operator::Multiply,
                operands,
            }) => matches!(operands.first(), Some(Expr::Number(n)) if n.is_negative()),
            Expr::Node(Node {
                operator: Operator::Divide,
                operands,
            }) => operands.first().is_some_and(Expr::is_negative),
            _ => false,
        }
    }

    /// Negation in the flat representation. A leading numeral of a product absorbs the sign.
    pub fn negate(self) -> Expr {
        match self {
            Expr::Number(n) => Expr::Number(n.neg()),
            Expr::Complex(c) => Expr::Complex(c.neg()),
            Expr::Node(Node {
                operator: Operator::Multiply,
                mut operands,
            }) => {
                if let Some(Expr::Number(n)) = operands.first() {
                    let flipped = n.neg();
                    if flipped.is_one() {
                        operands.remove(0);
                    } else {
                        operands[0] = Expr::Number(flipped);
                    }
                } else {
                    operands.insert(0, Expr::number(-1));
                }
                product(operands)
            }
            Expr::Node(Node {
                operator: Operator::Divide,
                mut operands,
            }) if operands.len() == 2 => {
                let numerator = operands.remove(0).negate();
                operands.insert(0, numerator);
                Expr::node(Operator::Divide, operands)
            }
            other => product(vec![Expr::number(-1), other]),
        }
    }

    /// Strips the sign that `is_negative` detects; the inverse of `negate` on negative terms.
    pub fn abs_term(self) -> Expr {
        if !self.is_negative() {
            return self;
        }
        match self {
            Expr::Node(Node {
                operator: Operator::Divide,
                mut operands,
            }) if operands.len() == 2 => {
                let numerator = operands.remove(0).abs_term();
                operands.insert(0, numerator);
                Expr::node(Operator::Divide, operands)
            }
            other => other.negate(),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Expr::Node(node) => 1 + node.operands.iter().map(Expr::size).sum::<usize>(),
            Expr::Call(call) => 1 + call.args.iter().map(Expr::size).sum::<usize>(),
            _ => 1,
        }
    }

    pub fn children(&self) -> &[Expr] {
        match self {
            Expr::Node(node) => &node.operands,
            Expr::Call(call) => &call.args,
            _ => &[],
        }
    }

    pub fn find_identifier(&self, name: &str) -> bool {
        match self {
            Expr::Identifier(n) => n == name,
            _ => self.children().iter().any(|c| c.find_identifier(name)),
        }
    }

    /// True when any identifier other than a named constant occurs.
    pub fn contains_identifier(&self) -> bool {
        match self {
            Expr::Identifier(n) => !is_constant_name(n),
            _ => self.children().iter().any(Expr::contains_identifier),
        }
    }

    pub fn find(&self, target: &Expr) -> bool {
        self == target || self.children().iter().any(|c| c.find(target))
    }

    pub fn replace_identifier(self, name: &str, replacement: &Expr) -> (Expr, bool) {
        self.replace(&Expr::ident(name), replacement)
    }

    pub fn replace(self, target: &Expr, replacement: &Expr) -> (Expr, bool) {
        if &self == target {
            return (replacement.clone(), true);
        }
        match self {
            Expr::Node(Node { operator, operands }) => {
                let (operands, changed) = replace_all(operands, target, replacement);
                (Expr::node(operator, operands), changed)
            }
            Expr::Call(Call { function, args }) => {
                let (args, changed) = replace_all(args, target, replacement);
                (Expr::call(function, args), changed)
            }
            leaf => (leaf, false),
        }
    }

    /// Occurrences of `name`; an identifier raised to a positive integer counts that many times.
    pub fn symbol_count(&self, name: &str) -> usize {
        match self {
            Expr::Identifier(n) if n == name => 1,
            Expr::Node(Node {
                operator: Operator::Raise,
                operands,
            }) if operands.len() == 2 && operands[0].is_identifier(name) => {
                match operands[1].as_number().and_then(Numeral::to_i64) {
                    Some(power) if power > 0 => power as usize,
                    _ => 1 + operands[1].symbol_count(name),
                }
            }
            _ => self.children().iter().map(|c| c.symbol_count(name)).sum(),
        }
    }

    pub fn identifiers(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_identifiers(&mut names);
        names
    }

    fn collect_identifiers(&self, names: &mut BTreeSet<String>) {
        match self {
            Expr::Identifier(n) => {
                names.insert(n.clone());
            }
            _ => {
                for child in self.children() {
                    child.collect_identifiers(names);
                }
            }
        }
    }
}

fn replace_all(items: Vec<Expr>, target: &Expr, replacement: &Expr) -> (Vec<Expr>, bool) {
    let mut changed = false;
    let items = items
        .into_iter()
        .map(|item| {
            let (item, hit) = item.replace(target, replacement);
            changed |= hit;
            item
        })
        .collect();
    (items, changed)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::render(self))
    }
}

pub fn compare(a: &Expr, b: &Expr) -> Ordering {
    a.cmp(b)
}

pub fn equals(a: &Expr, b: &Expr) -> bool {
    compare(a, b) == Ordering::Equal
}

pub fn zero() -> Expr {
    Expr::number(0)
}

pub fn one() -> Expr {
    Expr::number(1)
}

pub fn sum(mut operands: Vec<Expr>) -> Expr {
    match operands.len() {
        0 => zero(),
        1 => operands.remove(0),
        _ => Expr::node(Operator::Add, operands),
    }
}

pub fn product(mut operands: Vec<Expr>) -> Expr {
    match operands.len() {
        0 => one(),
        1 => operands.remove(0),
        _ => Expr::node(Operator::Multiply, operands),
    }
}

pub fn add(a: Expr, b: Expr) -> Expr {
    Expr::node(Operator::Add, vec![a, b])
}

pub fn sub(a: Expr, b: Expr) -> Expr {
    Expr::node(Operator::Subtract, vec![a, b])
}

pub fn mul(a: Expr, b: Expr) -> Expr {
    Expr::node(Operator::Multiply, vec![a, b])
}

pub fn div(a: Expr, b: Expr) -> Expr {
    Expr::node(Operator::Divide, vec![a, b])
}

pub fn pow(base: Expr, exp: Expr) -> Expr {
    Expr::node(Operator::Raise, vec![base, exp])
}

pub fn neg(a: Expr) -> Expr {
    a.negate()
}

pub fn ln(arg: Expr) -> Expr {
    Expr::unary(Function::Ln, arg)
}

/// Exact rational as an expression: an integer numeral, or `p / q` otherwise.
pub fn rational_expr(value: &Numeral) -> Expr {
    match value.as_rational() {
        Some(r) if !r.is_integer() => div(
            Expr::integer(r.numer().clone()),
            Expr::integer(r.denom().clone()),
        ),
        _ => Expr::Number(value.clone()),
    }
}

pub fn as_rational(expr: &Expr) -> Option<Numeral> {
    match expr {
        Expr::Number(n) if n.is_exact() => Some(n.clone()),
        _ => {
            let (num, den) = expr.binary(Operator::Divide)?;
            match (num.as_number(), den.as_number()) {
                (Some(a), Some(b)) if a.is_exact() && b.is_exact() && !b.is_zero() => {
                    Some(a.div(b))
                }
                _ => None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negate_folds_leading_numeral() {
        let x = Expr::ident("x");
        let two_x = product(vec![Expr::number(2), x.clone()]);
        assert_eq!(
            two_x.negate(),
            product(vec![Expr::number(-2), x.clone()])
        );
        assert_eq!(x.clone().negate().negate(), x);
    }

    #[test]
    fn calls_order_by_function_declaration() {
        let x = Expr::ident("x");
        let sin = Expr::unary(Function::Sin, x.clone());
        let cos = Expr::unary(Function::Cos, x.clone());
        assert_eq!(compare(&sin, &cos), Ordering::Less);
        assert!(x < sin);
    }

    #[test]
    fn symbol_count_counts_powers() {
        let x = Expr::ident("x");
        let expr = add(pow(x.clone(), Expr::number(2)), mul(Expr::number(3), x));
        assert_eq!(expr.symbol_count("x"), 3);
    }
}
