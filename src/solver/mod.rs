//! Isolating a symbol in an equation `left = right` by undoing the operations around it.

use tracing::debug;

use crate::expr::{
    div, is_constant_name, ln, one, pow, product, sub, sum, zero, Call, Expr, Function, Node,
    Operator,
};
use crate::simplify::{convert_subtract_to_add, factors_of, merge, shrunk};

const MAX_STEPS: usize = 64;

pub fn has_single_identifier(expr: &Expr) -> Option<String> {
    let mut names = expr.identifiers().into_iter().filter(|n| !is_constant_name(n));
    let first = names.next()?;
    names.next().is_none().then_some(first)
}

/// Splits `expr` read as an equation against zero (sums) or one (products) into the part that
/// holds `symbol` and the remainder moved across. Neither side is simplified.
pub fn move_left_and_right(expr: &Expr, symbol: &str) -> (Expr, Expr) {
    let holds = |e: &Expr| e.find_identifier(symbol);
    match expr {
        Expr::Node(Node {
            operator: Operator::Subtract,
            ..
        }) => move_left_and_right(&convert_subtract_to_add(expr.clone()).0, symbol),
        Expr::Node(Node {
            operator: Operator::Add,
            operands,
        }) => {
            let (with, without): (Vec<Expr>, Vec<Expr>) =
                operands.iter().cloned().partition(|t| holds(t));
            (sum(with), sub(zero(), sum(without)))
        }
        Expr::Node(Node {
            operator: Operator::Multiply,
            operands,
        }) => {
            let (with, without): (Vec<Expr>, Vec<Expr>) =
                operands.iter().cloned().partition(|f| holds(f));
            (product(with), div(one(), product(without)))
        }
        Expr::Node(Node {
            operator: Operator::Divide,
            operands,
        }) if operands.len() == 2 && !holds(&operands[1]) => (
            operands[0].clone(),
            div(one(), div(one(), operands[1].clone())),
        ),
        other => (other.clone(), zero()),
    }
}

/// Rewrites `left = right` so that `symbol` stands alone on the left.
///
/// The symbol's side is gathered first: addends without it move across and the symbol is
/// factored out of the rest. Outer operations are then undone one at a time, shrinking the
/// other side after each step. If the other side still holds the symbol as a plain factor,
/// both sides are divided by it. Returns `false` and leaves both sides untouched when the
/// symbol is absent or cannot be isolated.
pub fn solve(symbol: &str, left: &mut Expr, right: &mut Expr) -> bool {
    let (lhs, rhs) = if left.find_identifier(symbol) {
        (shrunk(left.clone()), shrunk(right.clone()))
    } else if right.find_identifier(symbol) {
        (shrunk(right.clone()), shrunk(left.clone()))
    } else {
        debug!(target: "solve", symbol, "symbol occurs on neither side");
        return false;
    };
    match Isolation::new(symbol, lhs, rhs).run() {
        Some((isolated, value)) => {
            debug!(target: "solve", symbol, %isolated, %value, "solved");
            *left = isolated;
            *right = value;
            true
        }
        None => {
            debug!(target: "solve", symbol, %left, %right, "cannot isolate");
            false
        }
    }
}

struct Isolation<'a> {
    symbol: &'a str,
    left: Expr,
    right: Expr,
}

impl<'a> Isolation<'a> {
    fn new(symbol: &'a str, left: Expr, right: Expr) -> Self {
        Isolation {
            symbol,
            left,
            right,
        }
    }

    fn holds(&self, expr: &Expr) -> bool {
        expr.find_identifier(self.symbol)
    }

    fn run(mut self) -> Option<(Expr, Expr)> {
        self.gather();
        if occurrences(&self.left, self.symbol) != 1 {
            return None;
        }
        for _ in 0..MAX_STEPS {
            if self.left.is_identifier(self.symbol) {
                break;
            }
            if !self.peel() {
                return None;
            }
            self.right = shrunk(self.right.clone());
            debug!(target: "solve", left = %self.left, right = %self.right, "step");
        }
        if !self.left.is_identifier(self.symbol) {
            return None;
        }
        if self.holds(&self.right) {
            if !self.plain_factor_of_right() {
                return None;
            }
            let x = Expr::ident(self.symbol);
            self.left = shrunk(div(self.left, x.clone()));
            self.right = shrunk(div(self.right, x));
            if self.holds(&self.right) {
                return None;
            }
        }
        Some((self.left, self.right))
    }

    fn gather(&mut self) {
        let left = merge(convert_subtract_to_add(self.left.clone()).0).0;
        let Some(terms) = left.operands_of(Operator::Add) else {
            return;
        };
        let (with, without): (Vec<Expr>, Vec<Expr>) =
            terms.iter().cloned().partition(|t| self.holds(t));
        if !without.is_empty() {
            self.right = shrunk(sub(self.right.clone(), sum(without)));
        }
        self.left = match self.factor_out(&with) {
            Some(rests) => product(vec![Expr::ident(self.symbol), sum(rests)]),
            None => sum(with),
        };
    }

    fn factor_out(&self, terms: &[Expr]) -> Option<Vec<Expr>> {
        if terms.len() < 2 {
            return None;
        }
        terms
            .iter()
            .map(|term| {
                let mut factors = factors_of(term.clone());
                let at = factors.iter().position(|f| f.is_identifier(self.symbol))?;
                factors.remove(at);
                Some(product(factors))
            })
            .collect()
    }

    fn plain_factor_of_right(&self) -> bool {
        let top = match self.right.binary(Operator::Divide) {
            Some((numerator, denominator)) if !self.holds(denominator) => numerator.clone(),
            Some(_) => return false,
            None => self.right.clone(),
        };
        factors_of(top)
            .iter()
            .any(|f| f.is_identifier(self.symbol))
    }

    fn peel(&mut self) -> bool {
        let left = std::mem::replace(&mut self.left, zero());
        let right = self.right.clone();
        let undone = match left {
            Expr::Node(Node { operator, operands }) => self.undo_operator(operator, operands, right),
            Expr::Call(call) => self.undo_call(call, right),
            leaf => Err(leaf),
        };
        match undone {
            Ok((left, right)) => {
                self.left = left;
                self.right = right;
                true
            }
            Err(left) => {
                self.left = left;
                false
            }
        }
    }

    fn undo_operator(
        &self,
        operator: Operator,
        operands: Vec<Expr>,
        right: Expr,
    ) -> Result<(Expr, Expr), Expr> {
        match operator {
            Operator::Add => {
                let (with, without): (Vec<Expr>, Vec<Expr>) =
                    operands.iter().cloned().partition(|t| self.holds(t));
                if with.len() != 1 {
                    return Err(Expr::node(operator, operands));
                }
                Ok((sum(with), sub(right, sum(without))))
            }
            Operator::Multiply => {
                let (with, without): (Vec<Expr>, Vec<Expr>) =
                    operands.iter().cloned().partition(|f| self.holds(f));
                if with.len() != 1 {
                    return Err(Expr::node(operator, operands));
                }
                Ok((product(with), div(right, product(without))))
            }
            Operator::Subtract | Operator::Divide | Operator::Raise => {
                let [a, b] = match <[Expr; 2]>::try_from(operands) {
                    Ok(pair) => pair,
                    Err(operands) => return Err(Expr::node(operator, operands)),
                };
                match (operator, self.holds(&a), self.holds(&b)) {
                    (Operator::Subtract, true, false) => Ok((a, sum(vec![right, b]))),
                    (Operator::Subtract, false, true) => Ok((b, sub(a, right))),
                    (Operator::Divide, true, false) => Ok((a, product(vec![right, b]))),
                    (Operator::Divide, false, true) => Ok((b, div(a, right))),
                    (Operator::Raise, true, false) => Ok((a, pow(right, div(one(), b)))),
                    (Operator::Raise, false, true) if a.is_identifier("e") => Ok((b, ln(right))),
                    (Operator::Raise, false, true) => Ok((b, div(ln(right), ln(a)))),
                    _ => Err(Expr::node(operator, vec![a, b])),
                }
            }
            _ => Err(Expr::node(operator, operands)),
        }
    }

    fn undo_call(&self, call: Call, right: Expr) -> Result<(Expr, Expr), Expr> {
        use Function::*;
        let Call { function, mut args } = call;
        if args.len() != 1 {
            return Err(Expr::call(function, args));
        }
        let inner = args.remove(0);
        let value = match function {
            Ln => pow(Expr::ident("e"), right),
            Log => pow(Expr::number(10), right),
            Sqrt => pow(right, Expr::number(2)),
            _ => match inverse_of(&function) {
                Some(g) => Expr::unary(g, right),
                None => return Err(Expr::unary(function, inner)),
            },
        };
        Ok((inner, value))
    }
}

fn occurrences(expr: &Expr, symbol: &str) -> usize {
    match expr {
        Expr::Identifier(name) => usize::from(name == symbol),
        _ => expr.children().iter().map(|c| occurrences(c, symbol)).sum(),
    }
}

fn inverse_of(function: &Function) -> Option<Function> {
    use Function::*;
    const PAIRS: [(Function, Function); 9] = [
        (Sin, Asin),
        (Cos, Acos),
        (Tan, Atan),
        (Csc, Acsc),
        (Sec, Asec),
        (Cot, Acot),
        (Sinh, Asinh),
        (Cosh, Acosh),
        (Tanh, Atanh),
    ];
    PAIRS.iter().find_map(|(f, g)| {
        if f == function {
            Some(g.clone())
        } else if g == function {
            Some(f.clone())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn parsed(input: &str) -> Expr {
        parse_expr(input).expect("parse input")
    }

    #[test]
    fn single_identifier_ignores_constants() {
        assert_eq!(has_single_identifier(&parsed("2x + e")), Some("x".to_string()));
        assert_eq!(has_single_identifier(&parsed("x + y")), None);
        assert_eq!(has_single_identifier(&parsed("3")), None);
    }

    #[test]
    fn absent_symbol_leaves_both_sides() {
        let mut left = parsed("y + 1");
        let mut right = parsed("2");
        assert!(!solve("x", &mut left, &mut right));
        assert_eq!(left.to_string(), "y + 1");
        assert_eq!(right.to_string(), "2");
    }

    #[test]
    fn inverse_functions_pair_up() {
        assert_eq!(inverse_of(&Function::Asin), Some(Function::Sin));
        assert_eq!(inverse_of(&Function::Abs), None);
    }
}
