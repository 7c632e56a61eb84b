use std::fmt;

use super::expr::{
    coefficient_text, is_negation, juxtaposed, level, operator_level, render, ATOM, SUM, UNARY,
};
use crate::expr::{Call, Expr, Node, Operator};

const TALL_CHILD_ROWS: usize = 3;

/// A rectangular grid of characters with a baseline row that neighbours align against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterGraph {
    rows: Vec<Vec<char>>,
    baseline: usize,
}

impl CharacterGraph {
    pub fn text(text: &str) -> Self {
        CharacterGraph {
            rows: vec![text.chars().collect()],
            baseline: 0,
        }
    }

    fn blank(width: usize, height: usize, baseline: usize) -> Self {
        CharacterGraph {
            rows: vec![vec![' '; width]; height],
            baseline,
        }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn baseline(&self) -> usize {
        self.baseline
    }

    fn blit(&mut self, other: &CharacterGraph, row: usize, col: usize) {
        for (r, line) in other.rows.iter().enumerate() {
            for (c, ch) in line.iter().enumerate() {
                self.rows[row + r][col + c] = *ch;
            }
        }
    }

    /// Places graphs left to right with their baselines on one row.
    pub fn beside(parts: &[CharacterGraph]) -> Self {
        let above = parts.iter().map(|p| p.baseline).max().unwrap_or(0);
        let below = parts
            .iter()
            .map(|p| p.height() - p.baseline - 1)
            .max()
            .unwrap_or(0);
        let width = parts.iter().map(CharacterGraph::width).sum();
        let mut out = CharacterGraph::blank(width, above + below + 1, above);
        let mut col = 0;
        for part in parts {
            out.blit(part, above - part.baseline, col);
            col += part.width();
        }
        out
    }

    /// Numerator over a rule two columns wider than the widest part, both centered.
    pub fn fraction(numerator: &CharacterGraph, denominator: &CharacterGraph) -> Self {
        let width = numerator.width().max(denominator.width()) + 2;
        let rule = numerator.height();
        let mut out = CharacterGraph::blank(width, rule + 1 + denominator.height(), rule);
        out.blit(numerator, 0, (width - numerator.width()) / 2);
        out.blit(&CharacterGraph::text(&"-".repeat(width)), rule, 0);
        out.blit(denominator, rule + 1, (width - denominator.width()) / 2);
        out
    }

    /// Exponent raised above and to the right of the base.
    pub fn superscript(base: &CharacterGraph, exponent: &CharacterGraph) -> Self {
        let mut out = CharacterGraph::blank(
            base.width() + exponent.width(),
            base.height() + exponent.height(),
            exponent.height() + base.baseline,
        );
        out.blit(exponent, 0, base.width());
        out.blit(base, exponent.height(), 0);
        out
    }

    /// Round brackets on one row, drawn brackets spanning several rows otherwise.
    pub fn parenthesized(&self) -> Self {
        let height = self.height();
        if height <= 1 {
            return CharacterGraph::beside(&[
                CharacterGraph::text("("),
                self.clone(),
                CharacterGraph::text(")"),
            ]);
        }
        let column = |top: char, middle: char, bottom: char| {
            let mut rows = vec![vec![middle]; height];
            rows[0] = vec![top];
            rows[height - 1] = vec![bottom];
            CharacterGraph {
                rows,
                baseline: self.baseline,
            }
        };
        CharacterGraph::beside(&[column('/', '|', '\\'), self.clone(), column('\\', '|', '/')])
    }
}

impl fmt::Display for CharacterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.rows.iter().map(|r| r.iter().collect()).collect();
        f.write_str(&lines.join("\n"))
    }
}

/// Two-dimensional layout of an expression.
pub fn pretty_print(expr: &Expr) -> CharacterGraph {
    match expr {
        Expr::Call(call) => layout_call(call),
        Expr::Node(node) => layout_node(node),
        leaf => CharacterGraph::text(&render(leaf)),
    }
}

fn layout_call(call: &Call) -> CharacterGraph {
    let mut parts = Vec::new();
    for (i, arg) in call.args.iter().enumerate() {
        if i > 0 {
            parts.push(CharacterGraph::text(", "));
        }
        parts.push(pretty_print(arg));
    }
    let args = if parts.is_empty() {
        CharacterGraph::text("")
    } else {
        CharacterGraph::beside(&parts)
    };
    CharacterGraph::beside(&[CharacterGraph::text(call.function.name()), args.parenthesized()])
}

fn child(expr: &Expr, parens: bool) -> CharacterGraph {
    let graph = pretty_print(expr);
    if parens || graph.height() > TALL_CHILD_ROWS {
        graph.parenthesized()
    } else {
        graph
    }
}

fn joined(parts: Vec<CharacterGraph>, sep: &str) -> CharacterGraph {
    let mut out = Vec::with_capacity(parts.len() * 2);
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            out.push(CharacterGraph::text(sep));
        }
        out.push(part);
    }
    CharacterGraph::beside(&out)
}

fn layout_node(node: &Node) -> CharacterGraph {
    let ops = &node.operands;
    match node.operator {
        Operator::Add => joined(
            ops.iter()
                .enumerate()
                .map(|(i, op)| {
                    let parens = level(op) < SUM
                        || op.is_op(Operator::Add)
                        || (i > 0 && op.is_op(Operator::Subtract));
                    child(op, parens)
                })
                .collect(),
            " + ",
        ),
        Operator::Subtract if ops.len() == 2 => CharacterGraph::beside(&[
            child(&ops[0], level(&ops[0]) < SUM),
            CharacterGraph::text(" - "),
            child(&ops[1], level(&ops[1]) <= SUM && !ops[1].is_op(Operator::Divide)),
        ]),
        Operator::Multiply => {
            if let Some((coef, rest)) = juxtaposed(ops) {
                return CharacterGraph::beside(&[
                    CharacterGraph::text(&coefficient_text(coef)),
                    pretty_print(rest),
                ]);
            }
            if is_negation(ops) {
                return CharacterGraph::beside(&[
                    CharacterGraph::text("-"),
                    child(&ops[1], level(&ops[1]) < UNARY && !ops[1].is_op(Operator::Divide)),
                ]);
            }
            joined(
                ops.iter()
                    .map(|op| child(op, level(op) < UNARY && !op.is_op(Operator::Divide)))
                    .collect(),
                " * ",
            )
        }
        Operator::Divide if ops.len() == 2 => {
            CharacterGraph::fraction(&pretty_print(&ops[0]), &pretty_print(&ops[1]))
        }
        Operator::Raise if ops.len() == 2 => {
            let base = child(&ops[0], level(&ops[0]) < ATOM);
            let exponent = pretty_print(&ops[1]);
            let exponent = if ops[1].is_op(Operator::Raise) {
                exponent
            } else if exponent.height() > 1 || level(&ops[1]) < ATOM {
                exponent.parenthesized()
            } else {
                exponent
            };
            CharacterGraph::superscript(&base, &exponent)
        }
        operator => joined(
            ops.iter()
                .map(|op| child(op, level(op) <= operator_level(operator)))
                .collect(),
            &format!(" {} ", operator.symbol()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{add, div, pow};

    #[test]
    fn superscript_sits_above_and_right() {
        let graph = pretty_print(&pow(Expr::ident("x"), Expr::number(2)));
        assert_eq!(graph.to_string(), " 2\nx ");
        assert_eq!(graph.baseline(), 1);
    }

    #[test]
    fn fraction_centers_both_parts() {
        let graph = pretty_print(&div(add(Expr::ident("x"), Expr::number(1)), Expr::number(2)));
        assert_eq!(graph.to_string(), " x + 1 \n-------\n   2   ");
    }

    #[test]
    fn tall_parentheses_span_rows() {
        let graph = CharacterGraph::fraction(&CharacterGraph::text("a"), &CharacterGraph::text("b"));
        assert_eq!(graph.parenthesized().to_string(), "/ a \\\n|---|\n\\ b /");
    }
}
