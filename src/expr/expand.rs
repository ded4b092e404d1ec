//! Expansion of cell formulas into enumerable addends
//!
//! The spreadsheet shows the running total of a cell, but reconciliation
//! needs the individual transactions back. Expansion rewrites a formula so
//! that every addend is one transaction:
//!
//! - parenthesized sums of plain integers fold into a single literal,
//!   remembered as parenthesis-derived;
//! - a multiplication whose count operand is a plain integer in `0..=500`
//!   unrolls into that many copies of its value operand;
//! - everything else (divisions, oversized counts) passes through verbatim.
//!
//! `expand` is a pure function over the formula text and is applied to
//! cached and live data alike.

use log::debug;

use crate::expr::parse::{self, Expr, Lit};

/// Counts above this are left as a multiplication
const MAX_REPEAT: i64 = 500;

/// Expand a formula into a `+`-joined list of addends
///
/// The leading `=` is preserved if present. Input that does not parse as an
/// arithmetic expression is returned unchanged.
pub fn expand(formula: &str) -> String {
    let (prefix, body) = split_prefix(formula);
    if body.trim().is_empty() {
        return formula.to_string();
    }
    let tree = match parse::parse(body) {
        Ok(tree) => tree,
        Err(err) => {
            debug!("formula '{}' left verbatim: {}", formula, err);
            return formula.to_string();
        }
    };
    let tree = unroll(fold_parens(tree));
    format!("{}{}", prefix, render(&tree))
}

/// Numeric value of a formula, `None` if it does not parse or divides by zero
pub fn evaluate(formula: &str) -> Option<i64> {
    let (_, body) = split_prefix(formula);
    if body.trim().is_empty() {
        return Some(0);
    }
    eval(&parse::parse(body).ok()?)
}

fn split_prefix(formula: &str) -> (&'static str, &str) {
    match formula.strip_prefix('=') {
        Some(rest) => ("=", rest),
        None => ("", formula),
    }
}

/// Collapse parenthesized sums of plain integers, innermost first
///
/// A group evaluates only when its body is `+`/`-` over literals that are
/// not themselves folded groups; a folded literal never re-folds into an
/// enclosing group. Groups that cannot fold are unwrapped (the tree already
/// encodes their precedence), except around divisions, which stay verbatim.
fn fold_parens(expr: Expr) -> Expr {
    match expr {
        Expr::Add(l, r) => Expr::add(fold_parens(*l), fold_parens(*r)),
        Expr::Sub(l, r) => Expr::sub(fold_parens(*l), fold_parens(*r)),
        Expr::Mul(l, r) => Expr::mul(fold_parens(*l), fold_parens(*r)),
        Expr::Div(l, r) => Expr::Div(l, r),
        Expr::Paren(inner) => {
            let inner = fold_parens(*inner);
            match plain_sum(&inner) {
                Some(value) => Expr::Lit(Lit::folded(value)),
                None if contains_div(&inner) => Expr::Paren(Box::new(inner)),
                None => inner,
            }
        }
        lit => lit,
    }
}

/// Value of a `+`/`-` tree over plain literals, `None` on anything else
fn plain_sum(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Lit(Lit { value, folded: false }) => Some(*value),
        Expr::Add(l, r) => plain_sum(l)?.checked_add(plain_sum(r)?),
        Expr::Sub(l, r) => plain_sum(l)?.checked_sub(plain_sum(r)?),
        _ => None,
    }
}

fn contains_div(expr: &Expr) -> bool {
    match expr {
        Expr::Div(_, _) => true,
        Expr::Lit(_) => false,
        Expr::Paren(inner) => contains_div(inner),
        Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) => {
            contains_div(l) || contains_div(r)
        }
    }
}

/// Rewrite multiplications as repeated additions, bottom-up
fn unroll(expr: Expr) -> Expr {
    match expr {
        Expr::Add(l, r) => Expr::add(unroll(*l), unroll(*r)),
        Expr::Sub(l, r) => Expr::sub(unroll(*l), unroll(*r)),
        Expr::Mul(l, r) => {
            let l = unroll(*l);
            let r = unroll(*r);
            // a division anywhere below refuses the whole node
            if contains_div(&l) || contains_div(&r) {
                return Expr::mul(l, r);
            }
            match pick_count(&l, &r) {
                Some((count, value)) if (0..=MAX_REPEAT).contains(&count) => {
                    repeat(value, count)
                }
                _ => Expr::mul(l, r),
            }
        }
        other => other,
    }
}

/// Choose the count and value operands of a multiplication
///
/// The parenthesis-derived side is the value when exactly one side carries
/// the tag; otherwise the literal side is the count, and between two
/// literals the left is the value and the right the count.
fn pick_count<'e>(l: &'e Expr, r: &'e Expr) -> Option<(i64, &'e Expr)> {
    let l_lit = match l {
        Expr::Lit(lit) => Some(*lit),
        _ => None,
    };
    let r_lit = match r {
        Expr::Lit(lit) => Some(*lit),
        _ => None,
    };
    let l_folded = l_lit.map(|n| n.folded).unwrap_or(false);
    let r_folded = r_lit.map(|n| n.folded).unwrap_or(false);
    if l_folded && !r_folded {
        return r_lit.map(|n| (n.value, l));
    }
    if r_folded && !l_folded {
        return l_lit.map(|n| (n.value, r));
    }
    match (l_lit, r_lit) {
        (Some(_), Some(n)) => Some((n.value, l)),
        (Some(n), None) => Some((n.value, r)),
        (None, Some(n)) => Some((n.value, l)),
        (None, None) => None,
    }
}

/// `count` copies of `value` joined by `+`; zero copies collapse to `0`
fn repeat(value: &Expr, count: i64) -> Expr {
    let mut out: Option<Expr> = None;
    for _ in 0..count {
        let part = value.clone();
        out = Some(match out {
            None => part,
            Some(acc) => Expr::add(acc, part),
        });
    }
    out.unwrap_or_else(|| Expr::lit(0))
}

/// Render back to text, without spaces
///
/// Parentheses are dropped: after folding and unrolling, the only surviving
/// groups are division-bearing ones, which render with their parentheses so
/// the text stays verbatim.
fn render(expr: &Expr) -> String {
    let mut out = String::new();
    render_into(expr, &mut out);
    out
}

fn render_into(expr: &Expr, out: &mut String) {
    match expr {
        Expr::Lit(lit) => out.push_str(&lit.value.to_string()),
        Expr::Add(l, r) => {
            render_into(l, out);
            out.push('+');
            render_into(r, out);
        }
        Expr::Sub(l, r) => {
            render_into(l, out);
            out.push('-');
            render_into(r, out);
        }
        Expr::Mul(l, r) => {
            render_into(l, out);
            out.push('*');
            render_into(r, out);
        }
        Expr::Div(l, r) => {
            render_into(l, out);
            out.push('/');
            render_into(r, out);
        }
        Expr::Paren(inner) => {
            out.push('(');
            render_into(inner, out);
            out.push(')');
        }
    }
}

/// Full arithmetic evaluation; integer division truncates
fn eval(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Lit(lit) => Some(lit.value),
        Expr::Add(l, r) => eval(l)?.checked_add(eval(r)?),
        Expr::Sub(l, r) => eval(l)?.checked_sub(eval(r)?),
        Expr::Mul(l, r) => eval(l)?.checked_mul(eval(r)?),
        Expr::Div(l, r) => eval(l)?.checked_div(eval(r)?),
        Expr::Paren(inner) => eval(inner),
    }
}
