//! Convert the text of one cell formula into an expression tree

use pest::Parser;
use pest_derive::*;

/// Wrapper around Pest's `Pair`
type Pair<'i> = pest::iterators::Pair<'i, Rule>;

/// Pest-generated parser
#[derive(Parser)]
#[grammar = "expr/grammar.pest"]
pub struct FormulaParser;

/// An integer leaf
///
/// `folded` records that the value was obtained by collapsing a
/// parenthesized sum, which makes it the preferred multiplicand when a
/// multiplication around it is unrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lit {
    pub value: i64,
    pub folded: bool,
}

impl Lit {
    pub fn plain(value: i64) -> Self {
        Self { value, folded: false }
    }

    pub fn folded(value: i64) -> Self {
        Self { value, folded: true }
    }
}

/// Expression tree for one cell formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Lit(Lit),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    /// A parenthesized group that survived folding (it contains a division)
    Paren(Box<Expr>),
}

impl Expr {
    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Expr::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Expr::Sub(Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Expr::Mul(Box::new(lhs), Box::new(rhs))
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Self {
        Expr::Div(Box::new(lhs), Box::new(rhs))
    }

    pub fn lit(value: i64) -> Self {
        Expr::Lit(Lit::plain(value))
    }
}

/// Ways in which a formula can fail to become a tree
#[derive(Debug)]
pub enum ExprError {
    /// not an arithmetic expression
    Syntax(Box<pest::error::Error<Rule>>),
    /// a literal too large for the engine's integers
    Overflow(String),
}

impl std::fmt::Display for ExprError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprError::Syntax(e) => write!(f, "syntax error: {}", e),
            ExprError::Overflow(s) => write!(f, "'{}' does not fit in an integer", s),
        }
    }
}

/// Parse the body of a formula (no leading `=`) into a tree
pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let mut pairs = FormulaParser::parse(Rule::formula, input)
        .map_err(|e| ExprError::Syntax(Box::new(e)))?;
    // grammar: formula is exactly `SOI ~ expr ~ EOI`
    let formula = pairs.next().unwrap();
    let expr = formula
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .unwrap();
    build_expr(expr)
}

// chain of terms joined by add_op
//
// safe to .unwrap() below: the grammar guarantees at least one term
// and an operand after every operator
fn build_expr(pair: Pair) -> Result<Expr, ExprError> {
    let mut inner = pair.into_inner();
    let mut lhs = build_term(inner.next().unwrap())?;
    while let Some(op) = inner.next() {
        let rhs = build_term(inner.next().unwrap())?;
        lhs = match op.as_str() {
            "+" => Expr::add(lhs, rhs),
            "-" => Expr::sub(lhs, rhs),
            _ => unreachable!(),
        };
    }
    Ok(lhs)
}

// chain of atoms joined by mul_op
fn build_term(pair: Pair) -> Result<Expr, ExprError> {
    let mut inner = pair.into_inner();
    let mut lhs = build_atom(inner.next().unwrap())?;
    while let Some(op) = inner.next() {
        let rhs = build_atom(inner.next().unwrap())?;
        lhs = match op.as_str() {
            "*" => Expr::mul(lhs, rhs),
            "/" => Expr::div(lhs, rhs),
            _ => unreachable!(),
        };
    }
    Ok(lhs)
}

fn build_atom(pair: Pair) -> Result<Expr, ExprError> {
    match pair.as_rule() {
        Rule::int | Rule::neg => {
            let value = pair
                .as_str()
                .parse::<i64>()
                .map_err(|_| ExprError::Overflow(pair.as_str().to_string()))?;
            Ok(Expr::lit(value))
        }
        Rule::group => {
            let inner = pair.into_inner().next().unwrap();
            Ok(Expr::Paren(Box::new(build_expr(inner)?)))
        }
        _ => unreachable!(),
    }
}
