//! Abstract Syntax Tree

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f64),
    Variable(String),
    UnaryOp(UnaryOp, Box<Expr>),
    BinaryOp(Box<Expr>, BinOp, Box<Expr>),
    FunctionCall(String, Vec<Expr>),
    /// Only produced as the first argument of `if(...)`
    Comparison(Box<Expr>, CmpOp, Box<Expr>),
    /// `if(condition, then, otherwise)` where condition is a `Comparison`
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp { Add, Sub, Mul, Div, Pow }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp { Neg }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp { Gt, Lt, Ge, Le, Eq, Ne }

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        }
    }
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
            CmpOp::Ge => ">=",
            CmpOp::Le => "<=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }

    /// Exact IEEE-754 comparison, no epsilon
    pub fn apply(&self, left: f64, right: f64) -> bool {
        match self {
            CmpOp::Gt => left > right,
            CmpOp::Lt => left < right,
            CmpOp::Ge => left >= right,
            CmpOp::Le => left <= right,
            CmpOp::Eq => left == right,
            CmpOp::Ne => left != right,
        }
    }
}

impl Expr {
    /// Visit this node and every descendant, parents first
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Number(_) | Expr::Variable(_) => {}
            Expr::UnaryOp(_, inner) => inner.walk(f),
            Expr::BinaryOp(left, _, right) | Expr::Comparison(left, _, right) => {
                left.walk(f);
                right.walk(f);
            }
            Expr::FunctionCall(_, args) => {
                for arg in args {
                    arg.walk(f);
                }
            }
            Expr::Conditional { condition, then, otherwise } => {
                condition.walk(f);
                then.walk(f);
                otherwise.walk(f);
            }
        }
    }

    /// Distinct variable names in order of first appearance
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        self.walk(&mut |expr| {
            if let Expr::Variable(name) = expr {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        });
        names
    }

    /// Height of the tree; a leaf has depth 1
    pub fn depth(&self) -> usize {
        match self {
            Expr::Number(_) | Expr::Variable(_) => 1,
            Expr::UnaryOp(_, inner) => 1 + inner.depth(),
            Expr::BinaryOp(left, _, right) | Expr::Comparison(left, _, right) => {
                1 + left.depth().max(right.depth())
            }
            Expr::FunctionCall(_, args) => 1 + args.iter().map(Expr::depth).max().unwrap_or(0),
            Expr::Conditional { condition, then, otherwise } => {
                1 + condition.depth().max(then.depth()).max(otherwise.depth())
            }
        }
    }
}

/// Fully parenthesized rendering, for logs and previews
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Variable(name) => f.write_str(name),
            Expr::UnaryOp(UnaryOp::Neg, inner) => write!(f, "(-{})", inner),
            Expr::BinaryOp(left, op, right) => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::Comparison(left, op, right) => write!(f, "{} {} {}", left, op.symbol(), right),
            Expr::FunctionCall(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Conditional { condition, then, otherwise } => {
                write!(f, "if({}, {}, {})", condition, then, otherwise)
            }
        }
    }
}
