//! Formula evaluator
//!
//! Walks a parsed formula against a per-request context. Evaluation is pure:
//! the same tree and values always give the same bits back.

use crate::ast::{BinOp, Expr, UnaryOp};
use pricer_core::EvalError;
use pricer_plugin::EvalContext;
use pricer_std::functions::checked_pow;

/// Formula evaluator
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, expr: &Expr, ctx: &EvalContext) -> Result<f64, EvalError> {
        self.eval_expr(expr, ctx)
    }

    fn eval_expr(&self, expr: &Expr, ctx: &EvalContext) -> Result<f64, EvalError> {
        match expr {
            Expr::Number(n) => Ok(*n),

            Expr::Variable(name) => Ok(ctx.value_of(name)),

            Expr::BinaryOp(left, op, right) => {
                let l = self.eval_expr(left, ctx)?;
                let r = self.eval_expr(right, ctx)?;
                self.eval_binary_op(l, *op, r)
            }

            Expr::UnaryOp(op, inner) => {
                let v = self.eval_expr(inner, ctx)?;
                Ok(self.eval_unary_op(*op, v))
            }

            Expr::Conditional { condition, then, otherwise } => {
                if self.eval_condition(condition, ctx)? {
                    self.eval_expr(then, ctx)
                } else {
                    self.eval_expr(otherwise, ctx)
                }
            }

            Expr::Comparison(..) => Err(EvalError::invalid("comparison outside if()")),

            Expr::FunctionCall(name, args) => {
                // if() only evaluates as a Conditional; its other shapes are invalid
                if ctx.registry.is_special_form(name) {
                    return Err(match ctx.registry.arity(name) {
                        Some(expected) if expected != args.len() => {
                            EvalError::arg_count(name, expected, args.len())
                        }
                        _ => EvalError::invalid("first argument of if() must be a comparison"),
                    });
                }
                let evaluated_args = args
                    .iter()
                    .map(|a| self.eval_expr(a, ctx))
                    .collect::<Result<Vec<f64>, EvalError>>()?;
                ctx.registry.call_function(name, &evaluated_args)
            }
        }
    }

    fn eval_condition(&self, condition: &Expr, ctx: &EvalContext) -> Result<bool, EvalError> {
        match condition {
            Expr::Comparison(left, op, right) => {
                let l = self.eval_expr(left, ctx)?;
                let r = self.eval_expr(right, ctx)?;
                Ok(op.apply(l, r))
            }
            _ => Err(EvalError::invalid("first argument of if() must be a comparison")),
        }
    }

    fn eval_binary_op(&self, l: f64, op: BinOp, r: f64) -> Result<f64, EvalError> {
        match op {
            BinOp::Add => Ok(l + r),
            BinOp::Sub => Ok(l - r),
            BinOp::Mul => Ok(l * r),
            BinOp::Div => {
                if r == 0.0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(l / r)
                }
            }
            BinOp::Pow => checked_pow(l, r),
        }
    }

    fn eval_unary_op(&self, op: UnaryOp, value: f64) -> f64 {
        match op {
            UnaryOp::Neg => -value,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
