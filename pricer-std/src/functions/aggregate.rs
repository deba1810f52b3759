//! Two-argument min/max

use pricer_plugin::prelude::*;

pub struct Min;
pub struct Max;

static PAIR_ARGS: [ArgMeta; 2] = [ArgMeta::new("a", "First value"), ArgMeta::new("b", "Second value")];

static MIN_EXAMPLES: [&str; 2] = ["min(1, 2)", "min(base_price * 0.8, 500)"];
static MIN_RELATED: [&str; 1] = ["max"];

static MAX_EXAMPLES: [&str; 2] = ["max(1, 2)", "max(width_cm * 3, 100)"];
static MAX_RELATED: [&str; 1] = ["min"];

impl FunctionPlugin for Min {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "min",
            description: "Smaller of two values",
            usage: "min(a, b)",
            args: &PAIR_ARGS,
            returns: "Number",
            examples: &MIN_EXAMPLES,
            category: "aggregate",
            related: &MIN_RELATED,
        }
    }

    fn call(&self, args: &[f64]) -> Result<f64, EvalError> {
        match args {
            [a, b] => Ok(a.min(*b)),
            _ => Err(EvalError::arg_count("min", 2, args.len())),
        }
    }
}

impl FunctionPlugin for Max {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "max",
            description: "Larger of two values",
            usage: "max(a, b)",
            args: &PAIR_ARGS,
            returns: "Number",
            examples: &MAX_EXAMPLES,
            category: "aggregate",
            related: &MAX_RELATED,
        }
    }

    fn call(&self, args: &[f64]) -> Result<f64, EvalError> {
        match args {
            [a, b] => Ok(a.max(*b)),
            _ => Err(EvalError::arg_count("max", 2, args.len())),
        }
    }
}
