//! Core math functions

use pricer_plugin::prelude::*;

pub struct Floor;
pub struct Ceil;
pub struct Round;
pub struct Abs;
pub struct Sqrt;
pub struct Pow;

static X_ARG: [ArgMeta; 1] = [ArgMeta::new("x", "Value")];

static FLOOR_EXAMPLES: [&str; 2] = ["floor(3.7)", "floor(width_cm / 10)"];
static FLOOR_RELATED: [&str; 2] = ["ceil", "round"];

static CEIL_EXAMPLES: [&str; 2] = ["ceil(3.2)", "ceil(quantity / 12)"];
static CEIL_RELATED: [&str; 2] = ["floor", "round"];

static ROUND_EXAMPLES: [&str; 2] = ["round(3.5)", "round(base_price * 1.19)"];
static ROUND_RELATED: [&str; 2] = ["floor", "ceil"];

static ABS_EXAMPLES: [&str; 1] = ["abs(-5)"];
static ABS_RELATED: [&str; 0] = [];

static SQRT_ARGS: [ArgMeta; 1] = [ArgMeta::new("x", "Value (must be non-negative)")];
static SQRT_EXAMPLES: [&str; 2] = ["sqrt(16)", "sqrt(area_cm2)"];
static SQRT_RELATED: [&str; 1] = ["pow"];

static POW_ARGS: [ArgMeta; 2] = [
    ArgMeta::new("base", "Base value"),
    ArgMeta::new("exponent", "Exponent; must be whole when base is negative"),
];
static POW_EXAMPLES: [&str; 2] = ["pow(2, 3)", "pow(width_cm, 2)"];
static POW_RELATED: [&str; 1] = ["sqrt"];

/// `base` raised to `exponent`, shared by `pow()` and the `^` operator
pub fn checked_pow(base: f64, exponent: f64) -> Result<f64, EvalError> {
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(EvalError::invalid("negative base with fractional exponent"));
    }
    if base == 0.0 && exponent < 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(base.powf(exponent))
}

impl FunctionPlugin for Floor {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "floor",
            description: "Largest integer less than or equal to x",
            usage: "floor(x)",
            args: &X_ARG,
            returns: "Number",
            examples: &FLOOR_EXAMPLES,
            category: "math",
            related: &FLOOR_RELATED,
        }
    }

    fn call(&self, args: &[f64]) -> Result<f64, EvalError> {
        match args {
            [x] => Ok(x.floor()),
            _ => Err(EvalError::arg_count("floor", 1, args.len())),
        }
    }
}

impl FunctionPlugin for Ceil {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "ceil",
            description: "Smallest integer greater than or equal to x",
            usage: "ceil(x)",
            args: &X_ARG,
            returns: "Number",
            examples: &CEIL_EXAMPLES,
            category: "math",
            related: &CEIL_RELATED,
        }
    }

    fn call(&self, args: &[f64]) -> Result<f64, EvalError> {
        match args {
            [x] => Ok(x.ceil()),
            _ => Err(EvalError::arg_count("ceil", 1, args.len())),
        }
    }
}

impl FunctionPlugin for Round {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "round",
            description: "Round to nearest integer, halves away from zero",
            usage: "round(x)",
            args: &X_ARG,
            returns: "Number",
            examples: &ROUND_EXAMPLES,
            category: "math",
            related: &ROUND_RELATED,
        }
    }

    fn call(&self, args: &[f64]) -> Result<f64, EvalError> {
        match args {
            // f64::round already rounds half away from zero
            [x] => Ok(x.round()),
            _ => Err(EvalError::arg_count("round", 1, args.len())),
        }
    }
}

impl FunctionPlugin for Abs {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "abs",
            description: "Absolute value",
            usage: "abs(x)",
            args: &X_ARG,
            returns: "Number",
            examples: &ABS_EXAMPLES,
            category: "math",
            related: &ABS_RELATED,
        }
    }

    fn call(&self, args: &[f64]) -> Result<f64, EvalError> {
        match args {
            [x] => Ok(x.abs()),
            _ => Err(EvalError::arg_count("abs", 1, args.len())),
        }
    }
}

impl FunctionPlugin for Sqrt {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "sqrt",
            description: "Square root",
            usage: "sqrt(x)",
            args: &SQRT_ARGS,
            returns: "Number",
            examples: &SQRT_EXAMPLES,
            category: "math",
            related: &SQRT_RELATED,
        }
    }

    fn call(&self, args: &[f64]) -> Result<f64, EvalError> {
        match args {
            [x] if *x < 0.0 => Err(EvalError::invalid(format!("square root of negative number {}", x))),
            [x] => Ok(x.sqrt()),
            _ => Err(EvalError::arg_count("sqrt", 1, args.len())),
        }
    }
}

impl FunctionPlugin for Pow {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "pow",
            description: "Raise to power",
            usage: "pow(base, exponent)",
            args: &POW_ARGS,
            returns: "Number",
            examples: &POW_EXAMPLES,
            category: "math",
            related: &POW_RELATED,
        }
    }

    fn call(&self, args: &[f64]) -> Result<f64, EvalError> {
        match args {
            [base, exponent] => checked_pow(*base, *exponent),
            _ => Err(EvalError::arg_count("pow", 2, args.len())),
        }
    }
}
