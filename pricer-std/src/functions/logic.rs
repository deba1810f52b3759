//! Conditional special form
//!
//! `if` is not a `FunctionPlugin`: its first argument is a comparison and
//! only the taken branch is evaluated. The registry still needs its metadata
//! for validation and help.

use pricer_plugin::prelude::*;

static IF_ARGS: [ArgMeta; 3] = [
    ArgMeta::new("condition", "Comparison: a > b, a < b, a >= b, a <= b, a == b or a != b"),
    ArgMeta::new("then", "Value when the condition holds"),
    ArgMeta::new("otherwise", "Value when it does not"),
];
static IF_EXAMPLES: [&str; 2] = [
    "if(quantity > 10, base_price * 0.9, base_price)",
    "if(width_cm >= 100, 50, 0)",
];
static IF_RELATED: [&str; 2] = ["min", "max"];

pub fn if_form() -> FunctionMeta {
    FunctionMeta {
        name: "if",
        description: "Choose between two values with a comparison; equality is exact",
        usage: "if(condition, then, otherwise)",
        args: &IF_ARGS,
        returns: "Number",
        examples: &IF_EXAMPLES,
        category: "logic",
        related: &IF_RELATED,
    }
}
