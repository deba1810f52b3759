//! Whitelisted formula functions

mod math;
mod aggregate;
mod logic;

pub use math::{checked_pow, Abs, Ceil, Floor, Pow, Round, Sqrt};
pub use aggregate::{Max, Min};
pub use logic::if_form;
