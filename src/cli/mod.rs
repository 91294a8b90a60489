mod commands;
pub mod duration;

pub use commands::{Cli, Commands};
pub use duration::{format_duration, parse_duration};
