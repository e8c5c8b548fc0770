mod line;

pub use line::{parse_program, split_arguments};
