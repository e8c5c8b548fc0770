pub mod error;
pub mod label;
pub mod types;
pub mod value;

pub use error::ScriptError;
pub use label::normalize_label;
pub use types::*;
pub use value::*;
