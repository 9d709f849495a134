pub mod error;
pub mod table;
pub mod types;
pub mod value;

pub use error::{ConvertError, LexError};
pub use table::*;
pub use types::*;
pub use value::*;
