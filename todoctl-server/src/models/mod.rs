//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod todo;
pub mod group;
pub mod patch;

pub use validation::{free_text, ValidationError};
pub use todo::TodoTitle;
pub use group::{GroupColor, GroupName};
pub use patch::Patch;
