// Re-export all model types
pub use self::cuisine::*;
pub use self::errors::*;
pub use self::response::*;
pub use self::validation::*;

mod cuisine;
mod errors;
mod response;
mod validation;
