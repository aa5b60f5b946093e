mod media_error;
mod upstream;
mod validation_errors;

pub use media_error::*;
pub use upstream::*;
pub use validation_errors::*;
