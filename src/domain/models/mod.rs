mod features;
mod file;
pub mod progress;
mod search;
mod transformation;
mod upload;

pub use features::*;
pub use file::*;
pub use progress::{ProgressCallback, ProgressTracker};
pub use search::*;
pub use transformation::*;
pub use upload::*;
