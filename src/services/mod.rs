pub mod consolidator;
pub mod feature_folder;
pub mod reorganizer;
pub mod resolver;

pub use consolidator::*;
pub use feature_folder::*;
pub use reorganizer::*;
pub use resolver::*;
