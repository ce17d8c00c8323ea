pub mod feature;

pub use feature::{FeatureFolderPath, FeatureInfo, DEFAULT_CLOSED_STATES};
