pub mod error;
pub mod logging;
pub mod naming;
pub mod report;
pub mod scan_marker;

pub use error::*;
pub use naming::{build_feature_folder_name, normalize_client_name, sanitize_attachment_filename};
