pub mod health;
pub mod sync;
pub mod webhook;

pub use health::*;
pub use sync::*;
pub use webhook::*;
