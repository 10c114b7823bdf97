// HTTP routes
pub mod health;
pub mod search;
pub mod suggestions;

pub use health::*;
pub use search::*;
pub use suggestions::*;
