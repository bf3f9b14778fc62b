mod activity;
mod application;
mod client;
mod license;
mod license_type;

pub use activity::*;
pub use application::*;
pub use client::*;
pub use license::*;
pub use license_type::*;

/// Free-form JSON object used for feature maps, usage maps and metadata.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
