mod app_auth;

pub use app_auth::*;
