pub mod config;
pub mod lookup;
pub mod render;
pub mod service;
pub mod session;
#[cfg(test)]
mod test_helpers;
#[cfg(not(feature = "multi-thread"))]
mod unavailable;
mod uri_tools;
pub mod validator;

pub use uri_tools::UriError;
