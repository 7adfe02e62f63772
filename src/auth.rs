//! Auth-domain values: scopes, redacted secrets, client registrations, grants, and profiles.

pub mod client;
pub mod grant;
pub mod scope;
pub mod secret;

pub use client::*;
pub use grant::*;
pub use scope::*;
pub use secret::*;
