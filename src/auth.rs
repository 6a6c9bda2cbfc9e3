//! Credential models: redacted token secrets, credential kinds, and token pairs.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
