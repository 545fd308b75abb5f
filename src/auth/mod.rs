//! Authentication module
//!
//! Settlement endpoints use HTTP Basic auth with the merchant's public and
//! private API keys. The `Authenticator` attaches the credentials to every
//! outgoing request.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;

#[cfg(test)]
mod tests;
