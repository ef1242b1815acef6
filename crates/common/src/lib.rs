//! Shared types for ado-npm-auth

mod secret;

pub use secret::Secret;
