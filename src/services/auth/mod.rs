pub mod factory;
pub mod jwt;
pub mod remote;
pub mod verifier;

pub use factory::build_token_verifier;
pub use verifier::{TokenVerifier, VerifiedIdentity, VerifyError};
