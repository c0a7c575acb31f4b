//! Identity: credential store, session tokens, and the resume access guard.

pub mod credentials;
pub mod extract;
pub mod guard;
pub mod handlers;
pub mod password;
pub mod token;

pub use credentials::CredentialService;
pub use token::TokenService;
