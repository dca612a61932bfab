pub mod claims;
pub mod extractors;
pub mod jwt;
pub mod principal;
pub mod verifier;

pub use extractors::{CurrentUser, SellerOrAdmin};
pub use principal::{Principal, Role};
pub use verifier::IdentityVerifier;
