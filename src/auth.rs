//! Auth-domain models: token secrets, token pairs, principals, and credentials.

pub mod credentials;
pub mod principal;
pub mod token;

pub use credentials::*;
pub use principal::*;
pub use token::{pair::*, secret::*};
