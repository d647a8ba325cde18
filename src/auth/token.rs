//! Bearer token secrets and the access/refresh pair persisted per session.

pub mod pair;
pub mod secret;
