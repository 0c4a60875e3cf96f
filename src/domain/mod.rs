//! Usage: Domain modules (persisted credential material).

pub(crate) mod credentials;
