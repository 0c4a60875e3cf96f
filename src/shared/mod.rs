pub(crate) mod blocking;
pub(crate) mod error;
pub(crate) mod security;
