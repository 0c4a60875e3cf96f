//! Usage: HTTP surface: router, listener resolution, server lifecycle, OAuth flow.

pub(crate) mod listen;
pub(crate) mod oauth;
pub(crate) mod routes;
pub(crate) mod server;
