//! Wire types for the Keygen `{data, meta, errors}` envelope.

pub mod models;
