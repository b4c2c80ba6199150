//! Inbound/outbound data formats. Only the CSV replay format lives here;
//! the HTTP surfaces that would front the channels in production are out
//! of scope for this crate.

pub mod csv;
