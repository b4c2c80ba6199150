//! Application layer: the reconciliation engine plus the services that
//! feed it, the two inbound channels and the submission flow.

pub mod channels;
pub mod engine;
pub mod submission;
