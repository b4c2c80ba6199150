//! Concrete implementations of the domain ports: an in-memory versioned
//! store and a scriptable gateway client, both used by tests and the
//! replay binary.

pub mod in_memory;
pub mod mock_gateway;
