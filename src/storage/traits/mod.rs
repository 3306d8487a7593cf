//! Storage backend traits.

mod gateway;

pub use gateway::SiteGateway;
