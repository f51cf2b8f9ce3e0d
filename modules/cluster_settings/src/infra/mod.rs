//! Infrastructure layer - concrete adapters for external services

pub mod cluster;

pub use cluster::LocalClusterState;
