//! Runtime for Infraroute
//!
//! This crate provides the backend connectors, source discovery, the source
//! registry, the intelligent query router with its SSH-scan fallback seam,
//! and the HTTP server exposing them.

pub mod connectors;
pub mod discovery;
pub mod fallback;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod server;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use connectors::{Connector, ConnectorFactory, NativeConnectorFactory};
pub use discovery::{best_inventory_source, rank_inventory_sources, SourceDiscovery};
pub use fallback::{CommandFallback, FallbackExecutor, UnavailableFallback};
pub use handlers::{QueryHandler, SourcesHandler};
pub use registry::{RegistryEntry, SourceRegistry};
pub use router::{IntelligentRouter, RoutedResult};
pub use server::Runtime;
