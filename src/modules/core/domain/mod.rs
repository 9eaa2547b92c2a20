//! Domain values for source discovery and query routing

mod config;
mod filters;
mod plan;
mod settings;
mod source;

pub use config::Config;
pub use filters::{Environment, QueryFilters, Role};
pub use plan::{
    DocumentOperation, FallbackPlan, NativeQuery, Params, QueryPlan, ScanKind, SshScanRequest,
};
pub use settings::{
    Credentials, DiscoveryConfig, RegistryConfig, RouterConfig, ServerConfig, TimeoutConfig,
    MAX_CONNECT_TIMEOUT_SECS, MAX_PROBE_TIMEOUT_SECS, MAX_QUERY_TIMEOUT_SECS,
    MAX_REGISTRY_TTL_HOURS,
};
pub use source::{Confidence, SourceMetadata};
