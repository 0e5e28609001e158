mod discovery;

pub use discovery::{DiscoveryClient, DiscoveryError, ProviderMetadata};

use std::time::Duration;

/// Timeout applied to every call made to the identity provider.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);
