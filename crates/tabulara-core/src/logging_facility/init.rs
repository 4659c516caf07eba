//! Logging initialization module
//!
//! Provides a single initialization point for the logging facility.

use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Human-readable output for development
    #[default]
    #[serde(alias = "dev")]
    Development,
    /// JSON structured output for production
    #[serde(alias = "prod")]
    Production,
    /// Test capture mode for deterministic testing
    Test,
}

impl Profile {
    /// Parse a profile name as given on the command line
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dev" | "development" => Some(Profile::Development),
            "prod" | "production" => Some(Profile::Production),
            "test" => Some(Profile::Test),
            _ => None,
        }
    }

    fn default_directive(&self) -> &'static str {
        match self {
            Profile::Development => "tabulara=debug",
            Profile::Production | Profile::Test => "tabulara=info",
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Only the first call takes effect. `RUST_LOG` overrides the profile's
/// default filter.
///
/// # Profiles
///
/// - **Development**: Human-readable logs with debug level
/// - **Production**: JSON structured logs with info level
/// - **Test**: Bare registry; use `init_test_capture()` to record events
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = || {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(profile.default_directive()))
        };
        match profile {
            Profile::Development => {
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(filter())
                    .init();
            }
            Profile::Production => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_env_filter(filter())
                    .init();
            }
            Profile::Test => {
                tracing_subscriber::registry().init();
            }
        }
    });
}
