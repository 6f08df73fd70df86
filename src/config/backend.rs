//! Backend address selection.
//!
//! Picks the backend base address for the current build profile and
//! platform. Emulators cannot reach the host's `localhost` the same way, so
//! each gets its own address:
//!
//! | Profile | Platform | Address |
//! |---------|----------|---------|
//! | Production | any | `$CAMERA_PRODUCTION_URL` or [`DEFAULT_PRODUCTION_URL`] |
//! | Development | Android emulator | `http://10.0.2.2:3000` |
//! | Development | iOS simulator | `http://localhost:3000` |
//! | Development | other | `$CAMERA_LOCAL_URL` or [`DEFAULT_LOCAL_URL`] |

// ============================================================================
// Imports
// ============================================================================

use std::env;

use tracing::debug;

use crate::transport::Endpoint;

// ============================================================================
// Constants
// ============================================================================

/// Environment variable overriding the production backend.
pub const PRODUCTION_URL_VAR: &str = "CAMERA_PRODUCTION_URL";

/// Environment variable overriding the local-network backend.
pub const LOCAL_URL_VAR: &str = "CAMERA_LOCAL_URL";

/// Production backend used when no override is set.
pub const DEFAULT_PRODUCTION_URL: &str = "https://iot-backend-uy96.onrender.com";

/// Local-network backend used when no override is set.
pub const DEFAULT_LOCAL_URL: &str = "http://192.168.0.115:3000";

/// Host machine as seen from the Android emulator.
const ANDROID_EMULATOR_URL: &str = "http://10.0.2.2:3000";

/// Host machine as seen from the iOS simulator.
const IOS_SIMULATOR_URL: &str = "http://localhost:3000";

// ============================================================================
// Enums
// ============================================================================

/// Build profile the client runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildProfile {
    /// Local development against a backend on the developer's machine.
    Development,
    /// Release build against the deployed backend.
    Production,
}

impl BuildProfile {
    /// Profile of the current compilation (`debug_assertions` → development).
    #[inline]
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }
}

/// Platform the client runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Android emulator.
    AndroidEmulator,
    /// iOS simulator.
    IosSimulator,
    /// Physical device or anything else.
    Device,
}

// ============================================================================
// BackendConfig
// ============================================================================

/// Selected backend address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Backend base address (HTTP or HTTPS).
    pub url: String,
    /// Human-readable description of the selection.
    pub description: String,
    /// `true` when the address targets the host machine from an emulator.
    pub is_emulator: bool,
}

impl BackendConfig {
    /// Selects a backend using the process environment for overrides.
    #[must_use]
    pub fn from_env(profile: BuildProfile, platform: Platform) -> Self {
        Self::from_lookup(profile, platform, |name| env::var(name).ok())
    }

    /// Selects a backend using `lookup` to read overrides.
    #[must_use]
    pub fn from_lookup<F>(profile: BuildProfile, platform: Platform, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |name: &str, fallback: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        let config = match (profile, platform) {
            (BuildProfile::Production, _) => Self {
                url: resolve(PRODUCTION_URL_VAR, DEFAULT_PRODUCTION_URL),
                description: "Production Server".into(),
                is_emulator: false,
            },
            (BuildProfile::Development, Platform::AndroidEmulator) => Self {
                url: ANDROID_EMULATOR_URL.into(),
                description: "Android Emulator → Host Machine".into(),
                is_emulator: true,
            },
            (BuildProfile::Development, Platform::IosSimulator) => Self {
                url: IOS_SIMULATOR_URL.into(),
                description: "iOS Simulator → Host Machine".into(),
                is_emulator: true,
            },
            (BuildProfile::Development, Platform::Device) => Self {
                url: resolve(LOCAL_URL_VAR, DEFAULT_LOCAL_URL),
                description: "Physical Device → Local Network".into(),
                is_emulator: false,
            },
        };

        debug!(
            url = %config.url,
            description = %config.description,
            is_emulator = config.is_emulator,
            "Backend selected"
        );
        config
    }

    /// Returns the socket endpoint for this backend.
    #[inline]
    #[must_use]
    pub fn websocket_endpoint(&self, path: &str) -> Endpoint {
        Endpoint::resolve_with_path(&self.url, path)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_production_default_and_override() {
        let config = BackendConfig::from_lookup(BuildProfile::Production, Platform::Device, no_env);
        assert_eq!(config.url, DEFAULT_PRODUCTION_URL);
        assert!(!config.is_emulator);

        let config = BackendConfig::from_lookup(
            BuildProfile::Production,
            Platform::AndroidEmulator,
            |name| (name == PRODUCTION_URL_VAR).then(|| "https://cams.example.com".to_string()),
        );
        assert_eq!(config.url, "https://cams.example.com");
    }

    #[test]
    fn test_development_emulators() {
        let android =
            BackendConfig::from_lookup(BuildProfile::Development, Platform::AndroidEmulator, no_env);
        assert_eq!(android.url, "http://10.0.2.2:3000");
        assert!(android.is_emulator);

        let ios =
            BackendConfig::from_lookup(BuildProfile::Development, Platform::IosSimulator, no_env);
        assert_eq!(ios.url, "http://localhost:3000");
        assert!(ios.is_emulator);
    }

    #[test]
    fn test_development_device_uses_local_override() {
        let config =
            BackendConfig::from_lookup(BuildProfile::Development, Platform::Device, |name| {
                (name == LOCAL_URL_VAR).then(|| " http://10.0.0.7:3000 ".to_string())
            });
        assert_eq!(config.url, "http://10.0.0.7:3000");

        let blank = BackendConfig::from_lookup(BuildProfile::Development, Platform::Device, |_| {
            Some(String::new())
        });
        assert_eq!(blank.url, DEFAULT_LOCAL_URL);
    }

    #[test]
    fn test_websocket_endpoint() {
        let config = BackendConfig::from_lookup(BuildProfile::Production, Platform::Device, no_env);
        assert_eq!(
            config.websocket_endpoint("/ws").to_string(),
            "wss://iot-backend-uy96.onrender.com/ws"
        );
    }
}
