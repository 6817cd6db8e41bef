use std::time::Duration;

/// How long a successful unlock suppresses blocking.
pub const UNLOCK_DURATION_MS: i64 = 30 * 60 * 1000;

/// Minimum gap between two block screens, across all packages.
pub const BLOCK_DEBOUNCE_MS: i64 = 1000;

/// Cadence of the countdown status refresh.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Tag registration gives up after this long without a scan.
pub const TAG_REGISTRATION_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_PACKAGE: &str = "dev.nutting.focaccia";

/// Fully qualified class name of the accessibility service inside the app package.
pub const ACCESSIBILITY_SERVICE_CLASS: &str = "dev.nutting.focaccia.AppBlockerAccessibilityService";

#[derive(Debug, Clone)]
pub struct Config {
    /// Package identifier of the app itself; never blocked, never listed.
    pub package_name: String,
    /// Enables the "simulate tap" unlock on the blocked screen.
    pub debug: bool,
    pub tick_interval: Duration,
    pub debounce_ms: i64,
    pub registration_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package_name: DEFAULT_PACKAGE.into(),
            debug: false,
            tick_interval: COUNTDOWN_TICK,
            debounce_ms: BLOCK_DEBOUNCE_MS,
            registration_timeout: TAG_REGISTRATION_TIMEOUT,
        }
    }
}

impl Config {
    /// Defaults, overridden by `FOCACCIA_DEBUG` and `FOCACCIA_PACKAGE`.
    pub fn from_env() -> Self {
        let debug = std::env::var("FOCACCIA_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let package_name = std::env::var("FOCACCIA_PACKAGE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PACKAGE.into());

        Self {
            package_name,
            debug,
            ..Self::default()
        }
    }

    /// Component name the platform lists for our accessibility service.
    pub fn accessibility_component(&self) -> String {
        format!("{}/{}", self.package_name, ACCESSIBILITY_SERVICE_CLASS)
    }
}
