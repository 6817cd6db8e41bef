/// Reads the platform's list of enabled accessibility services.
pub trait AccessibilitySettings: Send + Sync {
    /// Colon-separated component names, or `None` if the setting is unset.
    fn enabled_services(&self) -> Option<String>;
}

/// True iff `component` (`"<package>/<class>"`) appears in the
/// colon-separated `enabled_services`, ignoring ASCII case.
pub fn is_accessibility_service_enabled(enabled_services: Option<&str>, component: &str) -> bool {
    let Some(services) = enabled_services else {
        return false;
    };

    services
        .split(':')
        .any(|entry| entry.eq_ignore_ascii_case(component))
}
