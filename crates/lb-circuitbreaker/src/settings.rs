use std::time::Duration;

/// Configuration for the health gate, following the builder style the
/// workspace uses for every pattern's config type.
#[derive(Debug, Clone)]
pub struct CircuitBreakerSettings {
    pub(crate) recovery_window: Duration,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            recovery_window: Duration::from_secs(10),
        }
    }
}

impl CircuitBreakerSettings {
    pub fn builder() -> CircuitBreakerSettingsBuilder {
        CircuitBreakerSettingsBuilder::default()
    }

    pub fn recovery_window(&self) -> Duration {
        self.recovery_window
    }
}

#[derive(Debug, Clone, Default)]
pub struct CircuitBreakerSettingsBuilder {
    recovery_window: Option<Duration>,
}

impl CircuitBreakerSettingsBuilder {
    /// Sets how long a crashed replica is excluded before implicit recovery.
    ///
    /// Default: 10s.
    pub fn recovery_window(mut self, window: Duration) -> Self {
        self.recovery_window = Some(window);
        self
    }

    pub fn build(self) -> CircuitBreakerSettings {
        CircuitBreakerSettings {
            recovery_window: self
                .recovery_window
                .unwrap_or_else(|| CircuitBreakerSettings::default().recovery_window),
        }
    }
}
