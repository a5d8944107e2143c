// src/config.rs

/// Default minimum score a signature needs before its type is accepted.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;
/// Shareholder distributions above this amount get a reviewer note.
pub const DEFAULT_DISTRIBUTION_NOTE_THRESHOLD: f64 = 100_000.0;

pub const MIN_CONFIDENCE_ENV: &str = "TAXDOC_MIN_CONFIDENCE";
pub const DISTRIBUTION_THRESHOLD_ENV: &str = "TAXDOC_DISTRIBUTION_THRESHOLD";

/// Tunables for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub min_confidence: f64,
    pub distribution_note_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            distribution_note_threshold: DEFAULT_DISTRIBUTION_NOTE_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    /// Reads overrides from the environment, keeping defaults for unset or
    /// unparseable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut config = Self::default();
        if let Some(v) = read_f64(&lookup, MIN_CONFIDENCE_ENV) {
            config.min_confidence = v.clamp(0.0, 1.0);
        }
        if let Some(v) = read_f64(&lookup, DISTRIBUTION_THRESHOLD_ENV) {
            config.distribution_note_threshold = v.max(0.0);
        }
        config
    }

    /// Applies CLI flags on top of the current values.
    pub fn with_overrides(mut self, min_confidence: Option<f64>, distribution_threshold: Option<f64>) -> Self {
        if let Some(v) = min_confidence {
            self.min_confidence = v.clamp(0.0, 1.0);
        }
        if let Some(v) = distribution_threshold {
            self.distribution_note_threshold = v.max(0.0);
        }
        self
    }
}

fn read_f64<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<f64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => {
            tracing::debug!("Using {}={} from environment", key, v);
            Some(v)
        }
        _ => {
            tracing::warn!("Ignoring invalid {} value '{}'", key, raw);
            None
        }
    }
}
