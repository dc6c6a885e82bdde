use crate::error::ConfigError;

/// Default enlargement applied to every detected region.
pub const DEFAULT_EXPANSION_FACTOR: f64 = 0.45;

/// Default filename prefix for exported images.
pub const DEFAULT_EXPORT_PREFIX: &str = "redacted";

/// Tunables of the redaction pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct RedactConfig {
    /// Fraction of a box's width/height added around it before masking.
    /// 0 disables expansion.
    pub expansion_factor: f64,

    /// Prefix of generated export filenames (`{prefix}-{token}.png`).
    pub export_prefix: String,
}

impl RedactConfig {
    pub fn new() -> Self {
        Self {
            expansion_factor: DEFAULT_EXPANSION_FACTOR,
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
        }
    }

    pub fn with_expansion_factor(mut self, factor: f64) -> Result<Self, ConfigError> {
        self.expansion_factor = factor;
        self.validate()?;
        Ok(self)
    }

    pub fn with_export_prefix(mut self, prefix: impl Into<String>) -> Result<Self, ConfigError> {
        self.export_prefix = prefix.into();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.expansion_factor.is_finite() || self.expansion_factor < 0.0 {
            return Err(ConfigError::InvalidExpansionFactor(self.expansion_factor));
        }
        if self.export_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyExportPrefix);
        }
        Ok(())
    }
}

impl Default for RedactConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = RedactConfig::default();
        assert_eq!(config.expansion_factor, DEFAULT_EXPANSION_FACTOR);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_expansion_is_allowed() {
        let config = RedactConfig::new().with_expansion_factor(0.0).unwrap();
        assert_eq!(config.expansion_factor, 0.0);
    }

    #[test]
    fn negative_expansion_is_rejected() {
        let err = RedactConfig::new().with_expansion_factor(-0.1).unwrap_err();
        assert_eq!(err, ConfigError::InvalidExpansionFactor(-0.1));
    }

    #[test]
    fn nan_expansion_is_rejected() {
        assert!(RedactConfig::new().with_expansion_factor(f64::NAN).is_err());
    }

    #[test]
    fn blank_prefix_is_rejected() {
        let err = RedactConfig::new().with_export_prefix("  ").unwrap_err();
        assert_eq!(err, ConfigError::EmptyExportPrefix);
    }
}
