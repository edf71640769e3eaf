//! Configuration errors
//!
//! The engines themselves never fail: bad input degrades to an empty or
//! default result. Errors only surface where a caller assembles a
//! configuration up front (options validation, building a monitoring clock).

use std::fmt;

/// Category of a configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// A quantity that must be finite and strictly positive was not
    NonPositive,

    /// A value fell outside its allowed range
    OutOfRange,

    /// Any other invalid setting
    InvalidParameter,
}

impl fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NonPositive => "non-positive value",
            Self::OutOfRange => "value out of range",
            Self::InvalidParameter => "invalid parameter",
        };
        f.write_str(name)
    }
}

/// Configuration error with a diagnostic message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    code: ConfigErrorCode,
    msg: String,
}

impl ConfigError {
    /// Create error for a quantity that must be finite and positive.
    ///
    /// # Arguments
    /// * `param_name` - The offending option (e.g., `"max_influence_miles"`)
    /// * `value` - The invalid value
    pub fn non_positive(param_name: &str, value: f64) -> Self {
        Self {
            code: ConfigErrorCode::NonPositive,
            msg: format!("Parameter '{param_name}' must be finite and positive, got {value}"),
        }
    }

    /// Create error for a value outside `[min, max]`.
    pub fn out_of_range(param_name: &str, value: f64, min: f64, max: f64) -> Self {
        Self {
            code: ConfigErrorCode::OutOfRange,
            msg: format!("Parameter '{param_name}' must be within [{min}, {max}], got {value}"),
        }
    }

    /// Create error for any other invalid setting.
    pub fn invalid(param_name: &str, message: &str) -> Self {
        Self {
            code: ConfigErrorCode::InvalidParameter,
            msg: format!("Parameter '{param_name}': {message}"),
        }
    }

    /// Error category
    pub fn code(&self) -> ConfigErrorCode {
        self.code
    }

    /// Human-readable message
    pub fn msg(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.msg)
    }
}

impl std::error::Error for ConfigError {}

/// Check that a value is finite and strictly positive
pub(crate) fn ensure_positive(param_name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::non_positive(param_name, value))
    }
}

/// Check that a value is finite and within `[min, max]`
pub(crate) fn ensure_range(
    param_name: &str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(param_name, value, min, max))
    }
}
