//! Error type shared by every pipeline stage.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Non-finite or out-of-range numeric input, or a buffer whose length
    /// disagrees with its declared dimensions.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// The request would allocate past a configured limit.
    #[error("{what} exceeds limit: requested {requested}, limit {limit}")]
    ResourceExceeded {
        what: &'static str,
        requested: usize,
        limit: usize,
    },

    /// Malformed transfer buffer.
    #[error("malformed transfer buffer at offset {offset}: {reason}")]
    DecodeError { offset: usize, reason: String },
}

impl GeometryError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(offset: usize, reason: impl Into<String>) -> Self {
        Self::DecodeError {
            offset,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeometryError>;

/// Rejects NaN and infinities for a named parameter.
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::invalid(name, format!("must be finite, got {value}")))
    }
}

/// Rejects values outside `[min, max]` (and non-finite values).
pub(crate) fn ensure_in_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    ensure_finite(name, value)?;
    if value < min || value > max {
        return Err(GeometryError::invalid(
            name,
            format!("must be in [{min}, {max}], got {value}"),
        ));
    }
    Ok(())
}

#[cfg(feature = "python")]
impl From<GeometryError> for pyo3::PyErr {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::ResourceExceeded { .. } => {
                pyo3::exceptions::PyMemoryError::new_err(err.to_string())
            }
            _ => pyo3::exceptions::PyValueError::new_err(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_check_rejects_nan() {
        assert!(ensure_in_range("threshold", f64::NAN, 0.0, 1.0).is_err());
        assert!(ensure_in_range("threshold", 1.5, 0.0, 1.0).is_err());
        assert!(ensure_in_range("threshold", 1.0, 0.0, 1.0).is_ok());
    }

    #[test]
    fn test_display_names_parameter() {
        let err = GeometryError::invalid("radius", "must be finite");
        assert_eq!(err.to_string(), "invalid parameter `radius`: must be finite");
    }
}
