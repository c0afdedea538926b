use thiserror::Error;

/// Unified error type for all pagination operations
#[derive(Error, Debug)]
pub enum PageError {
    /// The base query already carries its own limiting clause
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid pagination configuration (page size, page number)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The paginator was used in the wrong order (e.g. execute without a query)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The default row-to-domain conversion was invoked without an override
    #[error("Conversion unsupported: {0}")]
    ConversionUnsupported(String),

    /// Any fault surfaced by the executor (connection loss, SQL error, ...)
    #[error("Data access failed: {0}")]
    DataAccess(String),
}

impl PageError {
    /// Create an invalid query error with custom message
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        PageError::InvalidQuery(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        PageError::InvalidConfiguration(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        PageError::InvalidState(msg.into())
    }

    /// Create a conversion unsupported error
    pub fn conversion_unsupported(msg: impl Into<String>) -> Self {
        PageError::ConversionUnsupported(msg.into())
    }

    /// Create a data access error from an executor fault
    pub fn data_access(msg: impl Into<String>) -> Self {
        PageError::DataAccess(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PageError>;
