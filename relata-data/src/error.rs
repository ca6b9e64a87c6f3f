use relata_core::{ConvertError, MappingError};
use relata_events::EventError;

/// Errors that can occur in the persistence engine.
///
/// A `find_by_id` miss is not an error; it is `Ok(None)`.
#[derive(Debug)]
pub enum DataError {
    /// The entity graph could not be resolved.
    Mapping(MappingError),
    /// A row or node did not match the resolved model.
    Convert(ConvertError),
    /// Statement execution failed; wraps the driver error.
    Access(Box<dyn std::error::Error + Send + Sync>),
    /// The operation needs an identity the aggregate does not carry.
    MissingId(String),
    /// A lifecycle subscriber failed and the template is configured to
    /// treat that as fatal.
    Event(EventError),
    /// The storage state contradicts the operation (e.g. updating a root
    /// row that does not exist).
    State(String),
}

impl DataError {
    /// Construct an `Access` variant from any driver error.
    ///
    /// Used by backend crates to wrap driver-specific failures.
    pub fn access(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Access(Box::new(err))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Mapping(err) => write!(f, "Mapping error: {err}"),
            DataError::Convert(err) => write!(f, "Conversion error: {err}"),
            DataError::Access(err) => write!(f, "Data access error: {err}"),
            DataError::MissingId(msg) => write!(f, "Missing identity: {msg}"),
            DataError::Event(err) => write!(f, "Event error: {err}"),
            DataError::State(msg) => write!(f, "State error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Mapping(err) => Some(err),
            DataError::Convert(err) => Some(err),
            DataError::Access(err) => Some(err.as_ref()),
            DataError::Event(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MappingError> for DataError {
    fn from(err: MappingError) -> Self {
        DataError::Mapping(err)
    }
}

impl From<ConvertError> for DataError {
    fn from(err: ConvertError) -> Self {
        DataError::Convert(err)
    }
}
