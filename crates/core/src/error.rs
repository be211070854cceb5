use thiserror::Error;

/// Errors raised while resolving an inbound diagnostic request
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiagnosticError {
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing patient")]
    MissingPatient,
}

/// Errors raised while loading the delivery schema
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Delivery schema from {origin} is not valid JSON: {message}")]
    Parse { origin: String, message: String },

    #[error("Delivery schema from {origin} must be a JSON object")]
    NotAnObject { origin: String },
}
