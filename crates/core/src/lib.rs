//! vaccin-core: patient profile, retrieval query selection and prompt
//! composition for the vaccination diagnostic service.
//!
//! Nothing in this crate performs I/O; the server crate owns HTTP and the
//! model client.

pub mod error;
pub mod outcome;
pub mod patient;
pub mod prompt;
pub mod queries;
pub mod schema;

pub use error::{DiagnosticError, SchemaError};
pub use outcome::ErrorBody;
pub use patient::{DiagnosticRequest, PatientObject, PatientProfile};
pub use prompt::{SCHEMA_NAME, SOURCE_DOCUMENT, SYSTEM_PROMPT, diagnostic_date, user_message};
pub use queries::{QueryList, SearchQuery, build_queries};
pub use schema::{BUNDLED_SCHEMA, DeliverySchema};
