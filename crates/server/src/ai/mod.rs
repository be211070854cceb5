//! Vaccination diagnostics powered by the OpenAI Responses API

pub mod client;
pub mod diagnostic;

pub use client::UpstreamError;
pub use diagnostic::DiagnosticService;
