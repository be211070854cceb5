//! Vaccination diagnostic: query selection, prompt and one Responses call

use std::sync::Arc;
use std::time::Instant;

use vaccin_core::{
    DeliverySchema, PatientObject, PatientProfile, QueryList, SCHEMA_NAME, SYSTEM_PROMPT,
    build_queries, diagnostic_date, user_message,
};

use super::client::{
    InputMessage, OpenAiClient, ResponseRequest, Role, TextConfig, TextFormat, Tool,
    UpstreamError, extract_text,
};
use crate::config::Config;

/// Per-deployment settings for the diagnostic call
#[derive(Debug)]
pub struct DiagnosticSettings {
    pub vector_store_id: String,
    pub max_search_results: u32,
    pub max_output_tokens: u32,
    pub schema: DeliverySchema,
}

/// Runs diagnostics against the configured model and vector store
#[derive(Clone)]
pub struct DiagnosticService {
    client: OpenAiClient,
    settings: Arc<DiagnosticSettings>,
}

impl DiagnosticService {
    pub fn new(client: OpenAiClient, settings: DiagnosticSettings) -> Self {
        Self {
            client,
            settings: Arc::new(settings),
        }
    }

    /// `None` when the OpenAI key or the vector store id is missing
    pub fn from_config(config: &Config) -> Option<Self> {
        let (api_key, vector_store_id) = config.openai_credentials()?;
        let client = OpenAiClient::new(
            api_key.to_string(),
            &config.openai_base_url,
            config.model.clone(),
        );

        Some(Self::new(
            client,
            DiagnosticSettings {
                vector_store_id: vector_store_id.to_string(),
                max_search_results: config.max_search_results,
                max_output_tokens: config.max_output_tokens,
                schema: config.schema.clone(),
            },
        ))
    }

    /// Run a diagnostic and return the structured report text as produced
    /// by the model.
    pub async fn run(&self, patient: &PatientObject) -> Result<String, UpstreamError> {
        let queries = build_queries(&PatientProfile::from_object(patient));
        metrics::histogram!("diagnostic_query_count").record(queries.len() as f64);

        let request = self.build_request(patient, &queries);

        tracing::info!(
            model = self.client.model(),
            query_count = queries.len(),
            "Requesting vaccination diagnostic"
        );

        let start = Instant::now();
        let result = self.client.create_response(&request).await;
        metrics::histogram!("diagnostic_upstream_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        let response = result?;

        if response.status.as_deref() == Some("incomplete") {
            let reason = response
                .incomplete_details
                .as_ref()
                .and_then(|d| d.reason.as_deref())
                .unwrap_or("unknown");
            tracing::warn!(
                response_id = response.id.as_deref().unwrap_or_default(),
                reason,
                "Diagnostic response incomplete, output may be truncated"
            );
        }

        let text = extract_text(&response)?;
        tracing::debug!(
            response_id = response.id.as_deref().unwrap_or_default(),
            bytes = text.len(),
            "Diagnostic response received"
        );

        Ok(text.to_string())
    }

    fn build_request(&self, patient: &PatientObject, queries: &QueryList) -> ResponseRequest {
        let date = diagnostic_date(chrono::Utc::now());

        ResponseRequest {
            input: vec![
                InputMessage {
                    role: Role::System,
                    content: SYSTEM_PROMPT.to_string(),
                },
                InputMessage {
                    role: Role::User,
                    content: user_message(date, patient, queries),
                },
            ],
            text: TextConfig {
                format: TextFormat::JsonSchema {
                    name: SCHEMA_NAME.to_string(),
                    schema: self.settings.schema.as_value().clone(),
                    strict: true,
                },
            },
            tools: vec![Tool::FileSearch {
                vector_store_ids: vec![self.settings.vector_store_id.clone()],
                max_num_results: self.settings.max_search_results,
            }],
            temperature: 0.0,
            max_output_tokens: Some(self.settings.max_output_tokens),
        }
    }
}
