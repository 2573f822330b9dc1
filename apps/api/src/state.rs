use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::extraction::{LocalExtractor, TextExtractor};
use crate::llm_client::LlmClient;
use crate::parsing::{LlmResumeParser, ResumeParser};
use crate::render::{DocumentRenderer, RenderServiceClient};
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    /// Pluggable collaborators. Defaults are wired in `AppState::from_config`;
    /// tests swap in stubs.
    pub extractor: Arc<dyn TextExtractor>,
    pub parser: Arc<dyn ResumeParser>,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let llm = LlmClient::new(
            config.anthropic_api_key.clone(),
            config.anthropic_api_url.clone(),
            Duration::from_secs(config.llm_timeout_secs),
        )
        .context("Failed to build LLM client")?;
        let renderer = RenderServiceClient::new(config.render_service_url.clone())
            .context("Failed to build render service client")?;

        Ok(Self {
            config,
            sessions: SessionStore::new(),
            extractor: Arc::new(LocalExtractor),
            parser: Arc::new(LlmResumeParser::new(llm)),
            renderer: Arc::new(renderer),
        })
    }
}
