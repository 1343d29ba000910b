// src/lib.rs
pub mod classify;
pub mod config;
pub mod connectors;
pub mod dossier;
pub mod error;
pub mod normalize;
pub mod records;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

pub use crate::classify::{Classification, ErrorClassifier};
pub use crate::config::DossierConfig;
pub use crate::connectors::context7::{DocsClient, DocsOptions, DocsResponse, ResponseType};
pub use crate::connectors::metasearch::{MetasearchClient, SafeSearch, SearchOptions, TimeLimit};
pub use crate::connectors::stackexchange::{QaClient, Research};
pub use crate::connectors::wikipedia::{ExtractFormat, WikipediaClient};
pub use crate::dossier::{assemble, assemble_top, DEFAULT_TOP_N};
pub use crate::error::{ClientError, TransportError};
pub use crate::normalize::{normalize, normalize_as, Normalize, Record, RecordKind};
pub use crate::records::{
    Answer, CodeSnippet, DocEntry, DossierItem, Question, SearchResult, WebResult, WikiPage,
    WikiSection,
};
pub use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Every client, wired to one shared transport.
pub struct Clients {
    pub docs: DocsClient,
    pub metasearch: MetasearchClient,
    pub qa: QaClient,
    pub wiki: WikipediaClient,
}

impl Clients {
    /// Build all clients over `transport` using the endpoints and
    /// credentials in `config`.
    pub fn with_transport(config: &DossierConfig, transport: Arc<dyn Transport>) -> Self {
        let docs = DocsClient::new(transport.clone(), config.context7.api_key.clone())
            .with_base_url(&config.context7.base_url);
        let metasearch =
            MetasearchClient::new(transport.clone()).with_base_url(&config.metasearch.base_url);
        let qa = QaClient::new(transport.clone())
            .with_base_url(&config.stackexchange.base_url)
            .with_site(&config.stackexchange.site)
            .with_api_key(config.stackexchange.api_key.clone())
            .with_top_n(config.stackexchange.top_n);
        let wiki = WikipediaClient::new(transport)
            .with_language(&config.wikipedia.language)
            .with_user_agent(&config.wikipedia.user_agent)
            .with_extract_format(config.wikipedia.extract_format);

        Self {
            docs,
            metasearch,
            qa,
            wiki,
        }
    }
}

/// Build all clients over a [`ReqwestTransport`] configured from `[http]`.
pub fn build_clients(config: &DossierConfig) -> Result<Clients, ClientError> {
    config.validate()?;
    let transport = ReqwestTransport::with_settings(
        &config.http.user_agent,
        Duration::from_secs(config.http.timeout_secs),
    )
    .map_err(|e| ClientError::Config(format!("cannot build HTTP client: {}", e)))?;
    Ok(Clients::with_transport(config, Arc::new(transport)))
}
