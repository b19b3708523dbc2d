//! Page requests against the device firmware.
//!
//! GET requests load page data and hand it to the renderer registered for a
//! [`FeatureTag`]. POST requests save settings; they block the caller until
//! the device answers and leave their [`Outcome`] in the notification slot for
//! the next page load.

use crate::{
    config::DeviceConfig,
    envelope::{EnvelopeError, TRANSPORT_ERROR_SENTINEL, parse_get_envelope, parse_mutation_outcome},
    http_client::{self, cache_busted, handle_blocking_http_response, handle_http_response},
    notification::{NotificationStore, Outcome},
    render::{Alert, FeatureTag, Renderer, RendererRegistry},
    session::SessionStore,
};
use anyhow::{Context, Result};
use log::{debug, error, info};
use reqwest::{Client, header::CONTENT_TYPE};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Message shown when a page GET fails at the transport level.
pub const PAGE_GET_ERROR: &str = "page get error";

/// What happened to a GET payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchOutcome {
    /// Handed to the renderer registered for the tag.
    Rendered,
    /// No renderer registered for the tag; payload discarded.
    Dropped,
    /// Request failed; the user was alerted.
    TransportFailed,
}

enum PostBody {
    Empty,
    Text(String),
    Json(String),
}

pub struct Dispatcher<S> {
    config: DeviceConfig,
    client: Client,
    blocking_client: OnceLock<reqwest::blocking::Client>,
    renderers: RendererRegistry,
    alert: Box<dyn Alert + Send + Sync>,
    notifications: NotificationStore<S>,
}

impl<S: SessionStore> Dispatcher<S> {
    pub fn new(
        config: DeviceConfig,
        session: S,
        alert: impl Alert + Send + Sync + 'static,
    ) -> Result<Self> {
        let client = http_client::async_client(config.timeout)?;

        Ok(Self {
            config,
            client,
            blocking_client: OnceLock::new(),
            renderers: RendererRegistry::new(),
            alert: Box::new(alert),
            notifications: NotificationStore::new(session),
        })
    }

    pub fn with_renderer(
        mut self,
        tag: FeatureTag,
        renderer: impl Renderer + Send + Sync + 'static,
    ) -> Self {
        self.renderers.register(tag, renderer);
        self
    }

    pub fn notifications(&self) -> &NotificationStore<S> {
        &self.notifications
    }

    /// Absolute URLs pass through, paths are joined to the base URL
    fn build_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }

        let base = self.config.base_url.trim_end_matches('/');
        let path = url.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Load page data from `url` and route it to the renderer for `tag`.
    ///
    /// Transport failures alert the user and are not returned. A body that is
    /// not a well-formed envelope is returned as an error.
    pub async fn fetch(&self, url: &str, tag: &FeatureTag) -> Result<FetchOutcome, EnvelopeError> {
        debug!("fetch() called for {tag}");

        let body = match self.get(url).await {
            Ok(body) => body,
            Err(e) => {
                error!("fetch {tag} failed: {e:#}");
                self.alert.alert(PAGE_GET_ERROR);
                return Ok(FetchOutcome::TransportFailed);
            }
        };

        let payload = parse_get_envelope(&body).inspect_err(|e| error!("fetch {tag}: {e}"))?;

        match self.renderers.get(tag) {
            Some(renderer) => {
                renderer.render(&payload);
                Ok(FetchOutcome::Rendered)
            }
            None => {
                debug!("no renderer for {tag}, dropping payload");
                Ok(FetchOutcome::Dropped)
            }
        }
    }

    /// Save via POST to `url`, blocking until the device answers or the
    /// request times out.
    ///
    /// The outcome is stored for the next page load and returned. Must be
    /// called from a thread that is not driving an async runtime.
    pub fn submit(&self, url: &str, body: Option<String>) -> Outcome {
        debug!("submit() called");
        self.submit_body(url, body.map_or(PostBody::Empty, PostBody::Text))
    }

    /// [`Dispatcher::submit`] with a JSON request body.
    pub fn submit_json(&self, url: &str, body: &impl Serialize) -> Outcome {
        debug!("submit_json() called");
        match serde_json::to_string(body) {
            Ok(json) => self.submit_body(url, PostBody::Json(json)),
            Err(e) => {
                error!("failed to serialize save body: {e}");
                self.record(Outcome::Err)
            }
        }
    }

    fn submit_body(&self, url: &str, body: PostBody) -> Outcome {
        let reply = self.post(url, body).unwrap_or_else(|e| {
            error!("ajax post error: {e:#}");
            TRANSPORT_ERROR_SENTINEL.to_string()
        });

        let outcome = parse_mutation_outcome(&reply).unwrap_or_else(|e| {
            error!("failed to classify save reply: {e}");
            Outcome::Err
        });

        self.record(outcome)
    }

    fn record(&self, outcome: Outcome) -> Outcome {
        if let Err(e) = self.notifications.record_outcome(outcome) {
            error!("{e:#}");
        }
        outcome
    }

    async fn get(&self, url: &str) -> Result<String> {
        let url = cache_busted(&self.build_url(url))?;
        info!("GET {url}");

        let res = self
            .client
            .get(url.clone())
            .send()
            .await
            .context(format!("failed to send GET request to {url}"))?;

        handle_http_response(res, &format!("GET {url}")).await
    }

    fn post(&self, url: &str, body: PostBody) -> Result<String> {
        let url = self.build_url(url);
        info!("POST {url}");

        let request = self.blocking_client()?.post(&url);
        let request = match body {
            PostBody::Empty => request,
            PostBody::Text(text) => request.body(text),
            PostBody::Json(json) => request.header(CONTENT_TYPE, "application/json").body(json),
        };

        let res = request
            .send()
            .context(format!("failed to send POST request to {url}"))?;

        handle_blocking_http_response(res, &format!("POST {url}"))
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.blocking_client.get() {
            return Ok(client);
        }

        let client = http_client::blocking_client(self.config.timeout)?;
        Ok(self.blocking_client.get_or_init(|| client))
    }
}

impl<S: SessionStore + Send + Sync + 'static> Dispatcher<S> {
    /// Fire-and-forget [`Dispatcher::fetch`] on the current tokio runtime.
    pub fn spawn_fetch(self: &Arc<Self>, url: impl Into<String>, tag: FeatureTag) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        let url = url.into();

        tokio::spawn(async move {
            if let Err(e) = dispatcher.fetch(&url, &tag).await {
                error!("page {tag} not rendered: {e}");
            }
        })
    }
}
