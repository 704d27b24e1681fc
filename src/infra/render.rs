//! HTTP client for the card compositor.
//!
//! The compositor is the opaque render collaborator: it receives the payload
//! as a multipart form (`payload` JSON part, optional `font` part) and
//! answers with PNG bytes. This client owns the request timeout and rejects
//! responses that do not decode as an image, so malformed compositor output
//! surfaces as a render failure instead of a corrupt cached blob.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use url::Url;

use crate::application::preview::{CardRenderer, RenderError};
use crate::domain::payload::CardPayload;
use crate::infra::fonts::FontSource;

pub struct CompositorClient {
    http: reqwest::Client,
    endpoint: Url,
    fonts: Arc<FontSource>,
}

impl CompositorClient {
    pub fn new(
        endpoint: Url,
        timeout: Duration,
        fonts: Arc<FontSource>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            fonts,
        })
    }
}

#[async_trait]
impl CardRenderer for CompositorClient {
    async fn render(&self, payload: &CardPayload) -> Result<Bytes, RenderError> {
        let json = serde_json::to_string(payload).expect("card payload serializes to JSON");
        let payload_part = Part::text(json)
            .mime_str("application/json")
            .map_err(transport)?;
        let mut form = Form::new().part("payload", payload_part);

        if let Some(font) = self.fonts.load().await {
            form = form.part("font", Part::bytes(font.to_vec()).file_name("brand.ttf"));
        }

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Upstream {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(transport)?;
        if imagesize::blob_size(&bytes).is_err() {
            return Err(RenderError::MalformedImage);
        }

        Ok(bytes)
    }
}

fn transport(err: reqwest::Error) -> RenderError {
    RenderError::Transport {
        source: Box::new(err),
    }
}
