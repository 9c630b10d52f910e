use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::settings::Settings;
use crate::{Note, NoteError, NoteUpdate, Result};

/// Remote store of a user's notes.
///
/// `list` yields `None` when the server answered without items. The mutating
/// calls follow an error-or-nothing contract. Nothing here is atomic with
/// local state changed before the call returns.
pub trait NoteService: Send + Sync + 'static {
    fn list(&self, user_id: &str) -> impl Future<Output = Result<Option<Vec<Note>>>> + Send;

    fn create(&self, note: &Note) -> impl Future<Output = Result<()>> + Send;

    fn update(&self, update: &NoteUpdate) -> impl Future<Output = Result<()>> + Send;

    fn remove(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Option<Vec<Note>>,
}

#[derive(Debug, Deserialize)]
struct ServiceMessage {
    message: String,
}

/// JSON-over-HTTP note service.
#[derive(Debug, Clone)]
pub struct HttpNoteService {
    client: Client,
    base: Url,
}

impl HttpNoteService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base: Url::parse(&base)?,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.api_url, settings.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }
}

impl NoteService for HttpNoteService {
    async fn list(&self, user_id: &str) -> Result<Option<Vec<Note>>> {
        let url = self.endpoint("notes")?;
        debug!(%url, user_id, "fetching notes");

        let response = self
            .client
            .get(url)
            .query(&[("userId", user_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        // A bare `null` means the same as a missing `items`
        let parsed: Option<ListResponse> = serde_json::from_str(&body)?;
        Ok(parsed.and_then(|response| response.items))
    }

    async fn create(&self, note: &Note) -> Result<()> {
        let url = self.endpoint("note")?;
        debug!(%url, id = %note.id, "creating note");

        let response = self.client.post(url).json(note).send().await?;
        acknowledgement(response).await
    }

    async fn update(&self, update: &NoteUpdate) -> Result<()> {
        update.validate()?;
        let url = self.endpoint("note")?;
        debug!(%url, id = %update.id, "updating note");

        let response = self.client.patch(url).json(update).send().await?;
        acknowledgement(response).await
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let url = self.endpoint(&format!("note/{}", id))?;
        debug!(%url, "removing note");

        let response = self.client.delete(url).send().await?;
        acknowledgement(response).await
    }
}

// Mutations succeed on an empty or falsy body, anything else is an error payload
async fn acknowledgement(response: Response) -> Result<()> {
    if !response.status().is_success() {
        return Err(rejection(response).await);
    }

    let body = response.text().await?;
    match error_message(&body) {
        None => Ok(()),
        Some(message) => Err(NoteError::rejected(message)),
    }
}

async fn rejection(response: Response) -> NoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ServiceMessage>(&body)
        .map(|m| m.message)
        .unwrap_or_else(|_| status.to_string());

    NoteError::rejected(message)
}

fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Null) | Ok(Value::Bool(false)) => None,
        Ok(Value::String(s)) if s.is_empty() => None,
        Ok(Value::Object(map)) => Some(
            map.get("message")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| trimmed.to_string()),
        ),
        _ => Some(trimmed.to_string()),
    }
}
