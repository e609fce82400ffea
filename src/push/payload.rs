use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shown when a push arrives without a usable title.
pub const DEFAULT_TITLE: &str = "Breaking news";

const MAX_TITLE_LEN: usize = 120;
const MAX_BODY_LEN: usize = 1000;

/// Push payload shared by the broadcast engine and the worker's renderer.
/// Wire form: `{ "title", "body", "icon"?, "url"? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl BroadcastMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: None,
            url: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.body.trim().is_empty() {
            return Err(Error::Validation("message body cannot be empty".to_string()));
        }
        if self.title.len() > MAX_TITLE_LEN {
            return Err(Error::Validation(format!(
                "title cannot exceed {MAX_TITLE_LEN} characters"
            )));
        }
        if self.body.len() > MAX_BODY_LEN {
            return Err(Error::Validation(format!(
                "body cannot exceed {MAX_BODY_LEN} characters"
            )));
        }
        Ok(())
    }

    pub fn to_payload(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Validation(format!("unencodable message: {e}")))
    }
}
