//! Ad slot widget
//!
//! Each widget renders one ad slot and asks the ad network to fill it at
//! most once.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Status marker the ad library leaves on a slot it has filled
pub const LOADED_STATUS: &str = "done";

/// Configuration for one ad slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdSlotConfig {
    pub client: String,
    pub slot: String,
    pub format: String,
    pub style: String,
    pub class: String,
}

impl Default for AdSlotConfig {
    fn default() -> Self {
        Self {
            client: "ca-pub-5088609724391307".to_string(),
            slot: "YOUR-AD-SLOT-ID".to_string(),
            format: "auto".to_string(),
            style: String::new(),
            class: String::new(),
        }
    }
}

/// Request pushed onto the ad queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdRequest {
    pub element_id: String,
    pub client: String,
    pub slot: String,
    pub format: String,
}

/// The ad library's global request queue
pub trait AdQueue {
    /// Whether the ad library has loaded
    fn is_loaded(&self) -> bool;

    /// Status marker on the slot element, if any
    fn slot_status(&self, element_id: &str) -> Option<String>;

    /// Queue a fill request
    ///
    /// # Errors
    ///
    /// Returns error if the library rejects the request
    fn push(&self, request: AdRequest) -> Result<()>;
}

/// One mounted ad slot
#[derive(Debug)]
pub struct AdWidget {
    id: Uuid,
    config: AdSlotConfig,
    pushed: bool,
}

impl AdWidget {
    #[must_use]
    pub fn new(config: AdSlotConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            pushed: false,
        }
    }

    /// Element id of this instance's slot
    #[must_use]
    pub fn element_id(&self) -> String {
        format!("ad-{}", self.id.simple())
    }

    #[must_use]
    pub const fn config(&self) -> &AdSlotConfig {
        &self.config
    }

    /// Ask the network to fill the slot
    ///
    /// Pushes at most once per widget, only once the library has loaded and
    /// while the slot is not already filled. Push failures are logged and
    /// swallowed. Returns whether a request was pushed by this call.
    pub fn mount(&mut self, queue: &dyn AdQueue) -> bool {
        if self.pushed || !queue.is_loaded() {
            return false;
        }

        let element_id = self.element_id();
        if queue.slot_status(&element_id).as_deref() == Some(LOADED_STATUS) {
            tracing::debug!(%element_id, "ad slot already filled");
            return false;
        }

        let request = self.request(element_id);

        // A failed push still counts as the one push
        self.pushed = true;
        match queue.push(request) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "ad push failed");
                false
            }
        }
    }

    fn request(&self, element_id: String) -> AdRequest {
        AdRequest {
            element_id,
            client: self.config.client.clone(),
            slot: self.config.slot.clone(),
            format: self.config.format.clone(),
        }
    }

    /// Script that queues this slot on a page carrying the ad library
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be serialized
    pub fn push_script(&self) -> Result<String> {
        let payload = serde_json::to_string(&self.request(self.element_id()))?;
        Ok(format!(
            "<script>(window.adsbygoogle = window.adsbygoogle || []).push({payload});</script>"
        ))
    }

    /// HTML markup for the slot
    #[must_use]
    pub fn render_html(&self) -> String {
        let class = if self.config.class.is_empty() {
            "ad-container".to_string()
        } else {
            format!("ad-container {}", escape(&self.config.class))
        };
        format!(
            "<div class=\"{class}\" style=\"{style}\">\
             <ins id=\"{id}\" class=\"adsbygoogle\" style=\"display: block\" \
             data-ad-client=\"{client}\" data-ad-slot=\"{slot}\" data-ad-format=\"{format}\" \
             data-full-width-responsive=\"true\"></ins></div>",
            style = escape(&self.config.style),
            id = self.element_id(),
            client = escape(&self.config.client),
            slot = escape(&self.config.slot),
            format = escape(&self.config.format),
        )
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// In-process ad queue that records requests
#[derive(Debug, Default)]
pub struct InMemoryAdQueue {
    loaded: bool,
    inner: Mutex<QueueState>,
}

#[derive(Debug, Default)]
struct QueueState {
    requests: Vec<AdRequest>,
    statuses: HashMap<String, String>,
}

impl InMemoryAdQueue {
    #[must_use]
    pub fn new(loaded: bool) -> Self {
        Self {
            loaded,
            inner: Mutex::default(),
        }
    }

    /// Requests pushed so far
    #[must_use]
    pub fn requests(&self) -> Vec<AdRequest> {
        self.inner
            .lock()
            .map(|state| state.requests.clone())
            .unwrap_or_default()
    }

    /// Set a slot's status marker
    pub fn set_status(&self, element_id: &str, status: &str) {
        if let Ok(mut state) = self.inner.lock() {
            state
                .statuses
                .insert(element_id.to_string(), status.to_string());
        }
    }
}

impl AdQueue for InMemoryAdQueue {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn slot_status(&self, element_id: &str) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|state| state.statuses.get(element_id).cloned())
    }

    fn push(&self, request: AdRequest) -> Result<()> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| Error::Ad("ad queue poisoned".to_string()))?;
        state
            .statuses
            .insert(request.element_id.clone(), LOADED_STATUS.to_string());
        state.requests.push(request);
        Ok(())
    }
}
