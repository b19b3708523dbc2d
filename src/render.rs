//! Page renderers selected by feature tag.

#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use serde_json::Value;
use std::{collections::HashMap, convert::Infallible, fmt, str::FromStr};

/// Selects which page renderer receives a GET payload.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum FeatureTag {
    Usb,
    Sdcard,
    Other,
    Power,
    NodeInfo,
    /// Page added without a dedicated variant.
    Custom(String),
}

impl FeatureTag {
    pub const BUILTIN: [FeatureTag; 5] = [
        FeatureTag::Usb,
        FeatureTag::Sdcard,
        FeatureTag::Other,
        FeatureTag::Power,
        FeatureTag::NodeInfo,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            FeatureTag::Usb => "usb",
            FeatureTag::Sdcard => "sdcard",
            FeatureTag::Other => "other",
            FeatureTag::Power => "power",
            FeatureTag::NodeInfo => "nodeinfo",
            FeatureTag::Custom(name) => name,
        }
    }
}

impl fmt::Display for FeatureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureTag {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "usb" => FeatureTag::Usb,
            "sdcard" => FeatureTag::Sdcard,
            "other" => FeatureTag::Other,
            "power" => FeatureTag::Power,
            "nodeinfo" => FeatureTag::NodeInfo,
            other => FeatureTag::Custom(other.to_string()),
        })
    }
}

impl From<&str> for FeatureTag {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(tag) => tag,
            Err(never) => match never {},
        }
    }
}

/// Updates one page from a parsed GET payload.
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait Renderer {
    fn render(&self, payload: &Value);
}

/// Blocking user-facing message for failed page loads.
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait Alert {
    fn alert(&self, message: &str);
}

/// Alert writing to the error log, for headless consoles.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAlert;

impl Alert for LogAlert {
    fn alert(&self, message: &str) {
        log::error!("{message}");
    }
}

pub type BoxedRenderer = Box<dyn Renderer + Send + Sync>;

/// Explicit tag to renderer mapping.
#[derive(Default)]
pub struct RendererRegistry {
    renderers: HashMap<FeatureTag, BoxedRenderer>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `renderer` for `tag`, returning the one it replaces.
    pub fn register(
        &mut self,
        tag: FeatureTag,
        renderer: impl Renderer + Send + Sync + 'static,
    ) -> Option<BoxedRenderer> {
        self.renderers.insert(tag, Box::new(renderer))
    }

    pub fn get(&self, tag: &FeatureTag) -> Option<&(dyn Renderer + Send + Sync)> {
        self.renderers.get(tag).map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.renderers.keys()).finish()
    }
}
