//! Configuration types for a PDF → OCR run.
//!
//! Everything a run needs sits in [`VisionConfig`], built via its
//! [`VisionConfigBuilder`]. The two values the endpoint cannot do without are
//! the subscription key and the endpoint URL; the rest has defaults matching
//! the Computer Vision `ocr` operation (`language=unk`,
//! `detectOrientation=true`) and a 300 DPI render.

use crate::error::Pdf2VisionError;
use crate::pipeline::client::OcrClient;
use crate::progress::Observer;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding the subscription key.
pub const ENV_API_KEY: &str = "PDF2VISION_API_KEY";

/// Environment variable holding the OCR endpoint URL.
pub const ENV_ENDPOINT_URL: &str = "PDF2VISION_ENDPOINT_URL";

/// Directory, relative to the working directory, that receives page images
/// when no `image_dir` is configured.
pub const DEFAULT_IMAGE_DIR: &str = "images";

/// Configuration for one run.
///
/// # Example
/// ```rust
/// use edgequake_pdf2vision::VisionConfig;
///
/// let config = VisionConfig::builder()
///     .endpoint_url("https://westeurope.api.cognitive.microsoft.com/vision/v2.0/ocr")
///     .api_key("0123456789abcdef")
///     .dpi(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.language, "unk");
/// ```
#[derive(Clone)]
pub struct VisionConfig {
    /// OCR endpoint, without query string. Sent to as
    /// `POST {endpoint_url}?language=..&detectOrientation=..`.
    pub endpoint_url: String,

    /// Value of the `Ocp-Apim-Subscription-Key` header.
    pub api_key: String,

    /// `language` query parameter. Default: `unk` (auto-detect).
    pub language: String,

    /// `detectOrientation` query parameter. Default: true.
    pub detect_orientation: bool,

    /// Render resolution, both axes. Range: 72–600. Default: 300.
    pub dpi: u32,

    /// Where page JPEGs are written. Default: `<cwd>/images`.
    pub image_dir: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Per-request timeout in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Pre-constructed OCR client. Takes precedence over `endpoint_url` and
    /// `api_key`.
    pub client: Option<Arc<dyn OcrClient>>,

    /// Receives page events and transcript appends.
    pub observer: Option<Observer>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            api_key: String::new(),
            language: "unk".to_string(),
            detect_orientation: true,
            dpi: 300,
            image_dir: None,
            password: None,
            request_timeout_secs: 60,
            client: None,
            observer: None,
        }
    }
}

impl fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("api_key", &redact(&self.api_key))
            .field("language", &self.language)
            .field("detect_orientation", &self.detect_orientation)
            .field("dpi", &self.dpi)
            .field("image_dir", &self.image_dir)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("client", &self.client.as_ref().map(|_| "<dyn OcrClient>"))
            .field("observer", &self.observer.as_ref().map(|_| "<dyn SessionObserver>"))
            .finish()
    }
}

/// Keys up to this length are hidden completely.
const REDACT_TAIL_MIN_LEN: usize = 8;

fn redact(key: &str) -> String {
    let len = key.chars().count();
    if len == 0 {
        String::new()
    } else if len <= REDACT_TAIL_MIN_LEN {
        "****".to_string()
    } else {
        let tail: String = key.chars().skip(len - 4).collect();
        format!("****{tail}")
    }
}

impl VisionConfig {
    /// Create a new builder for `VisionConfig`.
    pub fn builder() -> VisionConfigBuilder {
        VisionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Builder pre-filled from `PDF2VISION_API_KEY` and
    /// `PDF2VISION_ENDPOINT_URL` (unset variables are left empty).
    pub fn from_env() -> VisionConfigBuilder {
        let mut builder = Self::builder();
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            builder = builder.api_key(key);
        }
        if let Ok(url) = std::env::var(ENV_ENDPOINT_URL) {
            builder = builder.endpoint_url(url);
        }
        builder
    }

    /// Directory receiving the page images: `image_dir` if set, otherwise
    /// `images/` under the current working directory.
    pub fn resolve_image_dir(&self) -> Result<PathBuf, Pdf2VisionError> {
        match &self.image_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir()
                .map(|cwd| cwd.join(DEFAULT_IMAGE_DIR))
                .map_err(|e| Pdf2VisionError::Internal(format!("current_dir: {e}"))),
        }
    }
}

/// Builder for [`VisionConfig`].
#[derive(Debug)]
pub struct VisionConfigBuilder {
    config: VisionConfig,
}

impl VisionConfigBuilder {
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint_url = url.into().trim().to_string();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into().trim().to_string();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn detect_orientation(mut self, v: bool) -> Self {
        self.config.detect_orientation = v;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.image_dir = Some(dir.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn client(mut self, client: Arc<dyn OcrClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Endpoint and key are only required when no client was injected.
    pub fn build(self) -> Result<VisionConfig, Pdf2VisionError> {
        let c = &self.config;
        if c.client.is_none() {
            if c.endpoint_url.is_empty() {
                return Err(Pdf2VisionError::InvalidConfig(format!(
                    "endpoint URL is required (set --endpoint or {ENV_ENDPOINT_URL})"
                )));
            }
            let url = reqwest::Url::parse(&c.endpoint_url).map_err(|e| {
                Pdf2VisionError::InvalidConfig(format!(
                    "endpoint URL '{}' is invalid: {e}",
                    c.endpoint_url
                ))
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(Pdf2VisionError::InvalidConfig(format!(
                    "endpoint URL must be http or https, got '{}'",
                    url.scheme()
                )));
            }
            if c.api_key.is_empty() {
                return Err(Pdf2VisionError::InvalidConfig(format!(
                    "API key is required (set --api-key or {ENV_API_KEY})"
                )));
            }
        }
        if c.language.trim().is_empty() {
            return Err(Pdf2VisionError::InvalidConfig(
                "language must not be empty; use \"unk\" for auto-detection".into(),
            ));
        }
        Ok(self.config)
    }
}
