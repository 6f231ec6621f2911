use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://dvonb.xyz/api/2025-fall/itis-3135/students?full=1";

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:95.0) Gecko/20100101 Firefox/95.0";

/// Keys that may wrap the record list inside an object payload, in lookup order.
const LIST_KEYS: &[&str] = &["students", "data"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    #[error("Request failed: {status}")]
    Response { status: u16 },

    #[error("invalid JSON payload: {message}")]
    Decode { message: String },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read payload file: {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Normalized API payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Roster {
    /// Ordered raw entries; each may still wrap its record under
    /// `student` or `fields`.
    Records(Vec<Value>),
    /// A payload with no record list, kept whole for display.
    Blob(Value),
}

impl Roster {
    pub fn records(&self) -> &[Value] {
        match self {
            Roster::Records(records) => records,
            Roster::Blob(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Roster::Records(records) => records.is_empty(),
            Roster::Blob(value) => value.is_null(),
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Roster::Records(_) => "records",
            Roster::Blob(_) => "blob",
        }
    }
}

/// Bare arrays pass through; objects yield the first array under `students`
/// or `data`; anything else is kept as a blob.
pub fn normalize_payload(payload: Value) -> Roster {
    match payload {
        Value::Array(items) => Roster::Records(items),
        Value::Object(mut map) => {
            for key in LIST_KEYS {
                if matches!(map.get(*key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(*key) {
                        return Roster::Records(items);
                    }
                }
            }
            Roster::Blob(Value::Object(map))
        }
        Value::Null => Roster::Records(Vec::new()),
        other => Roster::Blob(other),
    }
}

pub fn parse_payload(body: &str) -> Result<Roster, LoadError> {
    let value: Value = serde_json::from_str(body).map_err(|e| LoadError::Decode {
        message: e.to_string(),
    })?;
    Ok(normalize_payload(value))
}

pub fn load_file(path: &Path) -> Result<Roster, LoadError> {
    let body = std::fs::read_to_string(path).map_err(|e| LoadError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_payload(&body)
}

/// Issues and observes view activations. Starting a new activation, or
/// ending the current one, makes every earlier `Activation` stale.
#[derive(Clone, Debug, Default)]
pub struct Session {
    current: Arc<AtomicU64>,
}

#[derive(Clone, Debug)]
pub struct Activation {
    id: u64,
    current: Arc<AtomicU64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&self) -> Activation {
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        Activation {
            id,
            current: Arc::clone(&self.current),
        }
    }

    pub fn deactivate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

impl Activation {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_live(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.id
    }
}

#[derive(Debug)]
pub enum LoadOutcome {
    Applied(Result<Roster, LoadError>),
    /// The activation ended while the request was in flight.
    Discarded,
}

#[derive(Clone, Debug)]
pub enum PayloadSource {
    Endpoint(String),
    File(PathBuf),
}

#[derive(Clone, Debug)]
pub struct LoaderOptions {
    pub source: PayloadSource,
    pub timeout_seconds: Option<u64>,
    pub proxy: Option<String>,
    /// Ignore proxies configured through the environment.
    pub no_proxy: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            source: PayloadSource::Endpoint(DEFAULT_ENDPOINT.to_string()),
            timeout_seconds: None,
            proxy: None,
            no_proxy: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Loader {
    client: reqwest::Client,
    source: PayloadSource,
}

fn build_client(options: &LoaderOptions) -> Result<reqwest::Client, LoadError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(USER_AGENT),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10));

    if let Some(secs) = options.timeout_seconds.filter(|s| *s > 0) {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    if options.no_proxy {
        builder = builder.no_proxy();
    }

    if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| LoadError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| LoadError::ClientBuild { source: e })
}

impl Loader {
    pub fn new(options: LoaderOptions) -> Result<Self, LoadError> {
        let client = build_client(&options)?;
        Ok(Self {
            client,
            source: options.source,
        })
    }

    pub fn source(&self) -> &PayloadSource {
        &self.source
    }

    /// One request against the configured source, no retries.
    pub async fn fetch(&self) -> Result<Roster, LoadError> {
        let url = match &self.source {
            PayloadSource::File(path) => return load_file(path),
            PayloadSource::Endpoint(url) => url,
        };
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::Transport { source: e })?;
        let status = res.status();
        if !status.is_success() {
            return Err(LoadError::Response {
                status: status.as_u16(),
            });
        }
        let body = res
            .text()
            .await
            .map_err(|e| LoadError::Transport { source: e })?;
        parse_payload(&body)
    }

    /// Fetch on behalf of `activation`, dropping the result if the
    /// activation is no longer live when it arrives.
    pub async fn load(&self, activation: &Activation) -> LoadOutcome {
        let result = self.fetch().await;
        if activation.is_live() {
            LoadOutcome::Applied(result)
        } else {
            LoadOutcome::Discarded
        }
    }
}
