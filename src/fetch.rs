use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::HttpSettings;
use crate::error::FetchError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Anything that can turn a URL into an HTML body.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(http: &HttpSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(build_headers(&http.headers))
            .timeout(Duration::from_secs(http.timeout))
            .build()?;
        Ok(HttpFetcher { client })
    }
}

fn build_headers(extra: &HashMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE));

    for (name, value) in extra {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!("Ignoring invalid header {}: {}", name, value),
        }
    }
    headers
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("Fetching URL: {}", url);
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

/// Bounded concurrent fetching. Results line up with the submitted URLs,
/// whatever order the requests finish in.
pub struct FetchPool {
    fetcher: Arc<dyn Fetch>,
    permits: Arc<Semaphore>,
    deadline: Option<Instant>,
}

impl FetchPool {
    pub fn new(fetcher: Arc<dyn Fetch>, concurrency: usize, deadline: Option<Instant>) -> Self {
        FetchPool {
            fetcher,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            deadline,
        }
    }

    /// Fetch every URL. Once the deadline has passed no new request is
    /// started; requests already running finish or time out on their own.
    pub async fn fetch_all(&self, urls: &[String], label: &str) -> Vec<Result<String, FetchError>> {
        let pb = progress_bar(urls.len() as u64, label);

        let handles: Vec<_> = urls
            .iter()
            .map(|url| {
                let fetcher = Arc::clone(&self.fetcher);
                let sem = Arc::clone(&self.permits);
                let deadline = self.deadline;
                let pb = pb.clone();
                let url = url.clone();

                tokio::spawn(async move {
                    let result = match sem.acquire().await {
                        Ok(_permit) if deadline.is_some_and(|d| Instant::now() >= d) => {
                            Err(FetchError::DeadlineExceeded { url })
                        }
                        Ok(_permit) => fetcher.fetch(&url).await,
                        Err(e) => Err(FetchError::Aborted {
                            url,
                            reason: e.to_string(),
                        }),
                    };
                    pb.inc(1);
                    result
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (url, handle) in urls.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(FetchError::Aborted {
                    url: url.clone(),
                    reason: e.to_string(),
                }),
            };
            results.push(result);
        }

        pb.finish_and_clear();
        results
    }
}

fn progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {msg} {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb.set_message(label.to_string());
    pb
}
