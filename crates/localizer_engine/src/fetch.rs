use std::error::Error as StdError;
use std::future::Future;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use localizer_logging::{localizer_debug, localizer_warn};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Option<Duration>,
    pub redirect_limit: usize,
    /// Upper bound on the body size; `None` accepts anything.
    pub max_bytes: Option<u64>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            redirect_limit: 10,
            max_bytes: None,
            user_agent: concat!("image-localizer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Transport used by the localizer for remote references.
///
/// Implementations follow redirects and treat any non-success status as a
/// failure. `timeout` bounds the whole request; `None` waits forever.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Option<Duration>) -> Result<FetchOutput, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(
        &self,
        redirect_counter: Arc<AtomicUsize>,
        verify_certificates: bool,
    ) -> Result<reqwest::Client, FetchError> {
        let redirect_limit = self.settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            redirect_counter.store(count, Ordering::Relaxed);
            if count > redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        let mut builder = reqwest::Client::builder()
            .user_agent(self.settings.user_agent.as_str())
            .redirect(policy)
            .danger_accept_invalid_certs(!verify_certificates);
        if let Some(connect_timeout) = self.settings.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        builder
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    async fn fetch_once(
        &self,
        url: &reqwest::Url,
        timeout: Option<Duration>,
        verify_certificates: bool,
    ) -> Result<FetchOutput, FetchError> {
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let client = self.build_client(redirect_counter.clone(), verify_certificates)?;

        let mut request = client.get(url.clone());
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("{status} for {url}"),
            ));
        }

        if let (Some(max_bytes), Some(content_len)) =
            (self.settings.max_bytes, response.content_length())
        {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let final_url = response.url().to_string();
        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string())
        };
        let content_type = header(CONTENT_TYPE);
        let content_disposition = header(CONTENT_DISPOSITION);

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if let Some(max_bytes) = self.settings.max_bytes {
                if next_len > max_bytes {
                    return Err(too_large(max_bytes, next_len));
                }
            }
            bytes.extend_from_slice(&chunk);
        }

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            redirect_count: redirect_counter.load(Ordering::Relaxed),
            content_type,
            content_disposition,
            byte_len: bytes.len() as u64,
            tls_verification_skipped: !verify_certificates,
        };

        Ok(FetchOutput { bytes, metadata })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<FetchOutput, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::new(
                FailureKind::UnsupportedScheme(parsed.scheme().to_string()),
                format!("can't fetch {url} over HTTP"),
            ));
        }

        let result = with_certificate_fallback(url, |verify_certificates| {
            self.fetch_once(&parsed, timeout, verify_certificates)
        })
        .await;
        if let Err(err) = &result {
            localizer_debug!("Fetching \"{}\" failed: {}", url, err);
        }
        result
    }
}

/// Runs `attempt` with certificate verification and, only when that fails on
/// the certificate, exactly once more without it.
pub(crate) async fn with_certificate_fallback<F, Fut>(
    url: &str,
    mut attempt: F,
) -> Result<FetchOutput, FetchError>
where
    F: FnMut(bool) -> Fut,
    Fut: Future<Output = Result<FetchOutput, FetchError>>,
{
    match attempt(true).await {
        Err(err) if err.kind == FailureKind::Certificate => {
            localizer_warn!(
                "Incorrect TLS certificate for \"{}\" ({}), retrying without verification...",
                url,
                err.message
            );
            attempt(false).await
        }
        result => result,
    }
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    let message = error_chain_message(&err);
    if is_certificate_error(&err) {
        return FetchError::new(FailureKind::Certificate, message);
    }
    FetchError::new(FailureKind::Network, message)
}

/// True when any error in the source chain reports a certificate validation failure.
pub(crate) fn is_certificate_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if text.contains("certificate") || text.contains("unknownissuer") {
            return true;
        }
        current = e.source();
    }
    false
}

fn error_chain_message(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        message.push_str(": ");
        message.push_str(&e.to_string());
        current = e.source();
    }
    message
}
