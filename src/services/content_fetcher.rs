//! README retrieval from GitHub.
//!
//! A repository URL is parsed into an owner/repo pair before any network I/O,
//! then a single request is made to the REST API's README endpoint asking for
//! the raw representation. No retries, no pagination. The body is returned
//! byte for byte and must be valid UTF-8.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, USER_AGENT};
use url::Url;

/// Media type that makes GitHub return the README body instead of JSON metadata.
pub const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";

const USER_AGENT_STRING: &str = concat!("github-summarizer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    InvalidLocator(String),

    #[error("GitHub returned {status}")]
    Status { status: StatusCode },

    #[error("request to GitHub failed: {0}")]
    Transport(String),

    #[error("README is not valid UTF-8")]
    NotUtf8,

    #[error("README exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("README fetch timed out")]
    Timeout,
}

/// `owner/repo` pair on github.com.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocator {
    pub owner: String,
    pub repo: String,
}

impl RepoLocator {
    /// Parse `[scheme://][www.]github.com/owner/repo[/...]`.
    ///
    /// The scheme may be omitted; when present it must be http or https.
    /// Anything after the repo segment (tree/branch paths, query, fragment)
    /// is ignored and a trailing `.git` on the repo is stripped.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let trimmed = input.trim();
        let invalid = || {
            FetchError::InvalidLocator(format!(
                "expected a github.com/owner/repo URL, got {trimmed:?}"
            ))
        };

        if trimmed.is_empty() {
            return Err(invalid());
        }

        let candidate = if trimmed.contains("://") {
            Cow::Borrowed(trimmed)
        } else {
            Cow::Owned(format!("https://{trimmed}"))
        };

        let url = Url::parse(&candidate).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid());
        }
        if !matches!(url.host_str(), Some("github.com" | "www.github.com")) {
            return Err(invalid());
        }

        let mut segments = url.path_segments().ok_or_else(invalid)?;
        let owner = segments.next().filter(|s| is_valid_name(s)).ok_or_else(invalid)?;
        let repo_segment = segments.next().ok_or_else(invalid)?;
        let repo = repo_segment.strip_suffix(".git").unwrap_or(repo_segment);
        if !is_valid_name(repo) {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl fmt::Display for RepoLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// GitHub owner and repository names: ASCII alphanumerics, `-`, `_` and `.`.
fn is_valid_name(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Source of README text for a repository.
#[async_trait]
pub trait ReadmeSource: Send + Sync {
    /// Fetch the default-branch README of an already parsed repository.
    async fn fetch(&self, locator: &RepoLocator) -> Result<String, FetchError>;

    /// Parse `repo_url` and fetch its README. A malformed URL fails with
    /// `InvalidLocator` before any request is made.
    async fn fetch_readme(&self, repo_url: &str) -> Result<String, FetchError> {
        let locator = RepoLocator::parse(repo_url)?;
        self.fetch(&locator).await
    }
}

/// [`ReadmeSource`] backed by the GitHub REST API.
pub struct GithubReadmeFetcher {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
    max_bytes: usize,
    timeout: Duration,
}

impl GithubReadmeFetcher {
    pub fn new(client: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: None,
            max_bytes: 512 * 1024,
            timeout: Duration::from_secs(10),
        }
    }

    /// Send `Authorization: Bearer <token>`; lifts the anonymous rate limit.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn download(&self, url: &str) -> Result<String, FetchError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, RAW_MEDIA_TYPE)
            .header(USER_AGENT, USER_AGENT_STRING);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let mut response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(FetchError::TooLarge {
                limit: self.max_bytes,
            });
        }

        // Stream so an oversized body is cut off without buffering all of it
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        String::from_utf8(body).map_err(|_| FetchError::NotUtf8)
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.to_string())
    }
}

#[async_trait]
impl ReadmeSource for GithubReadmeFetcher {
    async fn fetch(&self, locator: &RepoLocator) -> Result<String, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/readme",
            self.api_base, locator.owner, locator.repo
        );
        tracing::info!("Fetching README for {}", locator);

        let result = match tokio::time::timeout(self.timeout, self.download(&url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        };

        match &result {
            Ok(body) => tracing::info!("Fetched README for {} ({} bytes)", locator, body.len()),
            Err(e) => tracing::warn!("README fetch for {} failed: {}", locator, e),
        }
        result
    }
}
