use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use url::Url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the HTML document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    File(PathBuf),
    Stdin,
    Url(Url),
}

impl PageSource {
    /// Resolve the CLI arguments: a path (or `-` for stdin), or `--url`.
    pub fn from_args(input: Option<&str>, url: Option<&str>) -> Result<Self> {
        match (input, url) {
            (Some(_), Some(_)) => bail!("Give either a page file or --url, not both"),
            (None, None) => bail!("No page given: pass a file, '-' for stdin, or --url"),
            (Some("-"), None) => Ok(Self::Stdin),
            (Some(path), None) => Ok(Self::File(PathBuf::from(path))),
            (None, Some(raw)) => {
                let url = Url::parse(raw).with_context(|| format!("Invalid URL: {raw}"))?;
                if !matches!(url.scheme(), "http" | "https") {
                    bail!("Unsupported URL scheme: {}", url.scheme());
                }
                Ok(Self::Url(url))
            }
        }
    }

    pub fn is_stdin(&self) -> bool {
        matches!(self, Self::Stdin)
    }

    /// Read the whole document as text.
    pub async fn load(&self) -> Result<String> {
        let html = match self {
            Self::File(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
            Self::Stdin => {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("Failed to read page from stdin")?;
                buf
            }
            Self::Url(url) => fetch(url).await?,
        };
        debug!(bytes = html.len(), source = %self, "Loaded page");
        Ok(html)
    }
}

impl std::fmt::Display for PageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stdin => f.write_str("<stdin>"),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

async fn fetch(url: &Url) -> Result<String> {
    info!("Fetching {url}");
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("tablex/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Request to {url} failed"))?
        .error_for_status()
        .with_context(|| format!("{url} returned an error status"))?;

    response
        .text()
        .await
        .with_context(|| format!("Failed to read body of {url}"))
}
