//! Headless Chromium renderer for pages gated behind client-side scripts.
//!
//! The browser is launched on first use and shared by every render. Each
//! render opens its own tab, waits until the ready selector matches and
//! returns the serialized DOM.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use ferry_logging::{ferry_debug, ferry_info, ferry_warn};
use futures_util::StreamExt;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::render::Renderer;
use crate::types::{FailureKind, RenderError};

const READY_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Chromium binary; detected from the usual install locations when unset.
    pub executable: Option<PathBuf>,
    pub launch_timeout: Duration,
    /// Upper bound on navigation plus waiting for `ready_selector`.
    pub request_timeout: Duration,
    pub ready_selector: String,
    pub user_agent: String,
    pub sandbox: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            launch_timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(60),
            ready_selector: "body".to_string(),
            user_agent: "Mozilla/5.0 (compatible; ferry-schedule/0.1)".to_string(),
            sandbox: true,
        }
    }
}

struct RunningBrowser {
    browser: Browser,
    events: JoinHandle<()>,
}

impl Drop for RunningBrowser {
    fn drop(&mut self) {
        self.events.abort();
    }
}

pub struct ChromeRenderer {
    settings: BrowserSettings,
    running: OnceCell<RunningBrowser>,
}

impl ChromeRenderer {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            running: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    async fn browser(&self) -> Result<&Browser, RenderError> {
        let running = self.running.get_or_try_init(|| launch(&self.settings)).await?;
        Ok(&running.browser)
    }

    async fn load(&self, url: &str) -> Result<String, RenderError> {
        let browser = self.browser().await?;
        let page = browser.new_page(url).await.map_err(browser_error)?;
        let html = read_when_ready(&page, &self.settings.ready_selector).await;
        if let Err(err) = page.close().await {
            ferry_debug!("Closing tab for {} failed: {}", url, err);
        }
        html
    }
}

async fn launch(settings: &BrowserSettings) -> Result<RunningBrowser, RenderError> {
    let mut builder = BrowserConfig::builder()
        .request_timeout(settings.request_timeout)
        .launch_timeout(settings.launch_timeout)
        .arg(format!("--user-agent={}", settings.user_agent));
    if let Some(executable) = &settings.executable {
        builder = builder.chrome_executable(executable);
    }
    if !settings.sandbox {
        builder = builder.no_sandbox();
    }
    let config = builder
        .build()
        .map_err(|message| RenderError::new(FailureKind::Browser, message))?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(browser_error)?;
    let events = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(err) = event {
                ferry_warn!("Browser connection closed: {}", err);
                break;
            }
        }
    });
    ferry_info!("Headless browser started");
    Ok(RunningBrowser { browser, events })
}

async fn read_when_ready(page: &Page, selector: &str) -> Result<String, RenderError> {
    while page.find_element(selector).await.is_err() {
        tokio::time::sleep(READY_POLL).await;
    }
    page.content().await.map_err(browser_error)
}

fn browser_error(err: chromiumoxide::error::CdpError) -> RenderError {
    RenderError::new(FailureKind::Browser, err.to_string())
}

#[async_trait::async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &str, cancel: &CancellationToken) -> Result<String, RenderError> {
        let parsed = url::Url::parse(url)
            .map_err(|err| RenderError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let timeout = self.settings.request_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RenderError::cancelled()),
            result = tokio::time::timeout(timeout, self.load(parsed.as_str())) => {
                result.unwrap_or_else(|_| {
                    Err(RenderError::new(
                        FailureKind::Timeout,
                        format!("{parsed} not ready after {timeout:?}"),
                    ))
                })
            }
        }
    }
}
