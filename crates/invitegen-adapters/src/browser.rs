//! Page fetcher backed by a Chromium-based browser via the Chrome DevTools Protocol.
//!
//! # Architecture
//!
//! 1. [`Adapter::connect`] probes `http://127.0.0.1:{port}/json/version` and
//!    launches a headless Chromium when nothing answers.
//! 2. Every fetch opens its own tab with `PUT /json/new`, so tabs already open
//!    in a reused browser are never touched.
//! 3. One WebSocket session to that tab carries `Page.enable`,
//!    `Page.navigate`, the wait for `Page.loadEventFired`, and finally
//!    `Runtime.evaluate` of the body's `innerText` after the settle delay.
//! 4. The tab is closed with `/json/close/{id}` whether or not the fetch
//!    succeeded.

use std::process::Stdio;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::error::{AdapterError, Result};
use crate::traits::{Adapter, HealthStatus, PageFetcher};

/// Default Chrome DevTools Protocol debug port.
pub const DEFAULT_DEBUG_PORT: u16 = 9222;

/// Default wait after the load event before reading the page, in milliseconds.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 5000;

/// Timeout for a single CDP round trip, and the default page load timeout.
const CDP_TIMEOUT_SECS: u64 = 30;

/// Timeout for HTTP requests to the DevTools endpoint in seconds.
const HTTP_TIMEOUT_SECS: u64 = 10;

/// Timeout waiting for a launched browser to answer, in seconds.
const CHROME_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Largest CDP frame accepted (5 MB).
const MAX_CDP_RESPONSE_BYTES: usize = 5 * 1024 * 1024;

/// Expression evaluated to read the rendered page text.
const BODY_TEXT_EXPRESSION: &str = "document.body ? document.body.innerText : ''";

/// CDP event marking the end of page load.
const LOAD_EVENT: &str = "Page.loadEventFired";

type CdpStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn browser_error(reason: impl Into<String>) -> AdapterError {
    AdapterError::ExecutionFailed {
        operation: "browser".into(),
        reason: reason.into(),
    }
}

fn cdp_timeout() -> Duration {
    Duration::from_secs(CDP_TIMEOUT_SECS)
}

// ---------------------------------------------------------------------------
// BrowserFetcher
// ---------------------------------------------------------------------------

/// Page fetcher using the Chrome DevTools Protocol.
pub struct BrowserFetcher {
    /// Unique identifier for this adapter instance.
    id: String,
    /// Whether the adapter has been connected.
    connected: AtomicBool,
    /// Optional path to the Chrome/Chromium executable.
    chrome_path: Option<String>,
    /// The remote debugging port.
    debug_port: u16,
    /// Upper bound on the wait for `Page.loadEventFired`.
    load_timeout: Duration,
    /// Wait between the load event and text extraction.
    settle_delay: Duration,
    /// HTTP client for DevTools REST endpoints.
    client: reqwest::Client,
    /// Browser process started by [`Adapter::connect`], if any.
    launched: Mutex<Option<tokio::process::Child>>,
}

impl BrowserFetcher {
    /// Create a new fetcher with the default debug port (9222).
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_port(id, DEFAULT_DEBUG_PORT)
    }

    /// Create a new fetcher with a custom debug port.
    pub fn with_port(id: impl Into<String>, port: u16) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(concat!("invitegen/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .unwrap_or_default();

        Self {
            id: id.into(),
            connected: AtomicBool::new(false),
            chrome_path: None,
            debug_port: port,
            load_timeout: cdp_timeout(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            client,
            launched: Mutex::new(None),
        }
    }

    /// Set a custom Chrome/Chromium executable path.
    pub fn with_chrome_path(mut self, path: impl Into<String>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    /// Set the wait between the load event and text extraction.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the upper bound on the wait for the page's load event.
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    fn devtools_base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.debug_port)
    }

    async fn is_devtools_reachable(&self) -> bool {
        let url = format!("{}/json/version", self.devtools_base_url());
        self.client.get(&url).send().await.is_ok()
    }

    // -- Browser process ----------------------------------------------------

    /// Start a headless browser and wait until its DevTools endpoint answers.
    async fn launch_headless(&self) -> Result<()> {
        let executable = self.find_chrome_path().await?;
        info!(
            executable = %executable,
            port = self.debug_port,
            "launching headless browser"
        );

        let child = tokio::process::Command::new(&executable)
            .args([
                format!("--remote-debugging-port={}", self.debug_port).as_str(),
                "--headless=new",
                "--disable-gpu",
                "--no-first-run",
                "--no-default-browser-check",
                "about:blank",
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AdapterError::ExecutionFailed {
                operation: "connect".into(),
                reason: format!("failed to launch `{executable}`: {e}"),
            })?;

        if let Ok(mut slot) = self.launched.lock() {
            *slot = Some(child);
        }

        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(CHROME_STARTUP_TIMEOUT_SECS);
        while !self.is_devtools_reachable().await {
            if tokio::time::Instant::now() >= deadline {
                return Err(AdapterError::Timeout {
                    seconds: CHROME_STARTUP_TIMEOUT_SECS,
                    reason: "browser DevTools endpoint never answered".into(),
                });
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        debug!("DevTools endpoint answered");
        Ok(())
    }

    /// The configured executable, or the first well-known install found.
    async fn find_chrome_path(&self) -> Result<String> {
        if let Some(ref path) = self.chrome_path {
            return Ok(path.clone());
        }

        let candidates: &[&str] = if cfg!(target_os = "macos") {
            &[
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
                "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
            ]
        } else if cfg!(target_os = "linux") {
            &[
                "google-chrome",
                "google-chrome-stable",
                "chromium",
                "chromium-browser",
            ]
        } else {
            &[]
        };

        for candidate in candidates {
            if std::path::Path::new(candidate).exists() || on_path(candidate).await {
                return Ok((*candidate).to_owned());
            }
        }

        Err(AdapterError::ExecutionFailed {
            operation: "connect".into(),
            reason: "no Chrome/Chromium executable found; set browser.chrome_path".into(),
        })
    }

    // -- Tabs ---------------------------------------------------------------

    /// Open a blank tab reserved for one fetch.
    async fn open_tab(&self) -> Result<PageTarget> {
        let url = format!("{}/json/new?about:blank", self.devtools_base_url());
        let target: Value = self
            .client
            .put(&url)
            .send()
            .await
            .map_err(|e| browser_error(format!("failed to open a tab: {e}")))?
            .json()
            .await
            .map_err(|e| browser_error(format!("unexpected reply to tab creation: {e}")))?;

        let tab = PageTarget::from_json(&target)?;
        debug!(tab = %tab.id, "tab opened");
        Ok(tab)
    }

    /// Close a tab opened by [`Self::open_tab`]; failures are only logged.
    async fn close_tab(&self, tab: &PageTarget) {
        let url = format!("{}/json/close/{}", self.devtools_base_url(), tab.id);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => debug!(tab = %tab.id, "tab closed"),
            Ok(resp) => warn!(tab = %tab.id, status = %resp.status(), "failed to close tab"),
            Err(e) => warn!(tab = %tab.id, error = %e, "failed to close tab"),
        }
    }

    /// Load `url` in `tab` and return the body text.
    async fn read_page(&self, tab: &PageTarget, url: &str) -> Result<String> {
        let mut session = CdpSession::open(&tab.ws_url).await?;

        session.call("Page.enable", json!({})).await?;
        session.discard_events();

        let navigation = session.call("Page.navigate", json!({ "url": url })).await?;
        if let Some(error_text) = navigation.get("errorText").and_then(Value::as_str) {
            return Err(AdapterError::ExecutionFailed {
                operation: "Page.navigate".into(),
                reason: format!("navigation to `{url}` failed: {error_text}"),
            });
        }

        session.wait_for_event(LOAD_EVENT, self.load_timeout).await?;
        debug!(url, "page loaded");

        if !self.settle_delay.is_zero() {
            debug!(
                delay_ms = self.settle_delay.as_millis() as u64,
                "waiting for page to settle"
            );
            tokio::time::sleep(self.settle_delay).await;
        }

        let evaluation = session
            .call(
                "Runtime.evaluate",
                json!({
                    "expression": BODY_TEXT_EXPRESSION,
                    "returnByValue": true,
                }),
            )
            .await?;
        session.close().await;

        evaluated_text(&evaluation)
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(AdapterError::NotConnected {
                adapter_id: self.id.clone(),
            });
        }

        let parsed = validate_page_url(url)?;
        info!(url = %parsed, "fetching page");

        let tab = self.open_tab().await?;
        let result = self.read_page(&tab, parsed.as_str()).await;
        self.close_tab(&tab).await;

        let text = result?;
        info!(url = %parsed, chars = text.chars().count(), "page text extracted");
        Ok(text)
    }
}

#[async_trait]
impl Adapter for BrowserFetcher {
    fn id(&self) -> &str {
        &self.id
    }

    async fn connect(&mut self) -> Result<()> {
        info!(id = %self.id, port = self.debug_port, "connecting browser fetcher");

        if self.is_devtools_reachable().await {
            info!("reusing running DevTools endpoint");
        } else {
            self.launch_headless().await?;
        }

        self.connected.store(true, Ordering::Release);
        info!(id = %self.id, "browser fetcher connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let launched = self
            .launched
            .get_mut()
            .map(Option::take)
            .unwrap_or_default();
        if let Some(mut child) = launched {
            if let Err(e) = child.kill().await {
                warn!(id = %self.id, error = %e, "failed to stop launched browser");
            }
        }

        self.connected.store(false, Ordering::Release);
        info!(id = %self.id, "browser fetcher disconnected");
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        if !self.connected.load(Ordering::Acquire) {
            return Ok(HealthStatus::Unhealthy);
        }

        if self.is_devtools_reachable().await {
            Ok(HealthStatus::Healthy)
        } else {
            warn!(id = %self.id, "DevTools endpoint unreachable during health check");
            Ok(HealthStatus::Degraded)
        }
    }
}

// ---------------------------------------------------------------------------
// CDP session
// ---------------------------------------------------------------------------

/// A tab as described by the DevTools HTTP endpoint.
#[derive(Debug, Clone)]
struct PageTarget {
    id: String,
    ws_url: String,
}

impl PageTarget {
    fn from_json(target: &Value) -> Result<Self> {
        let field = |name: &str| target.get(name).and_then(Value::as_str).map(str::to_owned);
        match (field("id"), field("webSocketDebuggerUrl")) {
            (Some(id), Some(ws_url)) => Ok(Self { id, ws_url }),
            _ => Err(browser_error(
                "tab description lacks `id` or `webSocketDebuggerUrl`",
            )),
        }
    }
}

/// One WebSocket connection to a single tab.
///
/// Events that arrive while a command reply is awaited are remembered, so an
/// event that overtakes its command's reply is not lost.
struct CdpSession {
    ws: CdpStream,
    next_id: u64,
    events: Vec<String>,
}

impl CdpSession {
    async fn open(ws_url: &str) -> Result<Self> {
        let (ws, _response) = tokio::time::timeout(cdp_timeout(), connect_async(ws_url))
            .await
            .map_err(|_| AdapterError::Timeout {
                seconds: CDP_TIMEOUT_SECS,
                reason: format!("WebSocket connection to `{ws_url}` timed out"),
            })?
            .map_err(|e| browser_error(format!("WebSocket connection failed: {e}")))?;

        Ok(Self {
            ws,
            next_id: 1,
            events: Vec::new(),
        })
    }

    /// Next JSON frame from the browser.
    async fn recv(&mut self) -> Result<Value> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    if text.len() > MAX_CDP_RESPONSE_BYTES {
                        return Err(browser_error(format!(
                            "CDP frame too large: {} bytes (max {MAX_CDP_RESPONSE_BYTES})",
                            text.len()
                        )));
                    }
                    return Ok(serde_json::from_str(&text)?);
                }
                Some(Ok(Message::Close(_))) | None => {
                    return Err(browser_error("DevTools closed the WebSocket"));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Err(browser_error(format!("WebSocket receive error: {e}")));
                }
            }
        }
    }

    /// Send a command and return its `result` object.
    async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        debug!(method, id, "sending CDP command");
        let message = build_cdp_message(id, method, params);
        self.ws
            .send(Message::Text(message.to_string().into()))
            .await
            .map_err(|e| browser_error(format!("failed to send `{method}`: {e}")))?;

        let reply = tokio::time::timeout(cdp_timeout(), async {
            loop {
                let frame = self.recv().await?;
                if frame.get("id").and_then(Value::as_u64) == Some(id) {
                    return Ok::<Value, AdapterError>(frame);
                }
                if let Some(event) = frame.get("method").and_then(Value::as_str) {
                    self.events.push(event.to_owned());
                }
            }
        })
        .await
        .map_err(|_| AdapterError::Timeout {
            seconds: CDP_TIMEOUT_SECS,
            reason: format!("waiting for the reply to `{method}`"),
        })??;

        if let Some(error) = reply.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown CDP error");
            return Err(browser_error(format!("`{method}` failed: {message}")));
        }
        Ok(reply.get("result").cloned().unwrap_or_else(|| json!({})))
    }

    /// Forget events seen so far.
    fn discard_events(&mut self) {
        self.events.clear();
    }

    /// Wait until `event` arrives, or return at once if it already has.
    async fn wait_for_event(&mut self, event: &str, timeout: Duration) -> Result<()> {
        if self.events.iter().any(|seen| seen == event) {
            self.events.clear();
            return Ok(());
        }

        tokio::time::timeout(timeout, async {
            loop {
                let frame = self.recv().await?;
                if frame.get("method").and_then(Value::as_str) == Some(event) {
                    return Ok::<(), AdapterError>(());
                }
            }
        })
        .await
        .map_err(|_| AdapterError::Timeout {
            seconds: timeout.as_secs(),
            reason: format!("page never fired `{event}`"),
        })?
    }

    async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse and check a page URL; only `http` and `https` are fetched.
fn validate_page_url(raw: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| AdapterError::InvalidInput {
        operation: "fetch_text".into(),
        reason: format!("invalid URL `{raw}`: {e}"),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(AdapterError::InvalidInput {
            operation: "fetch_text".into(),
            reason: format!("unsupported URL scheme `{other}`; expected http or https"),
        }),
    }
}

/// The text produced by a `Runtime.evaluate` reply.
///
/// A missing or `null` value reads as empty text; a thrown exception is an
/// error.
fn evaluated_text(evaluation: &Value) -> Result<String> {
    let failure = |reason: String| AdapterError::ExecutionFailed {
        operation: "Runtime.evaluate".into(),
        reason,
    };

    if let Some(details) = evaluation.get("exceptionDetails") {
        let text = details
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or("unknown exception");
        return Err(failure(format!("page script threw: {text}")));
    }

    let Some(remote) = evaluation.get("result") else {
        return Err(failure("reply has no `result` object".into()));
    };

    Ok(match remote.get("value") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    })
}

/// Whether `name` resolves on `PATH`.
async fn on_path(name: &str) -> bool {
    tokio::process::Command::new("which")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok_and(|status| status.success())
}

/// Build a CDP message JSON object.
pub fn build_cdp_message(id: u64, method: &str, params: Value) -> Value {
    json!({
        "id": id,
        "method": method,
        "params": params,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
