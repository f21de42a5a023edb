//! Chromium driver over the DevTools protocol
//!
//! [`CdpDriver`] launches a Chromium through `chromiumoxide` and exposes it
//! as a blocking [`BrowserDriver`]. It owns a tokio runtime; every call
//! blocks on it, bounded by the configured command timeout.

use crate::cookies::Cookie;
use crate::driver::{BrowserDriver, DriverConfig, DriverError, ElementHandle, Selector};
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, DeleteCookiesParams};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info};

fn cdp_error(err: impl std::fmt::Display) -> DriverError {
    DriverError::webdriver(err.to_string())
}

/// Chromium browser session
pub struct CdpDriver {
    runtime: Runtime,
    browser: Mutex<Option<CdpBrowser>>,
    page: CdpPage,
    handler: tokio::task::JoinHandle<()>,
    command_timeout: Duration,
    elements: Mutex<HashMap<String, Selector>>,
    next_element: AtomicUsize,
    open: AtomicBool,
}

impl std::fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpDriver")
            .field("command_timeout", &self.command_timeout)
            .field("open", &self.open.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl CdpDriver {
    /// Launch a browser and open a blank page
    ///
    /// # Errors
    ///
    /// Returns error if the runtime or the browser cannot be started
    pub fn launch(config: &DriverConfig) -> Result<Self, DriverError> {
        let runtime = Runtime::new().map_err(cdp_error)?;

        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .request_timeout(config.command_timeout)
            .arg(format!("--lang={}", config.locale));
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(DriverError::webdriver)?;

        let (browser, page, handler) = runtime.block_on(async {
            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(cdp_error)?;
            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            let page = browser.new_page("about:blank").await.map_err(cdp_error)?;
            Ok::<_, DriverError>((browser, page, handle))
        })?;
        info!(headless = config.headless, "browser launched");

        Ok(Self {
            runtime,
            browser: Mutex::new(Some(browser)),
            page,
            handler,
            command_timeout: config.command_timeout,
            elements: Mutex::new(HashMap::new()),
            next_element: AtomicUsize::new(0),
            open: AtomicBool::new(true),
        })
    }

    /// Close the browser; later calls fail with [`DriverError::SessionClosed`]
    ///
    /// # Errors
    ///
    /// Returns error if the browser does not shut down cleanly
    pub fn close(&self) -> Result<(), DriverError> {
        self.open.store(false, Ordering::SeqCst);
        let browser = self
            .browser
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut browser) = browser {
            self.runtime
                .block_on(browser.close())
                .map_err(cdp_error)?;
        }
        self.handler.abort();
        Ok(())
    }

    fn run<T, F>(&self, what: &str, command: F) -> Result<T, DriverError>
    where
        F: Future<Output = Result<T, DriverError>>,
    {
        if !self.is_open() {
            return Err(DriverError::SessionClosed);
        }
        self.runtime
            .block_on(async { tokio::time::timeout(self.command_timeout, command).await })
            .map_err(|_| DriverError::Timeout {
                message: format!("{what} took longer than {:?}", self.command_timeout),
            })?
    }

    fn evaluate_bool(&self, what: &str, script: String) -> Result<bool, DriverError> {
        self.run(what, async {
            self.page
                .evaluate(script)
                .await
                .map_err(cdp_error)?
                .into_value::<bool>()
                .map_err(cdp_error)
        })
    }
}

fn visibility_script(selector: &Selector) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) return false; \
         const rect = el.getBoundingClientRect(); const style = getComputedStyle(el); \
         return rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none'; }})()",
        selector.to_query()
    )
}

fn existence_script(selector: &Selector) -> String {
    format!("({}) !== null && ({}) !== undefined", selector.to_query(), selector.to_query())
}

impl BrowserDriver for CdpDriver {
    fn current_url(&self) -> Result<String, DriverError> {
        self.run("reading the location", async {
            Ok(self.page.url().await.map_err(cdp_error)?.unwrap_or_default())
        })
    }

    fn navigate_to(&self, url: &str) -> Result<(), DriverError> {
        debug!(url, "navigating");
        self.run("navigation", async {
            self.page.goto(url).await.map_err(cdp_error)?;
            Ok(())
        })
    }

    fn refresh(&self) -> Result<(), DriverError> {
        self.run("reload", async {
            self.page.reload().await.map_err(cdp_error)?;
            Ok(())
        })
    }

    fn cookies(&self) -> Result<Vec<Cookie>, DriverError> {
        self.run("reading cookies", async {
            let cookies = self.page.get_cookies().await.map_err(cdp_error)?;
            Ok(cookies
                .into_iter()
                .map(|c| Cookie::new(c.name, c.value).with_domain(c.domain).with_path(c.path))
                .collect())
        })
    }

    fn add_cookie(&self, cookie: &Cookie) -> Result<(), DriverError> {
        let mut param = CookieParam::new(cookie.name.clone(), cookie.value.clone());
        param.domain = cookie.domain.clone();
        param.path = cookie.path.clone();
        self.run("adding a cookie", async {
            self.page.set_cookie(param).await.map_err(cdp_error)?;
            Ok(())
        })
    }

    fn delete_cookie(&self, name: &str) -> Result<(), DriverError> {
        self.run("deleting a cookie", async {
            self.page
                .delete_cookie(DeleteCookiesParams::new(name))
                .await
                .map_err(cdp_error)?;
            Ok(())
        })
    }

    fn is_visible(&self, selector: &Selector) -> Result<bool, DriverError> {
        self.evaluate_bool("visibility probe", visibility_script(selector))
    }

    fn exists(&self, selector: &Selector) -> Result<bool, DriverError> {
        self.evaluate_bool("existence probe", existence_script(selector))
    }

    fn find_element(&self, selector: &Selector) -> Result<Option<ElementHandle>, DriverError> {
        if !self.exists(selector)? {
            return Ok(None);
        }
        let id = format!("cdp-{}", self.next_element.fetch_add(1, Ordering::SeqCst));
        self.elements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), selector.clone());
        Ok(Some(ElementHandle::new(id)))
    }

    fn locator_of(&self, element: &ElementHandle) -> Result<Selector, DriverError> {
        self.elements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&element.id)
            .cloned()
            .ok_or_else(|| DriverError::NoSuchElement {
                element: element.id.clone(),
            })
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
