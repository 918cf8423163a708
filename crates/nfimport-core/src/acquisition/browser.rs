//! Rendering browser tiers.

use std::time::Duration;

use crate::error::AcquisitionError;
use crate::models::config::{BrowserConfig, WaitCondition};

/// Options for one rendered fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub headless: bool,
    pub timeout: Duration,
    pub wait_until: WaitCondition,
    pub post_load_wait: Duration,
    pub slow_mo: Duration,
    pub user_agent: String,
    pub locale: String,
}

impl RenderOptions {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            timeout: config.timeout(),
            wait_until: config.wait_until,
            post_load_wait: config.post_load_wait(),
            slow_mo: config.slow_mo(),
            user_agent: config.user_agent.clone(),
            locale: config.locale.clone(),
        }
    }

    /// Same options with a visible window.
    pub fn visible(&self) -> Self {
        Self {
            headless: false,
            ..self.clone()
        }
    }
}

/// A browser that loads a URL, runs its scripts and returns the final HTML.
pub trait PageRenderer {
    fn render(&self, url: &str, options: &RenderOptions) -> Result<String, AcquisitionError>;
}

impl<R: PageRenderer + ?Sized> PageRenderer for &R {
    fn render(&self, url: &str, options: &RenderOptions) -> Result<String, AcquisitionError> {
        (**self).render(url, options)
    }
}

impl<R: PageRenderer + ?Sized> PageRenderer for Box<R> {
    fn render(&self, url: &str, options: &RenderOptions) -> Result<String, AcquisitionError> {
        (**self).render(url, options)
    }
}

#[cfg(feature = "browser")]
pub use chrome::ChromeRenderer;

/// Stand-in for builds without the `browser` feature. Every render fails.
#[cfg(not(feature = "browser"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRenderer;

#[cfg(not(feature = "browser"))]
impl PageRenderer for UnavailableRenderer {
    fn render(&self, url: &str, _options: &RenderOptions) -> Result<String, AcquisitionError> {
        Err(AcquisitionError::Browser(format!(
            "cannot render {url}: built without the `browser` feature"
        )))
    }
}

#[cfg(feature = "browser")]
mod chrome {
    use std::thread;

    use headless_chrome::{Browser, LaunchOptions};
    use tracing::debug;

    use super::{PageRenderer, RenderOptions};
    use crate::error::AcquisitionError;
    use crate::models::config::WaitCondition;

    /// Chrome or Chromium driven over the DevTools protocol.
    ///
    /// A fresh browser is launched for every render and closed when it
    /// returns.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ChromeRenderer;

    impl ChromeRenderer {
        pub fn new() -> Self {
            Self
        }
    }

    fn browser_error(err: impl std::fmt::Display) -> AcquisitionError {
        AcquisitionError::Browser(err.to_string())
    }

    impl PageRenderer for ChromeRenderer {
        fn render(&self, url: &str, options: &RenderOptions) -> Result<String, AcquisitionError> {
            debug!(
                "Rendering {} (headless: {}, wait: {:?})",
                url, options.headless, options.wait_until
            );

            let launch = LaunchOptions::default_builder()
                .headless(options.headless)
                .idle_browser_timeout(options.timeout + options.post_load_wait)
                .build()
                .map_err(browser_error)?;
            let browser = Browser::new(launch).map_err(browser_error)?;
            let tab = browser.new_tab().map_err(browser_error)?;

            tab.set_default_timeout(options.timeout);
            tab.set_user_agent(&options.user_agent, Some(options.locale.as_str()), None)
                .map_err(browser_error)?;

            thread::sleep(options.slow_mo);
            tab.navigate_to(url).map_err(browser_error)?;
            match options.wait_until {
                WaitCondition::DomContentLoaded => {
                    tab.wait_for_element("body").map_err(browser_error)?;
                }
                WaitCondition::Load | WaitCondition::NetworkIdle => {
                    tab.wait_until_navigated().map_err(browser_error)?;
                }
            }

            thread::sleep(options.post_load_wait);
            tab.get_content().map_err(browser_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let options = RenderOptions::from_config(&BrowserConfig::default());

        assert!(options.headless);
        assert_eq!(options.timeout, Duration::from_millis(20_000));
        assert_eq!(options.post_load_wait, Duration::from_millis(1_500));
        assert_eq!(options.slow_mo, Duration::from_millis(300));
        assert_eq!(options.wait_until, WaitCondition::NetworkIdle);
        assert_eq!(options.locale, "pt-BR");
    }

    #[test]
    fn test_visible_keeps_other_options() {
        let options = RenderOptions::from_config(&BrowserConfig::default());
        let visible = options.visible();

        assert!(!visible.headless);
        assert_eq!(visible.user_agent, options.user_agent);
        assert_eq!(visible.timeout, options.timeout);
    }
}
