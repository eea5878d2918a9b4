//! Contains logic for observing the focused window in different environments.
//! [GenericWindowManager] is the main artifact of this module that abstracts
//! the operations.

#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "x11")]
extern crate xcb;

use anyhow::Result;

/// Snapshot of the focused window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowInfo {
    /// Full path to an executable. For example /usr/lib/firefox/firefox
    pub process_path: String,
    /// Name the system reports for the process. For example 'firefox'
    pub display_name: String,
    /// For example 'main.rs - deskbeat - Visual Studio Code'
    pub title: String,
    /// Address shown by a browser, when the platform can read it.
    pub url: Option<String>,
    pub process_id: u32,
}

impl WindowInfo {
    /// Whether `other` shows different content, ignoring the process id.
    pub fn differs_from(&self, other: &WindowInfo) -> bool {
        self.process_path != other.process_path
            || self.title != other.title
            || self.url != other.url
    }
}

/// Intended to serve as a contract platform window observers must implement.
#[cfg_attr(test, mockall::automock)]
pub trait WindowManager {
    fn get_active_window(&mut self) -> Result<WindowInfo>;

    /// Retrieve amount of time user has been inactive in milliseconds
    fn get_idle_time(&mut self) -> Result<u32>;
}

/// Serves as a cross-compatible WindowManager implementation.
pub struct GenericWindowManager {
    inner: Box<dyn WindowManager>,
}

impl GenericWindowManager {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "x11")] {
                use x11::LinuxWindowManager;
                Ok(Self {
                    inner: Box::new(LinuxWindowManager::new()?),
                })
            }
            else {
                Err(anyhow::anyhow!("No window manager was compiled in, enable the x11 feature"))
            }
        }
    }
}

impl WindowManager for GenericWindowManager {
    fn get_active_window(&mut self) -> Result<WindowInfo> {
        self.inner.get_active_window()
    }

    fn get_idle_time(&mut self) -> Result<u32> {
        self.inner.get_idle_time()
    }
}
