//! Desktop toast channel via notify-rust (D-Bus).

use anyhow::Result;
use notify_rust::{Notification, Timeout};
use tracing::debug;

/// App name shown by the desktop environment.
const APP_NAME: &str = "notify-dispatch";

/// Narrow seam over the OS toast capability, injectable for tests.
pub trait DesktopToast: Send + Sync {
    fn show(&self, title: &str, message: &str, persistent: bool) -> Result<()>;
}

/// Production toasts through the D-Bus notification service.
pub struct DbusToast;

impl DesktopToast for DbusToast {
    fn show(&self, title: &str, message: &str, persistent: bool) -> Result<()> {
        debug!("Desktop notification: {title}");

        let timeout = if persistent {
            Timeout::Never
        } else {
            Timeout::Milliseconds(5000)
        };

        Notification::new()
            .appname(APP_NAME)
            .summary(title)
            .body(message)
            .icon("dialog-information")
            .timeout(timeout)
            .show()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        Ok(())
    }
}
