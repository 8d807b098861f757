use anyhow::{bail, Context, Result};
use daybell_core::{AlertMessage, AlertSink, Reminder, DEFAULT_PATTERN};
use std::io::Write;
use tracing::{info, warn};

use crate::config::AlertsSection;

/// Terminal + desktop alert: banner on stdout, optional bell, and a desktop
/// notification through `notify-send` (Linux) or `osascript` (macOS).
pub struct DesktopAlert {
    settings: AlertsSection,
}

impl DesktopAlert {
    pub fn new(settings: AlertsSection) -> Self {
        Self { settings }
    }
}

impl AlertSink for DesktopAlert {
    fn ring(&mut self, reminder: &Reminder, message: &AlertMessage) -> Result<()> {
        let mut out = std::io::stdout().lock();
        if self.settings.terminal_bell {
            write!(out, "{}", "\x07".repeat(DEFAULT_PATTERN.pulses()))?;
        }
        writeln!(out, "\n*** {} ***\n{}\n", message.title, message.body)?;
        out.flush()?;

        if self.settings.desktop_notification {
            // Notifier failures are logged, not propagated.
            if let Err(e) = notify_desktop(message) {
                warn!(reminder = %reminder.id, error = %e, "desktop notification failed");
            }
        }

        info!(reminder = %reminder.id, title = %message.title, "alert delivered");
        Ok(())
    }
}

fn notify_desktop(message: &AlertMessage) -> Result<()> {
    if cfg!(target_os = "macos") {
        let script = format!(
            r#"display notification "{}" with title "{}" sound name "Glass""#,
            escape_applescript(&message.body),
            escape_applescript(&message.title)
        );
        let output = std::process::Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .output()
            .context("running osascript")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("osascript notification failed: {stderr}");
        }
        return Ok(());
    }

    let notify = match which::which("notify-send") {
        Ok(p) => p,
        Err(_) => bail!("notify-send not found; skipping desktop notification"),
    };

    let output = std::process::Command::new(notify)
        .args(["--urgency", "critical"])
        .args(["--app-name", "daybell"])
        .arg(&message.title)
        .arg(&message.body)
        .output()
        .context("running notify-send")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("notify-send failed: {stderr}");
    }
    Ok(())
}

fn escape_applescript(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
