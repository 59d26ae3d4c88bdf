//! Policy reload on SIGHUP

use crate::access_control::PolicyHandle;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::info;

/// Reload the policy file each time the process receives SIGHUP.
///
/// A reload that fails validation is logged and the previous policy stays
/// active.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(
    policy: PolicyHandle,
    path: PathBuf,
    base_url: Option<String>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangups = signal(SignalKind::hangup())?;
    info!(path = %path.display(), "Send SIGHUP to reload the policy");

    Ok(tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            info!(path = %path.display(), "Received SIGHUP, reloading policy");
            // Errors are already logged by the handle
            let _ = policy.reload_from(&path, base_url.as_deref());
        }
    }))
}

#[cfg(not(unix))]
pub fn spawn_reload_on_hangup(
    _policy: PolicyHandle,
    path: PathBuf,
    _base_url: Option<String>,
) -> std::io::Result<JoinHandle<()>> {
    tracing::warn!(path = %path.display(), "Policy reload on signal is only supported on unix");
    Ok(tokio::spawn(async {}))
}
