//! Storefront management - spawning and health checking the dev server

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Replaced by the chosen port in `StorefrontConfig::args`
pub const PORT_PLACEHOLDER: &str = "{port}";

/// Handle to a running storefront process
pub struct StorefrontHandle {
    child: Child,
    pub base_url: String,
    pub port: u16,
}

impl StorefrontHandle {
    /// Spawn the storefront dev server
    pub async fn spawn(config: StorefrontConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning storefront on port {}", port);

        let mut cmd = Command::new(&config.command);
        cmd.args(config.resolved_args(port))
            .current_dir(&config.working_dir)
            .envs(&config.env)
            .env("PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        // npm forks the dev server; its own group lets stop() reach both
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(|e| {
            E2eError::ServerStartup(format!(
                "Failed to spawn {} in {}: {}",
                config.command,
                config.working_dir.display(),
                e
            ))
        })?;

        let mut handle = StorefrontHandle {
            child,
            base_url: base_url.clone(),
            port,
        };

        // Wait for the storefront to serve its index page
        handle.wait_for_healthy(config.startup_timeout).await?;

        info!("Storefront is up at {}", base_url);
        Ok(handle)
    }

    /// Wait for the storefront to respond over HTTP
    async fn wait_for_healthy(&mut self, timeout_duration: Duration) -> E2eResult<()> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            if let Some(status) = self.child.try_wait()? {
                return Err(E2eError::ServerStartup(format!(
                    "storefront exited before becoming ready: {}",
                    status
                )));
            }

            match client.get(&self.base_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(());
                }
                Ok(resp) => {
                    warn!("Health check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for storefront to start...");
                    }
                    // Connection refused is expected while the dev server boots
                    if !e.is_connect() {
                        warn!("Health check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(250)).await;
        }

        Err(E2eError::ServerHealthCheck(attempts))
    }

    /// Get the base URL for this storefront
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the storefront and everything it forked
    pub fn stop(&mut self) -> E2eResult<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        info!("Stopping storefront (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            let pgid = Pid::from_raw(self.child.id() as i32);
            if killpg(pgid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
            let _ = killpg(pgid, Signal::SIGKILL);
        }

        // Force kill if still running
        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for StorefrontHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Configuration for spawning the storefront
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Program to run
    pub command: String,

    /// Arguments; `{port}` is replaced by the chosen port
    pub args: Vec<String>,

    /// Storefront checkout to run in
    pub working_dir: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for startup
    pub startup_timeout: Duration,

    /// Extra environment for the dev server
    pub env: HashMap<String, String>,
}

impl StorefrontConfig {
    fn resolved_args(&self, port: u16) -> Vec<String> {
        let port = port.to_string();
        self.args
            .iter()
            .map(|arg| arg.replace(PORT_PLACEHOLDER, &port))
            .collect()
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            command: "npm".to_string(),
            args: ["run", "dev", "--", "--port", PORT_PLACEHOLDER, "--strictPort"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            working_dir: PathBuf::from("../jwt-pizza"),
            port: None,
            startup_timeout: Duration::from_secs(60),
            env: HashMap::new(),
        }
    }
}

/// Find a free port to use
pub fn find_free_port() -> E2eResult<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port().unwrap();
        let port2 = find_free_port().unwrap();

        // Ports should be in valid range
        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }

    #[test]
    fn test_port_placeholder_is_substituted() {
        let config = StorefrontConfig::default();
        assert_eq!(
            config.resolved_args(5174),
            ["run", "dev", "--", "--port", "5174", "--strictPort"]
        );
    }

    #[tokio::test]
    async fn test_missing_command_fails_startup() {
        let config = StorefrontConfig {
            command: "definitely-not-a-storefront".to_string(),
            working_dir: std::env::temp_dir(),
            ..Default::default()
        };
        assert!(matches!(
            StorefrontHandle::spawn(config).await,
            Err(E2eError::ServerStartup(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_early_exit_is_reported() {
        let config = StorefrontConfig {
            command: "true".to_string(),
            args: vec![],
            working_dir: std::env::temp_dir(),
            startup_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        assert!(matches!(
            StorefrontHandle::spawn(config).await,
            Err(E2eError::ServerStartup(_))
        ));
    }
}
