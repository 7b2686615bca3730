//! External-command fetch used when the TLS stack rejects a site
//!
//! Some organization sites serve incomplete or outdated certificate chains
//! that `curl` with the system trust store still accepts.

use std::time::Duration;
use tokio::process::Command;
use url::Url;

/// Marker appended to curl's output via `-w` so status and final URL can be
/// recovered from stdout
const WRITE_OUT_MARKER: &str = "__contact_enricher__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackResponse {
    pub body: String,
    pub status_code: u16,
    pub resolved_url: Url,
}

/// Runs `curl -L -sS --max-time T -A UA <url>`
#[derive(Debug, Clone)]
pub struct CurlFallback {
    command: String,
    timeout: Duration,
    user_agent: String,
}

impl CurlFallback {
    pub fn new(command: &str, timeout: Duration, user_agent: &str) -> Self {
        Self {
            command: command.to_string(),
            timeout,
            user_agent: user_agent.to_string(),
        }
    }

    /// Fetches a URL through the external command
    ///
    /// Errors are returned as messages; the caller decides how to surface them.
    pub async fn fetch(&self, url: &Url) -> Result<FallbackResponse, String> {
        let output = Command::new(&self.command)
            .arg("-L")
            .arg("-sS")
            .arg("--max-time")
            .arg(self.timeout.as_secs().max(1).to_string())
            .arg("-A")
            .arg(&self.user_agent)
            .arg("-w")
            .arg(format!("\n{} %{{http_code}} %{{url_effective}}", WRITE_OUT_MARKER))
            .arg(url.as_str())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {}", self.command, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_write_out(&stdout, url))
    }
}

/// Splits curl's stdout into body, status and effective URL
///
/// Without the marker the whole output is the body, the status is assumed to
/// be 200 and the URL is the one requested.
pub fn parse_write_out(stdout: &str, requested: &Url) -> FallbackResponse {
    let marker = format!("\n{} ", WRITE_OUT_MARKER);
    let Some(idx) = stdout.rfind(&marker) else {
        return FallbackResponse {
            body: stdout.to_string(),
            status_code: 200,
            resolved_url: requested.clone(),
        };
    };

    let body = stdout[..idx].to_string();
    let mut fields = stdout[idx + marker.len()..].split_whitespace();
    let status_code = fields
        .next()
        .and_then(|s| s.parse::<u16>().ok())
        .filter(|&s| s > 0)
        .unwrap_or(200);
    let resolved_url = fields
        .next()
        .and_then(|s| Url::parse(s).ok())
        .unwrap_or_else(|| requested.clone());

    FallbackResponse {
        body,
        status_code,
        resolved_url,
    }
}
