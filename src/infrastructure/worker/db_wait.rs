use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::{Instant, sleep, timeout};
use tracing::{info, warn};
use url::Url;

/// Block until a TCP connection to the database host succeeds or the budget
/// runs out. Returns whether the database answered; callers proceed either
/// way and lean on the worker's quiet retry path.
pub async fn wait_for_database(
    database_url: &str,
    wait_timeout: Duration,
    poll_interval: Duration,
) -> bool {
    let Some((host, port)) = host_and_port(database_url) else {
        warn!(
            "DATABASE_URL has no host/port to probe, skipping startup wait"
        );
        return false;
    };

    let deadline = Instant::now() + wait_timeout;
    loop {
        match timeout(poll_interval, TcpStream::connect((host.as_str(), port))).await {
            Ok(Ok(_)) => {
                info!(host = %host, port, "database is accepting connections");
                return true;
            }
            _ => {
                if Instant::now() >= deadline {
                    warn!(
                        host = %host,
                        port,
                        timeout_ms = wait_timeout.as_millis() as u64,
                        "database did not come up within the startup budget, continuing anyway"
                    );
                    return false;
                }
                sleep(poll_interval).await;
            }
        }
    }
}

fn host_and_port(database_url: &str) -> Option<(String, u16)> {
    let parsed = Url::parse(database_url).ok()?;
    let host = parsed.host_str()?.to_string();
    let port = parsed.port().unwrap_or(5432);
    Some((host, port))
}
