use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// `GET /metrics` over a bare HTTP/1.1 connection; returns the body.
pub async fn scrape(addr: SocketAddr) -> Result<String> {
    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("failed to connect to metrics at {addr}"))?;
    stream
        .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .context("failed to send metrics request")?;

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .context("failed to read metrics response")?;

    let Some((head, body)) = response.split_once("\r\n\r\n") else {
        bail!("malformed HTTP response: {response}");
    };
    if !head.starts_with("HTTP/1.1 200") {
        bail!("metrics endpoint answered: {}", head.lines().next().unwrap_or_default());
    }
    Ok(body.to_string())
}
