use std::{io::Write, path::Path, time::Duration};

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, Response, redirect::Policy};

use super::Transport;
use crate::common::PendingWrite;
use crate::error::{Error, Result};

/// `Transport` over HTTPS using a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::limited(10))
            .timeout(timeout)
            .build()
            .map_err(|err| Error::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }

    /// GET `url`, mapping connection failures to status 0 and non-2xx
    /// responses to their status code.
    async fn get(&self, url: &str) -> Result<Response> {
        let resp = self.client.get(url).send().await
            .map_err(|err| Error::download(url, 0, err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("request failed");
            return Err(Error::download(url, status.as_u16(), reason));
        }
        Ok(resp)
    }
}

impl Transport for HttpTransport {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes>> {
        async move {
            let resp = self.get(url).await?;
            resp.bytes().await.map_err(|err| Error::download(url, 0, err.to_string()))
        }
        .boxed()
    }

    fn fetch_to_file<'a>(&'a self, url: &'a str, path: &'a Path) -> BoxFuture<'a, Result<u64>> {
        async move {
            let mut resp = self.get(url).await?;
            let mut sink = PendingWrite::open(path)?;
            let mut written = 0u64;
            while let Some(chunk) = resp.chunk().await
                .map_err(|err| Error::download(url, 0, err.to_string()))?
            {
                sink.write_all(&chunk)?;
                written += chunk.len() as u64;
            }
            sink.finalize()?;
            tracing::debug!(url, bytes = written, path = %path.display(), "download complete");
            Ok(written)
        }
        .boxed()
    }
}
