use std::path::Path;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};

use crate::common;
use crate::error::{Error, Result};

/// Remote fetch seam. Failures are `Error::Download` carrying the HTTP
/// status, or 0 when no response was received.
pub trait Transport: Send + Sync {
    /// Fetch the whole body at `url`.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes>>;

    /// Fetch `url` into `path` atomically. Returns the number of bytes written.
    fn fetch_to_file<'a>(&'a self, url: &'a str, path: &'a Path) -> BoxFuture<'a, Result<u64>> {
        async move {
            let body = self.fetch(url).await?;
            let target = path.to_path_buf();
            let len = body.len() as u64;
            tokio::task::spawn_blocking(move || common::write_atomic(&target, &body))
                .await
                .map_err(|err| Error::Data(format!("write task failed: {err}")))??;
            Ok(len)
        }
        .boxed()
    }
}
