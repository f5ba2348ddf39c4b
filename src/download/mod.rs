mod acs;
#[cfg(feature = "download")]
mod http;
mod pl94171;
mod retry;
mod tiger;
mod transport;

pub(crate) use acs::download_acs;
pub(crate) use pl94171::download_pl94171;
pub(crate) use tiger::download_shapefile;

pub use acs::{ACS_BATCH_SIZE, acs_api_base, acs_url};
#[cfg(feature = "download")]
pub use http::HttpTransport;
pub use pl94171::{BLOCK_SUMMARY_LEVEL, parse_pl94171_zip, pl94171_url};
pub use retry::RetryPolicy;
pub use tiger::{addrfeat_url, blocks_url};
pub use transport::Transport;

#[cfg(test)]
pub(crate) use pl94171::tests::sample_archive as sample_pl94171_archive;
