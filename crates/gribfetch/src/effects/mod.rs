//! I/O: the pacing gate, HTTP access, partial fetching, orchestration, and
//! local subsetting.

mod fetcher;
mod gate;
mod http;
mod retriever;
mod subset;

pub use fetcher::PartialFetcher;
pub use gate::RateGate;
pub use http::{BoxStream, HttpClient, Response};
pub use retriever::{Outcome, RetrievalState, Retriever};
pub use subset::subset_file;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
