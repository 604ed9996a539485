//! Request search lifecycle.
//!
//! A request moves `pending -> searching` once per attempt and then to
//! `handed_off` (a candidate was dispatched), `awaiting_search` (nothing
//! usable yet, retry later), or `failed` (configuration or dispatch error).

mod dispatch;
mod processor;
mod store;
mod types;

pub use dispatch::{DispatchError, DownloadDispatcher};
pub use processor::{RequestProcessor, SearchReport};
pub use store::{MemoryRequestStore, RequestStore};
pub use types::{RequestError, RequestRecord, RequestStatus, SelectedCandidate};
