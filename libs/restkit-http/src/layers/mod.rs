//! Tower layers used by the default transport
//!
//! - [`DefaultHeaderLayer`] - Sets a header (e.g. `User-Agent`) unless the request already has it

mod default_header;

pub use default_header::{DefaultHeaderLayer, DefaultHeaderService};
