//! Report querying for loadtrend.
//!
//! Reports are parsed once into an owned [`ReportDocument`] and queried with a
//! small XPath subset ([`Query`]). Extracted strings go through a
//! locale-tolerant numeric normalisation before becoming metric values.

pub mod document;
pub mod error;
pub mod extractor;
pub mod number;
pub mod xpath;

pub use document::{Element, ReportDocument};
pub use error::{QueryError, QueryResult};
pub use extractor::{extract, extract_compiled, extract_first};
pub use number::{normalize, parse_report_number};
pub use xpath::Query;
