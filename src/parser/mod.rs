//! Format backends for the two handlers.
//!
//! - [`dialect`]: Tabular records and the delimiter/quoting rules used to read and write them
//! - [`markup`]: Element tree, event-driven parser and indented printer for XML
//!
//! Tokenizing and escaping are delegated to the `csv` and `quick-xml` crates;
//! these modules only map between their events/records and our own types.

pub mod dialect;
pub mod markup;

pub use dialect::{Dialect, Record, TabularDataset};
pub use markup::{parse_path, parse_str, to_pretty_string, write_pretty, Element, Node, ParseFailure};
