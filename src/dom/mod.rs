pub mod document;
mod parse;

use std::sync::Arc;

use parking_lot::Mutex;

pub use document::{Document, Interaction, MutationBatch, MutationRecord, NodeId};
pub use parse::parse_html;

pub type SharedDocument = Arc<Mutex<Document>>;
