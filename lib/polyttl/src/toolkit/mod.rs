//! polyttl parsing toolkit.
//!
//! Provides the character cursor, the pull driver and the error types shared
//! by the parsers of this crate.

mod driver;
mod error;
mod reader;

pub use self::error::{TextPosition, TurtleParseError, TurtleSyntaxError, TurtleSyntaxErrorKind};
pub(crate) use self::driver::{EmissionDriver, QuadProducer};
pub(crate) use self::reader::StreamReader;

use oxrdf::BlankNode;
use std::collections::HashMap;

/// Document-scoped blank node identifiers.
///
/// Labels written in the document are renamed to fresh internal identifiers
/// so that they can never collide with the identifiers minted for anonymous
/// blank nodes. The mapping is injective and stable for the lifetime of one
/// parser instance and is never shared between documents.
#[derive(Default)]
pub(crate) struct BlankNodeScope {
    labels: HashMap<String, BlankNode>,
    counter: u64,
}

impl BlankNodeScope {
    /// The blank node for a label written in the document.
    pub fn labeled(&mut self, label: &str) -> BlankNode {
        if let Some(node) = self.labels.get(label) {
            return node.clone();
        }
        let node = self.fresh();
        self.labels.insert(label.to_owned(), node.clone());
        node
    }

    /// A new anonymous blank node.
    pub fn fresh(&mut self) -> BlankNode {
        let node = BlankNode::new_unchecked(format!("b{}", self.counter));
        self.counter += 1;
        node
    }
}
