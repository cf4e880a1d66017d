#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod lexer;
mod line_formats;
pub mod nquads;
pub mod ntriples;
mod terse;
mod toolkit;
pub mod trig;
pub mod turtle;

pub use crate::nquads::NQuadsParser;
pub use crate::ntriples::NTriplesParser;
pub use crate::toolkit::{TextPosition, TurtleParseError, TurtleSyntaxError, TurtleSyntaxErrorKind};
pub use crate::trig::TriGParser;
pub use crate::turtle::TurtleParser;
