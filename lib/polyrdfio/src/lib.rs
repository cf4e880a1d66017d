#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod error;
mod format;
mod parser;

pub use crate::error::{RdfParseError, RdfSyntaxError};
pub use crate::format::RdfFormat;
pub use crate::parser::{RdfParser, ReaderQuadParser};
pub use polyttl::TextPosition;
