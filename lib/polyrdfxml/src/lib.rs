#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod error;
mod parser;
mod utils;

pub use crate::error::{RdfXmlParseError, RdfXmlSyntaxError, RdfXmlSyntaxErrorKind};
pub use crate::parser::{RdfXmlParser, ReaderRdfXmlParser};
