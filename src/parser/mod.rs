//! Format parsers: each one turns a raw byte stream into the canonical
//! mapping/sequence form, or fails with a typed error.

pub mod html;
pub mod markdown;
pub mod rdf;
pub mod yaml;

pub use html::HtmlParser;
pub use markdown::MarkdownParser;
pub use rdf::{RdfXmlParser, TurtleParser};
pub use yaml::YamlParser;

use serde_json::Value;

use crate::error::Error;
use crate::options::LoadOptions;
use crate::Document;

/// A parser for one family of serializations.
pub trait DocumentParser: Send + Sync {
	/// Parses `bytes` into a canonical document.
	///
	/// `source` is the URI the bytes were read from; a fragment identifier on
	/// it may address a part of the document (HTML script elements). The only
	/// option a parser may write back is `options.base`.
	fn parse(
		&self,
		bytes: &[u8],
		source: &str,
		options: &mut LoadOptions,
	) -> Result<Document, Error>;
}

/// Rejects bare scalars: a canonical document is a mapping or a sequence.
pub(crate) fn ensure_not_scalar(document: Document) -> Result<Document, Error> {
	match &document {
		Value::Object(_) | Value::Array(_) => Ok(document),
		scalar => Err(Error::DocumentIsScalar {
			kind: kind_name(scalar),
		}),
	}
}

fn kind_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "a sequence",
		Value::Object(_) => "a mapping",
	}
}
