//! YAML-LD document loading.
//!
//! This crate resolves a reference to a linked data document (a local path,
//! an HTTP(S) URL, or an in-memory value) into one canonical in-memory
//! representation, whatever the source serialization: YAML, JSON, HTML with
//! embedded scripts, Markdown front matter, RDF/XML or Turtle.
//!
//! The result of a load is a [`RemoteDocument`]: the canonical document plus
//! its resolved URL and content type. Graph transformation (expansion,
//! compaction, framing) is the business of a downstream consumer.
//!
//! ```no_run
//! # async fn example() -> Result<(), yaml_ld::Error> {
//! let mut options = yaml_ld::LoadOptions::default();
//! let document = yaml_ld::load_document("person.yamlld", &mut options).await?;
//! println!("{}", document.document());
//! # Ok(())
//! # }
//! ```

pub mod content_type;
mod error;
pub mod loader;
mod options;
pub mod parser;

pub use error::{Error, ErrorCause};
pub use loader::{ChoiceByScheme, FsLoader, LinkHeaderEntry, Loader, RemoteDocument, SchemeLoader};
pub use options::LoadOptions;
pub use parser::{
	DocumentParser, HtmlParser, MarkdownParser, RdfXmlParser, TurtleParser, YamlParser,
};

#[cfg(feature = "reqwest")]
pub use loader::{HttpLoader, HttpLoaderOptions};

/// Canonical in-memory document: a mapping, or a sequence of mappings and
/// scalars. Never a bare scalar at the top level.
pub type Document = serde_json::Value;

/// Loads a document from `source` with a default loader configuration.
///
/// Builds a fresh [`ChoiceByScheme`] dispatcher on every call; construct one
/// yourself and keep it around for repeated loads.
pub async fn load_document(
	source: &str,
	options: &mut LoadOptions,
) -> Result<RemoteDocument, Error> {
	ChoiceByScheme::new().load(source, options).await
}

/// Parses an in-memory YAML-LD (or JSON) document.
pub fn parse(input: &str) -> Result<Document, Error> {
	YamlParser.parse(input.as_bytes(), "inline", &mut LoadOptions::default())
}
