//! The content type registry: which MIME type a file extension stands for,
//! which parser handles a MIME type, and how representations are ranked
//! during content negotiation.
//!
//! The registry is static: it is resolved at compile time and cannot be
//! extended at runtime.

use crate::error::Error;
use crate::parser::{
	DocumentParser, HtmlParser, MarkdownParser, RdfXmlParser, TurtleParser, YamlParser,
};

/// Content type associated with a file extension, if any.
///
/// Accepts the extension with or without its leading dot.
pub fn by_extension(extension: &str) -> Option<&'static str> {
	let extension = extension.strip_prefix('.').unwrap_or(extension);
	Some(match extension {
		"json" => "application/json",
		"jsonld" => "application/ld+json",
		"yaml" | "yml" => "application/yaml",
		"yamlld" => "application/ld+yaml",
		"html" | "xhtml" => "text/html",
		"md" | "markdown" => "text/markdown",
		"ttl" => "text/turtle",
		"rdf" => "application/rdf+xml",
		_ => return None,
	})
}

/// Strips `;`-delimited parameters such as `charset=utf-8` from a content
/// type.
pub fn strip_parameters(content_type: &str) -> &str {
	match content_type.split_once(';') {
		Some((essence, _)) => essence.trim(),
		None => content_type.trim(),
	}
}

/// Finds the parser registered for a content type.
///
/// Parameters are stripped and the type is matched case-insensitively.
pub fn parser_for(content_type: &str, uri: &str) -> Result<&'static dyn DocumentParser, Error> {
	let essence = strip_parameters(content_type).to_ascii_lowercase();
	match essence.as_str() {
		// YAML is a superset of JSON: one parser covers all four.
		"application/json" | "application/ld+json" | "application/yaml"
		| "application/ld+yaml" => Ok(&YamlParser),
		"text/html" | "application/xhtml+xml" => Ok(&HtmlParser),
		"text/markdown" => Ok(&MarkdownParser),
		"application/rdf+xml" => Ok(&RdfXmlParser),
		"text/turtle" => Ok(&TurtleParser),
		_ => Err(Error::ParserNotFound {
			content_type: essence,
			uri: uri.to_owned(),
		}),
	}
}

/// Total preference ranking used for alternate-representation negotiation.
///
/// An alternate is only followed when its rank is strictly greater than the
/// rank of the current representation, so unknown content types never win.
pub fn preference(content_type: &str) -> u8 {
	match strip_parameters(content_type).to_ascii_lowercase().as_str() {
		"application/ld+json" | "application/ld+yaml" => 4,
		"application/rdf+xml" | "text/turtle" => 3,
		"text/html" | "application/xhtml+xml" | "application/json" | "application/yaml" => 2,
		"text/markdown" => 1,
		_ => 0,
	}
}

/// Extension of the last path segment of a URL or file path, ignoring query
/// and fragment.
pub fn extension_of(source: &str) -> Option<&str> {
	let path = source.split(['?', '#']).next().unwrap_or(source);
	let segment = path.rsplit('/').next().unwrap_or(path);
	let (stem, extension) = segment.rsplit_once('.')?;
	(!stem.is_empty() && !extension.is_empty()).then_some(extension)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_registered_extension_round_trips_to_a_parser() {
		for extension in [
			".json", ".jsonld", ".yaml", ".yml", ".yamlld", ".html", ".xhtml", ".md",
			".markdown", ".ttl", ".rdf",
		] {
			let content_type = by_extension(extension).expect(extension);
			assert!(parser_for(content_type, "test").is_ok(), "{content_type}");
		}
	}

	#[test]
	fn unknown_extension_has_no_content_type() {
		assert_eq!(by_extension(".csv"), None);
	}

	#[test]
	fn parameters_are_stripped_before_lookup() {
		assert!(parser_for("application/ld+yaml; charset=utf-8", "test").is_ok());
		assert!(parser_for("Text/HTML; Charset=UTF-8", "test").is_ok());
	}

	#[test]
	fn unknown_content_type_reports_parser_not_found() {
		let error = parser_for("text/csv", "test.csv").err().unwrap();
		assert!(matches!(error, Error::ParserNotFound { .. }));
	}

	#[test]
	fn linked_data_types_outrank_their_generic_forms() {
		assert!(preference("application/ld+yaml") > preference("application/yaml"));
		assert!(preference("application/ld+json") > preference("text/html"));
		assert!(preference("application/rdf+xml") > preference("text/html"));
		assert_eq!(preference("text/html"), preference("application/json"));
		assert_eq!(preference("application/octet-stream"), 0);
	}

	#[test]
	fn extension_ignores_query_and_fragment() {
		assert_eq!(extension_of("https://example.com/a/doc.jsonld?x=1#f"), Some("jsonld"));
		assert_eq!(extension_of("/home/user/doc.yamlld"), Some("yamlld"));
		assert_eq!(extension_of("https://example.com/doc"), None);
		assert_eq!(extension_of(".hidden"), None);
	}
}
