//! Markdown documents carrying YAML front matter.

use serde_json::{Map, Value};

use super::{ensure_not_scalar, yaml, DocumentParser};
use crate::error::Error;
use crate::options::LoadOptions;
use crate::Document;

/// Markdown parser: the front matter is the document, the prose is not.
pub struct MarkdownParser;

impl DocumentParser for MarkdownParser {
	fn parse(
		&self,
		bytes: &[u8],
		source: &str,
		_options: &mut LoadOptions,
	) -> Result<Document, Error> {
		let text = std::str::from_utf8(bytes).map_err(|_| Error::InvalidEncoding)?;

		let Some(matter) = front_matter(text) else {
			return Ok(Value::Object(Map::new()));
		};

		match yaml::load_all(matter, source)?.into_iter().next() {
			None | Some(Value::Null) => Ok(Value::Object(Map::new())),
			Some(document) => ensure_not_scalar(document),
		}
	}
}

/// The content between the opening `---` fence and its `---` (or `...`)
/// terminator. An absent or unterminated fence means no front matter.
fn front_matter(text: &str) -> Option<&str> {
	let body = text.strip_prefix("---")?;
	let body = body.strip_prefix('\r').unwrap_or(body);
	let body = body.strip_prefix('\n')?;

	let mut offset = 0;
	for line in body.split_inclusive('\n') {
		let fence = line.trim_end_matches(['\n', '\r']);
		if fence == "---" || fence == "..." {
			return Some(&body[..offset]);
		}
		offset += line.len();
	}
	None
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn parse(text: &str) -> Result<Document, Error> {
		MarkdownParser.parse(text.as_bytes(), "test.md", &mut LoadOptions::default())
	}

	#[test]
	fn front_matter_is_the_document() {
		let document = parse(concat!(
			"---\n",
			"\"@id\": https://example.org/person/john-doe\n",
			"\"@type\": Person\n",
			"name: John Doe\n",
			"---\n",
			"\n",
			"# John Doe\n",
			"\n",
			"Prose is discarded.\n",
		))
		.unwrap();
		assert_eq!(
			document,
			json!({
				"@id": "https://example.org/person/john-doe",
				"@type": "Person",
				"name": "John Doe",
			})
		);
	}

	#[test]
	fn a_document_without_front_matter_is_an_empty_mapping() {
		assert_eq!(parse("# Title\n\nJust prose.\n").unwrap(), json!({}));
	}

	#[test]
	fn empty_front_matter_is_an_empty_mapping() {
		assert_eq!(parse("---\n---\n# Title\n").unwrap(), json!({}));
	}

	#[test]
	fn an_unterminated_fence_is_not_front_matter() {
		assert_eq!(parse("---\na: 1\n").unwrap(), json!({}));
	}

	#[test]
	fn a_dots_terminator_closes_the_fence() {
		assert_eq!(parse("---\na: 1\n...\nprose\n").unwrap(), json!({"a": 1}));
	}

	#[test]
	fn scalar_front_matter_is_rejected() {
		let error = parse("---\njust a string\n---\n").unwrap_err();
		assert!(matches!(error, Error::DocumentIsScalar { .. }));
	}

	#[test]
	fn invalid_front_matter_yaml_fails_loading() {
		let error = parse("---\na: [unclosed\n---\n").unwrap_err();
		assert!(matches!(error, Error::LoadingDocumentFailed { .. }));
	}
}
