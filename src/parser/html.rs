//! HTML script element extraction.
//!
//! An HTML page carries linked data in `<script>` elements; the fragment of
//! the source URI may address one of them by `id`. A page may also advertise
//! better representations through `<link rel="alternate">` elements. Those
//! are extracted here but followed by the loaders, which own the means to
//! fetch them.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::DocumentParser;
use crate::content_type;
use crate::error::Error;
use crate::loader::link::{resolve_reference, LinkHeaderEntry};
use crate::options::LoadOptions;
use crate::Document;

/// One `<script>` element of an HTML document.
struct Script {
	content_type: String,
	content: String,
}

/// HTML parser extracting linked data from `<script>` elements.
pub struct HtmlParser;

impl HtmlParser {
	/// `<link rel="alternate">` elements declaring a content type, in
	/// document order, with their targets resolved against `base`.
	pub fn alternate_links(bytes: &[u8], base: &str) -> Vec<LinkHeaderEntry> {
		let Ok(text) = std::str::from_utf8(bytes) else {
			return Vec::new();
		};
		let html = Html::parse_document(text);
		html.select(&selector(r#"link[rel~="alternate"][type][href]"#))
			.filter_map(|element| {
				let href = element.value().attr("href")?;
				let content_type = element.value().attr("type")?;
				Some(LinkHeaderEntry {
					url: resolve_reference(href, base),
					rel: "alternate".to_owned(),
					content_type: content_type.to_owned(),
					attributes: hashbrown::HashMap::new(),
				})
			})
			.collect()
	}
}

impl DocumentParser for HtmlParser {
	fn parse(
		&self,
		bytes: &[u8],
		source: &str,
		options: &mut LoadOptions,
	) -> Result<Document, Error> {
		let text = std::str::from_utf8(bytes).map_err(|_| Error::InvalidEncoding)?;
		let html = Html::parse_document(text);
		let document_url = strip_fragment(source);

		// A `<base href>` refines the base the downstream layer will expand
		// relative IRIs against.
		if let Some(href) = html
			.select(&selector("html > head > base[href]"))
			.next()
			.and_then(|element| element.value().attr("href"))
		{
			let current = options
				.base
				.clone()
				.unwrap_or_else(|| document_url.to_owned());
			options.base = Some(resolve_reference(href, &current));
		}

		let scripts = match fragment_of(source) {
			Some(id) => {
				let element = html
					.select(&selector("script"))
					.find(|element| element.value().attr("id") == Some(id));
				match element {
					Some(element) => vec![script_of(element, source)?],
					None => {
						return Err(Error::NoScriptTagForId { id: id.to_owned() });
					}
				}
			}
			None => html
				.select(&selector("script[type]"))
				.filter_map(|element| {
					let content_type = element.value().attr("type")?;
					Some(Script {
						content_type: content_type.to_owned(),
						content: element.text().collect(),
					})
				})
				.collect(),
		};

		let mut collected = Vec::new();
		for script in scripts {
			// Scripts of unrelated types are not candidates.
			let Ok(parser) = content_type::parser_for(&script.content_type, source) else {
				continue;
			};
			let parsed = parser
				.parse(script.content.as_bytes(), document_url, options)
				.map_err(invalid_script)?;

			if !options.extract_all_scripts {
				return Ok(parsed);
			}
			match parsed {
				Value::Array(items) => collected.extend(items),
				Value::Object(_) => collected.push(parsed),
				scalar => {
					return Err(Error::DocumentIsScalar {
						kind: super::kind_name(&scalar),
					});
				}
			}
		}

		if collected.is_empty() {
			return Err(Error::NoLinkedDataFoundInHtml {
				html: shorten(text),
			});
		}
		Ok(Value::Array(collected))
	}
}

fn script_of(element: ElementRef, source: &str) -> Result<Script, Error> {
	match element.value().attr("type") {
		Some(content_type) => Ok(Script {
			content_type: content_type.to_owned(),
			content: element.text().collect(),
		}),
		None => Err(Error::LoadingDocumentFailed {
			path: source.to_owned(),
			cause: Some("script tag declares no linked data type".into()),
		}),
	}
}

/// Failures inside a script element carry the `invalid script element` code;
/// scalar and encoding rejections keep their own codes.
fn invalid_script(error: Error) -> Error {
	match error {
		Error::DocumentIsScalar { .. }
		| Error::InvalidEncoding
		| Error::MappingKeyError
		| Error::UndefinedAliasFound => error,
		other => Error::InvalidScriptElement {
			cause: Some(Box::new(other)),
		},
	}
}

fn selector(selectors: &str) -> Selector {
	// The selectors in this module are fixed strings.
	Selector::parse(selectors).unwrap()
}

fn strip_fragment(source: &str) -> &str {
	source.split('#').next().unwrap_or(source)
}

fn fragment_of(source: &str) -> Option<&str> {
	source
		.split_once('#')
		.map(|(_, fragment)| fragment)
		.filter(|fragment| !fragment.is_empty())
}

/// Shortened rendering of an HTML document for error reports: first and last
/// ten lines, each cut at eighty columns.
fn shorten(html: &str) -> String {
	const LINES: usize = 10;
	const COLUMNS: usize = 80;

	let lines: Vec<String> = html
		.lines()
		.map(|line| {
			if line.chars().count() > COLUMNS {
				line.chars().take(COLUMNS).collect()
			} else {
				line.to_owned()
			}
		})
		.collect();

	if lines.len() <= 2 * LINES {
		lines.join("\n")
	} else {
		let mut shortened = lines[..LINES].join("\n");
		shortened.push_str("\n...\n");
		shortened.push_str(&lines[lines.len() - LINES..].join("\n"));
		shortened
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	const PAGE: &str = concat!(
		"<html><head><title>t</title></head><body>",
		r#"<script id="a" type="application/ld+json">{"name": "first"}</script>"#,
		r#"<script id="b" type="application/ld+json">{"name": "second"}</script>"#,
		"</body></html>",
	);

	fn parse(html: &str, source: &str, options: &mut LoadOptions) -> Result<Document, Error> {
		HtmlParser.parse(html.as_bytes(), source, options)
	}

	#[test]
	fn a_fragment_addresses_one_script_by_id() {
		let document = parse(PAGE, "https://example.com/page.html#b", &mut LoadOptions::default())
			.unwrap();
		assert_eq!(document, json!({"name": "second"}));
	}

	#[test]
	fn a_missing_fragment_target_is_an_error() {
		let error = parse(PAGE, "https://example.com/page.html#c", &mut LoadOptions::default())
			.unwrap_err();
		assert!(matches!(error, Error::NoScriptTagForId { ref id } if id == "c"));
		assert_eq!(error.code(), "loading document failed");
	}

	#[test]
	fn without_a_fragment_the_first_script_wins() {
		let document =
			parse(PAGE, "https://example.com/page.html", &mut LoadOptions::default()).unwrap();
		assert_eq!(document, json!({"name": "first"}));
	}

	#[test]
	fn extracting_all_scripts_concatenates_them_in_order() {
		let mut options = LoadOptions::default().with_extract_all_scripts(true);
		let document = parse(PAGE, "https://example.com/page.html", &mut options).unwrap();
		assert_eq!(document, json!([{"name": "first"}, {"name": "second"}]));
	}

	#[test]
	fn script_arrays_splice_into_the_extracted_sequence() {
		let html = concat!(
			r#"<script type="application/ld+json">[{"a": 1}, {"b": 2}]</script>"#,
			r#"<script type="application/ld+yaml">c: 3</script>"#,
		);
		let mut options = LoadOptions::default().with_extract_all_scripts(true);
		let document = parse(html, "https://example.com/p.html", &mut options).unwrap();
		assert_eq!(document, json!([{"a": 1}, {"b": 2}, {"c": 3}]));
	}

	#[test]
	fn scripts_parse_with_the_parser_for_their_own_type() {
		let html = r#"<script type="application/ld+yaml">name: from yaml</script>"#;
		let document =
			parse(html, "https://example.com/p.html", &mut LoadOptions::default()).unwrap();
		assert_eq!(document, json!({"name": "from yaml"}));
	}

	#[test]
	fn unrelated_script_types_are_skipped() {
		let html = concat!(
			r#"<script type="text/javascript">var a = 1;</script>"#,
			r#"<script type="application/ld+json">{"a": 1}</script>"#,
		);
		let document =
			parse(html, "https://example.com/p.html", &mut LoadOptions::default()).unwrap();
		assert_eq!(document, json!({"a": 1}));
	}

	#[test]
	fn a_page_without_linked_data_reports_a_shortened_rendering() {
		let error = parse(
			"<html><body><p>nothing here</p></body></html>",
			"https://example.com/p.html",
			&mut LoadOptions::default(),
		)
		.unwrap_err();
		match error {
			Error::NoLinkedDataFoundInHtml { ref html } => {
				assert!(html.contains("nothing here"));
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn broken_script_content_is_an_invalid_script_element() {
		let html = r#"<script type="application/ld+json">{"a": [</script>"#;
		let error = parse(html, "https://example.com/p.html", &mut LoadOptions::default())
			.unwrap_err();
		assert!(matches!(error, Error::InvalidScriptElement { .. }));
		assert_eq!(error.code(), "invalid script element");
	}

	#[test]
	fn scalar_script_content_is_rejected_as_a_scalar() {
		let html = r#"<script type="application/ld+yaml">"just a string"</script>"#;
		let error = parse(html, "https://example.com/p.html", &mut LoadOptions::default())
			.unwrap_err();
		assert!(matches!(error, Error::DocumentIsScalar { .. }));
	}

	#[test]
	fn a_base_element_refines_the_base_option() {
		let html = concat!(
			"<html><head><base href=\"/data/\"></head><body>",
			r#"<script type="application/ld+json">{"a": 1}</script>"#,
			"</body></html>",
		);
		let mut options = LoadOptions::default();
		parse(html, "https://example.com/page.html", &mut options).unwrap();
		assert_eq!(options.base.as_deref(), Some("https://example.com/data/"));
	}

	#[test]
	fn alternate_link_elements_are_reported_resolved() {
		let html = concat!(
			"<html><head>",
			r#"<link rel="alternate" type="application/ld+json" href="doc.jsonld">"#,
			r#"<link rel="stylesheet" href="style.css">"#,
			"</head><body></body></html>",
		);
		let links = HtmlParser::alternate_links(html.as_bytes(), "https://example.com/page.html");
		assert_eq!(links.len(), 1);
		assert_eq!(links[0].url, "https://example.com/doc.jsonld");
		assert_eq!(links[0].content_type, "application/ld+json");
	}

	#[test]
	fn long_documents_are_shortened_for_diagnostics() {
		let long: String = (0..100).map(|i| format!("<p>line {i}</p>\n")).collect();
		let shortened = shorten(&long);
		assert!(shortened.contains("line 0"));
		assert!(shortened.contains("..."));
		assert!(shortened.contains("line 99"));
		assert!(!shortened.contains("line 50"));
	}
}
