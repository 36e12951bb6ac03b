//! Tag-aware YAML and JSON parsing.
//!
//! The composer is written over the raw `yaml-rust2` event stream instead of
//! its ready-made `YamlLoader` because linked data typing needs the tags:
//! an `!!xsd:dateTime` scalar must keep its exact lexical form, while an
//! `!!xsd:integer` scalar becomes a native number.

use hashbrown::HashMap;
use serde_json::{Map, Number, Value};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, ScanError, TScalarStyle};

use super::{ensure_not_scalar, DocumentParser};
use crate::error::Error;
use crate::options::LoadOptions;
use crate::Document;

const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
const I18N: &str = "https://www.w3.org/ns/i18n#";
const CORE: &str = "tag:yaml.org,2002:";

/// Tag-aware YAML parser.
///
/// Also covers JSON and the `ld+json`/`ld+yaml` variants: YAML is a superset
/// of JSON.
pub struct YamlParser;

impl DocumentParser for YamlParser {
	fn parse(
		&self,
		bytes: &[u8],
		source: &str,
		options: &mut LoadOptions,
	) -> Result<Document, Error> {
		let text = std::str::from_utf8(bytes).map_err(|_| Error::InvalidEncoding)?;
		let documents = load_all(text, source)?;

		if options.extract_all_scripts {
			Ok(Value::Array(documents))
		} else {
			match documents.into_iter().next() {
				Some(document) => ensure_not_scalar(document),
				None => Err(Error::LoadingDocumentFailed {
					path: source.to_owned(),
					cause: None,
				}),
			}
		}
	}
}

/// Parses every document of a YAML stream, in source order.
///
/// The whole stream is consumed before anything is returned, so a syntax
/// error in a later document surfaces even when the caller only uses the
/// first one.
pub(crate) fn load_all(text: &str, source: &str) -> Result<Vec<Document>, Error> {
	let mut composer = Composer::default();
	let mut parser = Parser::new_from_str(text);
	parser
		.load(&mut composer, true)
		.map_err(|cause| scan_error(source, cause))?;
	match composer.error {
		Some(error) => Err(error),
		None => Ok(composer.documents),
	}
}

fn scan_error(source: &str, cause: ScanError) -> Error {
	Error::LoadingDocumentFailed {
		path: source.to_owned(),
		cause: Some(Box::new(cause)),
	}
}

/// Event-stream composer producing `serde_json` values.
#[derive(Default)]
struct Composer {
	documents: Vec<Value>,
	stack: Vec<Node>,
	anchors: HashMap<usize, Value>,
	error: Option<Error>,
}

enum Node {
	Sequence { items: Vec<Value>, anchor: usize },
	Mapping {
		entries: Map<String, Value>,
		pending_key: Option<String>,
		anchor: usize,
	},
}

impl Composer {
	fn insert(&mut self, value: Value, anchor: usize) {
		if anchor > 0 {
			self.anchors.insert(anchor, value.clone());
		}

		match self.stack.last_mut() {
			None => self.documents.push(value),
			Some(Node::Sequence { items, .. }) => items.push(value),
			Some(Node::Mapping {
				entries,
				pending_key,
				..
			}) => match pending_key.take() {
				Some(key) => {
					entries.insert(key, value);
				}
				None => match value {
					Value::String(key) => *pending_key = Some(key),
					_ => {
						if self.error.is_none() {
							self.error = Some(Error::MappingKeyError);
						}
					}
				},
			},
		}
	}

	fn fail(&mut self, error: Error) {
		if self.error.is_none() {
			self.error = Some(error);
		}
	}
}

impl MarkedEventReceiver for Composer {
	fn on_event(&mut self, event: Event, _marker: Marker) {
		if self.error.is_some() {
			return;
		}

		match event {
			Event::Nothing
			| Event::StreamStart
			| Event::StreamEnd
			| Event::DocumentStart
			| Event::DocumentEnd => {}
			Event::Scalar(text, style, anchor, tag) => {
				let value = resolve_scalar(text, style, tag);
				self.insert(value, anchor);
			}
			Event::SequenceStart(anchor, _tag) => self.stack.push(Node::Sequence {
				items: Vec::new(),
				anchor,
			}),
			Event::SequenceEnd => {
				if let Some(Node::Sequence { items, anchor }) = self.stack.pop() {
					self.insert(Value::Array(items), anchor);
				}
			}
			Event::MappingStart(anchor, _tag) => self.stack.push(Node::Mapping {
				entries: Map::new(),
				pending_key: None,
				anchor,
			}),
			Event::MappingEnd => {
				if let Some(Node::Mapping {
					entries, anchor, ..
				}) = self.stack.pop()
				{
					self.insert(Value::Object(entries), anchor);
				}
			}
			Event::Alias(id) => match self.anchors.get(&id).cloned() {
				Some(value) => self.insert(value, 0),
				None => self.fail(Error::UndefinedAliasFound),
			},
		}
	}
}

fn resolve_scalar(text: String, style: TScalarStyle, tag: Option<Tag>) -> Value {
	if let Some(tag) = tag {
		return apply_tag(&tag, text);
	}
	if style != TScalarStyle::Plain {
		return Value::String(text);
	}
	resolve_plain(text)
}

/// Applies linked data scalar typing.
///
/// `xsd:integer`, `xsd:decimal` and `xsd:boolean` become native values;
/// `xsd:double`, `xsd:date`, `xsd:time` and `xsd:dateTime` keep their exact
/// lexical form so that nothing is lost when the document is later converted
/// to RDF. Internationalized string tags stay plain strings. Unknown tags
/// keep the scalar text; so do malformed lexical forms.
fn apply_tag(tag: &Tag, text: String) -> Value {
	let full = full_tag(tag);

	if let Some(name) = full.strip_prefix(XSD) {
		return xsd_scalar(name, text);
	}
	if full.starts_with(I18N) || full.starts_with("http://www.w3.org/ns/i18n#") {
		return Value::String(text);
	}
	if let Some(name) = full.strip_prefix(CORE) {
		// The `!!xsd:NAME` shorthand used by YAML-LD documents without a
		// `%TAG` directive.
		if let Some(name) = name.strip_prefix("xsd:") {
			return xsd_scalar(name, text);
		}
		return core_scalar(name, text);
	}

	Value::String(text)
}

/// Resolved form of a tag, tolerating both resolved and shorthand handles.
fn full_tag(tag: &Tag) -> String {
	match tag.handle.as_str() {
		"!!" => format!("{CORE}{}", tag.suffix),
		"!" | "" => tag.suffix.clone(),
		handle => format!("{handle}{}", tag.suffix),
	}
}

fn xsd_scalar(name: &str, text: String) -> Value {
	match name {
		"integer" => parse_int(&text).map(Value::Number).unwrap_or(Value::String(text)),
		"decimal" => parse_float(&text).map(Value::Number).unwrap_or(Value::String(text)),
		"boolean" => match text.trim() {
			"true" | "1" => Value::Bool(true),
			"false" | "0" => Value::Bool(false),
			_ => Value::String(text),
		},
		// Kept textual: parsing these would lose precision or timezone
		// information before the RDF layer sees them.
		"double" | "date" | "time" | "dateTime" => Value::String(text),
		_ => Value::String(text),
	}
}

fn core_scalar(name: &str, text: String) -> Value {
	match name {
		"null" => Value::Null,
		"bool" => match text.trim() {
			"true" | "True" | "TRUE" => Value::Bool(true),
			"false" | "False" | "FALSE" => Value::Bool(false),
			_ => Value::String(text),
		},
		"int" => parse_int(&text).map(Value::Number).unwrap_or(Value::String(text)),
		"float" => parse_float(&text).map(Value::Number).unwrap_or(Value::String(text)),
		// `timestamp` stays textual, like the `xsd` date types.
		_ => Value::String(text),
	}
}

/// YAML 1.2 core schema resolution for plain scalars.
fn resolve_plain(text: String) -> Value {
	match text.as_str() {
		"" | "~" | "null" | "Null" | "NULL" => return Value::Null,
		"true" | "True" | "TRUE" => return Value::Bool(true),
		"false" | "False" | "FALSE" => return Value::Bool(false),
		_ => {}
	}
	if let Some(number) = parse_int(&text) {
		return Value::Number(number);
	}
	if let Some(number) = parse_float(&text) {
		return Value::Number(number);
	}
	Value::String(text)
}

fn parse_int(text: &str) -> Option<Number> {
	let text = text.trim();
	let (negative, digits) = match text.strip_prefix('-') {
		Some(digits) => (true, digits),
		None => (false, text.strip_prefix('+').unwrap_or(text)),
	};
	let magnitude = if let Some(hex) = digits.strip_prefix("0x") {
		i64::from_str_radix(hex, 16).ok()?
	} else if let Some(octal) = digits.strip_prefix("0o") {
		i64::from_str_radix(octal, 8).ok()?
	} else if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
		return None;
	} else {
		digits.parse::<i64>().ok()?
	};
	Some(Number::from(if negative { -magnitude } else { magnitude }))
}

fn parse_float(text: &str) -> Option<Number> {
	let text = text.trim();
	// `f64::from_str` accepts forms like `inf` and `NaN` that the core
	// schema spells differently; restricting the first character filters
	// them out, and `from_f64` rejects the non-finite remainder.
	let first = text.bytes().next()?;
	if !(first.is_ascii_digit() || matches!(first, b'-' | b'+' | b'.')) {
		return None;
	}
	Number::from_f64(text.parse::<f64>().ok()?)
}
