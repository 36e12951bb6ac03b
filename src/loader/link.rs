//! `Link` header parsing for alternate-representation negotiation.

use hashbrown::HashMap;
use iref::{Iri, IriRefBuf};

/// One entry of an HTTP `Link` response header, or one HTML
/// `<link rel="alternate">` element.
#[derive(Debug, Clone)]
pub struct LinkHeaderEntry {
	/// Link target, resolved against the page URL when possible.
	pub url: String,
	/// The `rel` parameter, possibly a whitespace-separated token list.
	pub rel: String,
	/// The `type` parameter, empty when the link does not declare one.
	pub content_type: String,
	/// Every parameter of the entry, keys lowercased.
	pub attributes: HashMap<String, String>,
}

impl LinkHeaderEntry {
	pub fn is_alternate(&self) -> bool {
		self.rel
			.split_ascii_whitespace()
			.any(|token| token.eq_ignore_ascii_case("alternate"))
	}
}

/// Resolves a possibly-relative reference against a base.
///
/// Returns the reference unchanged when either side does not parse as an
/// IRI; a local file path base falls in that case, and the caller resolves
/// against the file system instead.
pub(crate) fn resolve_reference(reference: &str, base: &str) -> String {
	match (IriRefBuf::new(reference.to_owned()), Iri::new(base)) {
		(Ok(reference), Ok(base)) => reference.resolved(base).to_string(),
		_ => reference.to_owned(),
	}
}

/// Parses a complete `Link` header value into its comma-separated entries.
///
/// Entry format: `<url>; rel="alternate"; type="text/turtle"`, parameter
/// values quoted or not. Relative targets are resolved against `page_url`.
/// Malformed trailing input is dropped rather than failing the response.
pub fn parse_link_header(value: &str, page_url: &str) -> Vec<LinkHeaderEntry> {
	enum State {
		BeginHref,
		Href,
		NextParam,
		BeginKey,
		Key,
		BeginValue,
		QuotedValue,
		Value,
	}

	let mut entries = Vec::new();
	let mut state = State::BeginHref;
	let mut href = String::new();
	let mut key = String::new();
	let mut value_buffer = String::new();
	let mut params: HashMap<String, String> = HashMap::new();

	fn finish_param(key: &mut String, value: &mut String, params: &mut HashMap<String, String>) {
		params.insert(
			std::mem::take(key).to_ascii_lowercase(),
			std::mem::take(value).trim().to_owned(),
		);
	}

	fn finish_entry(
		href: &mut String,
		params: &mut HashMap<String, String>,
		entries: &mut Vec<LinkHeaderEntry>,
		page_url: &str,
	) {
		if href.is_empty() {
			return;
		}
		let params = std::mem::take(params);
		entries.push(LinkHeaderEntry {
			url: resolve_reference(&std::mem::take(href), page_url),
			rel: params.get("rel").cloned().unwrap_or_default(),
			content_type: params.get("type").cloned().unwrap_or_default(),
			attributes: params,
		});
	}

	let mut chars = value.chars();
	loop {
		match state {
			State::BeginHref => match chars.next() {
				Some('<') => state = State::Href,
				Some(' ') | Some(',') => {}
				Some(_) => break,
				None => break,
			},
			State::Href => match chars.next() {
				Some('>') => state = State::NextParam,
				Some(c) => href.push(c),
				None => break,
			},
			State::NextParam => match chars.next() {
				Some(';') => state = State::BeginKey,
				Some(',') => {
					finish_entry(&mut href, &mut params, &mut entries, page_url);
					state = State::BeginHref;
				}
				Some(' ') => {}
				Some(_) => break,
				None => {
					finish_entry(&mut href, &mut params, &mut entries, page_url);
					break;
				}
			},
			State::BeginKey => match chars.next() {
				Some(' ') => {}
				Some(c) => {
					key.push(c);
					state = State::Key;
				}
				None => {
					finish_entry(&mut href, &mut params, &mut entries, page_url);
					break;
				}
			},
			State::Key => match chars.next() {
				Some('=') => state = State::BeginValue,
				Some(';') => {
					finish_param(&mut key, &mut value_buffer, &mut params);
					state = State::BeginKey;
				}
				Some(',') => {
					finish_param(&mut key, &mut value_buffer, &mut params);
					finish_entry(&mut href, &mut params, &mut entries, page_url);
					state = State::BeginHref;
				}
				Some(c) => key.push(c),
				None => {
					finish_param(&mut key, &mut value_buffer, &mut params);
					finish_entry(&mut href, &mut params, &mut entries, page_url);
					break;
				}
			},
			State::BeginValue => match chars.next() {
				Some('"') => state = State::QuotedValue,
				Some(c) => {
					value_buffer.push(c);
					state = State::Value;
				}
				None => {
					finish_param(&mut key, &mut value_buffer, &mut params);
					finish_entry(&mut href, &mut params, &mut entries, page_url);
					break;
				}
			},
			State::QuotedValue => match chars.next() {
				Some('"') => {
					finish_param(&mut key, &mut value_buffer, &mut params);
					state = State::NextParam;
				}
				Some(c) => value_buffer.push(c),
				None => break,
			},
			State::Value => match chars.next() {
				Some(';') => {
					finish_param(&mut key, &mut value_buffer, &mut params);
					state = State::BeginKey;
				}
				Some(',') => {
					finish_param(&mut key, &mut value_buffer, &mut params);
					finish_entry(&mut href, &mut params, &mut entries, page_url);
					state = State::BeginHref;
				}
				Some(c) => value_buffer.push(c),
				None => {
					finish_param(&mut key, &mut value_buffer, &mut params);
					finish_entry(&mut href, &mut params, &mut entries, page_url);
					break;
				}
			},
		}
	}

	entries
}
