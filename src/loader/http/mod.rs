//! HTTP(S) document loader based on [`reqwest`](https://crates.io/crates/reqwest).
//!
//! Beyond the GET itself, the loader owns the protocol logic of this crate:
//! content type discovery, `Link`-header alternate negotiation and the
//! on-disk response cache.

mod cache;

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, LINK};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

use self::cache::{CachedResponse, ResponseCache};
use super::link::parse_link_header;
use super::{mime_of, Loader, RemoteDocument};
use crate::content_type;
use crate::error::Error;
use crate::options::LoadOptions;
use crate::parser::HtmlParser;

/// Default `Accept` header, in preference order.
const DEFAULT_ACCEPT: &str = "application/ld+json, application/ld+yaml, \
	application/rdf+xml;q=0.8, text/html;q=0.8, application/xhtml+xml;q=0.8, \
	application/json;q=0.5";

/// Hosts whose content negotiation hands out HTML too eagerly; they get a
/// narrower header.
const ACCEPT_OVERRIDES: &[(&str, &str)] = &[
	("www.wikidata.org", "application/rdf+xml, text/turtle;q=0.9"),
	("dbpedia.org", "application/rdf+xml, text/turtle;q=0.9"),
];

// Default network timeout. Chosen arbitrarily.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Loader options.
pub struct HttpLoaderOptions {
	/// Directory of the persistent response cache. `None` disables caching.
	pub cache_dir: Option<PathBuf>,

	/// HTTP client.
	pub client: ClientWithMiddleware,
}

impl Default for HttpLoaderOptions {
	fn default() -> Self {
		Self {
			cache_dir: None,
			client: ClientBuilder::new(
				reqwest::Client::builder()
					.timeout(DEFAULT_TIMEOUT)
					.build()
					.unwrap_or_default(),
			)
			.build(),
		}
	}
}

/// `reqwest`-based loader.
///
/// Evaluates `Link` response headers (and, for HTML bodies, `<link
/// rel="alternate">` elements) and follows the most preferred alternate
/// representation one hop deep; a failing alternate falls back to the
/// original response. Successful responses are served from the cache when
/// one is configured.
pub struct HttpLoader {
	options: HttpLoaderOptions,
	cache: Option<ResponseCache>,
}

impl Default for HttpLoader {
	fn default() -> Self {
		Self::new_using(HttpLoaderOptions::default())
	}
}

impl HttpLoader {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a new loader with the given options.
	pub fn new_using(options: HttpLoaderOptions) -> Self {
		let cache = options.cache_dir.clone().map(ResponseCache::new);
		Self { options, cache }
	}

	/// Empties the response cache. A no-op when caching is disabled.
	pub fn clear_cache(&self) -> std::io::Result<()> {
		match &self.cache {
			Some(cache) => cache.clear(),
			None => Ok(()),
		}
	}

	async fn fetch(&self, url: &str, options: &LoadOptions) -> Result<CachedResponse, Error> {
		let accept = accept_header_for(url);
		let key = cache::key(url, accept, &options.headers);

		if let Some(cache) = &self.cache {
			if let Some(response) = cache.get(&key) {
				log::debug!("cache hit: {url}");
				return Ok(response);
			}
		}

		log::debug!("downloading: {url}");
		let mut request = self.options.client.get(url).header(ACCEPT, accept);
		for (name, value) in &options.headers {
			request = request.header(name.as_str(), value.as_str());
		}

		let response = request.send().await.map_err(|cause| Error::Transport {
			url: url.to_owned(),
			cause: Box::new(cause),
		})?;

		match response.status() {
			StatusCode::NOT_FOUND => {
				return Err(Error::NotFound {
					path: url.to_owned(),
				});
			}
			status if !status.is_success() => {
				return Err(Error::HttpStatus {
					url: url.to_owned(),
					status: status.as_u16(),
				});
			}
			_ => {}
		}

		let final_url = response.url().to_string();
		let content_type = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(str::to_owned);
		let links = response
			.headers()
			.get_all(LINK)
			.iter()
			.filter_map(|value| value.to_str().ok().map(str::to_owned))
			.collect();
		let body = response
			.bytes()
			.await
			.map_err(|cause| Error::Transport {
				url: url.to_owned(),
				cause: Box::new(cause),
			})?
			.to_vec();

		let response = CachedResponse {
			final_url,
			content_type,
			links,
			body,
		};
		if let Some(cache) = &self.cache {
			if let Err(error) = cache.put(&key, &response) {
				log::warn!("failed to cache the response for {url}: {error}");
			}
		}
		Ok(response)
	}

	fn parse_response(
		&self,
		response: CachedResponse,
		source: &str,
		options: &mut LoadOptions,
	) -> Result<RemoteDocument, Error> {
		let mut content_type = resolved_content_type(&response, source);

		if content_type.is_none() && looks_like_rdf_xml(&response.body) {
			content_type = Some("application/rdf+xml".to_owned());
		}
		let Some(content_type) = content_type else {
			return Err(Error::ContentTypeNotDetermined {
				source_uri: source.to_owned(),
				body: body_snippet(&response.body),
			});
		};

		let parser = content_type::parser_for(&content_type, source)?;
		let document = parser.parse(&response.body, source, options)?;
		Ok(RemoteDocument::new(
			response.final_url,
			mime_of(&content_type, source)?,
			document,
		))
	}
}

impl Loader for HttpLoader {
	async fn load(&self, url: &str, options: &mut LoadOptions) -> Result<RemoteDocument, Error> {
		let response = self.fetch(url, options).await?;
		let current = resolved_content_type(&response, url);

		if let Some(alternate_url) = preferred_alternate(
			&response.links,
			&response.body,
			current.as_deref(),
			&response.final_url,
		) {
			log::debug!("following alternate representation: {alternate_url}");
			// One hop only: the alternate's own Link headers are not
			// re-evaluated, which keeps mutually-pointing alternates from
			// cycling.
			match self.fetch(&alternate_url, options).await {
				Ok(alternate) => match self.parse_response(alternate, &alternate_url, options) {
					Ok(document) => return Ok(document),
					Err(error) => log::warn!(
						"alternate representation `{alternate_url}` failed ({error}), \
						 falling back to `{url}`"
					),
				},
				Err(error) => log::warn!(
					"alternate representation `{alternate_url}` failed ({error}), \
					 falling back to `{url}`"
				),
			}
		}

		self.parse_response(response, url, options)
	}
}

/// Content type of a response: the `Content-Type` header with parameters
/// stripped, or the URL extension as a fallback.
fn resolved_content_type(response: &CachedResponse, url: &str) -> Option<String> {
	match &response.content_type {
		Some(raw) => Some(content_type::strip_parameters(raw).to_ascii_lowercase()),
		None => content_type::extension_of(url)
			.and_then(content_type::by_extension)
			.map(str::to_owned),
	}
}

/// The URL of the most preferred alternate representation, if any ranks
/// strictly above the current content type.
///
/// Candidates come from the `Link` response headers and, when the body is
/// HTML, from its `<link rel="alternate">` elements. Candidates without a
/// registered parser are ignored. Document order breaks rank ties.
fn preferred_alternate(
	links: &[String],
	body: &[u8],
	current: Option<&str>,
	page_url: &str,
) -> Option<String> {
	let current_rank = current.map(content_type::preference).unwrap_or(0);

	let mut candidates: Vec<_> = links
		.iter()
		.flat_map(|value| parse_link_header(value, page_url))
		.filter(|entry| entry.is_alternate())
		.collect();
	if matches!(current, Some("text/html") | Some("application/xhtml+xml")) {
		candidates.extend(HtmlParser::alternate_links(body, page_url));
	}

	let mut best: Option<(u8, String)> = None;
	for candidate in candidates {
		if content_type::parser_for(&candidate.content_type, page_url).is_err() {
			continue;
		}
		let rank = content_type::preference(&candidate.content_type);
		if rank <= current_rank {
			continue;
		}
		if best.as_ref().map_or(true, |(rank_so_far, _)| rank > *rank_so_far) {
			best = Some((rank, candidate.url));
		}
	}
	best.map(|(_, url)| url)
}

/// An undeclared body that opens like RDF/XML is assumed to be RDF/XML.
fn looks_like_rdf_xml(body: &[u8]) -> bool {
	let Ok(head) = std::str::from_utf8(&body[..body.len().min(512)]) else {
		return false;
	};
	let head = head.trim_start();
	head.starts_with("<?xml") || head.starts_with("<rdf:RDF")
}

fn body_snippet(body: &[u8]) -> String {
	String::from_utf8_lossy(&body[..body.len().min(256)]).into_owned()
}

/// The `Accept` header to use for a URL: the default preference list, or a
/// narrower per-host override.
fn accept_header_for(url: &str) -> &'static str {
	let Some(host) = host_of(url) else {
		return DEFAULT_ACCEPT;
	};
	ACCEPT_OVERRIDES
		.iter()
		.find(|(candidate, _)| {
			host == *candidate
				|| (host.ends_with(candidate)
					&& host[..host.len() - candidate.len()].ends_with('.'))
		})
		.map(|(_, accept)| *accept)
		.unwrap_or(DEFAULT_ACCEPT)
}

fn host_of(url: &str) -> Option<&str> {
	let (_, rest) = url.split_once("://")?;
	let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
	let host = authority.rsplit('@').next().unwrap_or(authority);
	Some(host.split(':').next().unwrap_or(host))
}

#[cfg(test)]
mod tests {
	use super::*;

	const PAGE: &str = "https://example.com/page.html";

	#[test]
	fn an_ld_json_link_outranks_an_html_response() {
		let links =
			vec![r#"<doc.jsonld>; rel="alternate"; type="application/ld+json""#.to_owned()];
		assert_eq!(
			preferred_alternate(&links, b"", Some("text/html"), PAGE),
			Some("https://example.com/doc.jsonld".to_owned()),
		);
	}

	#[test]
	fn an_equivalent_alternate_is_not_followed() {
		let links = vec![r#"<doc.json>; rel="alternate"; type="application/json""#.to_owned()];
		assert_eq!(preferred_alternate(&links, b"", Some("text/html"), PAGE), None);
	}

	#[test]
	fn nothing_outranks_a_linked_data_response() {
		let links =
			vec![r#"<doc.rdf>; rel="alternate"; type="application/rdf+xml""#.to_owned()];
		assert_eq!(
			preferred_alternate(&links, b"", Some("application/ld+yaml"), PAGE),
			None,
		);
	}

	#[test]
	fn alternates_without_a_registered_parser_are_ignored() {
		let links = vec![r#"<doc.pdf>; rel="alternate"; type="application/pdf""#.to_owned()];
		assert_eq!(preferred_alternate(&links, b"", Some("text/html"), PAGE), None);
	}

	#[test]
	fn non_alternate_links_are_ignored() {
		let links = vec![
			r#"<ctx.jsonld>; rel="http://www.w3.org/ns/json-ld#context"; type="application/ld+json""#
				.to_owned(),
		];
		assert_eq!(preferred_alternate(&links, b"", Some("text/html"), PAGE), None);
	}

	#[test]
	fn html_link_elements_join_the_candidates() {
		let body = concat!(
			"<html><head>",
			r#"<link rel="alternate" type="application/ld+yaml" href="doc.yamlld">"#,
			"</head><body></body></html>",
		);
		assert_eq!(
			preferred_alternate(&[], body.as_bytes(), Some("text/html"), PAGE),
			Some("https://example.com/doc.yamlld".to_owned()),
		);
	}

	#[test]
	fn the_highest_rank_wins_and_document_order_breaks_ties() {
		let links = vec![
			r#"<doc.ttl>; rel="alternate"; type="text/turtle""#.to_owned(),
			r#"<doc.jsonld>; rel="alternate"; type="application/ld+json""#.to_owned(),
			r#"<doc.yamlld>; rel="alternate"; type="application/ld+yaml""#.to_owned(),
		];
		assert_eq!(
			preferred_alternate(&links, b"", Some("text/html"), PAGE),
			Some("https://example.com/doc.jsonld".to_owned()),
		);
	}

	#[test]
	fn header_content_type_strips_parameters_case_insensitively() {
		let response = CachedResponse {
			final_url: PAGE.to_owned(),
			content_type: Some("Application/LD+YAML; Charset=UTF-8".to_owned()),
			links: Vec::new(),
			body: Vec::new(),
		};
		assert_eq!(
			resolved_content_type(&response, PAGE).as_deref(),
			Some("application/ld+yaml"),
		);
	}

	#[test]
	fn a_missing_header_falls_back_to_the_extension() {
		let response = CachedResponse {
			final_url: "https://example.com/doc.ttl".to_owned(),
			content_type: None,
			links: Vec::new(),
			body: Vec::new(),
		};
		assert_eq!(
			resolved_content_type(&response, "https://example.com/doc.ttl").as_deref(),
			Some("text/turtle"),
		);
	}

	#[test]
	fn rdf_xml_bodies_are_recognized() {
		assert!(looks_like_rdf_xml(b"<?xml version=\"1.0\"?>\n<rdf:RDF/>"));
		assert!(looks_like_rdf_xml(b"  <rdf:RDF xmlns:rdf=\"x\">"));
		assert!(!looks_like_rdf_xml(b"<html><body/></html>"));
	}

	#[test]
	fn known_hosts_get_a_narrower_accept_header() {
		assert_eq!(
			accept_header_for("https://www.wikidata.org/prop/P101"),
			"application/rdf+xml, text/turtle;q=0.9",
		);
		assert_eq!(
			accept_header_for("https://de.dbpedia.org/page/Berlin"),
			"application/rdf+xml, text/turtle;q=0.9",
		);
		assert_eq!(accept_header_for("https://example.com/doc"), DEFAULT_ACCEPT);
	}
}
