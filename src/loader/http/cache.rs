//! On-disk HTTP response cache.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A response, as fetched or as replayed from the cache.
#[derive(Debug, Clone)]
pub(crate) struct CachedResponse {
	/// URL after transport-level redirections.
	pub final_url: String,
	/// Raw `Content-Type` header value, if the response carried one.
	pub content_type: Option<String>,
	/// Raw `Link` header values.
	pub links: Vec<String>,
	pub body: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct Metadata {
	final_url: String,
	content_type: Option<String>,
	links: Vec<String>,
}

/// Cache key of a request identity: method, URL and headers.
pub(crate) fn key(
	url: &str,
	accept: &str,
	headers: &hashbrown::HashMap<String, String>,
) -> String {
	let mut hasher = Sha256::new();
	hasher.update(b"GET\n");
	hasher.update(url.as_bytes());
	hasher.update(b"\n");
	hasher.update(accept.as_bytes());
	let mut headers: Vec<_> = headers.iter().collect();
	headers.sort();
	for (name, value) in headers {
		hasher.update(b"\n");
		hasher.update(name.as_bytes());
		hasher.update(b":");
		hasher.update(value.as_bytes());
	}
	hex::encode(hasher.finalize())
}

/// Persistent response cache, keyed by request identity.
///
/// The cache is an optimization, not a correctness mechanism: concurrent
/// writes for the same key may race, and the loser's bytes are identical
/// anyway.
#[derive(Debug, Clone)]
pub(crate) struct ResponseCache {
	dir: PathBuf,
}

impl ResponseCache {
	pub fn new(dir: PathBuf) -> Self {
		Self { dir }
	}

	pub fn get(&self, key: &str) -> Option<CachedResponse> {
		let metadata = fs::read(self.dir.join(format!("{key}.json"))).ok()?;
		let metadata: Metadata = serde_json::from_slice(&metadata).ok()?;
		let body = fs::read(self.dir.join(format!("{key}.bin"))).ok()?;
		Some(CachedResponse {
			final_url: metadata.final_url,
			content_type: metadata.content_type,
			links: metadata.links,
			body,
		})
	}

	pub fn put(&self, key: &str, response: &CachedResponse) -> io::Result<()> {
		fs::create_dir_all(&self.dir)?;
		let metadata = Metadata {
			final_url: response.final_url.clone(),
			content_type: response.content_type.clone(),
			links: response.links.clone(),
		};
		let metadata = serde_json::to_vec(&metadata)
			.map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
		// Body first: a reader keys off the metadata file.
		fs::write(self.dir.join(format!("{key}.bin")), &response.body)?;
		fs::write(self.dir.join(format!("{key}.json")), metadata)
	}

	/// Removes every cached response.
	pub fn clear(&self) -> io::Result<()> {
		match fs::remove_dir_all(&self.dir) {
			Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
			other => other,
		}
	}
}
