//! Document loaders: resolving a reference into a [`RemoteDocument`].

pub mod fs;
pub mod link;

#[cfg(feature = "reqwest")]
pub mod http;

pub use fs::FsLoader;
pub use link::LinkHeaderEntry;

#[cfg(feature = "reqwest")]
pub use http::{HttpLoader, HttpLoaderOptions};

#[cfg(feature = "reqwest")]
use std::sync::Arc;

use hashbrown::HashMap;
use mime::Mime;

use crate::error::Error;
use crate::options::LoadOptions;
use crate::Document;

/// A loaded document.
///
/// Stores the canonical content of a document along with its resolved URL
/// and content type. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct RemoteDocument<T = Document> {
	url: String,
	content_type: Mime,
	context_url: Option<String>,
	document: T,
}

impl<T> RemoteDocument<T> {
	/// Creates a new remote document.
	///
	/// `url` is the final URL of the loaded document, after eventual
	/// redirection and content negotiation. `content_type` is the resolved
	/// content type, exclusive of any parameters.
	pub fn new(url: String, content_type: Mime, document: T) -> Self {
		Self {
			url,
			content_type,
			context_url: None,
			document,
		}
	}

	/// The final URL of the loaded document.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// The resolved content type, exclusive of any parameters.
	pub fn content_type(&self) -> &Mime {
		&self.content_type
	}

	/// URL of an out-of-band context attached to the document.
	///
	/// Reserved for context discovery; currently always `None`.
	pub fn context_url(&self) -> Option<&str> {
		self.context_url.as_deref()
	}

	/// The content of the document.
	pub fn document(&self) -> &T {
		&self.document
	}

	/// Drops the metadata and returns the content of the document.
	pub fn into_document(self) -> T {
		self.document
	}

	/// Maps the content of the remote document.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RemoteDocument<U> {
		RemoteDocument {
			url: self.url,
			content_type: self.content_type,
			context_url: self.context_url,
			document: f(self.document),
		}
	}
}

/// Document loader.
///
/// Loaders are constructed once, up front, and injected where they are
/// needed; there is no global default instance.
pub trait Loader {
	/// Loads the document behind the given URL.
	#[allow(async_fn_in_trait)]
	async fn load(&self, url: &str, options: &mut LoadOptions) -> Result<RemoteDocument, Error>;
}

/// A loader the dispatcher can route a scheme to.
///
/// A closed union rather than a trait object: the async [`Loader`] trait is
/// not object safe, and the set of transports is fixed at build time anyway.
pub enum SchemeLoader {
	File(FsLoader),
	#[cfg(feature = "reqwest")]
	Http(Arc<HttpLoader>),
}

impl Loader for SchemeLoader {
	async fn load(&self, url: &str, options: &mut LoadOptions) -> Result<RemoteDocument, Error> {
		match self {
			Self::File(loader) => loader.load(url, options).await,
			#[cfg(feature = "reqwest")]
			Self::Http(loader) => loader.load(url, options).await,
		}
	}
}

/// Dispatches a reference to the loader registered for its URI scheme.
///
/// A bare string with no scheme is treated as a local path.
pub struct ChoiceByScheme {
	loaders: HashMap<String, SchemeLoader>,
}

impl ChoiceByScheme {
	/// A dispatcher with the default wiring: `file` to the local file
	/// system, `http` and `https` to one shared HTTP loader.
	pub fn new() -> Self {
		let mut loaders = HashMap::new();
		loaders.insert("file".to_owned(), SchemeLoader::File(FsLoader::new()));
		#[cfg(feature = "reqwest")]
		{
			let http = Arc::new(HttpLoader::new());
			loaders.insert("http".to_owned(), SchemeLoader::Http(Arc::clone(&http)));
			loaders.insert("https".to_owned(), SchemeLoader::Http(http));
		}
		Self { loaders }
	}

	/// A dispatcher with no loaders registered at all.
	pub fn empty() -> Self {
		Self {
			loaders: HashMap::new(),
		}
	}

	/// Registers a loader for a scheme, replacing any previous one.
	pub fn insert(&mut self, scheme: impl Into<String>, loader: SchemeLoader) -> &mut Self {
		self.loaders.insert(scheme.into(), loader);
		self
	}

	/// The registered schemes, sorted.
	pub fn schemes(&self) -> Vec<String> {
		let mut schemes: Vec<String> = self.loaders.keys().cloned().collect();
		schemes.sort();
		schemes
	}
}

impl Default for ChoiceByScheme {
	fn default() -> Self {
		Self::new()
	}
}

impl Loader for ChoiceByScheme {
	async fn load(&self, url: &str, options: &mut LoadOptions) -> Result<RemoteDocument, Error> {
		let scheme = scheme_of(url).unwrap_or("file");
		match self.loaders.get(scheme) {
			Some(loader) => loader.load(url, options).await,
			None => Err(Error::ProtocolNotFound {
				url: url.to_owned(),
				scheme: scheme.to_owned(),
				available: self.schemes(),
			}),
		}
	}
}

/// The scheme of a URI, if it has one.
pub(crate) fn scheme_of(source: &str) -> Option<&str> {
	let (scheme, _) = source.split_once(':')?;
	let mut chars = scheme.chars();
	let first = chars.next()?;
	(first.is_ascii_alphabetic()
		&& chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-')))
	.then_some(scheme)
}

/// The registry content type as a `Mime` value.
pub(crate) fn mime_of(content_type: &str, source: &str) -> Result<Mime, Error> {
	content_type
		.parse()
		.map_err(|cause: mime::FromStrError| Error::LoadingDocumentFailed {
			path: source.to_owned(),
			cause: Some(Box::new(cause)),
		})
}
