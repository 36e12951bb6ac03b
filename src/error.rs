pub type ErrorCause = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can go wrong while resolving a reference into a canonical
/// document.
///
/// Most variants carry a stable [`code`](Error::code) consumed by the YAML-LD
/// conformance suite; the remaining variants are diagnostic only.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Document content must be a sequence or a mapping.
	#[error("document content must be a sequence or a mapping, found {kind}")]
	DocumentIsScalar {
		/// Kind of the offending scalar, for diagnostics.
		kind: &'static str,
	},

	/// The document is not valid in its declared serialization.
	#[error("loading document `{path}` failed")]
	LoadingDocumentFailed {
		path: String,
		#[source]
		cause: Option<ErrorCause>,
	},

	/// A mapping key must be a string.
	#[error("a mapping key must be a string")]
	MappingKeyError,

	/// A YAML-LD document must be encoded in UTF-8.
	#[error("document must be encoded in UTF-8")]
	InvalidEncoding,

	/// The content of an HTML `<script>` element is not a valid document.
	#[error("HTML script element content is not a valid linked data document")]
	InvalidScriptElement {
		#[source]
		cause: Option<ErrorCause>,
	},

	/// A JSON literal embedded in the document is not valid JSON.
	///
	/// Raised by the downstream transformation layer; part of the stable
	/// code set this crate guarantees.
	#[error("invalid JSON literal")]
	InvalidJsonLiteral,

	/// An alias references an anchor the document never defined.
	#[error("an alias references an undefined anchor")]
	UndefinedAliasFound,

	/// No linked data scripts were found in an HTML document.
	#[error("no linked data found in HTML document:\n{html}")]
	NoLinkedDataFoundInHtml {
		/// Shortened rendering of the HTML, for diagnostics.
		html: String,
	},

	/// The source URI carried a fragment, but no script has a matching `id`.
	#[error("no script tag found for id `{id}`")]
	NoScriptTagForId { id: String },

	/// A remote context could not be retrieved.
	#[error("failed to load the remote context `{context}`: {reason}")]
	LoadingRemoteContextFailed { context: String, reason: String },

	/// The referenced document does not exist.
	#[error("`{path}` does not exist")]
	NotFound { path: String },

	/// No loader is registered for the scheme of the given URL.
	#[error("cannot choose a loader for `{url}`: unknown scheme `{scheme}` (available schemes: {})", .available.join(", "))]
	ProtocolNotFound {
		url: String,
		scheme: String,
		available: Vec<String>,
	},

	/// No parser is registered for the given content type.
	#[error("cannot find a parser for `{content_type}` content type of `{uri}`")]
	ParserNotFound { content_type: String, uri: String },

	/// Neither the response headers nor the URL allowed determining a
	/// content type.
	#[error("could not determine the content type of `{source_uri}`")]
	ContentTypeNotDetermined {
		source_uri: String,
		/// Leading bytes of the response body, for diagnostics.
		body: String,
	},

	/// The request could not be carried out.
	#[cfg(feature = "reqwest")]
	#[error("request to `{url}` failed")]
	Transport {
		url: String,
		#[source]
		cause: ErrorCause,
	},

	/// The server answered with a non-success status other than 404.
	#[cfg(feature = "reqwest")]
	#[error("request to `{url}` failed with status {status}")]
	HttpStatus { url: String, status: u16 },
}

impl Error {
	/// Stable error code.
	///
	/// Codes for input errors are defined by the YAML-LD specification and
	/// asserted by its conformance suite. Codes for configuration errors
	/// (`not-found`, `protocol-not-found`, `parser-not-found`,
	/// `content-type-not-determined`) are diagnostic identifiers of this
	/// implementation.
	pub fn code(&self) -> &'static str {
		match self {
			Self::MappingKeyError => "mapping-key-error",
			Self::InvalidEncoding => "invalid encoding",
			Self::InvalidScriptElement { .. } => "invalid script element",
			Self::InvalidJsonLiteral => "invalid JSON literal",
			Self::LoadingRemoteContextFailed { .. } => "loading remote context failed",
			Self::NotFound { .. } => "not-found",
			Self::ProtocolNotFound { .. } => "protocol-not-found",
			Self::ParserNotFound { .. } => "parser-not-found",
			Self::ContentTypeNotDetermined { .. } => "content-type-not-determined",
			_ => "loading document failed",
		}
	}
}
