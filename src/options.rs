use hashbrown::HashMap;

/// Options passed to every loader and parser call.
///
/// Callees never write to these options, with one exception: the HTML parser
/// refines [`base`](Self::base) when a document declares its own
/// `<base href>`.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
	/// Extract every linked data script or stream document, as opposed to
	/// only the first one.
	pub extract_all_scripts: bool,

	/// Extra HTTP headers to send with remote requests.
	pub headers: HashMap<String, String>,

	/// The base IRI to use.
	pub base: Option<String>,
}

impl LoadOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_extract_all_scripts(mut self, extract_all_scripts: bool) -> Self {
		self.extract_all_scripts = extract_all_scripts;
		self
	}

	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());
		self
	}

	pub fn with_base(mut self, base: impl Into<String>) -> Self {
		self.base = Some(base.into());
		self
	}
}
