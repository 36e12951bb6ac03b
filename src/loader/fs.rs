//! Local file system loader.

use std::io;
use std::path::{Path, PathBuf};

use super::{mime_of, scheme_of, Loader, RemoteDocument};
use crate::content_type;
use crate::error::Error;
use crate::options::LoadOptions;
use crate::parser::HtmlParser;

/// Loads documents from the local file system.
///
/// The content type is determined purely by extension; file content is never
/// sniffed.
#[derive(Debug, Default)]
pub struct FsLoader;

impl FsLoader {
	pub fn new() -> Self {
		Self
	}

	/// The file system path behind a `file://` URL or bare path, with query
	/// and fragment stripped.
	fn filepath(source: &str) -> PathBuf {
		let path = source.strip_prefix("file://").unwrap_or(source);
		let path = path.split(['?', '#']).next().unwrap_or(path);
		PathBuf::from(path)
	}

	/// Reads a source, determining its content type by extension first: an
	/// unregistered extension is reported without touching the disk.
	fn read(&self, source: &str) -> Result<(Vec<u8>, &'static str, PathBuf), Error> {
		let path = Self::filepath(source);

		let extension = path
			.extension()
			.and_then(|extension| extension.to_str())
			.and_then(content_type::by_extension);
		let Some(content_type) = extension else {
			return Err(Error::ContentTypeNotDetermined {
				source_uri: source.to_owned(),
				body: String::new(),
			});
		};
		content_type::parser_for(content_type, source)?;

		let bytes = std::fs::read(&path).map_err(|cause| match cause.kind() {
			io::ErrorKind::NotFound => Error::NotFound {
				path: path.display().to_string(),
			},
			_ => Error::LoadingDocumentFailed {
				path: path.display().to_string(),
				cause: Some(Box::new(cause)),
			},
		})?;

		Ok((bytes, content_type, path))
	}

	fn parse(
		&self,
		bytes: &[u8],
		content_type: &'static str,
		source: &str,
		options: &mut LoadOptions,
	) -> Result<RemoteDocument, Error> {
		let parser = content_type::parser_for(content_type, source)?;
		let document = parser.parse(bytes, source, options)?;
		Ok(RemoteDocument::new(
			source.to_owned(),
			mime_of(content_type, source)?,
			document,
		))
	}

	/// The most preferred local alternate a local HTML page advertises, if
	/// any.
	fn preferred_alternate(&self, bytes: &[u8], source: &str, path: &Path) -> Option<String> {
		let current_rank = content_type::preference("text/html");
		let mut best: Option<(u8, String)> = None;

		for entry in HtmlParser::alternate_links(bytes, source) {
			if content_type::parser_for(&entry.content_type, source).is_err() {
				continue;
			}
			let rank = content_type::preference(&entry.content_type);
			if rank <= current_rank {
				continue;
			}
			// Only targets on the local file system can be followed from
			// here.
			let target = match scheme_of(&entry.url) {
				None => {
					let relative = Path::new(&entry.url);
					if relative.is_absolute() {
						relative.to_path_buf()
					} else {
						path.parent().unwrap_or(Path::new("")).join(relative)
					}
				}
				Some("file") => Self::filepath(&entry.url),
				Some(_) => continue,
			};
			if best.as_ref().map_or(true, |(rank_so_far, _)| rank > *rank_so_far) {
				best = Some((rank, target.display().to_string()));
			}
		}

		best.map(|(_, target)| target)
	}
}

impl Loader for FsLoader {
	async fn load(&self, source: &str, options: &mut LoadOptions) -> Result<RemoteDocument, Error> {
		let (bytes, content_type, path) = self.read(source)?;

		// A local HTML page may point at a better representation next to it.
		if content_type == "text/html" {
			if let Some(alternate) = self.preferred_alternate(&bytes, source, &path) {
				log::debug!("following alternate representation: {alternate}");
				match self
					.read(&alternate)
					.and_then(|(bytes, content_type, _)| {
						self.parse(&bytes, content_type, &alternate, options)
					}) {
					Ok(document) => return Ok(document),
					Err(error) => {
						log::warn!(
							"alternate representation `{alternate}` failed ({error}), \
							 falling back to `{source}`"
						);
					}
				}
			}
		}

		self.parse(&bytes, content_type, source, options)
	}
}
