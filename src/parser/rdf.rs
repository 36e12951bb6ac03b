//! RDF serializations: parsing is delegated to the `oxrdfio` parsers, and
//! the resulting triples are regrouped into the expanded node form the
//! transformation layer consumes.

use hashbrown::HashMap;
use iref::Iri;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{Subject, Term};
use oxrdfio::{RdfFormat, RdfParser};
use serde_json::{Map, Value};

use super::DocumentParser;
use crate::error::Error;
use crate::options::LoadOptions;
use crate::Document;

/// RDF/XML parser.
pub struct RdfXmlParser;

impl DocumentParser for RdfXmlParser {
	fn parse(
		&self,
		bytes: &[u8],
		source: &str,
		_options: &mut LoadOptions,
	) -> Result<Document, Error> {
		graph_document(RdfFormat::RdfXml, bytes, source)
	}
}

/// Turtle parser.
pub struct TurtleParser;

impl DocumentParser for TurtleParser {
	fn parse(
		&self,
		bytes: &[u8],
		source: &str,
		_options: &mut LoadOptions,
	) -> Result<Document, Error> {
		graph_document(RdfFormat::Turtle, bytes, source)
	}
}

fn graph_document(format: RdfFormat, bytes: &[u8], source: &str) -> Result<Document, Error> {
	let mut parser = RdfParser::from_format(format);
	if Iri::new(source).is_ok() {
		parser = parser
			.with_base_iri(source)
			.map_err(|cause| loading_failed(source, cause))?;
	}

	// Subjects keep their first-appearance order.
	let mut nodes: Vec<(String, Map<String, Value>)> = Vec::new();
	let mut index: HashMap<String, usize> = HashMap::new();

	for quad in parser.for_reader(bytes) {
		let quad = quad.map_err(|cause| loading_failed(source, cause))?;

		let subject = match quad.subject {
			Subject::NamedNode(node) => node.into_string(),
			Subject::BlankNode(node) => format!("_:{}", node.into_string()),
			_ => continue,
		};

		let position = *index.entry(subject.clone()).or_insert_with(|| {
			let mut node = Map::new();
			node.insert("@id".to_owned(), Value::String(subject.clone()));
			nodes.push((subject, node));
			nodes.len() - 1
		});
		let node = &mut nodes[position].1;

		if quad.predicate.as_ref() == rdf::TYPE {
			if let Term::NamedNode(class) = quad.object {
				push_value(node, "@type", Value::String(class.into_string()));
				continue;
			}
		}

		let object = term_value(quad.object);
		push_value(node, quad.predicate.as_str(), object);
	}

	Ok(Value::Array(
		nodes
			.into_iter()
			.map(|(_, node)| Value::Object(node))
			.collect(),
	))
}

fn push_value(node: &mut Map<String, Value>, key: &str, value: Value) {
	if let Value::Array(values) = node
		.entry(key.to_owned())
		.or_insert_with(|| Value::Array(Vec::new()))
	{
		values.push(value);
	}
}

fn term_value(term: Term) -> Value {
	let mut value = Map::new();
	match term {
		Term::NamedNode(node) => {
			value.insert("@id".to_owned(), Value::String(node.into_string()));
		}
		Term::BlankNode(node) => {
			value.insert(
				"@id".to_owned(),
				Value::String(format!("_:{}", node.into_string())),
			);
		}
		Term::Literal(literal) => {
			let (lexical, datatype, language) = literal.destruct();
			// Lexical forms stay textual: converting numerics here would be
			// as lossy as parsing `xsd:double` YAML scalars would be.
			value.insert("@value".to_owned(), Value::String(lexical));
			if let Some(language) = language {
				value.insert("@language".to_owned(), Value::String(language));
			} else if let Some(datatype) = datatype {
				if datatype.as_ref() != xsd::STRING {
					value.insert("@type".to_owned(), Value::String(datatype.into_string()));
				}
			}
		}
		_ => {}
	}
	Value::Object(value)
}

fn loading_failed(
	source: &str,
	cause: impl std::error::Error + Send + Sync + 'static,
) -> Error {
	Error::LoadingDocumentFailed {
		path: source.to_owned(),
		cause: Some(Box::new(cause)),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	const TURTLE: &str = concat!(
		"@prefix schema: <http://schema.org/> .\n",
		"<https://example.com/jane> a schema:Person ;\n",
		"    schema:name \"Jane Doe\" ;\n",
		"    schema:height \"1.75\"^^<http://www.w3.org/2001/XMLSchema#decimal> ;\n",
		"    schema:knows <https://example.com/john> .\n",
	);

	#[test]
	fn turtle_becomes_expanded_nodes() {
		let document = TurtleParser
			.parse(TURTLE.as_bytes(), "https://example.com/jane.ttl", &mut LoadOptions::default())
			.unwrap();
		assert_eq!(
			document,
			json!([{
				"@id": "https://example.com/jane",
				"@type": ["http://schema.org/Person"],
				"http://schema.org/name": [{"@value": "Jane Doe"}],
				"http://schema.org/height": [{
					"@value": "1.75",
					"@type": "http://www.w3.org/2001/XMLSchema#decimal",
				}],
				"http://schema.org/knows": [{"@id": "https://example.com/john"}],
			}])
		);
	}

	#[test]
	fn language_tags_are_kept() {
		let turtle = "<https://example.com/a> <http://schema.org/name> \"Jeanne\"@fr .\n";
		let document = TurtleParser
			.parse(turtle.as_bytes(), "https://example.com/a.ttl", &mut LoadOptions::default())
			.unwrap();
		assert_eq!(
			document,
			json!([{
				"@id": "https://example.com/a",
				"http://schema.org/name": [{"@value": "Jeanne", "@language": "fr"}],
			}])
		);
	}

	#[test]
	fn rdf_xml_parses_through_the_same_pipeline() {
		let rdf_xml = concat!(
			"<?xml version=\"1.0\"?>\n",
			"<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"\n",
			"         xmlns:schema=\"http://schema.org/\">\n",
			"  <rdf:Description rdf:about=\"https://example.com/jane\">\n",
			"    <schema:name>Jane Doe</schema:name>\n",
			"  </rdf:Description>\n",
			"</rdf:RDF>\n",
		);
		let document = RdfXmlParser
			.parse(rdf_xml.as_bytes(), "https://example.com/jane.rdf", &mut LoadOptions::default())
			.unwrap();
		assert_eq!(
			document,
			json!([{
				"@id": "https://example.com/jane",
				"http://schema.org/name": [{"@value": "Jane Doe"}],
			}])
		);
	}

	#[test]
	fn invalid_turtle_fails_loading() {
		let error = TurtleParser
			.parse(b"this is not turtle", "https://example.com/a.ttl", &mut LoadOptions::default())
			.unwrap_err();
		assert!(matches!(error, Error::LoadingDocumentFailed { .. }));
	}

	#[test]
	fn blank_node_subjects_keep_their_labels() {
		let turtle = "_:b0 <http://schema.org/name> \"Anonymous\" .\n";
		let document = TurtleParser
			.parse(turtle.as_bytes(), "https://example.com/a.ttl", &mut LoadOptions::default())
			.unwrap();
		let nodes = document.as_array().unwrap();
		assert_eq!(nodes.len(), 1);
		assert!(nodes[0]["@id"].as_str().unwrap().starts_with("_:"));
	}
}
