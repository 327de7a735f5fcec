//! Graph engine helpers: parsing fetched bytes into a graph and
//! serializing a graph back out for a snapshot.

use crate::errors::ParseError;
use anyhow::Result;
use log::debug;
use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::model::{Graph, Triple};
use std::io::Cursor;
use std::path::Path;

/// Parses a Turtle document into a graph.
///
/// Any other serialization, or a malformed body, is a [`ParseError`];
/// there is no format fallback.
pub fn parse_turtle(bytes: &[u8], source: &str) -> Result<Graph> {
    let parser = RdfParser::from_format(RdfFormat::Turtle);
    let mut graph = Graph::new();
    for quad in parser.for_reader(Cursor::new(bytes)) {
        let quad = quad.map_err(|e| ParseError {
            source_url: source.to_string(),
            reason: e.to_string(),
        })?;
        let triple = Triple::new(quad.subject, quad.predicate, quad.object);
        graph.insert(&triple);
    }
    Ok(graph)
}

/// Serializes a graph to a Turtle file.
pub fn write_graph_to_file(graph: &Graph, path: &Path) -> Result<()> {
    debug!("Writing {} triples to {}", graph.len(), path.display());
    let mut file = std::fs::File::create(path)?;
    let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle).for_writer(&mut file);
    for triple in graph.iter() {
        serializer.serialize_triple(triple)?;
    }
    serializer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParseError;

    const SMALL_TTL: &str = r#"
@prefix void: <http://rdfs.org/ns/void#> .
@prefix dcterms: <http://purl.org/dc/terms/> .
<http://example.org/ds> a void:Dataset ;
    dcterms:title "A dataset" .
"#;

    #[test]
    fn test_parse_turtle() {
        let graph = parse_turtle(SMALL_TTL.as_bytes(), "http://example.org/void").unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_parse_rejects_other_formats() {
        // an HTML error page, a common wrong-format response
        let html = b"<!doctype html><html><body>not found</body></html>";
        let err = parse_turtle(html, "http://example.org/void").unwrap_err();
        assert!(err.downcast_ref::<ParseError>().is_some());
    }

    #[test]
    fn test_roundtrip_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ttl");
        let graph = parse_turtle(SMALL_TTL.as_bytes(), "mem").unwrap();
        write_graph_to_file(&graph, &path).unwrap();
        let reread = parse_turtle(&std::fs::read(&path).unwrap(), "file").unwrap();
        assert_eq!(reread.len(), graph.len());
    }
}
