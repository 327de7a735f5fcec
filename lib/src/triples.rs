//! Subject/predicate lookup over a parsed description graph.

use oxigraph::model::{Graph, NamedNodeRef, NamedOrBlankNodeRef, TermRef};

/// Read-only lookup view over one graph snapshot.
#[derive(Clone, Copy)]
pub struct Triples<'a> {
    graph: &'a Graph,
}

impl<'a> Triples<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph }
    }

    /// All object values for (subject, predicate).
    ///
    /// Never fails: an absent predicate yields an empty vector, which is a
    /// normal outcome. Order is stable for a given graph snapshot.
    pub fn lookup<'b>(
        &self,
        subject: impl Into<NamedOrBlankNodeRef<'b>>,
        predicate: impl Into<NamedNodeRef<'b>>,
    ) -> Vec<TermRef<'a>> {
        self.graph
            .objects_for_subject_predicate(subject, predicate)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DATA_DUMP, TITLE};
    use crate::util::parse_turtle;
    use oxigraph::model::NamedNodeRef;

    #[test]
    fn test_lookup_absent_is_empty_not_error() {
        let graph = Graph::new();
        let subject = NamedNodeRef::new("http://example.org/ds").unwrap();
        let found = Triples::new(&graph).lookup(subject, TITLE);
        assert!(found.is_empty());
    }

    #[test]
    fn test_lookup_returns_all_objects() {
        let ttl = r#"
@prefix void: <http://rdfs.org/ns/void#> .
<http://example.org/ds> void:dataDump <http://example.org/d1>, <http://example.org/d2> .
"#;
        let graph = parse_turtle(ttl.as_bytes(), "mem").unwrap();
        let subject = NamedNodeRef::new("http://example.org/ds").unwrap();
        let found = Triples::new(&graph).lookup(subject, DATA_DUMP);
        assert_eq!(found.len(), 2);
        // absent predicate on a present subject is still just empty
        assert!(Triples::new(&graph).lookup(subject, TITLE).is_empty());
    }
}
