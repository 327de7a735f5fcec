//! A typed view over a single void:Dataset subject within a description
//! document.

use crate::consts::{
    CONTRIBUTOR, CREATED, CREATOR, DATA_DUMP, DATE, DESCRIPTION, EXAMPLE_RESOURCE, FEATURE,
    ISSUED, MODIFIED, PUBLISHER, ROOT_RESOURCE, SOURCE, SPARQL_ENDPOINT, SUBSET, TITLE, TRIPLES,
    URI_SPACE, VOCABULARY,
};
use crate::description::DatasetDescription;
use crate::errors::UnsupportedAttribute;
use crate::triples::Triples;
use anyhow::{anyhow, Context, Result};
use chrono::prelude::*;
use log::warn;
use oxigraph::model::{NamedNode, NamedNodeRef, Term};

/// Result shape of an attribute lookup.
///
/// Callers must handle all three cases; `dataDump` in particular is
/// routinely absent, single, or repeated in real descriptions.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    One(Term),
    Many(Vec<Term>),
}

/// Recognized attribute names and the predicates they resolve to. The
/// registry is closed: anything outside it is an [`UnsupportedAttribute`].
const ATTRIBUTES: &[(&str, NamedNodeRef<'static>)] = &[
    // Dublin Core descriptive terms
    ("title", TITLE),
    ("description", DESCRIPTION),
    ("creator", CREATOR),
    ("publisher", PUBLISHER),
    ("contributor", CONTRIBUTOR),
    ("source", SOURCE),
    ("date", DATE),
    ("created", CREATED),
    ("issued", ISSUED),
    ("modified", MODIFIED),
    // VoID dataset terms
    ("dataDump", DATA_DUMP),
    ("sparqlEndpoint", SPARQL_ENDPOINT),
    ("exampleResource", EXAMPLE_RESOURCE),
    ("uriSpace", URI_SPACE),
    ("rootResource", ROOT_RESOURCE),
    ("subset", SUBSET),
    ("feature", FEATURE),
    ("vocabulary", VOCABULARY),
    ("triples", TRIPLES),
];

/// One void:Dataset described by a [`DatasetDescription`].
///
/// Holds no graph data of its own; every lookup goes back to the owning
/// document's current graph, so a view is only as fresh as the document it
/// borrows from.
pub struct Dataset<'a> {
    subject: NamedNode,
    desc: &'a DatasetDescription,
}

impl std::fmt::Debug for Dataset<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl<'a> Dataset<'a> {
    pub(crate) fn new(subject: NamedNode, desc: &'a DatasetDescription) -> Self {
        Self { subject, desc }
    }

    /// The subject IRI identifying this dataset within its description.
    pub fn id(&self) -> &str {
        self.subject.as_str()
    }

    pub fn subject(&self) -> NamedNodeRef<'_> {
        self.subject.as_ref()
    }

    /// Looks up a recognized attribute against the owning document.
    pub fn get(&self, name: &str) -> Result<Value> {
        let predicate = ATTRIBUTES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
            .ok_or_else(|| UnsupportedAttribute {
                name: name.to_string(),
            })?;
        let mut objects: Vec<Term> = Triples::new(self.desc.graph())
            .lookup(self.subject.as_ref(), predicate)
            .into_iter()
            .map(|t| t.into_owned())
            .collect();
        Ok(match objects.len() {
            0 => Value::Empty,
            1 => Value::One(objects.remove(0)),
            _ => Value::Many(objects),
        })
    }

    /// The dcterms:modified timestamp.
    ///
    /// Required for change detection, so a missing, repeated, or
    /// non-literal value is an error here rather than an empty result.
    pub fn modified(&self) -> Result<DateTime<Utc>> {
        match self.get("modified")? {
            Value::One(Term::Literal(lit)) => parse_timestamp(lit.value())
                .with_context(|| format!("Invalid dcterms:modified on {}", self.id())),
            Value::One(other) => Err(anyhow!(
                "dcterms:modified on {} is not a literal: {}",
                self.id(),
                other
            )),
            Value::Empty => Err(anyhow!("{} has no dcterms:modified", self.id())),
            Value::Many(values) => Err(anyhow!(
                "{} has {} dcterms:modified values",
                self.id(),
                values.len()
            )),
        }
    }

    /// All void:dataDump locations, flattened to a list of URIs.
    pub fn data_dumps(&self) -> Result<Vec<String>> {
        let values = match self.get("dataDump")? {
            Value::Empty => vec![],
            Value::One(term) => vec![term],
            Value::Many(terms) => terms,
        };
        let mut dumps = Vec::with_capacity(values.len());
        for term in values {
            match term {
                Term::NamedNode(n) => dumps.push(n.into_string()),
                other => warn!("Skipping non-IRI dataDump on {}: {}", self.id(), other),
            }
        }
        Ok(dumps)
    }

    /// The dcterms:title, when present as a single literal.
    pub fn title(&self) -> Result<Option<String>> {
        Ok(match self.get("title")? {
            Value::One(Term::Literal(lit)) => Some(lit.value().to_string()),
            _ => None,
        })
    }
}

/// Parses an xsd:dateTime or xsd:date literal into a UTC timestamp.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")?;
    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::DatasetDescription;
    use crate::fetch::DocumentFetcher;
    use anyhow::Result;
    use std::sync::Arc;

    struct StaticFetcher(&'static str);

    impl DocumentFetcher for StaticFetcher {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    const TTL: &str = r#"
@prefix void: <http://rdfs.org/ns/void#> .
@prefix dcterms: <http://purl.org/dc/terms/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

<http://example.org/gazetteer> a void:Dataset ;
    dcterms:title "Gazetteer" ;
    dcterms:modified "2020-01-01T00:00:00Z"^^xsd:dateTime ;
    void:dataDump <http://example.org/dumps/gazetteer.nt> .

<http://example.org/postcodes> a void:Dataset ;
    dcterms:modified "2019-05-01"^^xsd:date ;
    void:dataDump <http://example.org/dumps/pc1.nt>, <http://example.org/dumps/pc2.nt> .
"#;

    fn description() -> DatasetDescription {
        DatasetDescription::fetch("http://example.org/", true, Arc::new(StaticFetcher(TTL)))
            .unwrap()
    }

    #[test]
    fn test_get_shape_law() {
        let desc = description();
        let gazetteer = desc.dataset("http://example.org/gazetteer").unwrap().unwrap();
        let postcodes = desc.dataset("http://example.org/postcodes").unwrap().unwrap();

        // 0 matches -> Empty
        assert_eq!(gazetteer.get("creator").unwrap(), Value::Empty);
        // 1 match -> unwrapped scalar
        assert!(matches!(gazetteer.get("dataDump").unwrap(), Value::One(_)));
        // >= 2 matches -> the full sequence
        match postcodes.get("dataDump").unwrap() {
            Value::Many(values) => assert_eq!(values.len(), 2),
            other => panic!("expected Many, got {:?}", other),
        }
    }

    #[test]
    fn test_get_unknown_attribute_fails() {
        let desc = description();
        let dataset = desc.dataset("http://example.org/gazetteer").unwrap().unwrap();
        let err = dataset.get("sizeOnDisk").unwrap_err();
        let kind = err.downcast_ref::<UnsupportedAttribute>().unwrap();
        assert_eq!(kind.name, "sizeOnDisk");
    }

    #[test]
    fn test_modified_parses_datetime_and_date() {
        let desc = description();
        let gazetteer = desc.dataset("http://example.org/gazetteer").unwrap().unwrap();
        assert_eq!(
            gazetteer.modified().unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
        );
        let postcodes = desc.dataset("http://example.org/postcodes").unwrap().unwrap();
        assert_eq!(
            postcodes.modified().unwrap(),
            Utc.with_ymd_and_hms(2019, 5, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_data_dumps_normalizes_cardinality() {
        let desc = description();
        let gazetteer = desc.dataset("http://example.org/gazetteer").unwrap().unwrap();
        assert_eq!(
            gazetteer.data_dumps().unwrap(),
            vec!["http://example.org/dumps/gazetteer.nt".to_string()]
        );
        let postcodes = desc.dataset("http://example.org/postcodes").unwrap().unwrap();
        assert_eq!(postcodes.data_dumps().unwrap().len(), 2);
    }

    #[test]
    fn test_title() {
        let desc = description();
        let gazetteer = desc.dataset("http://example.org/gazetteer").unwrap().unwrap();
        assert_eq!(gazetteer.title().unwrap(), Some("Gazetteer".to_string()));
        let postcodes = desc.dataset("http://example.org/postcodes").unwrap().unwrap();
        assert_eq!(postcodes.title().unwrap(), None);
    }
}
