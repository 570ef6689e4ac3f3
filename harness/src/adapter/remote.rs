//! Remote SPARQL-like endpoint adapter (spec.md §4.1).
//!
//! Blocking client: adapter calls happen inside `rayon` worker threads
//! (spec.md §5), which aren't async-aware, so synchronous I/O here keeps
//! the runner in sole charge of concurrency.

use std::collections::BTreeSet;
use std::time::Duration;

use narrascope_kernel::{AdapterError, Iri, Literal, Node, Triple};
use narrascope_search::store::{post_filter, Neighbourhood, PostFilterConfig, TripleStore};
use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
const MAX_RETRIES: u32 = 3;

/// One triple as returned by the remote endpoint's JSON wire format.
///
/// `datatype`, when present on a literal, is the same bare XSD datatype IRI
/// HDT embeds after a typed literal's closing quote (e.g.
/// `http://www.w3.org/2001/XMLSchema#date`). It's folded into the decoded
/// literal's text in the same `^^<iri>` shape `decode_triple` preserves, so
/// `narrascope_search::post_filter`'s date/integer normalisation fires
/// identically regardless of which adapter fetched the triple.
#[derive(Debug, Deserialize)]
struct WireTriple {
    subject: String,
    predicate: String,
    object: String,
    #[serde(default)]
    literal: bool,
    #[serde(default)]
    datatype: Option<String>,
}

impl From<WireTriple> for Triple {
    fn from(w: WireTriple) -> Self {
        let object = if w.literal {
            let text = match w.datatype {
                Some(iri) => format!("{}^^<{iri}>", w.object),
                None => w.object,
            };
            Node::Literal(Literal::Plain(text))
        } else {
            Node::Resource(Iri::new(w.object))
        };
        Triple::new(Iri::new(w.subject), Iri::new(w.predicate), object)
    }
}

/// Queries a remote triple-pattern endpoint over HTTP.
pub struct RemoteAdapter {
    client: Client,
    endpoint: Url,
    meta_predicates: Vec<Iri>,
    post_filter: PostFilterConfig,
}

impl RemoteAdapter {
    #[must_use]
    pub fn new(endpoint: Url, meta_predicates: Vec<Iri>, post_filter: PostFilterConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            meta_predicates,
            post_filter,
        }
    }

    /// Fetch all triples matching `(subject, predicate, object)`, treating
    /// `""` as a wildcard in any position, retrying transport failures with
    /// exponential backoff.
    fn pattern(&self, subject: &str, predicate: &str, object: &str) -> Result<Vec<Triple>, AdapterError> {
        let mut last_err = None;
        for attempt in 0..MAX_RETRIES {
            match self.query_once(subject, predicate, object) {
                Ok(triples) => return Ok(triples),
                Err(e) => {
                    tracing::warn!(subject, predicate, object, attempt, %e, "retrying remote triple query");
                    last_err = Some(e);
                    std::thread::sleep(Duration::from_millis(20 * 2u64.pow(attempt)));
                }
            }
        }
        Err(last_err.unwrap_or_else(|| AdapterError::Io("remote query exhausted retries".into())))
    }

    fn query_once(&self, subject: &str, predicate: &str, object: &str) -> Result<Vec<Triple>, AdapterError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("subject", subject), ("predicate", predicate), ("object", object)])
            .send()
            .map_err(|e| AdapterError::Io(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AdapterError::NotFound(Iri::new(subject)));
        }
        let response = response
            .error_for_status()
            .map_err(|e| AdapterError::Io(e.to_string()))?;

        let wire: Vec<WireTriple> = response.json().map_err(|e| AdapterError::Io(e.to_string()))?;
        Ok(wire.into_iter().map(Triple::from).collect())
    }
}

impl TripleStore for RemoteAdapter {
    fn neighbours(&self, node: &Iri, excluded: &[Iri]) -> Result<Neighbourhood, AdapterError> {
        let ingoing_raw = self.pattern("", "", node.as_str())?;
        let outgoing_raw = self.pattern(node.as_str(), "", "")?;

        let ingoing: Vec<Triple> = ingoing_raw
            .into_iter()
            .filter(|t| !excluded.contains(&t.predicate))
            .collect();
        let outgoing: Vec<Triple> = outgoing_raw
            .into_iter()
            .filter(|t| !excluded.contains(&t.predicate))
            .collect();

        let mut endpoints: BTreeSet<Iri> = BTreeSet::new();
        endpoints.extend(ingoing.iter().map(|t| t.subject.clone()));
        endpoints.extend(outgoing.iter().filter_map(|t| t.object.as_iri().cloned()));

        let mut spec_outgoing = Vec::new();
        for endpoint in &endpoints {
            for predicate in &self.meta_predicates {
                spec_outgoing.extend(self.pattern(endpoint.as_str(), predicate.as_str(), "")?);
            }
        }

        Ok(Neighbourhood {
            ingoing: post_filter(ingoing, &self.post_filter),
            outgoing: post_filter(outgoing, &self.post_filter),
            spec_outgoing: post_filter(spec_outgoing, &self.post_filter),
        })
    }

    fn superclass(&self, node: &Iri) -> Result<Iri, AdapterError> {
        let mut current = node.clone();
        let mut seen = BTreeSet::new();
        loop {
            if !seen.insert(current.clone()) {
                tracing::warn!(node = %node, "cyclic subClassOf chain, returning node itself");
                return Ok(node.clone());
            }
            let parents = self.pattern(current.as_str(), RDFS_SUBCLASS_OF, "")?;
            let Some(parent) = parents.first().and_then(|t| t.object.as_iri()) else {
                return Ok(current);
            };
            if parent.as_str() == OWL_THING {
                return Ok(current);
            }
            current = parent.clone();
        }
    }
}
