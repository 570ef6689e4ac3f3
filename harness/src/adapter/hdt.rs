//! In-process compressed triple store, backed by the `hdt` crate
//! (spec.md §4.1).

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use hdt::Hdt;
use narrascope_kernel::{AdapterError, DatasetConfig, Iri, Triple};
use narrascope_search::store::{post_filter, Neighbourhood, PostFilterConfig, TripleStore};

use super::decode_triple;

const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";

/// Reads triples out of a single `.hdt` file. `meta_predicates` is the
/// dataset's type/date predicate list (spec.md §4.1's `spec_outgoing`
/// query); an empty string in any pattern position means "any", matching
/// the source interface's `run_request`.
pub struct HdtAdapter {
    doc: Hdt,
    meta_predicates: Vec<Iri>,
    post_filter: PostFilterConfig,
}

impl HdtAdapter {
    /// Open `path` and resolve the meta-predicate list from `dataset_config`.
    ///
    /// # Errors
    ///
    /// `AdapterError::Io` if the file can't be opened or doesn't parse as
    /// a valid HDT document.
    pub fn open(
        path: &Path,
        dataset_config: &DatasetConfig,
        post_filter: PostFilterConfig,
    ) -> Result<Self, AdapterError> {
        let file = File::open(path)
            .map_err(|e| AdapterError::Io(format!("opening {}: {e}", path.display())))?;
        let doc = Hdt::new(BufReader::new(file)).map_err(|e| AdapterError::Io(e.to_string()))?;
        Ok(Self {
            doc,
            meta_predicates: dataset_config.meta_predicates(),
            post_filter,
        })
    }

    fn pattern(&self, subject: &str, predicate: &str, object: &str) -> Vec<Triple> {
        self.doc
            .triples_with_pattern(subject, predicate, object)
            .map(|[s, p, o]| decode_triple(&s, &p, &o))
            .collect()
    }
}

impl TripleStore for HdtAdapter {
    fn neighbours(&self, node: &Iri, excluded: &[Iri]) -> Result<Neighbourhood, AdapterError> {
        let ingoing_raw = self.pattern("", "", node.as_str());
        let outgoing_raw = self.pattern(node.as_str(), "", "");

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
                spec_outgoing.extend(self.pattern(endpoint.as_str(), predicate.as_str(), ""));
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
            let parents = self.pattern(current.as_str(), RDFS_SUBCLASS_OF, "");
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
