//! Triple-store adapter trait and the shared post-filter pipeline.
//!
//! The core never depends on which adapter is behind this trait — only
//! `narrascope_harness` knows whether it's talking to an in-process HDT
//! file or a remote endpoint.

use narrascope_kernel::{AdapterError, Iri, Node, Triple};

/// The three triple sequences a `neighbours` query returns.
#[derive(Debug, Clone, Default)]
pub struct Neighbourhood {
    /// `(?s, p, node)` with `p` not in the exclusion list.
    pub ingoing: Vec<Triple>,
    /// `(node, p, ?o)` with `p` not in the exclusion list.
    pub outgoing: Vec<Triple>,
    /// Type/date triples for every endpoint in `ingoing`/`outgoing`, fetched
    /// for ordering and filtering — not part of the result subgraph.
    pub spec_outgoing: Vec<Triple>,
}

/// Capability set a triple store must provide.
///
/// Implementations must be safe to call concurrently from `rayon` worker
/// threads (spec.md §5): no interior mutability the core observes.
pub trait TripleStore: Send + Sync {
    /// Fetch the ingoing/outgoing/spec-outgoing neighbourhood of `node`,
    /// already run through the post-filter pipeline.
    ///
    /// # Errors
    ///
    /// `AdapterError::NotFound` if `node` is absent from the store;
    /// `AdapterError::Io` on transport/storage failure.
    fn neighbours(&self, node: &Iri, excluded: &[Iri]) -> Result<Neighbourhood, AdapterError>;

    /// Walk `rdfs:subClassOf` upward from `node` to its superclass (the
    /// last IRI before `owl:Thing`).
    ///
    /// # Errors
    ///
    /// `AdapterError::Cycle` if the walk revisits a node; callers should
    /// treat the node as its own superclass in that case.
    fn superclass(&self, node: &Iri) -> Result<Iri, AdapterError>;
}

/// Namespace prefixes whose matching subject/object triples are dropped
/// outright: external templates, citations, wikisources, raw quoted
/// literals, and similar noise (spec.md §4.1 step 1).
pub const DEFAULT_NAMESPACE_DENYLIST: &[&str] = &[
    "http://en.wikipedia.org/",
    "https",
    "http://citation.dbpedia.org/",
    "http://books.google.com/",
    "http://en.wikisource",
    "http://www.sparknotes.com",
    "\"",
    "http://whc.unesco.org",
    "http://www",
    "http://dinlarthelwa",
    "http://afm",
];

/// Category-namespace prefix, toggled by `exclude_category` (spec.md §4.1
/// step 2, §6).
pub const DEFAULT_CATEGORY_PREFIX: &str = "http://dbpedia.org/resource/Category:";

/// Sentinel literal values dropped during normalisation (spec.md §4.1
/// step 3).
const SENTINEL_LITERALS: &[&str] = &["\"Unknown\"@"];

/// Real XSD datatype IRIs a typed literal's text carries after its closing
/// quote, e.g. `2020-01-01^^<http://www.w3.org/2001/XMLSchema#date>` — the
/// exact shape `decode_triple`/`WireTriple` preserve off the wire, and the
/// same substring `pre_process_date` checks for in the original interface.
const XSD_DATE: &str = "<http://www.w3.org/2001/XMLSchema#date>";
const XSD_INTEGER: &str = "<http://www.w3.org/2001/XMLSchema#integer>";

/// Configuration for [`post_filter`].
#[derive(Debug, Clone)]
pub struct PostFilterConfig {
    pub namespace_denylist: Vec<String>,
    pub exclude_category: bool,
    pub category_prefix: String,
}

impl Default for PostFilterConfig {
    fn default() -> Self {
        Self {
            namespace_denylist: DEFAULT_NAMESPACE_DENYLIST
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            exclude_category: true,
            category_prefix: DEFAULT_CATEGORY_PREFIX.to_string(),
        }
    }
}

/// Apply the namespace denylist, category denylist, and literal
/// normalisation pipeline to a batch of freshly-fetched triples.
///
/// This is the single implementation both the HDT adapter and the remote
/// adapter call through, so the two stay behaviourally interchangeable.
#[must_use]
pub fn post_filter(triples: Vec<Triple>, config: &PostFilterConfig) -> Vec<Triple> {
    triples
        .into_iter()
        .filter(|t| !matches_namespace_denylist(t, &config.namespace_denylist))
        .filter(|t| !config.exclude_category || !matches_category(t, &config.category_prefix))
        .filter_map(|t| normalise_literal(t))
        .collect()
}

fn matches_namespace_denylist(triple: &Triple, denylist: &[String]) -> bool {
    let subject_hit = denylist.iter().any(|p| triple.subject.starts_with(p));
    let object_hit = denylist.iter().any(|p| triple.object.as_str().starts_with(p));
    subject_hit || object_hit
}

fn matches_category(triple: &Triple, category_prefix: &str) -> bool {
    triple.subject.starts_with(category_prefix)
        || triple.object.as_str().starts_with(category_prefix)
}

/// Rewrite a date/integer-typed literal object to its normalised prefix, or
/// drop the triple if its object is a closed-set sentinel string.
///
/// A literal whose text contains the real `xsd:date` datatype IRI keeps
/// only its first 10 characters (`YYYY-MM-DD`); one containing `xsd:integer`
/// keeps its first 4 (the year). Everything else passes through unchanged.
fn normalise_literal(mut triple: Triple) -> Option<Triple> {
    let raw = triple.object.as_str();
    if SENTINEL_LITERALS.iter().any(|s| raw.starts_with(s)) {
        return None;
    }

    if let Node::Literal(lit) = &triple.object {
        let text = lit.as_str();
        if text.contains(XSD_DATE) {
            triple.object = Node::Literal(narrascope_kernel::Literal::Plain(text.chars().take(10).collect()));
        } else if text.contains(XSD_INTEGER) {
            triple.object = Node::Literal(narrascope_kernel::Literal::Plain(text.chars().take(4).collect()));
        }
    }
    Some(triple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrascope_kernel::Literal;

    fn triple(s: &str, p: &str, o: Node) -> Triple {
        Triple::new(Iri::new(s), Iri::new(p), o)
    }

    #[test]
    fn namespace_denylist_drops_matching_object() {
        let config = PostFilterConfig::default();
        let triples = vec![triple(
            "A",
            "p",
            Node::Resource(Iri::new("http://en.wikipedia.org/wiki/X")),
        )];
        assert!(post_filter(triples, &config).is_empty());
    }

    #[test]
    fn category_prefix_drops_matching_subject() {
        let config = PostFilterConfig::default();
        let triples = vec![triple(
            "http://dbpedia.org/resource/Category:Wars",
            "p",
            Node::Resource(Iri::new("B")),
        )];
        assert!(post_filter(triples, &config).is_empty());
    }

    #[test]
    fn date_literal_normalised_to_ten_char_prefix() {
        let config = PostFilterConfig::default();
        let triples = vec![triple(
            "A",
            "p",
            Node::Literal(Literal::Plain(
                "2020-06-01T00:00:00^^<http://www.w3.org/2001/XMLSchema#date>".into(),
            )),
        )];
        let out = post_filter(triples, &config);
        assert_eq!(out[0].object.as_str(), "2020-06-01");
    }

    #[test]
    fn integer_literal_normalised_to_four_char_year_prefix() {
        let config = PostFilterConfig::default();
        let triples = vec![triple(
            "A",
            "p",
            Node::Literal(Literal::Plain(
                "1805^^<http://www.w3.org/2001/XMLSchema#integer>".into(),
            )),
        )];
        let out = post_filter(triples, &config);
        assert_eq!(out[0].object.as_str(), "1805");
    }

    #[test]
    fn sentinel_literal_dropped() {
        let config = PostFilterConfig::default();
        let triples = vec![triple(
            "A",
            "p",
            Node::Literal(Literal::Plain("\"Unknown\"@en".into())),
        )];
        assert!(post_filter(triples, &config).is_empty());
    }
}
