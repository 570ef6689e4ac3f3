//! Triple-store adapters: the only code in the workspace that knows
//! whether a run is backed by a local HDT file or a remote endpoint.

pub mod hdt;
pub mod remote;

pub use self::hdt::HdtAdapter;
pub use remote::RemoteAdapter;

use narrascope_kernel::{Iri, Literal, Node, Triple};

/// Decode one `(subject, predicate, object)` string triple into the kernel
/// model. `object` follows HDT's own string convention (see
/// `hdt::Hdt::triples_with_pattern`): a literal is wrapped in `"..."`,
/// optionally followed by a `^^<datatype-iri>` or `@lang` tag, anything else
/// is a bare IRI. Only the wrapping quotes are stripped — any trailing
/// datatype/language tag is kept intact, so `narrascope_search::post_filter`'s
/// literal normalisation step can detect the real `xsd:date`/`xsd:integer`
/// datatype IRI the way the source interface's `pre_process_date` does.
fn decode_triple(subject: &str, predicate: &str, object: &str) -> Triple {
    let node = if let Some(rest) = object.strip_prefix('"') {
        Node::Literal(Literal::Plain(strip_closing_quote(rest)))
    } else {
        Node::Resource(Iri::new(object))
    };
    Triple::new(Iri::new(subject), Iri::new(predicate), node)
}

/// Remove the literal's closing `"`, keeping whatever follows it (a
/// `^^<...>` datatype tag or `@lang` suffix) untouched.
fn strip_closing_quote(rest: &str) -> String {
    match rest.rfind('"') {
        Some(idx) => format!("{}{}", &rest[..idx], &rest[idx + 1..]),
        None => rest.to_string(),
    }
}
