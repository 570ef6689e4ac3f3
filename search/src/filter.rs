//! Narrative-dimension filter: discards candidate nodes outside the
//! configured spatial ("where") and temporal ("when") window.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use narrascope_kernel::{Iri, Node, Triple};
use regex::Regex;

use crate::error::SearchError;

/// Inclusive day window `[lo, hi]` parsed from ISO 8601 config strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub lo: NaiveDate,
    pub hi: NaiveDate,
}

impl DateWindow {
    /// Parse `start_date`/`end_date` config strings.
    ///
    /// # Errors
    ///
    /// `SearchError::BadDate` if either string isn't a valid `YYYY-MM-DD` day,
    /// which spec.md §7 treats as a fatal, pre-flight `ConfigError`-class
    /// failure rather than a mid-run one.
    pub fn parse(start: &str, end: &str) -> Result<Self, SearchError> {
        let lo = NaiveDate::parse_from_str(start, "%Y-%m-%d")
            .map_err(|e| SearchError::BadDate(format!("start_date {start:?}: {e}")))?;
        let hi = NaiveDate::parse_from_str(end, "%Y-%m-%d")
            .map_err(|e| SearchError::BadDate(format!("end_date {end:?}: {e}")))?;
        Ok(Self { lo, hi })
    }
}

/// Flags plus supporting predicate/class lists for the narrative filter.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub where_: bool,
    pub when: bool,
    pub window: Option<DateWindow>,
    /// `rdf:type` classes that count as a place (spec.md §4.2 "where").
    pub place_classes: Vec<Iri>,
    pub point_in_time: Vec<Iri>,
    pub start_dates: Vec<Iri>,
    pub end_dates: Vec<Iri>,
}

/// Discard the subset of `candidates` whose `spec_outgoing` triples violate
/// the configured narrative dimensions. Union across dimensions, per
/// spec.md §4.2's final line.
#[must_use]
pub fn discard(config: &FilterConfig, candidates: &[Iri], spec_outgoing: &[Triple]) -> BTreeSet<Iri> {
    let mut discarded = BTreeSet::new();

    for node in candidates {
        let node_specs: Vec<&Triple> = spec_outgoing.iter().filter(|t| &t.subject == node).collect();

        if config.where_ && violates_where(config, &node_specs) {
            discarded.insert(node.clone());
            continue;
        }

        if config.when {
            if let Some(window) = config.window {
                if violates_when(config, &node_specs, window) || violates_year_fallback(node, window) {
                    discarded.insert(node.clone());
                }
            }
        }
    }

    discarded
}

fn violates_where(config: &FilterConfig, specs: &[&Triple]) -> bool {
    specs.iter().any(|t| {
        config
            .place_classes
            .iter()
            .any(|place| t.object.as_iri().is_some_and(|o| o == place))
    })
}

fn violates_when(config: &FilterConfig, specs: &[&Triple], window: DateWindow) -> bool {
    for t in specs {
        let Some(date) = literal_date(&t.object) else {
            continue;
        };
        if config.end_dates.contains(&t.predicate) && date < window.lo {
            return true;
        }
        if config.start_dates.contains(&t.predicate) && date > window.hi {
            return true;
        }
        if config.point_in_time.contains(&t.predicate) && (date < window.lo || date > window.hi) {
            return true;
        }
    }
    false
}

fn literal_date(object: &Node) -> Option<NaiveDate> {
    let text = object.as_str();
    let prefix = text.get(0..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// First 4-digit run in the node's own IRI, interpreted as a year. Absent a
/// match, the node is kept (spec.md §4.2).
fn violates_year_fallback(node: &Iri, window: DateWindow) -> bool {
    let re = Regex::new(r"\d{4}").expect("static year regex is valid");
    let Some(m) = re.find(node.as_str()) else {
        return false;
    };
    let Ok(year) = m.as_str().parse::<i32>() else {
        return false;
    };
    year < window.lo.format("%Y").to_string().parse().unwrap_or(i32::MIN)
        || year > window.hi.format("%Y").to_string().parse().unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrascope_kernel::Literal;

    fn date_triple(subject: &str, predicate: &str, date: &str) -> Triple {
        Triple::new(
            Iri::new(subject),
            Iri::new(predicate),
            Node::Literal(Literal::Plain(date.to_string())),
        )
    }

    #[test]
    fn temporal_filter_discards_out_of_window_nodes() {
        let window = DateWindow::parse("2005-01-01", "2015-01-01").unwrap();
        let config = FilterConfig {
            when: true,
            window: Some(window),
            point_in_time: vec![Iri::new("dbo:date")],
            ..Default::default()
        };
        let candidates = vec![Iri::new("E1"), Iri::new("E2"), Iri::new("E3")];
        let spec_outgoing = vec![
            date_triple("E1", "dbo:date", "2000-06-01"),
            date_triple("E2", "dbo:date", "2010-01-01"),
            date_triple("E3", "dbo:date", "2020-12-31"),
        ];
        let discarded = discard(&config, &candidates, &spec_outgoing);
        assert_eq!(discarded, BTreeSet::from([Iri::new("E1"), Iri::new("E3")]));
    }

    #[test]
    fn where_filter_discards_place_typed_node_even_in_window() {
        let window = DateWindow::parse("2005-01-01", "2015-01-01").unwrap();
        let config = FilterConfig {
            where_: true,
            when: true,
            window: Some(window),
            point_in_time: vec![Iri::new("dbo:date")],
            place_classes: vec![Iri::new("dbo:Place")],
            ..Default::default()
        };
        let candidates = vec![Iri::new("E1")];
        let spec_outgoing = vec![
            date_triple("E1", "dbo:date", "2010-01-01"),
            Triple::new(
                Iri::new("E1"),
                Iri::new("rdf:type"),
                Node::Resource(Iri::new("dbo:Place")),
            ),
        ];
        let discarded = discard(&config, &candidates, &spec_outgoing);
        assert!(discarded.contains(&Iri::new("E1")));
    }

    #[test]
    fn year_fallback_discards_node_whose_iri_year_is_outside_window() {
        let window = DateWindow::parse("2005-01-01", "2015-01-01").unwrap();
        let config = FilterConfig {
            when: true,
            window: Some(window),
            ..Default::default()
        };
        let candidates = vec![Iri::new("http://dbpedia.org/resource/Battle_of_1944")];
        let discarded = discard(&config, &candidates, &[]);
        assert!(discarded.contains(&candidates[0]));
    }

    #[test]
    fn node_with_no_year_in_iri_is_kept() {
        let window = DateWindow::parse("2005-01-01", "2015-01-01").unwrap();
        let config = FilterConfig {
            when: true,
            window: Some(window),
            ..Default::default()
        };
        let candidates = vec![Iri::new("http://dbpedia.org/resource/Trafalgar")];
        let discarded = discard(&config, &candidates, &[]);
        assert!(discarded.is_empty());
    }
}
