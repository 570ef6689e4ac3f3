//! Per-dataset meta-predicate map (spec.md §6 "Dataset-config file").
//!
//! Three bundled defaults ship embedded so the crate is runnable without
//! external config for the common datasets; `DatasetConfig::load` reads an
//! override file from disk when `dataset_path` is supplied.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::Iri;

const DBPEDIA_YAML: &str = include_str!("../assets/dbpedia.yaml");
const WIKIDATA_YAML: &str = include_str!("../assets/wikidata.yaml");
const YAGO_YAML: &str = include_str!("../assets/yago.yaml");

/// Which bundled dataset a run targets. Determines the meta-predicate map
/// used to resolve `rdf:type`, temporal predicates, and place/person
/// classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Wikidata,
    Dbpedia,
    Yago,
}

/// Mapping from logical roles (type predicate, date predicates, place/person
/// classes) to the IRIs that play them in a given dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub rdf_type: Iri,
    #[serde(default)]
    pub point_in_time: Vec<Iri>,
    #[serde(default)]
    pub start_dates: Vec<Iri>,
    #[serde(default)]
    pub end_dates: Vec<Iri>,
    #[serde(default)]
    pub places: Vec<Iri>,
    #[serde(default)]
    pub person: Vec<Iri>,
}

impl DatasetConfig {
    /// Load the bundled default for `kind`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the embedded YAML fails to parse, which
    /// would indicate a packaging bug rather than user input.
    pub fn bundled(kind: DatasetKind) -> Result<Self, ConfigError> {
        let yaml = match kind {
            DatasetKind::Wikidata => WIKIDATA_YAML,
            DatasetKind::Dbpedia => DBPEDIA_YAML,
            DatasetKind::Yago => YAGO_YAML,
        };
        serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::new("dataset_type", format!("bundled config invalid: {e}")))
    }

    /// Load a dataset-config override from a YAML file on disk.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming `dataset_path` if the file cannot be
    /// read or does not parse as a valid `DatasetConfig`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::new("dataset_path", e.to_string()))?;
        serde_yaml::from_str(&text).map_err(|e| ConfigError::new("dataset_path", e.to_string()))
    }

    /// The full list of predicates the adapter must fetch to resolve
    /// `spec_outgoing` triples: type predicate plus every temporal role.
    #[must_use]
    pub fn meta_predicates(&self) -> Vec<Iri> {
        let mut preds = vec![self.rdf_type.clone()];
        preds.extend(self.point_in_time.iter().cloned());
        preds.extend(self.start_dates.iter().cloned());
        preds.extend(self.end_dates.iter().cloned());
        preds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_dbpedia_parses() {
        let cfg = DatasetConfig::bundled(DatasetKind::Dbpedia).unwrap();
        assert_eq!(
            cfg.rdf_type.as_str(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type"
        );
        assert!(!cfg.places.is_empty());
    }

    #[test]
    fn bundled_wikidata_and_yago_parse() {
        assert!(DatasetConfig::bundled(DatasetKind::Wikidata).is_ok());
        assert!(DatasetConfig::bundled(DatasetKind::Yago).is_ok());
    }

    #[test]
    fn meta_predicates_includes_type_and_temporal_roles() {
        let cfg = DatasetConfig::bundled(DatasetKind::Dbpedia).unwrap();
        let preds = cfg.meta_predicates();
        assert!(preds.contains(&cfg.rdf_type));
        assert!(preds.len() > 1);
    }
}
