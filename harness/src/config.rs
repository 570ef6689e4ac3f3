//! Configuration schema and validation (spec.md §6).
//!
//! `RawConfig` mirrors the source's loose `dict` config one-to-one, field
//! names matching spec.md §6's table; `validate` is this crate's
//! `_check_config`, translated from ad hoc `dict` lookups into one
//! exhaustive pass that raises `ConfigError{key, reason}` naming the
//! offending key.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use narrascope_kernel::{ConfigError, DatasetConfig, DatasetKind, Iri};
use narrascope_search::{
    DateWindow, FilterConfig, MetricsObserver, OrderingConfig, Parallelism, Ranker, ScoringRule,
    SearchMode, SearchPolicy,
};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOrdering {
    #[serde(default)]
    pub domain_range: Option<u8>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawFiltering {
    #[serde(default)]
    pub what: Option<u8>,
    #[serde(default, rename = "where")]
    pub where_: Option<u8>,
    #[serde(default)]
    pub when: Option<u8>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawParallelism {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub threads: Option<usize>,
}

/// Loose, field-for-field mirror of spec.md §6's config table. Every field
/// is optional at the type level; `validate` enforces which ones are
/// actually mandatory, the same way the source's `_check_config` does on a
/// raw `dict`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfig {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub iterations: Option<u32>,
    #[serde(default)]
    pub type_ranking: Option<String>,
    #[serde(default)]
    pub type_interface: Option<String>,
    #[serde(default)]
    pub dataset_type: Option<String>,
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
    #[serde(default)]
    pub dataset_config_path: Option<PathBuf>,
    #[serde(default)]
    pub remote_endpoint: Option<String>,
    #[serde(default)]
    pub rdf_type: Option<Vec<(String, String)>>,
    #[serde(default)]
    pub predicate_filter: Option<Vec<String>>,
    #[serde(default)]
    pub demoted_predicates: Option<Vec<String>>,
    #[serde(default)]
    pub ordering: Option<RawOrdering>,
    #[serde(default)]
    pub filtering: Option<RawFiltering>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub exclude_category: Option<u8>,
    #[serde(default)]
    pub gold_standard: Option<Vec<String>>,
    #[serde(default)]
    pub referents: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub type_metrics: Option<bool>,
    #[serde(default)]
    pub name_exp: Option<String>,
    #[serde(default)]
    pub parallelism: Option<RawParallelism>,
}

/// Which adapter a validated run talks through.
#[derive(Debug, Clone)]
pub enum AdapterSelection {
    Hdt { dataset_path: PathBuf },
    Remote { endpoint: Url },
}

/// Everything `harness::cli` needs to build and run a `SearchEngine`.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub policy: SearchPolicy,
    pub filter: FilterConfig,
    pub ordering: OrderingConfig,
    pub ranker: Ranker,
    pub dataset_config: DatasetConfig,
    pub metrics: Option<MetricsObserver>,
    pub exclude_category: bool,
    pub adapter: AdapterSelection,
}

impl RunConfig {
    /// Build the post-filter pipeline configuration the chosen adapter
    /// should run every fetched batch through, honouring `exclude_category`.
    #[must_use]
    pub fn post_filter_config(&self) -> narrascope_search::PostFilterConfig {
        narrascope_search::PostFilterConfig {
            exclude_category: self.exclude_category,
            ..narrascope_search::PostFilterConfig::default()
        }
    }
}

/// Alias kept for call sites that load straight from disk; loading itself
/// never fails with anything but a `ConfigError`.
pub type ConfigLoadError = ConfigError;

/// Parse a `RawConfig` from YAML or JSON text, sniffed by `path`'s
/// extension (enrichment: the source only reads JSON; the rest of the
/// pack favors YAML for hand-edited config, so both are accepted here).
///
/// # Errors
///
/// `ConfigError` naming `config_path` if the file can't be read or doesn't
/// parse as either format.
pub fn load_raw(path: &std::path::Path) -> Result<RawConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::new("config_path", e.to_string()))?;
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&text).map_err(|e| ConfigError::new("config_path", format!("invalid JSON: {e}")))
    } else {
        serde_yaml::from_str(&text).map_err(|e| ConfigError::new("config_path", format!("invalid YAML: {e}")))
    }
}

/// Validate `raw` for `mode`, resolving it into a runnable [`RunConfig`].
///
/// `target_node` comes from the CLI's `--end-node`, not the config file,
/// mirroring the source's `-e` flag (spec.md §6 / harness::cli).
///
/// # Errors
///
/// `ConfigError{key, reason}` naming the first invalid or missing key,
/// checked in the same order as the source's `_check_config`.
pub fn validate(raw: RawConfig, mode: SearchMode, target_node: Option<Iri>) -> Result<RunConfig, ConfigError> {
    let start = require(raw.start, "start")?;
    let iterations = raw.iterations.ok_or_else(|| missing("iterations"))?;
    let rule = parse_scoring_rule(&require(raw.type_ranking, "type_ranking")?)?;
    let type_interface = require(raw.type_interface, "type_interface")?;
    let dataset_kind = parse_dataset_kind(&require(raw.dataset_type, "dataset_type")?)?;

    let dataset_config = match &raw.dataset_config_path {
        Some(path) => DatasetConfig::load(path)?,
        None => DatasetConfig::bundled(dataset_kind)?,
    };

    let adapter = match type_interface.as_str() {
        "hdt" => {
            let dataset_path = raw
                .dataset_path
                .ok_or_else(|| ConfigError::new("dataset_path", "required when type_interface = hdt"))?;
            AdapterSelection::Hdt { dataset_path }
        }
        "remote" => {
            let endpoint_str = raw
                .remote_endpoint
                .ok_or_else(|| ConfigError::new("remote_endpoint", "required when type_interface = remote"))?;
            let endpoint = Url::parse(&endpoint_str)
                .map_err(|e| ConfigError::new("remote_endpoint", e.to_string()))?;
            AdapterSelection::Remote { endpoint }
        }
        other => {
            return Err(ConfigError::new(
                "type_interface",
                format!("must be `hdt` or `remote`, got `{other}`"),
            ))
        }
    };

    let domain_range = flag_on(raw.ordering.as_ref().and_then(|o| o.domain_range));
    let rdf_type = raw.rdf_type.unwrap_or_default();
    let rdf_type_required =
        matches!(mode, SearchMode::TypeNodeMetrics | SearchMode::TypeNodeNoMetrics) || domain_range;
    if rdf_type_required && rdf_type.is_empty() {
        return Err(ConfigError::new(
            "rdf_type",
            "required for type-node search modes, or when ordering.domain_range is set",
        ));
    }
    let target_types: Vec<Iri> = rdf_type.into_iter().map(|(_, iri)| Iri::new(iri)).collect();
    let ordering = OrderingConfig { domain_range, target_types };

    let mut predicate_filter: Vec<Iri> = raw
        .predicate_filter
        .unwrap_or_default()
        .into_iter()
        .map(Iri::new)
        .collect();
    if flag_on(raw.filtering.as_ref().and_then(|f| f.what)) {
        predicate_filter.push(dataset_config.rdf_type.clone());
    }
    let demoted_predicates: Vec<Iri> = raw
        .demoted_predicates
        .unwrap_or_default()
        .into_iter()
        .map(Iri::new)
        .collect();

    let filtering_when = flag_on(raw.filtering.as_ref().and_then(|f| f.when));
    let window = if filtering_when {
        let start_date = require(raw.start_date, "start_date")?;
        let end_date = require(raw.end_date, "end_date")?;
        Some(
            DateWindow::parse(&start_date, &end_date)
                .map_err(|e| ConfigError::new("start_date", e.to_string()))?,
        )
    } else {
        None
    };
    let filter = FilterConfig {
        where_: flag_on(raw.filtering.as_ref().and_then(|f| f.where_)),
        when: filtering_when,
        window,
        place_classes: dataset_config.places.clone(),
        point_in_time: dataset_config.point_in_time.clone(),
        start_dates: dataset_config.start_dates.clone(),
        end_dates: dataset_config.end_dates.clone(),
    };

    let parallelism = match raw.parallelism.as_ref().and_then(|p| p.mode.as_deref()) {
        None | Some("sequential") => Parallelism::Sequential,
        Some("pool") => {
            let threads = raw
                .parallelism
                .as_ref()
                .and_then(|p| p.threads)
                .unwrap_or_else(default_pool_size);
            Parallelism::Pool(threads)
        }
        Some(other) => {
            return Err(ConfigError::new(
                "parallelism.mode",
                format!("must be `sequential` or `pool`, got `{other}`"),
            ))
        }
    };

    if matches!(mode, SearchMode::SpecificNode) && target_node.is_none() {
        return Err(ConfigError::new("end_node", "required for search_specific_node mode"));
    }

    let metrics = if matches!(mode, SearchMode::TypeNodeMetrics) {
        let gold_standard: BTreeSet<Iri> = raw
            .gold_standard
            .ok_or_else(|| missing("gold_standard"))?
            .into_iter()
            .map(Iri::new)
            .collect();
        let referents: BTreeMap<Iri, Iri> = raw
            .referents
            .ok_or_else(|| missing("referents"))?
            .into_iter()
            .map(|(k, v)| (Iri::new(k), Iri::new(v)))
            .collect();
        raw.type_metrics.ok_or_else(|| missing("type_metrics"))?;
        Some(MetricsObserver::new(referents, gold_standard))
    } else {
        None
    };

    let policy = SearchPolicy {
        start: Iri::new(start),
        iterations,
        predicate_filter,
        demoted_predicates,
        target_node,
        mode,
        parallelism,
    };

    Ok(RunConfig {
        policy,
        filter,
        ordering,
        ranker: Ranker::new(rule),
        dataset_config,
        metrics,
        exclude_category: flag_on(raw.exclude_category.or(Some(1))),
        adapter,
    })
}

fn require(value: Option<String>, key: &str) -> Result<String, ConfigError> {
    value.filter(|s| !s.is_empty()).ok_or_else(|| missing(key))
}

fn missing(key: &str) -> ConfigError {
    ConfigError::new(key, "missing mandatory key")
}

fn flag_on(value: Option<u8>) -> bool {
    value.unwrap_or(0) == 1
}

fn default_pool_size() -> usize {
    std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(4)
}

fn parse_scoring_rule(value: &str) -> Result<ScoringRule, ConfigError> {
    match value {
        "pred_freq" => Ok(ScoringRule::PredFreq),
        "inverse_pred_freq" => Ok(ScoringRule::InversePredFreq),
        "entropy_pred_freq" => Ok(ScoringRule::EntropyPredFreq),
        "pred_object_freq" => Ok(ScoringRule::PredObjectFreq),
        "inverse_pred_object_freq" => Ok(ScoringRule::InversePredObjectFreq),
        "entropy_pred_object_freq" => Ok(ScoringRule::EntropyPredObjectFreq),
        other => Err(ConfigError::new(
            "type_ranking",
            format!("must be one of the six scoring rules, got `{other}`"),
        )),
    }
}

fn parse_dataset_kind(value: &str) -> Result<DatasetKind, ConfigError> {
    match value {
        "wikidata" => Ok(DatasetKind::Wikidata),
        "dbpedia" => Ok(DatasetKind::Dbpedia),
        "yago" => Ok(DatasetKind::Yago),
        other => Err(ConfigError::new(
            "dataset_type",
            format!("must be `wikidata`, `dbpedia`, or `yago`, got `{other}`"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_raw() -> RawConfig {
        RawConfig {
            start: Some("http://dbpedia.org/resource/Battle_of_Trafalgar".into()),
            iterations: Some(3),
            type_ranking: Some("pred_freq".into()),
            type_interface: Some("hdt".into()),
            dataset_type: Some("dbpedia".into()),
            dataset_path: Some(PathBuf::from("dbpedia.hdt")),
            ..RawConfig::default()
        }
    }

    #[test]
    fn minimal_config_validates_for_simple_exploration() {
        let run = validate(minimal_raw(), SearchMode::SimpleExploration, None).unwrap();
        assert_eq!(run.policy.iterations, 3);
        assert!(matches!(run.adapter, AdapterSelection::Hdt { .. }));
    }

    #[test]
    fn missing_start_is_a_config_error_naming_the_key() {
        let mut raw = minimal_raw();
        raw.start = None;
        let err = validate(raw, SearchMode::SimpleExploration, None).unwrap_err();
        assert_eq!(err.key, "start");
    }

    #[test]
    fn type_node_mode_requires_rdf_type() {
        let raw = minimal_raw();
        let err = validate(raw, SearchMode::TypeNodeNoMetrics, None).unwrap_err();
        assert_eq!(err.key, "rdf_type");
    }

    #[test]
    fn specific_node_mode_requires_target_node() {
        let raw = minimal_raw();
        let err = validate(raw, SearchMode::SpecificNode, None).unwrap_err();
        assert_eq!(err.key, "end_node");
    }

    #[test]
    fn filtering_when_requires_parseable_dates() {
        let mut raw = minimal_raw();
        raw.filtering = Some(RawFiltering { what: None, where_: None, when: Some(1) });
        let err = validate(raw, SearchMode::SimpleExploration, None).unwrap_err();
        assert_eq!(err.key, "start_date");
    }

    #[test]
    fn unknown_type_interface_is_rejected() {
        let mut raw = minimal_raw();
        raw.type_interface = Some("triply".into());
        let err = validate(raw, SearchMode::SimpleExploration, None).unwrap_err();
        assert_eq!(err.key, "type_interface");
    }
}
