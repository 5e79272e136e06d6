//! Options controlling a release validation run.
//!
//! Every field has a default, so a configuration file only needs to name the
//! options it changes.

use std::collections::BTreeMap;

use polars::prelude::Expr;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::labels::{GROUPS, POPS, SEXES, default_sort_order};
use crate::locus::ReferenceGenome;
use crate::naming::FieldNaming;

/// Which check families run. All default to enabled except the globals dump
/// and the array-of-struct missingness stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    pub pprint_globals: bool,
    pub summarize_variants: bool,
    pub filters: bool,
    pub raw_adj: bool,
    pub subset_freq: bool,
    pub samples_sum: bool,
    pub sex_chr: bool,
    pub missingness: bool,
    pub array_struct_missingness: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            pprint_globals: false,
            summarize_variants: true,
            filters: true,
            raw_adj: true,
            subset_freq: true,
            samples_sum: true,
            sex_chr: true,
            missingness: true,
            array_struct_missingness: false,
        }
    }
}

/// Size limits for example-row tables in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayLimits {
    /// Maximum number of rows shown.
    pub n_rows: usize,
    /// Maximum number of columns shown per table.
    pub n_cols: usize,
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            n_rows: 50,
            n_cols: 140,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Subsets to check. The empty string is the whole callset.
    pub subsets: Vec<String>,
    pub pops: Vec<String>,
    pub sexes: Vec<String>,
    /// Callstat groups summed in the group-sum stage, e.g. `adj`.
    pub groups: Vec<String>,
    /// Extra subset -> pops pairs for the group-sum stage.
    pub sample_sum_sets_and_pops: BTreeMap<String, Vec<String>>,
    pub sum_metrics: Vec<String>,
    pub sort_order: Vec<String>,
    pub delimiter: String,
    pub metric_first_field: bool,
    pub missingness_threshold: f64,
    /// Show example rows for passing checks too.
    pub verbose: bool,
    pub show_percent_sites: bool,
    pub variant_filter_field: String,
    pub problematic_regions: Vec<String>,
    /// Also count each individual filter value.
    pub single_filter_count: bool,
    pub display: DisplayLimits,
    pub stages: StageToggles,
    /// Row array -> global arrays whose lengths must match it.
    pub row_to_globals_check: BTreeMap<String, Vec<String>>,
    pub check_all_rows: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_contigs: Option<Vec<String>>,
    pub reference_genome: ReferenceGenome,
    /// Row array -> global index dictionary naming its positions.
    pub indexed_array_annotations: BTreeMap<String, String>,
    /// Named predicates whose matching-row counts are logged.
    #[serde(skip)]
    pub site_gt_checks: Vec<(String, Expr)>,
    /// Extra named aggregations added to the filter summary tables.
    #[serde(skip)]
    pub extra_filter_checks: Vec<(String, Expr)>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            subsets: vec![String::new()],
            pops: POPS.iter().map(|p| (*p).to_string()).collect(),
            sexes: SEXES.iter().map(|s| (*s).to_string()).collect(),
            groups: vec![GROUPS[0].to_string()],
            sample_sum_sets_and_pops: BTreeMap::new(),
            sum_metrics: ["AC", "AN", "nhomalt"].map(str::to_string).to_vec(),
            sort_order: default_sort_order(),
            delimiter: "-".to_string(),
            metric_first_field: true,
            missingness_threshold: 0.5,
            verbose: false,
            show_percent_sites: true,
            variant_filter_field: "RF".to_string(),
            problematic_regions: ["lcr", "segdup", "nonpar"].map(str::to_string).to_vec(),
            single_filter_count: false,
            display: DisplayLimits::default(),
            stages: StageToggles::default(),
            row_to_globals_check: BTreeMap::new(),
            check_all_rows: false,
            expected_contigs: None,
            reference_genome: ReferenceGenome::default(),
            indexed_array_annotations: [("faf", "faf_index_dict"), ("freq", "freq_index_dict")]
                .into_iter()
                .map(|(array, dict)| (array.to_string(), dict.to_string()))
                .collect(),
            site_gt_checks: Vec::new(),
            extra_filter_checks: Vec::new(),
        }
    }
}

impl ValidationOptions {
    pub fn naming(&self) -> FieldNaming {
        FieldNaming::new(self.delimiter.clone(), self.metric_first_field)
    }

    #[must_use]
    pub fn with_site_gt_check(mut self, name: impl Into<String>, predicate: Expr) -> Self {
        self.site_gt_checks.push((name.into(), predicate));
        self
    }

    #[must_use]
    pub fn with_extra_filter_check(mut self, name: impl Into<String>, agg: Expr) -> Self {
        self.extra_filter_checks.push((name.into(), agg));
        self
    }

    /// Reject option values no check could run with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.missingness_threshold) {
            return Err(ModelError::InvalidOption {
                option: "missingness_threshold".to_string(),
                reason: format!("{} is outside [0, 1]", self.missingness_threshold),
            });
        }
        if self.delimiter.is_empty() {
            return Err(ModelError::InvalidOption {
                option: "delimiter".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.subsets.is_empty() {
            return Err(ModelError::InvalidOption {
                option: "subsets".to_string(),
                reason: "list at least one subset (\"\" for the whole callset)".to_string(),
            });
        }
        for axis in ["pop", "sex", "group"] {
            if !self.sort_order.iter().any(|candidate| candidate == axis) {
                return Err(ModelError::UnknownAxis {
                    axis: axis.to_string(),
                });
            }
        }
        Ok(())
    }
}
