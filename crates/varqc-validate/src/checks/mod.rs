//! Check families run by the release validation.
//!
//! Each family builds its checks against a field catalog first, so a
//! misnamed field fails before any rows are read, then evaluates them in
//! as few passes as the family allows.

pub mod filters;
pub mod globals;
pub mod group_sum;
pub mod lengths;
pub mod raw_adj;
pub mod sex_chr;
pub mod subset_freq;
pub mod summary;
pub mod summations;
pub mod vcf_header;

pub use filters::{
    FilterSummary, FilterSummaryConfig, filter_flag_columns, make_filters_expr_dict,
    summarize_variant_filters,
};
pub use globals::pprint_global_anns;
pub use group_sum::{make_group_sum_expr_dict, sum_group_callstats};
pub use lengths::check_global_and_row_annot_lengths;
pub use raw_adj::{check_raw_and_adj_callstats, make_raw_adj_checks};
pub use sex_chr::check_sex_chr_metrics;
pub use subset_freq::{compare_subset_freqs, make_subset_freq_checks};
pub use summary::{VariantSummary, collect_contigs, compare_row_counts, summarize_variants};
pub use summations::{SummationGroup, compute_and_check_summations};
pub use vcf_header::vcf_field_check;
