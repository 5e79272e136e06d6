//! VCF header description dictionaries.

use std::collections::BTreeMap;

/// Header section (`info`, `filter`, `format`) -> field -> description.
pub type HeaderDict = BTreeMap<String, BTreeMap<String, String>>;

/// Info fields a VCF export derives from the given histograms.
///
/// Every histogram contributes `{hist}_bin_freq`; depth histograms also
/// carry `{hist}_n_larger`.
pub fn hist_fields<S: AsRef<str>>(hists: &[S]) -> Vec<String> {
    let mut fields = Vec::with_capacity(hists.len() * 2);
    for hist in hists {
        let hist = hist.as_ref();
        fields.push(format!("{hist}_bin_freq"));
        if hist.contains("dp") {
            fields.push(format!("{hist}_n_larger"));
        }
    }
    fields
}
