use varqc_model::Dataset;

use crate::sink::ReportSink;

/// Report every global annotation, pretty-printed.
pub fn pprint_global_anns(ds: &Dataset, sink: &mut dyn ReportSink) {
    sink.info(&ds.globals().pretty());
}
