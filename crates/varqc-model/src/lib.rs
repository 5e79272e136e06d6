pub mod dataset;
pub mod error;
pub mod field;
pub mod globals;
pub mod labels;
pub mod locus;
pub mod naming;
pub mod options;
pub mod values;
pub mod vcf;

pub use dataset::{DEFAULT_INFO_ROOT, Dataset};
pub use error::{ModelError, Result};
pub use field::{FieldCatalog, FieldRef};
pub use globals::{Globals, IndexDict};
pub use labels::{LabelGroups, SORT_ORDER, label_groups, make_label_combos};
pub use locus::{CONTIG_COLUMN, POSITION_COLUMN, ReferenceGenome};
pub use naming::FieldNaming;
pub use options::{DisplayLimits, StageToggles, ValidationOptions};
pub use vcf::{HeaderDict, hist_fields};
