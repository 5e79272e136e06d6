//! Genomic locus conventions: key columns, contig naming and the
//! pseudo-autosomal regions of the X chromosome.

use polars::prelude::{Expr, col, lit};
use serde::{Deserialize, Serialize};

/// Row column holding the contig name.
pub const CONTIG_COLUMN: &str = "contig";

/// Row column holding the 1-based position.
pub const POSITION_COLUMN: &str = "position";

/// Reference genome build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferenceGenome {
    GRCh37,
    #[default]
    GRCh38,
}

impl ReferenceGenome {
    /// Name of the X chromosome contig.
    pub fn x_contig(self) -> &'static str {
        match self {
            Self::GRCh37 => "X",
            Self::GRCh38 => "chrX",
        }
    }

    /// Name of the Y chromosome contig.
    pub fn y_contig(self) -> &'static str {
        match self {
            Self::GRCh37 => "Y",
            Self::GRCh38 => "chrY",
        }
    }

    /// Inclusive PAR1 and PAR2 intervals on X.
    pub fn x_par_intervals(self) -> [(i64, i64); 2] {
        match self {
            Self::GRCh37 => [(60_001, 2_699_520), (154_931_044, 155_260_560)],
            Self::GRCh38 => [(10_001, 2_781_479), (155_701_383, 156_030_895)],
        }
    }

    /// Whether an X position falls inside a pseudo-autosomal region.
    pub fn in_x_par(self, position: i64) -> bool {
        self.x_par_intervals()
            .iter()
            .any(|(start, end)| (*start..=*end).contains(&position))
    }

    /// Row predicate: the locus lies on X outside both PARs.
    pub fn in_x_nonpar(self) -> Expr {
        let position = col(POSITION_COLUMN);
        let [(par1_start, par1_end), (par2_start, par2_end)] = self.x_par_intervals();
        let outside_par = position
            .clone()
            .lt(lit(par1_start))
            .or(position
                .clone()
                .gt(lit(par1_end))
                .and(position.clone().lt(lit(par2_start))))
            .or(position.gt(lit(par2_end)));
        on_contig(self.x_contig()).and(outside_par)
    }

    /// Row predicate: the locus lies on Y.
    pub fn on_y(self) -> Expr {
        on_contig(self.y_contig())
    }
}

/// Row predicate selecting one contig.
pub fn on_contig(contig: &str) -> Expr {
    col(CONTIG_COLUMN).eq(lit(contig.to_string()))
}
