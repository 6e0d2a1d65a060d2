//! Splitting a table's columns into business, system, and uncertain fields

use serde::Serialize;

use crate::classifier::{classify_column, ClassificationResult};
use crate::types::{ColumnInfo, TableInfo};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// A column together with the classifier's verdict on it
#[derive(Debug, Clone, Serialize)]
pub struct FieldAnalysis {
    pub column: ColumnInfo,
    pub classification: ClassificationResult,
}

/// Columns of one table grouped by classification.
///
/// Every column lands in exactly one of the three lists.
#[derive(Debug, Clone, Serialize)]
pub struct FieldPartition {
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_comment: Option<String>,
    pub threshold: f64,
    pub business: Vec<FieldAnalysis>,
    pub system: Vec<FieldAnalysis>,
    pub uncertain: Vec<FieldAnalysis>,
}

impl FieldPartition {
    pub fn total(&self) -> usize {
        self.business.len() + self.system.len() + self.uncertain.len()
    }
}

/// Classify every column of `table` and bucket it.
///
/// A column is business or system only when the rule that matched it is at
/// least `threshold` confident; anything below goes to `uncertain`.
pub fn partition_fields(table: &TableInfo, threshold: f64) -> FieldPartition {
    let mut partition = FieldPartition {
        table: table.name.clone(),
        table_comment: table.comment.clone(),
        threshold,
        business: Vec::new(),
        system: Vec::new(),
        uncertain: Vec::new(),
    };

    for column in &table.columns {
        let classification = classify_column(column, table);
        let bucket = if classification.confidence < threshold {
            &mut partition.uncertain
        } else if classification.is_system_field {
            &mut partition.system
        } else {
            &mut partition.business
        };
        bucket.push(FieldAnalysis {
            column: column.clone(),
            classification,
        });
    }

    tracing::debug!(
        table = %partition.table,
        business = partition.business.len(),
        system = partition.system.len(),
        uncertain = partition.uncertain.len(),
        "Partitioned fields"
    );

    partition
}
