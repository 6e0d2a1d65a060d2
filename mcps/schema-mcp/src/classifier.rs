//! System vs. business field classification
//!
//! A column is labelled by walking a fixed, ordered list of naming/type
//! rules; the first rule that matches decides the result. Confidences are
//! constants attached to each rule, not calibrated probabilities.
//!
//! Rule order matters: the business-name rule is guarded against names that
//! contain any high-confidence system pattern, so it must run after that
//! rule and must see the same pattern table.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{ColumnInfo, TableInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    SystemAudit,
    SystemTechnical,
    SystemControl,
    BusinessCore,
    BusinessRelation,
    BusinessUnknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationResult {
    pub is_system_field: bool,
    pub confidence: f64,
    pub reasoning: String,
    pub category: FieldCategory,
}

/// Everything the classifier may look at for one column.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldContext<'a> {
    pub field_name: &'a str,
    pub field_type: &'a str,
    pub field_comment: Option<&'a str>,
    pub table_name: Option<&'a str>,
    pub table_comment: Option<&'a str>,
}

struct SystemPattern {
    name: &'static str,
    data_type: &'static str,
    reasoning: &'static str,
}

const fn sys(name: &'static str, data_type: &'static str, reasoning: &'static str) -> SystemPattern {
    SystemPattern {
        name,
        data_type,
        reasoning,
    }
}

const SYSTEM_PATTERNS: &[SystemPattern] = &[
    sys("created_at", "timestamp", "creation timestamp, used for audit"),
    sys("updated_at", "timestamp", "update timestamp, used for audit"),
    sys("deleted_at", "timestamp", "deletion timestamp, used for soft delete"),
    sys("created_by", "varchar", "creator, used for audit"),
    sys("updated_by", "varchar", "last updater, used for audit"),
    sys("deleted_by", "varchar", "deleter, used for audit"),
    sys("is_deleted", "boolean", "deletion marker, used for soft delete"),
    sys("del_flag", "integer", "deletion flag, used for soft delete"),
    sys("system_version", "bigint", "system version number, used for version control"),
    sys("system_event", "varchar", "system event, used for audit"),
    sys("data_source", "varchar", "data source identifier, technical implementation"),
    sys("corp_id", "varchar", "company id, used for multi-tenancy"),
    sys("owner_org_code", "varchar", "owning organization code, used for permission control"),
    sys("app_belong", "varchar", "owning application, technical implementation"),
    sys("access_modifier", "varchar", "access modifier, used for permission control"),
    sys("latest", "boolean", "latest-revision marker, used for version control"),
    sys("effective_start_time", "timestamp", "effective start time, used for effectivity control"),
    sys("effective_end_time", "timestamp", "effective end time, used for effectivity control"),
    sys("effective_status", "boolean", "effective status, used for effectivity control"),
    sys("effective_condition", "text", "effective condition, used for effectivity control"),
];

const CONTROL_PATTERNS: &[(&str, &str)] = &[
    ("version", "version field, usually system version control"),
    ("flag", "flag field, likely system state control"),
    ("source", "source field, usually a data source identifier"),
    ("modifier", "modifier field, usually permission or access control"),
    ("event", "event field, usually system audit"),
];

const BUSINESS_PATTERNS: &[(&str, &str)] = &[
    ("name", "name field, core business attribute"),
    ("code", "code field, business identifier"),
    ("type", "type field, business classification"),
    ("status", "status field, business state"),
    ("description", "description field, business explanation"),
    ("sequence", "sequence field, business ordering"),
    ("amount", "amount field, business data"),
    ("quantity", "quantity field, business data"),
    ("price", "price field, business data"),
    ("id", "identifier field, business key"),
];

/// One step of the classification ladder, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    SystemPattern,
    ControlPattern,
    BusinessPattern,
    TableEcho,
    Fallback,
}

const RULES: [Rule; 5] = [
    Rule::SystemPattern,
    Rule::ControlPattern,
    Rule::BusinessPattern,
    Rule::TableEcho,
    Rule::Fallback,
];

impl Rule {
    fn confidence(self) -> f64 {
        match self {
            Rule::SystemPattern => 0.95,
            Rule::ControlPattern => 0.75,
            Rule::BusinessPattern => 0.90,
            Rule::TableEcho => 0.80,
            Rule::Fallback => 0.60,
        }
    }

    fn apply(self, name: &str, data_type: &str, table: Option<&str>) -> Option<ClassificationResult> {
        let hit = |is_system_field: bool, category: FieldCategory, reasoning: String| ClassificationResult {
            is_system_field,
            confidence: self.confidence(),
            reasoning,
            category,
        };

        match self {
            Rule::SystemPattern => SYSTEM_PATTERNS
                .iter()
                .find(|p| name.contains(p.name) && data_type.contains(p.data_type))
                .map(|p| {
                    let category = if p.reasoning.contains("audit") {
                        FieldCategory::SystemAudit
                    } else {
                        FieldCategory::SystemTechnical
                    };
                    hit(true, category, p.reasoning.to_string())
                }),
            Rule::ControlPattern => CONTROL_PATTERNS
                .iter()
                .find(|(pattern, _)| name.contains(pattern))
                .map(|(_, reasoning)| hit(true, FieldCategory::SystemControl, reasoning.to_string())),
            Rule::BusinessPattern => {
                if SYSTEM_PATTERNS.iter().any(|p| name.contains(p.name)) {
                    return None;
                }
                BUSINESS_PATTERNS
                    .iter()
                    .find(|(pattern, _)| name.contains(pattern))
                    .map(|(_, reasoning)| hit(false, FieldCategory::BusinessCore, reasoning.to_string()))
            }
            Rule::TableEcho => {
                let table = table.filter(|t| !t.is_empty())?;
                name.contains(&table.to_lowercase()).then(|| {
                    hit(
                        false,
                        FieldCategory::BusinessRelation,
                        format!("field name contains table name {}, likely a business relation", table),
                    )
                })
            }
            Rule::Fallback => Some(fallback()),
        }
    }
}

fn fallback() -> ClassificationResult {
    ClassificationResult {
        is_system_field: false,
        confidence: Rule::Fallback.confidence(),
        reasoning: "no clear system-field markers, assumed business field".to_string(),
        category: FieldCategory::BusinessUnknown,
    }
}

/// Classify a single field. Deterministic and free of I/O.
pub fn classify(ctx: &FieldContext<'_>) -> ClassificationResult {
    let name = ctx.field_name.to_lowercase();
    let data_type = ctx.field_type.to_lowercase();

    RULES
        .iter()
        .find_map(|rule| rule.apply(&name, &data_type, ctx.table_name))
        .unwrap_or_else(fallback)
}

/// Classify a reflected column in the context of its table.
pub fn classify_column(column: &ColumnInfo, table: &TableInfo) -> ClassificationResult {
    classify(&FieldContext {
        field_name: &column.name,
        field_type: &column.data_type,
        field_comment: column.comment.as_deref(),
        table_name: Some(&table.name),
        table_comment: table.comment.as_deref(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<'a>(name: &'a str, data_type: &'a str) -> FieldContext<'a> {
        FieldContext {
            field_name: name,
            field_type: data_type,
            ..Default::default()
        }
    }

    #[test]
    fn test_created_at_timestamp_is_audit() {
        for (name, ty) in [
            ("created_at", "TIMESTAMP"),
            ("CREATED_AT", "timestamp without time zone"),
            ("row_created_at", "TIMESTAMP(6)"),
        ] {
            let result = classify(&field(name, ty));
            assert!(result.is_system_field, "{name}");
            assert_eq!(result.confidence, 0.95);
            assert_eq!(result.category, FieldCategory::SystemAudit);
        }
    }

    #[test]
    fn test_soft_delete_is_technical() {
        let result = classify(&field("is_deleted", "BOOLEAN"));
        assert!(result.is_system_field);
        assert_eq!(result.category, FieldCategory::SystemTechnical);

        let result = classify(&field("deleted_at", "TIMESTAMP"));
        assert_eq!(result.category, FieldCategory::SystemTechnical);
    }

    #[test]
    fn test_system_pattern_needs_type_match() {
        // DATETIME does not contain "timestamp", so the audit rule misses
        // and nothing else in the ladder matches before the fallback.
        let result = classify(&field("created_at", "DATETIME"));
        assert!(!result.is_system_field);
        assert_eq!(result.category, FieldCategory::BusinessUnknown);
        assert_eq!(result.confidence, 0.60);
    }

    #[test]
    fn test_corp_id_varchar() {
        let result = classify(&field("corp_id", "VARCHAR(64)"));
        assert!(result.is_system_field);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.category, FieldCategory::SystemTechnical);
    }

    #[test]
    fn test_control_patterns() {
        for name in ["version", "sync_flag", "source_system", "last_modifier", "event_type"] {
            let result = classify(&field(name, "VARCHAR(20)"));
            assert!(result.is_system_field, "{name}");
            assert_eq!(result.confidence, 0.75);
            assert_eq!(result.category, FieldCategory::SystemControl);
        }
    }

    #[test]
    fn test_control_beats_business() {
        // "event_type" carries both "event" and "type"; step 2 runs first.
        let result = classify(&field("event_type", "VARCHAR"));
        assert_eq!(result.category, FieldCategory::SystemControl);
    }

    #[test]
    fn test_name_is_business_core() {
        let result = classify(&field("name", "VARCHAR(100)"));
        assert!(!result.is_system_field);
        assert_eq!(result.confidence, 0.90);
        assert_eq!(result.category, FieldCategory::BusinessCore);
    }

    #[test]
    fn test_system_pattern_wins_over_business() {
        let result = classify(&field("created_at_name", "TIMESTAMP"));
        assert!(result.is_system_field);
        assert_eq!(result.confidence, 0.95);
        assert_eq!(result.category, FieldCategory::SystemAudit);
    }

    #[test]
    fn test_business_guard_blocks_system_names() {
        // corp_id contains "id" but also the system pattern "corp_id"; with a
        // non-matching type step 1 misses and the guard keeps step 3 quiet.
        let result = classify(&field("corp_id", "INTEGER"));
        assert_eq!(result.category, FieldCategory::BusinessUnknown);

        let result = classify(&field("updated_by_name", "TEXT"));
        assert_eq!(result.category, FieldCategory::BusinessUnknown);
    }

    #[test]
    fn test_table_echo() {
        let ctx = FieldContext {
            field_name: "activity_title",
            field_type: "VARCHAR(255)",
            table_name: Some("Activity"),
            ..Default::default()
        };
        let result = classify(&ctx);
        assert!(!result.is_system_field);
        assert_eq!(result.confidence, 0.80);
        assert_eq!(result.category, FieldCategory::BusinessRelation);
        assert!(result.reasoning.contains("Activity"));
    }

    #[test]
    fn test_empty_table_name_does_not_echo() {
        let ctx = FieldContext {
            field_name: "location",
            field_type: "TEXT",
            table_name: Some(""),
            ..Default::default()
        };
        assert_eq!(classify(&ctx).category, FieldCategory::BusinessUnknown);
    }

    #[test]
    fn test_fallback() {
        let result = classify(&field("location", "VARCHAR(255)"));
        assert!(!result.is_system_field);
        assert_eq!(result.confidence, 0.60);
        assert_eq!(result.category, FieldCategory::BusinessUnknown);
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_value(FieldCategory::BusinessRelation).unwrap();
        assert_eq!(json, "business_relation");
    }

    #[test]
    fn test_rule_confidences_are_ordered_as_documented() {
        let confidences: Vec<f64> = RULES.iter().map(|r| r.confidence()).collect();
        assert_eq!(confidences, vec![0.95, 0.75, 0.90, 0.80, 0.60]);
    }
}
