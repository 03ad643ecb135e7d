use std::collections::BTreeMap;

use codefix_types::diagnostic::DocumentDiagnostics;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A rule as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleDefinition {
    pub rule_id: String,
    pub is_enabled: bool,
}

/// How the rule engine should treat a rule.
///
/// Severity is decided by the caller; enabled rules only need to run, so they all map to `Warn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLevel {
    Warn,
    Suppress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleLevels {
    levels: BTreeMap<String, ReportLevel>,
}

impl RuleLevels {
    pub fn from_definitions<'a>(rules: impl IntoIterator<Item = &'a RuleDefinition>) -> Self {
        Self::from_table(rules.into_iter().map(|r| (r.rule_id.clone(), r.is_enabled)))
    }

    pub fn from_table(rules: impl IntoIterator<Item = (String, bool)>) -> Self {
        let levels = rules
            .into_iter()
            .map(|(id, enabled)| {
                let level = if enabled {
                    ReportLevel::Warn
                } else {
                    ReportLevel::Suppress
                };
                (id, level)
            })
            .collect();
        Self { levels }
    }

    pub fn level(&self, rule_id: &str) -> Option<ReportLevel> {
        self.levels.get(rule_id).copied()
    }

    /// Rules absent from the table are reported.
    pub fn is_reported(&self, rule_id: &str) -> bool {
        self.level(rule_id) != Some(ReportLevel::Suppress)
    }

    pub fn levels(&self) -> &BTreeMap<String, ReportLevel> {
        &self.levels
    }

    /// Drop diagnostics for suppressed rules. Documents left empty are kept.
    pub fn filter(&self, mut documents: Vec<DocumentDiagnostics>) -> Vec<DocumentDiagnostics> {
        if self.levels.is_empty() {
            return documents;
        }
        for doc in &mut documents {
            let before = doc.diagnostics.len();
            doc.diagnostics.retain(|d| self.is_reported(&d.id));
            let dropped = before - doc.diagnostics.len();
            if dropped > 0 {
                debug!(file = %doc.file_name, dropped, "suppressed diagnostics");
            }
        }
        documents
    }
}
