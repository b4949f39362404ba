use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Solved,
    Unsatisfiable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub variables: Vec<VariableReport>,
    pub conflicts: Vec<ConflictReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub widenings: Vec<WideningReport>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VariableReport {
    pub id: String,
    pub slot: String,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub free: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    /// The failing edge, with slots spelled out.
    pub constraint: String,
    pub left_type: String,
    pub right_type: String,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WideningReport {
    pub binding: String,
    pub candidates: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub status: CheckStatus,
    pub queries: Vec<QueryReport>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QueryReport {
    pub source: String,
    pub target: String,
    pub assignable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<bool>,
    pub reason: Option<String>,
}

impl QueryReport {
    /// False only when an expected answer was given and differs.
    pub fn meets_expectation(&self) -> bool {
        self.expected.is_none_or(|expected| expected == self.assignable)
    }
}

pub fn render_json<T: Serialize>(report: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    pub fn render_solve(&self, report: &SolveReport) -> String {
        let mut out = String::new();
        match report.status {
            SolveStatus::Solved => {
                let _ = writeln!(
                    out,
                    "{}: {} variable(s)",
                    self.success("solved"),
                    report.variables.len()
                );
            }
            SolveStatus::Unsatisfiable => {
                let _ = writeln!(
                    out,
                    "{}: {} conflict(s)",
                    self.failure("unsatisfiable"),
                    report.conflicts.len()
                );
                for conflict in &report.conflicts {
                    out.push_str(&self.format_conflict(conflict));
                    out.push('\n');
                }
                out.push_str("partial assignment:\n");
            }
        }

        let width = report
            .variables
            .iter()
            .map(|v| v.slot.len())
            .max()
            .unwrap_or(0);
        for variable in &report.variables {
            let ty = variable.ty.as_deref().unwrap_or("<unresolved>");
            let marker = if variable.free { " (free)" } else { "" };
            let _ = writeln!(
                out,
                "  {:<4} {}  {}{}",
                variable.id,
                self.slot(&format!("{:<width$}", variable.slot)),
                ty,
                marker
            );
        }

        for widening in &report.widenings {
            let _ = writeln!(
                out,
                "widenings for {}: {}",
                self.slot(&widening.binding),
                widening.candidates.join(", ")
            );
        }
        out
    }

    pub fn format_conflict(&self, conflict: &ConflictReport) -> String {
        let mut line = format!(
            "  {} {} ({} vs {})",
            self.failure("error"),
            conflict.constraint,
            conflict.left_type,
            conflict.right_type
        );
        if let Some(reason) = &conflict.reason {
            line.push_str(": ");
            line.push_str(reason);
        }
        line
    }

    pub fn render_check(&self, report: &CheckReport) -> String {
        let mut out = String::new();
        for query in &report.queries {
            let verdict = if query.assignable {
                self.success("assignable")
            } else {
                self.failure("not assignable")
            };
            let _ = write!(out, "{} -> {}: {}", query.source, query.target, verdict);
            if let Some(reason) = &query.reason {
                let _ = write!(out, " ({reason})");
            }
            if !query.meets_expectation() {
                let _ = write!(out, " {}", self.failure("[unexpected]"));
            }
            out.push('\n');
        }
        let failed = report
            .queries
            .iter()
            .filter(|q| !q.meets_expectation())
            .count();
        let summary = match report.status {
            CheckStatus::Passed => self.success("passed"),
            CheckStatus::Failed => self.failure("failed"),
        };
        let _ = writeln!(
            out,
            "{}: {} query(ies), {} unexpected",
            summary,
            report.queries.len(),
            failed
        );
        out
    }

    fn success(&self, text: &str) -> String {
        if self.color {
            text.green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn failure(&self, text: &str) -> String {
        if self.color {
            text.red().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn slot(&self, text: &str) -> String {
        if self.color {
            text.cyan().to_string()
        } else {
            text.to_string()
        }
    }
}
