//! `sluice condition` command handler

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use sluice_pipeline::condition::{Checker, ConditionNode, MatchValue, TreeBuilder};

use crate::cli::{ConditionAction, ConditionArgs};
use crate::commands::{read_condition_document, read_event_lines};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `condition` command.
pub async fn execute(args: ConditionArgs, writer: &OutputWriter) -> Result<(), CliError> {
    match args.action {
        ConditionAction::Validate { file } => execute_validate(&file, writer).await,
        ConditionAction::Check { file, events } => {
            execute_check(&file, events.as_deref(), writer).await
        }
        ConditionAction::Diff { left, right } => execute_diff(&left, &right, writer).await,
    }
}

/// Build the document and report the resulting tree or the construction error.
///
/// # Errors
///
/// Returns `CliError::Condition` if the document does not build.
async fn execute_validate(path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %path.display(), "validating condition document");

    let doc = read_condition_document(path).await?;
    let report = match TreeBuilder::new().build(&doc) {
        Ok(root) => ConditionValidationReport {
            source: path.display().to_string(),
            valid: true,
            root_kind: root.as_ref().map(|n| n.kind().to_owned()),
            tree: root.as_ref().map(outline).unwrap_or_default(),
            error: None,
        },
        Err(e) => ConditionValidationReport {
            source: path.display().to_string(),
            valid: false,
            root_kind: None,
            tree: Vec::new(),
            error: Some(e.to_string()),
        },
    };

    writer.render(&report)?;

    if let Some(error) = report.error {
        return Err(CliError::Condition(error));
    }
    Ok(())
}

/// Evaluate the condition against each event line.
async fn execute_check(
    path: &Path,
    events: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let checker = load_checker(path).await?;
    let lines = read_event_lines(events).await?;

    let verdicts: Vec<Verdict> = lines
        .iter()
        .map(|event| Verdict {
            line: event.line,
            matched: checker.evaluate(&event.fields),
        })
        .collect();
    let matched = verdicts.iter().filter(|v| v.matched).count();

    info!(
        path = %path.display(),
        total = verdicts.len(),
        matched,
        "condition check completed"
    );

    let report = ConditionCheckReport {
        source: path.display().to_string(),
        always_true: checker.is_empty(),
        total: verdicts.len(),
        matched,
        verdicts,
    };
    writer.render(&report)
}

/// Compare the trees built from two documents.
///
/// # Errors
///
/// Returns `CliError::Command` when the trees differ, after rendering the report.
async fn execute_diff(left: &Path, right: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let a = load_checker(left).await?;
    let b = load_checker(right).await?;

    let mismatch = a.compare(&b).err();
    let report = ConditionDiffReport {
        left: left.display().to_string(),
        right: right.display().to_string(),
        equal: mismatch.is_none(),
        path: mismatch.as_ref().map(|m| m.path.clone()),
        reason: mismatch.as_ref().map(|m| m.reason.clone()),
    };

    writer.render(&report)?;

    if let Some(mismatch) = mismatch {
        return Err(CliError::Command(mismatch.to_string()));
    }
    Ok(())
}

async fn load_checker(path: &Path) -> Result<Checker, CliError> {
    let doc = read_condition_document(path).await?;
    Checker::from_document(&doc)
        .map_err(|e| CliError::Condition(format!("{}: {e}", path.display())))
}

/// 트리를 들여쓰기된 한 줄 요약 목록으로 펼칩니다.
fn outline(root: &ConditionNode) -> Vec<String> {
    let mut lines = Vec::new();
    push_outline(root, 0, &mut lines);
    lines
}

fn push_outline(node: &ConditionNode, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match node {
        ConditionNode::FieldOp(n) => {
            let values: Vec<String> = n.values().iter().map(display_value).collect();
            let case = if n.case_sensitive() { "" } else { " (ci)" };
            lines.push(format!(
                "{indent}{} {}{case} [{}]",
                n.op(),
                n.field(),
                values.join(", ")
            ));
        }
        ConditionNode::Logical(n) => {
            lines.push(format!("{indent}{}", n.op()));
            for operand in n.operands() {
                push_outline(operand, depth + 1, lines);
            }
        }
        ConditionNode::ByteLenCmp(n) => {
            lines.push(format!(
                "{indent}byte_len({}) {} {}",
                n.field(),
                n.cmp_op(),
                n.threshold()
            ));
        }
    }
}

fn display_value(value: &MatchValue) -> String {
    match value {
        MatchValue::Absent => "null".to_owned(),
        MatchValue::Bytes(bytes) => format!("{:?}", String::from_utf8_lossy(bytes)),
    }
}

/// Condition validation result.
#[derive(Serialize)]
pub struct ConditionValidationReport {
    pub source: String,
    pub valid: bool,
    /// `None` when the document is not an object (always-true condition).
    pub root_kind: Option<String>,
    pub tree: Vec<String>,
    pub error: Option<String>,
}

impl Render for ConditionValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", "Condition Validation".bold())?;
        writeln!(w, "  Source: {}", self.source)?;
        if self.valid {
            writeln!(w, "  Status: {}", "VALID".green().bold())?;
            match &self.root_kind {
                Some(kind) => writeln!(w, "  Root:   {kind}")?,
                None => writeln!(w, "  Root:   none (always true)")?,
            }
            for line in &self.tree {
                writeln!(w, "    {line}")?;
            }
        } else {
            writeln!(w, "  Status: {}", "INVALID".red().bold())?;
            if let Some(error) = &self.error {
                writeln!(w, "  Error:  {}", error.red())?;
            }
        }
        Ok(())
    }
}

/// Result for one event line.
#[derive(Serialize)]
pub struct Verdict {
    pub line: u64,
    pub matched: bool,
}

/// Condition check result over an event stream.
#[derive(Serialize)]
pub struct ConditionCheckReport {
    pub source: String,
    pub always_true: bool,
    pub total: usize,
    pub matched: usize,
    pub verdicts: Vec<Verdict>,
}

impl Render for ConditionCheckReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for verdict in &self.verdicts {
            let label = if verdict.matched {
                "match".green().bold()
            } else {
                "no match".dimmed()
            };
            writeln!(w, "line {:>6}  {label}", verdict.line)?;
        }
        writeln!(
            w,
            "{} {}/{} events matched ({})",
            "Summary:".bold(),
            self.matched,
            self.total,
            self.source
        )?;
        Ok(())
    }
}

/// Structural comparison result.
#[derive(Serialize)]
pub struct ConditionDiffReport {
    pub left: String,
    pub right: String,
    pub equal: bool,
    /// Location of the first difference, e.g. `root.operands[1].values[0]`.
    pub path: Option<String>,
    pub reason: Option<String>,
}

impl Render for ConditionDiffReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", "Condition Diff".bold())?;
        writeln!(w, "  Left:   {}", self.left)?;
        writeln!(w, "  Right:  {}", self.right)?;
        if self.equal {
            writeln!(w, "  Result: {}", "EQUAL".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "DIFFERENT".red().bold())?;
            if let Some(path) = &self.path {
                writeln!(w, "  At:     {path}")?;
            }
            if let Some(reason) = &self.reason {
                writeln!(w, "  Reason: {}", reason.red())?;
            }
        }
        Ok(())
    }
}
