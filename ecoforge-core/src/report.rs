use csv::Writer;
use serde::Serialize;
use std::fmt;
use std::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Resolution,
    Computation,
    OracleFallback,
    Integrity,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueKind::Resolution => "resolution",
            IssueKind::Computation => "computation",
            IssueKind::OracleFallback => "oracle-fallback",
            IssueKind::Integrity => "integrity",
        };
        f.write_str(label)
    }
}

/// A non-fatal problem met during a run, tied to the activity it concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub kind: IssueKind,
    pub activity_id: String,
    pub message: String,
}

/// Non-fatal issues collected over a run and printed once at the end.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: IssueKind, activity_id: impl Into<String>, message: impl Into<String>) {
        self.entries.push(ReportEntry {
            kind,
            activity_id: activity_id.into(),
            message: message.into(),
        });
    }

    pub fn integrity(&mut self, activity_id: impl Into<String>, message: impl Into<String>) {
        self.push(IssueKind::Integrity, activity_id, message);
    }

    pub fn extend(&mut self, other: RunReport) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by kind, then activity, then message.
    pub fn sorted(&self) -> Vec<&ReportEntry> {
        let mut entries: Vec<&ReportEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| {
            (a.kind, &a.activity_id, &a.message).cmp(&(b.kind, &b.activity_id, &b.message))
        });
        entries
    }

    /// Renders the summary table printed at the end of a run.
    pub fn render_table(&self) -> String {
        if self.entries.is_empty() {
            return String::from("No issue reported.\n");
        }
        let entries = self.sorted();
        let id_width = entries
            .iter()
            .map(|e| e.activity_id.len())
            .max()
            .unwrap_or(0)
            .max("Activity".len());

        let mut table = format!("| {:<15} | {:<id_width$} | Message\n", "Kind", "Activity");
        table.push_str(&format!("|{}|{}|---------\n", "-".repeat(17), "-".repeat(id_width + 2)));
        for entry in entries {
            table.push_str(&format!(
                "| {:<15} | {:<id_width$} | {}\n",
                entry.kind.to_string(),
                entry.activity_id,
                entry.message
            ));
        }
        table
    }

    /// Dumps every entry as CSV for later inspection.
    pub fn write_csv(&self, path: &str) -> Result<(), anyhow::Error> {
        let mut writer: Writer<fs::File> = Writer::from_path(path)?;
        for entry in self.sorted() {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(())
    }
}
