//! Decision reporting.
//!
//! Every engine decision produces one human-readable line a test harness
//! can assert against: an object was added under some final name, was not
//! added, or an existing server object was reused in its place. Lines are
//! collected in order and mirrored to the tracing output.

use tracing::info;

/// Ordered record of every decision the pipeline made.
#[derive(Debug, Default)]
pub struct MigrationReport {
    lines: Vec<String>,
}

impl MigrationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Object created on the server, possibly under a renamed final name.
    pub fn added(&mut self, source: &str, final_name: &str) {
        self.push(format!("{source} is added as {final_name}"));
    }

    /// Object skipped; the reason has already been logged.
    pub fn not_added(&mut self, source: &str) {
        self.push(format!("{source} is not added."));
    }

    /// An existing server object satisfies this source object's identity.
    pub fn reused(&mut self, server_name: &str, source: &str) {
        self.push(format!(
            "CP object {server_name} is used instead of {source}"
        ));
    }

    /// Free-form decision line (rules, layers, package, NAT).
    pub fn line(&mut self, line: impl Into<String>) {
        self.push(line.into());
    }

    fn push(&mut self, line: String) {
        info!(report = %line);
        self.lines.push(line);
    }

    /// All decision lines in pipeline order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether a particular decision line was recorded.
    #[must_use]
    pub fn contains(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l == line)
    }
}
