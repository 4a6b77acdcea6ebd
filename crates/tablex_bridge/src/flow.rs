use thiserror::Error;
use tracing::debug;

use crate::dispatcher::ExportReport;

/// What an export in progress covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    One(usize),
    All,
}

/// Where the interactive detect/select/export sequence currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Detecting,
    NoneFound,
    Listing,
    Selected(usize),
    Exporting(ExportScope),
}

impl FlowState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Detecting => "detecting",
            Self::NoneFound => "none-found",
            Self::Listing => "listing",
            Self::Selected(_) => "selected",
            Self::Exporting(_) => "exporting",
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlowError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("No table at index {index} ({count} detected)")]
    NoSuchTable { index: usize, count: usize },
}

/// Drives `Idle -> Detecting -> {NoneFound | Listing} -> Selected ->
/// Exporting -> Idle` and keeps the transient status line.
///
/// Detection may be re-run from any state except `Detecting` and
/// `Exporting`.
#[derive(Debug)]
pub struct ExportFlow {
    state: FlowState,
    table_count: usize,
    status: Option<String>,
}

impl Default for ExportFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Idle,
            table_count: 0,
            status: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn table_count(&self) -> usize {
        self.table_count
    }

    pub fn selected(&self) -> Option<usize> {
        match self.state {
            FlowState::Selected(index) | FlowState::Exporting(ExportScope::One(index)) => {
                Some(index)
            }
            _ => None,
        }
    }

    fn transition(&mut self, next: FlowState) {
        debug!(from = self.state.name(), to = next.name(), "Flow transition");
        self.state = next;
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    pub fn begin_detect(&mut self) -> Result<(), FlowError> {
        match self.state {
            FlowState::Detecting | FlowState::Exporting(_) => Err(self.invalid("detect")),
            _ => {
                self.status = None;
                self.transition(FlowState::Detecting);
                Ok(())
            }
        }
    }

    pub fn detection_finished(&mut self, count: usize) -> Result<(), FlowError> {
        if self.state != FlowState::Detecting {
            return Err(self.invalid("finish detection"));
        }
        self.table_count = count;
        if count == 0 {
            self.status = Some("No tables found on this page.".into());
            self.transition(FlowState::NoneFound);
        } else {
            self.transition(FlowState::Listing);
        }
        Ok(())
    }

    pub fn select(&mut self, index: usize) -> Result<(), FlowError> {
        if !matches!(self.state, FlowState::Listing | FlowState::Selected(_)) {
            return Err(self.invalid("select a table"));
        }
        if index >= self.table_count {
            return Err(FlowError::NoSuchTable {
                index,
                count: self.table_count,
            });
        }
        self.transition(FlowState::Selected(index));
        Ok(())
    }

    /// Start exporting the selected table, announcing `file_name`.
    pub fn begin_export(&mut self, file_name: &str) -> Result<usize, FlowError> {
        let FlowState::Selected(index) = self.state else {
            return Err(self.invalid("export"));
        };
        self.status = Some(format!("Exporting {file_name}..."));
        self.transition(FlowState::Exporting(ExportScope::One(index)));
        Ok(index)
    }

    pub fn begin_export_all(&mut self) -> Result<(), FlowError> {
        if !matches!(self.state, FlowState::Listing | FlowState::Selected(_)) {
            return Err(self.invalid("export all"));
        }
        self.status = Some(format!("Exporting {} tables...", self.table_count));
        self.transition(FlowState::Exporting(ExportScope::All));
        Ok(())
    }

    /// A single export completed.
    pub fn export_succeeded(&mut self, file_name: &str, used_fallback: bool) -> Result<(), FlowError> {
        if !matches!(self.state, FlowState::Exporting(ExportScope::One(_))) {
            return Err(self.invalid("finish export"));
        }
        let mut status = format!("✓ {file_name} exported!");
        if used_fallback {
            status.push_str(" (XLSX unavailable)");
        }
        self.status = Some(status);
        self.transition(FlowState::Idle);
        Ok(())
    }

    /// Any export ended in failure; `message` becomes the status line.
    pub fn export_failed(&mut self, message: impl Into<String>) -> Result<(), FlowError> {
        if !matches!(self.state, FlowState::Exporting(_)) {
            return Err(self.invalid("fail export"));
        }
        self.status = Some(message.into());
        self.transition(FlowState::Idle);
        Ok(())
    }

    pub fn export_all_finished(&mut self, report: &ExportReport) -> Result<(), FlowError> {
        if self.state != FlowState::Exporting(ExportScope::All) {
            return Err(self.invalid("finish export all"));
        }
        let status = if report.failed.is_empty() {
            format!("✓ {} tables exported!", report.saved.len())
        } else {
            format!(
                "Exported {} of {} tables ({} failed)",
                report.saved.len(),
                report.total(),
                report.failed.len()
            )
        };
        self.status = Some(status);
        self.transition(FlowState::Idle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::FailedExport;
    use crate::save::SaveOutcome;

    fn listing(count: usize) -> ExportFlow {
        let mut flow = ExportFlow::new();
        flow.begin_detect().unwrap();
        flow.detection_finished(count).unwrap();
        flow
    }

    #[test]
    fn test_happy_path() {
        let mut flow = listing(2);
        assert_eq!(flow.state(), FlowState::Listing);

        flow.select(1).unwrap();
        assert_eq!(flow.selected(), Some(1));

        assert_eq!(flow.begin_export("Revenue.csv").unwrap(), 1);
        assert_eq!(flow.status(), Some("Exporting Revenue.csv..."));

        flow.export_succeeded("Revenue.csv", false).unwrap();
        assert_eq!(flow.state(), FlowState::Idle);
        assert_eq!(flow.status(), Some("✓ Revenue.csv exported!"));
    }

    #[test]
    fn test_fallback_is_mentioned() {
        let mut flow = listing(1);
        flow.select(0).unwrap();
        flow.begin_export("T.xls").unwrap();
        flow.export_succeeded("T.xls", true).unwrap();
        assert_eq!(flow.status(), Some("✓ T.xls exported! (XLSX unavailable)"));
    }

    #[test]
    fn test_none_found() {
        let flow = listing(0);
        assert_eq!(flow.state(), FlowState::NoneFound);
        assert_eq!(flow.status(), Some("No tables found on this page."));
    }

    #[test]
    fn test_illegal_transitions() {
        let mut flow = ExportFlow::new();
        assert!(matches!(
            flow.select(0),
            Err(FlowError::InvalidTransition { .. })
        ));
        assert!(flow.begin_export("x").is_err());

        let mut flow = listing(2);
        assert_eq!(
            flow.select(5),
            Err(FlowError::NoSuchTable { index: 5, count: 2 })
        );
        assert!(flow.begin_export("x").is_err());

        flow.select(0).unwrap();
        flow.begin_export("x").unwrap();
        assert!(flow.begin_detect().is_err());
    }

    #[test]
    fn test_refresh_from_listing() {
        let mut flow = listing(3);
        flow.select(2).unwrap();
        flow.begin_detect().unwrap();
        flow.detection_finished(1).unwrap();
        assert!(flow.select(2).is_err());
    }

    #[test]
    fn test_export_all_summary() {
        let mut flow = listing(2);
        flow.begin_export_all().unwrap();
        let report = ExportReport {
            saved: vec![SaveOutcome {
                file_name: "a.csv".into(),
                location: "memory:a.csv".into(),
            }],
            failed: vec![FailedExport {
                title: "b".into(),
                error: "Save failed: denied".into(),
            }],
        };
        flow.export_all_finished(&report).unwrap();
        assert_eq!(flow.state(), FlowState::Idle);
        assert_eq!(flow.status(), Some("Exported 1 of 2 tables (1 failed)"));
    }

    #[test]
    fn test_failure_returns_to_idle() {
        let mut flow = listing(1);
        flow.select(0).unwrap();
        flow.begin_export("x.csv").unwrap();
        flow.export_failed("Error exporting table: denied").unwrap();
        assert_eq!(flow.state(), FlowState::Idle);
    }
}
