use tablex_core::{ExportError, ExportFormat, Preferences};
use tablex_scan::ScanOptions;
use tracing::{debug, error, info, warn};

use crate::agent::ContentAgent;
use crate::dispatcher::{ExportReport, Exporter};
use crate::message::{Request, Response};
use crate::save::{SaveOutcome, SaveTarget};

/// Routes protocol messages between the page, the exporter and the save
/// surface. The only component that writes preferences.
pub struct MessageHost<P: Preferences> {
    agent: ContentAgent,
    prefs: P,
    exporter: Exporter,
    target: Box<dyn SaveTarget>,
}

impl<P: Preferences> MessageHost<P> {
    /// Build a host. The agent's inline-buttons option is taken from `prefs`.
    pub fn new(
        mut agent: ContentAgent,
        prefs: P,
        exporter: Exporter,
        target: Box<dyn SaveTarget>,
    ) -> Self {
        agent.set_options(ScanOptions {
            inline_buttons: prefs.inline_buttons(),
        });
        Self {
            agent,
            prefs,
            exporter,
            target,
        }
    }

    pub fn agent(&self) -> &ContentAgent {
        &self.agent
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    /// Handle one request. Never fails: errors become failure replies.
    pub async fn handle(&mut self, request: Request) -> Response {
        debug!(action = request.action(), "Handling request");

        if let Some(response) = self.agent.handle(&request) {
            return response;
        }

        match request {
            Request::ToggleInlineButtons { enabled } => match self.set_inline_buttons(enabled) {
                Ok(()) => Response::ok(),
                Err(e) => {
                    error!(category = ?e.category(), "Failed to toggle inline buttons: {e}");
                    Response::failure(&e)
                }
            },
            Request::ExportTable {
                data,
                title,
                format,
            } => {
                match self
                    .exporter
                    .export(&data, &title, format, self.target.as_ref())
                    .await
                {
                    Ok(_) => Response::ok(),
                    Err(e) => {
                        error!(category = ?e.category(), "Error exporting table: {e}");
                        Response::failure(&e)
                    }
                }
            }
            Request::DetectTables | Request::ProcessTable { .. } => {
                // Answered by the agent above.
                Response::failure(&ExportError::InvalidRequest(
                    "unroutable request".into(),
                ))
            }
        }
    }

    /// Parse one JSON request line and return the JSON reply.
    pub async fn handle_json(&mut self, line: &str) -> String {
        match Request::parse(line) {
            Ok(request) => self.handle(request).await.to_json(),
            Err(e) => {
                warn!(category = ?e.category(), "Rejected message: {e}");
                Response::rejected(line, &e).to_json()
            }
        }
    }

    /// Persist the preference first; the live option only changes once the
    /// store accepted it.
    pub fn set_inline_buttons(&mut self, enabled: bool) -> Result<(), ExportError> {
        self.prefs
            .set_inline_buttons(enabled)
            .map_err(|e| ExportError::Config(format!("{e:#}")))?;
        self.agent.set_options(ScanOptions {
            inline_buttons: enabled,
        });
        info!(enabled, "Inline export buttons updated");
        Ok(())
    }

    /// Extract table `index` and save it in `format`. Returns the save
    /// outcome and whether the Excel path fell back to HTML.
    pub async fn export_table(
        &self,
        index: usize,
        format: ExportFormat,
    ) -> Result<(SaveOutcome, bool), ExportError> {
        let table = self.agent.extract(index)?;
        self.exporter
            .export(&table.data, &table.title, format, self.target.as_ref())
            .await
    }

    /// Export every table on the page.
    pub async fn export_all(&self, format: ExportFormat) -> Result<ExportReport, ExportError> {
        let tables = self.agent.extract_all();
        if tables.is_empty() {
            return Err(ExportError::NoTablesFound);
        }
        Ok(self
            .exporter
            .export_all(&tables, format, self.target.as_ref())
            .await)
    }
}
