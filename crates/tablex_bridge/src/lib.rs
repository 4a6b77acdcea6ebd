//! Glue between detection, serialization and the save surface.
//!
//! - [`message`]: the JSON request/response protocol.
//! - [`agent`]: answers content-side requests against a parsed page.
//! - [`dispatcher`]: turns a grid into a named file and hands it to a
//!   [`SaveTarget`].
//! - [`host`]: routes protocol messages and owns the preference store.
//! - [`flow`]: the interactive detect/select/export state machine.

pub mod agent;
pub mod dispatcher;
pub mod flow;
pub mod host;
pub mod message;
pub mod save;

pub use agent::ContentAgent;
pub use dispatcher::{ExportArtifact, ExportReport, Exporter, ExporterOptions, FailedExport};
pub use flow::{ExportFlow, ExportScope, FlowError, FlowState};
pub use host::MessageHost;
pub use message::{ProcessedTable, Request, Response};
pub use save::{DirectoryTarget, MemoryTarget, SaveOutcome, SaveTarget};
