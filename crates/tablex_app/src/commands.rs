use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tablex_bridge::{
    ContentAgent, DirectoryTarget, ExportFlow, Exporter, ExporterOptions, MessageHost, SaveTarget,
};
use tablex_core::{ExportError, ExportFormat, Preferences, TablexConfig};
use tablex_docs::TableGrid;
use tablex_scan::{Page, ScanOptions, TableSummary};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::source::PageSource;

/// Sample grid written by `selftest`.
const SELFTEST_ROWS: [[&str; 3]; 4] = [
    ["Name", "Age", "City"],
    ["John", "30", "New York"],
    ["Alice", "25", "London"],
    ["Bob", "35", "Paris"],
];

const SELFTEST_TITLE: &str = "test_direct_export";

/// Build the exporter from config, attaching the native workbook writer when
/// it is compiled in and enabled.
pub fn build_exporter(config: &TablexConfig) -> Exporter {
    #[allow(unused_mut)]
    let mut exporter = Exporter::new(ExporterOptions {
        csv_quoting: config.csv_quoting,
        stagger: Duration::from_millis(config.export_stagger_ms),
    });

    #[cfg(feature = "xlsx")]
    if config.native_xlsx {
        exporter = exporter.with_workbook_writer(Box::new(
            tablex_docs::XlsxWriter::new().with_numeric_cells(config.xlsx_numeric_cells),
        ));
    }

    debug!(
        native_workbook = exporter.has_native_workbook(),
        "Exporter ready"
    );
    exporter
}

fn save_target(config: &TablexConfig, out: Option<&Path>) -> DirectoryTarget {
    let dir = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.resolved_download_dir());
    DirectoryTarget::new(dir)
}

async fn load_page(source: &PageSource) -> Result<Page> {
    let html = source
        .load()
        .await
        .map_err(|e| ExportError::Source(format!("{e:#}")))?;
    Ok(Page::parse(&html))
}

async fn build_host<P: Preferences>(
    source: &PageSource,
    prefs: P,
    config: &TablexConfig,
    out: Option<&Path>,
) -> Result<MessageHost<P>> {
    let page = load_page(source).await?;
    Ok(MessageHost::new(
        ContentAgent::new(page, ScanOptions::default()),
        prefs,
        build_exporter(config),
        Box::new(save_target(config, out)),
    ))
}

// ---------------------------------------------------------------------------
// detect
// ---------------------------------------------------------------------------

pub async fn detect(
    source: &PageSource,
    inline_buttons: bool,
    json: bool,
    w: &mut impl Write,
) -> Result<()> {
    let page = load_page(source).await?;
    let agent = ContentAgent::new(page, ScanOptions { inline_buttons });
    let tables = agent.detect();

    if json {
        writeln!(w, "{}", serde_json::to_string_pretty(&tables)?)?;
        return Ok(());
    }

    if tables.is_empty() {
        writeln!(w, "{}", ExportError::NoTablesFound.user_message())?;
        return Ok(());
    }

    for summary in &tables {
        write_summary(w, summary)?;
    }
    Ok(())
}

fn write_summary(w: &mut impl Write, summary: &TableSummary) -> Result<()> {
    writeln!(
        w,
        "[{}] {} ({} rows x {} cols)",
        summary.id, summary.title, summary.rows, summary.cols
    )?;
    for row in &summary.preview {
        writeln!(w, "    {}", row.join(" | "))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// export / export-all
// ---------------------------------------------------------------------------

pub async fn export<P: Preferences>(
    source: &PageSource,
    prefs: P,
    config: &TablexConfig,
    index: usize,
    format: ExportFormat,
    out: Option<&Path>,
    w: &mut impl Write,
) -> Result<()> {
    let host = build_host(source, prefs, config, out).await?;
    let mut flow = ExportFlow::new();

    flow.begin_detect()?;
    let tables = host.agent().detect();
    flow.detection_finished(tables.len())?;
    if tables.is_empty() {
        bail!(ExportError::NoTablesFound);
    }
    flow.select(index).map_err(|_| ExportError::IndexOutOfRange {
        index,
        count: tables.len(),
    })?;

    flow.begin_export(&tables[index].title)?;
    write_status(w, &flow)?;

    match host.export_table(index, format).await {
        Ok((outcome, used_fallback)) => {
            flow.export_succeeded(&outcome.file_name, used_fallback)?;
            write_status(w, &flow)?;
            writeln!(w, "    {}", outcome.location)?;
            Ok(())
        }
        Err(e) => {
            flow.export_failed(e.user_message())?;
            write_status(w, &flow)?;
            Err(e.into())
        }
    }
}

pub async fn export_all<P: Preferences>(
    source: &PageSource,
    prefs: P,
    config: &TablexConfig,
    format: ExportFormat,
    out: Option<&Path>,
    w: &mut impl Write,
) -> Result<()> {
    let host = build_host(source, prefs, config, out).await?;
    let mut flow = ExportFlow::new();

    flow.begin_detect()?;
    flow.detection_finished(host.agent().page().table_count())?;
    if flow.table_count() == 0 {
        bail!(ExportError::NoTablesFound);
    }

    flow.begin_export_all()?;
    write_status(w, &flow)?;

    let report = host.export_all(format).await?;
    for saved in &report.saved {
        writeln!(w, "    ✓ {}", saved.location)?;
    }
    for failed in &report.failed {
        writeln!(w, "    ✗ {}: {}", failed.title, failed.error)?;
    }

    flow.export_all_finished(&report)?;
    write_status(w, &flow)?;

    if report.saved.is_empty() {
        bail!("No tables were exported");
    }
    Ok(())
}

fn write_status(w: &mut impl Write, flow: &ExportFlow) -> Result<()> {
    if let Some(status) = flow.status() {
        writeln!(w, "{status}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// inline
// ---------------------------------------------------------------------------

/// `None` only reports the current value.
pub fn inline<P: Preferences>(prefs: &mut P, enabled: Option<bool>, w: &mut impl Write) -> Result<()> {
    if let Some(enabled) = enabled {
        prefs
            .set_inline_buttons(enabled)
            .context("Failed to save inline buttons preference")?;
        info!(enabled, "Inline buttons preference saved");
    }
    let state = if prefs.inline_buttons() { "on" } else { "off" };
    writeln!(w, "Inline export buttons: {state}")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// serve
// ---------------------------------------------------------------------------

pub async fn serve<P: Preferences>(
    source: &PageSource,
    prefs: P,
    config: &TablexConfig,
    out: Option<&Path>,
) -> Result<()> {
    if source.is_stdin() {
        bail!("serve reads requests from stdin; load the page from a file or --url");
    }
    let mut host = build_host(source, prefs, config, out).await?;
    info!("Serving requests for {source}");

    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    serve_lines(&mut host, reader, tokio::io::stdout()).await
}

/// Answer one JSON request per input line until EOF.
pub async fn serve_lines<P, R, W>(host: &mut MessageHost<P>, reader: R, mut writer: W) -> Result<()>
where
    P: Preferences,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = host.handle_json(line).await;
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        handled += 1;
    }

    info!(handled, "Input closed, stopping");
    Ok(())
}

// ---------------------------------------------------------------------------
// selftest
// ---------------------------------------------------------------------------

/// Export a fixed sample as CSV to check that the save directory works.
pub async fn selftest(config: &TablexConfig, out: Option<&Path>, w: &mut impl Write) -> Result<PathBuf> {
    let target = save_target(config, out);
    let exporter = build_exporter(config);
    let grid = TableGrid::from_rows(SELFTEST_ROWS);

    writeln!(w, "Writing sample export to {}", target.dir().display())?;
    let (outcome, _) = exporter
        .export(&grid, SELFTEST_TITLE, ExportFormat::Csv, &target as &dyn SaveTarget)
        .await
        .inspect_err(|e| warn!("Self test failed: {e}"))?;

    writeln!(w, "✓ {} exported!", outcome.file_name)?;
    writeln!(w, "    {}", outcome.location)?;
    Ok(PathBuf::from(outcome.location))
}
