//! Row enrichment pipeline
//!
//! Input rows are fanned out across a fixed-size [`WorkerPool`]; each worker
//! enriches one row at a time. Finished rows flow through a bounded channel to
//! exactly one writer, which owns the [`ResultSink`] and is the only code that
//! ever touches output.
//!
//! Guarantees:
//! - Every submitted row produces exactly one written record, or the run fails
//! - A row whose enrichment panics is written with a crawl error
//! - Output order is completion order; records carry their row index
//! - A sink error cancels the pool and aborts the run

mod enrich;
mod pool;
mod rows;

pub use enrich::{EnrichedRow, RowEnricher};
pub use pool::{PoolReport, PoolRun, WorkerPool};
pub use rows::{read_rows, read_rows_from_path, InputRow, InputTable};

use crate::output::{OutputResult, ResultSink, RunSummary};
use crate::{HarvestError, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Crawl error recorded for a row whose enrichment task panicked
pub const WORKER_PANIC_ERROR: &str = "worker panicked";

/// Enriches every row and writes the results through `sink`
///
/// # Arguments
///
/// * `rows` - Input rows; each is attempted exactly once
/// * `enricher` - Shared per-row enrichment logic
/// * `concurrency` - Number of rows processed in parallel
/// * `sink` - Output destination, moved onto the writer thread
///
/// # Returns
///
/// * `Ok(RunSummary)` - Every row was written
/// * `Err(HarvestError)` - The sink failed or rows went missing
pub async fn run_pipeline<S>(
    rows: Vec<InputRow>,
    enricher: Arc<RowEnricher>,
    concurrency: usize,
    sink: S,
) -> Result<RunSummary>
where
    S: ResultSink + 'static,
{
    let started = Instant::now();
    let rows_total = rows.len();

    let pool = WorkerPool::new(concurrency);
    tracing::info!(
        "Enriching {} rows with {} workers",
        rows_total,
        pool.concurrency()
    );

    let run = pool.run(
        rows,
        move |row| {
            let enricher = Arc::clone(&enricher);
            async move { enricher.enrich(row).await }
        },
        |row| EnrichedRow::failed(row, WORKER_PANIC_ERROR),
    );

    let PoolRun {
        results,
        shutdown,
        join,
    } = run;

    let writer_shutdown = shutdown.clone();
    let writer = tokio::task::spawn_blocking(move || write_results(results, sink, writer_shutdown));

    let written = writer
        .await
        .map_err(|e| HarvestError::Pipeline(format!("writer task failed: {}", e)))?;

    let report = join
        .await
        .map_err(|e| HarvestError::Pipeline(format!("worker pool failed: {}", e)))?;

    let mut summary = written?;

    if report.panicked > 0 {
        tracing::warn!("{} rows failed with a panic", report.panicked);
    }

    if report.submitted != rows_total || summary.rows_written != rows_total {
        return Err(HarvestError::Pipeline(format!(
            "{} rows submitted, {} processed, {} written, expected {}",
            report.submitted, report.completed, summary.rows_written, rows_total
        )));
    }

    summary.rows_total = rows_total;
    summary.concurrency = pool.concurrency();
    summary.duration_seconds = Some(started.elapsed().as_secs());

    tracing::info!(
        "Wrote {} rows ({} with emails) in {:?}",
        summary.rows_written,
        summary.rows_with_emails,
        started.elapsed()
    );

    Ok(summary)
}

/// The single writer loop
///
/// Runs on a blocking thread so slow output I/O never stalls the runtime.
/// On a sink error the pool is cancelled and the receiver dropped, which
/// makes every worker stop at its next hand-off.
fn write_results<S: ResultSink>(
    mut results: mpsc::Receiver<EnrichedRow>,
    mut sink: S,
    shutdown: CancellationToken,
) -> OutputResult<RunSummary> {
    let mut summary = RunSummary::new();

    while let Some(row) = results.blocking_recv() {
        if let Err(e) = sink.write(&row) {
            tracing::error!("Output failed at row {}: {}", row.row.index, e);
            shutdown.cancel();
            return Err(e);
        }
        summary.record(&row);
    }

    sink.finish()?;
    Ok(summary)
}
