/*!
 * Batch orchestration: load, process, finalize.
 *
 * The orchestrator walks the catalog sequentially, skipping items the
 * checkpoint already holds, translating the rest, and checkpointing each
 * item as soon as it completes. Only a checkpoint write failure or a run
 * of consecutive provider failures aborts the run; individual translation
 * failures degrade to source text and the batch keeps going. The merged
 * output file is written once, after the last item.
 */

use anyhow::{Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::checkpoint::{CheckpointMetadata, CheckpointStore, JsonCheckpointStore};
use crate::content::{Catalog, FieldSpec, catalog_fingerprint};
use crate::output::OutputWriter;
use crate::translation::{ContentWalker, TranslationClient};

/// Where a run ended up
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunState {
    /// Every item processed and the output file written
    Completed,
    /// Stopped between items on request; checkpoint kept for resume
    Interrupted,
}

/// Summary of one pipeline run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Items in the catalog
    pub total: usize,
    /// Items done by the end of this run (including resumed ones)
    pub completed: usize,
    /// Items taken from the checkpoint instead of retranslated
    pub resumed: usize,
    /// Strings that fell back to source text during this run
    pub fallbacks: u64,
    /// How the run ended
    pub state: RunState,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// File locations and languages for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Source catalog JSON file
    pub catalog_path: PathBuf,
    /// Merged output JSON file
    pub output_path: PathBuf,
    /// Checkpoint file
    pub checkpoint_path: PathBuf,
    /// Ignore any existing checkpoint
    pub fresh: bool,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
}

/// Drives a full catalog through translation with checkpointed resume
pub struct PipelineOrchestrator<'a> {
    client: &'a TranslationClient,
    field_spec: FieldSpec,
    options: PipelineOptions,
    /// Checked between items; set by the signal handler
    cancel: Arc<AtomicBool>,
}

impl<'a> PipelineOrchestrator<'a> {
    /// Create an orchestrator for one run
    pub fn new(client: &'a TranslationClient, field_spec: FieldSpec, options: PipelineOptions) -> Self {
        Self {
            client,
            field_spec,
            options,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the run between items when set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run the pipeline to completion, interruption, or abort.
    ///
    /// Returns an error for conditions that must not be papered over:
    /// an unreadable catalog, a failed checkpoint write, or too many
    /// consecutive provider failures.
    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();

        // Loading
        debug!("Pipeline state: loading");
        let catalog = Catalog::load(&self.options.catalog_path)?;
        info!(
            "Loaded catalog {} ({} items)",
            self.options.catalog_path.display(),
            catalog.len()
        );

        let metadata = CheckpointMetadata {
            catalog_fingerprint: catalog_fingerprint(&self.options.catalog_path)?,
            source_language: self.options.source_language.clone(),
            target_language: self.options.target_language.clone(),
        };
        let mut store = if self.options.fresh {
            JsonCheckpointStore::fresh(&self.options.checkpoint_path, metadata)?
        } else {
            JsonCheckpointStore::open(&self.options.checkpoint_path, metadata)?
        };

        // Processing
        debug!("Pipeline state: processing");
        let started_stats = self.client.stats();
        let max_failures = self.max_consecutive_failures();
        let mut resumed = 0usize;
        let mut interrupted = false;

        let progress = build_progress_bar(catalog.len() as u64);
        let walker = ContentWalker::new(
            self.client,
            &self.options.source_language,
            &self.options.target_language,
        );

        for item in catalog.items() {
            if self.cancel.load(Ordering::SeqCst) {
                warn!("Stop requested, leaving checkpoint for resume");
                interrupted = true;
                break;
            }

            if store.has(&item.id) {
                debug!("Skipping '{}' (already in checkpoint)", item.id);
                resumed += 1;
                progress.inc(1);
                continue;
            }

            progress.set_message(item.id.clone());
            let translated = walker.translate_item(&item.value, &self.field_spec).await;

            // An accepted item must be durable before the next one starts
            store.put(&item.id, translated)?;
            progress.inc(1);

            if max_failures > 0 && self.client.consecutive_failures() >= max_failures {
                progress.abandon();
                return Err(anyhow!(
                    "Aborting after {} consecutive translation failures; \
                     checkpoint kept at {}",
                    self.client.consecutive_failures(),
                    store.path().display()
                ));
            }
        }
        progress.finish_and_clear();

        let completed = store.len();
        let fallbacks = self.client.stats().fallbacks - started_stats.fallbacks;

        if interrupted {
            return Ok(RunReport {
                total: catalog.len(),
                completed,
                resumed,
                fallbacks,
                state: RunState::Interrupted,
                elapsed: started.elapsed(),
            });
        }

        // Finalizing
        debug!("Pipeline state: finalizing");
        let items = OutputWriter::assemble(&catalog, store.completed());
        OutputWriter::write(&self.options.output_path, &items)?;
        info!(
            "Wrote {} items to {}",
            items.len(),
            self.options.output_path.display()
        );

        // The output now holds everything the checkpoint did
        store.clear()?;

        Ok(RunReport {
            total: catalog.len(),
            completed,
            resumed,
            fallbacks,
            state: RunState::Completed,
            elapsed: started.elapsed(),
        })
    }

    fn max_consecutive_failures(&self) -> u64 {
        self.client.max_consecutive_failures()
    }
}

fn build_progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar
}
