//! Progress reporting service
//!
//! This module separates progress reporting concerns from business logic,
//! allowing different frontends to implement their own progress handling.

use crate::types::StageTimings;
use instant::Instant;
use tracing::{error, info};

/// Progress stages while producing a banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Validating configuration and inputs
    Validation,
    /// Computing product placement
    Planning,
    /// Deriving the inpainting mask
    MaskDerivation,
    /// Generating or loading the background layer
    BackgroundGeneration,
    /// Producing the title copy
    CopyGeneration,
    /// Layering background, product and text
    Compositing,
    /// Saving result to file
    FileSaving,
    /// Processing completed
    Completed,

    // Batch processing stages
    /// Initializing batch processing
    BatchInitialization,
    /// Processing individual item in batch
    BatchItemProcessing,
    /// Finalizing batch processing
    BatchFinalization,
}

impl ProcessingStage {
    /// Get a human-readable description of the processing stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStage::Validation => "Validating configuration",
            ProcessingStage::Planning => "Planning product placement",
            ProcessingStage::MaskDerivation => "Deriving inpainting mask",
            ProcessingStage::BackgroundGeneration => "Generating background",
            ProcessingStage::CopyGeneration => "Generating title copy",
            ProcessingStage::Compositing => "Compositing layers",
            ProcessingStage::FileSaving => "Saving banner",
            ProcessingStage::Completed => "Banner completed",

            ProcessingStage::BatchInitialization => "Initializing batch processing",
            ProcessingStage::BatchItemProcessing => "Processing batch item",
            ProcessingStage::BatchFinalization => "Finalizing batch processing",
        }
    }

    /// Get the typical progress percentage for this stage
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        match self {
            ProcessingStage::Validation => 2,
            ProcessingStage::Planning => 5,
            ProcessingStage::MaskDerivation => 10,
            // Remote generation dominates wall time
            ProcessingStage::BackgroundGeneration => 15,
            ProcessingStage::CopyGeneration => 80,
            ProcessingStage::Compositing => 90,
            ProcessingStage::FileSaving => 97,
            ProcessingStage::Completed => 100,

            ProcessingStage::BatchInitialization => 5,
            ProcessingStage::BatchItemProcessing => 50,
            ProcessingStage::BatchFinalization => 98,
        }
    }
}

/// Progress update containing stage and timing information
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Current processing stage
    pub stage: ProcessingStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Human-readable stage description
    pub description: String,
    /// Elapsed time since processing started (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    /// Create a new progress update
    #[must_use]
    pub fn new(stage: ProcessingStage, start_time: Instant) -> Self {
        Self::with_description(stage, stage.description().to_string(), start_time)
    }

    /// Create a progress update with custom description
    #[must_use]
    pub fn with_description(
        stage: ProcessingStage,
        description: String,
        start_time: Instant,
    ) -> Self {
        Self {
            progress: stage.progress_percentage(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
            description,
        }
    }
}

/// Trait for reporting progress while a banner is produced
pub trait ProgressReporter: Send + Sync {
    /// Report a progress update
    fn report_progress(&self, update: ProgressUpdate);

    /// Report completion with the final per-stage timings
    fn report_completion(&self, timings: &StageTimings);

    /// Report an error during processing
    fn report_error(&self, stage: ProcessingStage, error: &str);
}

/// No-op progress reporter that discards all progress updates
#[derive(Debug, Default)]
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_completion(&self, _timings: &StageTimings) {}

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {}
}

/// Progress reporter that emits tracing events
#[derive(Debug)]
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// # Arguments
    /// * `verbose` - Whether to show elapsed time and per-stage timings
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            info!(
                "[{}%] {} ({}ms elapsed)",
                update.progress, update.description, update.elapsed_ms
            );
        } else {
            info!("[{}%] {}", update.progress, update.description);
        }
    }

    fn report_completion(&self, timings: &StageTimings) {
        info!("✅ Banner completed in {}ms", timings.total_ms);

        if self.verbose {
            info!("  📊 {}", timings.summary());
        }
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        error!("❌ Error during {}: {}", stage.description(), error);
    }
}
