//! The capture → recognize → search → play pipeline
//!
//! Strictly sequential: each stage depends on the previous stage's output,
//! and the first failure aborts the run with the failed stage named. Nothing
//! is compensated on failure; a captured image or a completed search has no
//! side effects worth undoing.
//!
//! Whole-pipeline execution is single-occupancy: the camera is one physical
//! resource and the device runs one playback command at a time, so an
//! overlapping trigger is rejected immediately instead of queuing a
//! duplicate run.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};
use waxeye_common::Error as WaxeyeError;

use crate::camera::Camera;
use crate::spotify::{CatalogClient, PlaybackController};
use crate::vision::Recognizer;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Capture,
    Recognize,
    Search,
    Play,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Capture => "capture",
            Stage::Recognize => "recognize",
            Stage::Search => "search",
            Stage::Play => "play",
        };
        f.write_str(name)
    }
}

/// Why a pipeline run did not complete
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Another run holds the pipeline; the trigger was not queued
    #[error("a pipeline run is already in flight")]
    Busy,

    /// A stage failed; earlier stages' side effects stand
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: WaxeyeError,
    },
}

impl PipelineError {
    fn at(stage: Stage) -> impl FnOnce(WaxeyeError) -> PipelineError {
        move |source| PipelineError::Stage { stage, source }
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// What the recognizer made of the photograph
    pub label: String,
    /// The context URI that was sent to playback
    pub context_uri: String,
}

pub struct Pipeline {
    camera: Camera,
    recognizer: Recognizer,
    catalog: Arc<CatalogClient>,
    playback: Arc<PlaybackController>,
    gate: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        camera: Camera,
        recognizer: Recognizer,
        catalog: Arc<CatalogClient>,
        playback: Arc<PlaybackController>,
    ) -> Self {
        Self {
            camera,
            recognizer,
            catalog,
            playback,
            gate: Mutex::new(()),
        }
    }

    /// Run the full pipeline once
    pub async fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        let _guard = self.gate.try_lock().map_err(|_| PipelineError::Busy)?;

        info!("pipeline run started");

        let image = self
            .camera
            .capture()
            .await
            .map_err(PipelineError::at(Stage::Capture))?;

        let label = self
            .recognizer
            .recognize(&image)
            .await
            .map_err(PipelineError::at(Stage::Recognize))?;
        info!("recognized {:?}", label);

        let context_uri = self
            .catalog
            .search_album(&label)
            .await
            .map_err(PipelineError::at(Stage::Search))?;
        info!("resolved {:?} to {}", label, context_uri);

        self.playback
            .play(&context_uri)
            .await
            .map_err(PipelineError::at(Stage::Play))?;

        info!("pipeline run complete");
        Ok(PipelineOutcome { label, context_uri })
    }
}
