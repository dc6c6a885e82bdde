use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::RedactConfig;
use crate::detection::DetectionClient;
use crate::error::{DetectionError, RedactError};
use crate::export::{ExportArtifact, ExportService};
use crate::geometry;
use crate::models::{DetectionSet, NormalizedBox, SourceImage};
use crate::render::{MaskRenderer, RenderedSurface};

/// Processing phase of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing ingested.
    #[default]
    Idle,
    /// Source decoded, no detections yet.
    Loaded,
    /// One detection request outstanding.
    Detecting,
    /// Masks rendered; export available.
    Redacted,
    /// Last detection or render attempt failed. The source is kept for a retry.
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Loaded => "loaded",
            Phase::Detecting => "detecting",
            Phase::Redacted => "redacted",
            Phase::Error => "in error",
        };
        f.write_str(name)
    }
}

/// Handle for one outstanding detection call
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    /// Must be handed back to [`PipelineController::complete_detection`].
    pub id: Uuid,
    /// Source file bytes, base64 encoded.
    pub payload: String,
}

/// What happened to a detection result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Redacted { regions: usize, dropped: usize },
    /// The session moved on while the request was outstanding. Nothing applied.
    Stale,
}

/// Everything belonging to the image currently being processed.
#[derive(Debug, Default)]
pub struct PipelineSession {
    phase: Phase,
    source: Option<SourceImage>,
    detections: DetectionSet,
    surface: Option<RenderedSurface>,
    pending: Option<Uuid>,
    last_error: Option<String>,
    renders: u32,
}

impl PipelineSession {
    fn loaded(source: SourceImage) -> Self {
        Self {
            phase: Phase::Loaded,
            source: Some(source),
            ..Default::default()
        }
    }

    fn failed_ingest(message: String) -> Self {
        Self {
            last_error: Some(message),
            ..Default::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn detections(&self) -> &DetectionSet {
        &self.detections
    }

    pub fn surface(&self) -> Option<&RenderedSurface> {
        self.surface.as_ref()
    }

    pub fn pending_request(&self) -> Option<Uuid> {
        self.pending
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of renders performed since the session was created.
    pub fn renders(&self) -> u32 {
        self.renders
    }
}

/// Read-only snapshot for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub phase: Phase,
    pub source_name: Option<String>,
    pub regions: usize,
    pub last_error: Option<String>,
}

impl SessionStatus {
    /// Diagnostic log lines, most general first.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(name) = &self.source_name {
            lines.push(format!("SRC: {}", name));
        }
        match self.phase {
            Phase::Detecting => lines.push("STATUS: DETECTING".to_string()),
            Phase::Redacted => lines.push(format!("STATUS: {} TARGETS CENSORED", self.regions)),
            _ => {}
        }
        if let Some(error) = &self.last_error {
            lines.push(format!("ERROR: {}", error));
        }
        lines
    }
}

/// Drives one session through ingest → detect → render → export.
///
/// The controller is the only writer of its [`PipelineSession`]. Detection is
/// split into [`begin_detection`](Self::begin_detection) and
/// [`complete_detection`](Self::complete_detection) so a caller can keep
/// interacting with the session (e.g. `reset`) while the detector is busy;
/// a result arriving for a superseded request is discarded.
#[derive(Debug)]
pub struct PipelineController {
    config: RedactConfig,
    renderer: MaskRenderer,
    exporter: ExportService,
    session: PipelineSession,
}

impl PipelineController {
    pub fn new(config: RedactConfig) -> Result<Self, RedactError> {
        config.validate()?;
        let exporter = ExportService::new(config.export_prefix.clone());
        Ok(Self {
            config,
            renderer: MaskRenderer::new(),
            exporter,
            session: PipelineSession::default(),
        })
    }

    pub fn with_renderer(mut self, renderer: MaskRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &RedactConfig {
        &self.config
    }

    pub fn session(&self) -> &PipelineSession {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.session.phase,
            source_name: self.session.source.as_ref().map(|s| s.name.clone()),
            regions: self.session.detections.len(),
            last_error: self.session.last_error.clone(),
        }
    }

    /// Decode `bytes` and start a fresh session with them.
    ///
    /// Any previous image, detections and surface are dropped. On a decode
    /// failure the session is left empty (`Idle`) with the error recorded.
    pub async fn ingest(
        &mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<(), RedactError> {
        self.ensure_not_detecting("ingest")?;
        let name = name.into();

        let decoded = {
            let name = name.clone();
            tokio::task::spawn_blocking(move || SourceImage::decode(name, bytes)).await
        };
        let source = match decoded {
            Ok(Ok(source)) => source,
            Ok(Err(e)) => return Err(self.fail_ingest(&name, format!("{:#}", e))),
            Err(e) => return Err(self.fail_ingest(&name, format!("decoder task failed: {}", e))),
        };

        tracing::info!(
            source = %source.name,
            width = source.width(),
            height = source.height(),
            "image ingested"
        );
        self.session = PipelineSession::loaded(source);
        Ok(())
    }

    /// Read a file from disk and [`ingest`](Self::ingest) it.
    pub async fn ingest_path(&mut self, path: impl AsRef<Path>) -> Result<(), RedactError> {
        self.ensure_not_detecting("ingest")?;
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match tokio::fs::read(path).await {
            Ok(bytes) => self.ingest(name, bytes).await,
            Err(e) => Err(self.fail_ingest(&name, format!("Failed to read {:?}: {}", path, e))),
        }
    }

    /// Enter `Detecting` and hand out the request to send to the detector.
    ///
    /// Accepted from `Loaded` and, as a retry, from `Error`.
    pub fn begin_detection(&mut self) -> Result<DetectionRequest, RedactError> {
        let phase = self.session.phase;
        let source = match (phase, self.session.source.as_ref()) {
            (Phase::Loaded | Phase::Error, Some(source)) => source,
            _ => {
                return Err(RedactError::Rejected {
                    action: "start detection",
                    phase,
                });
            }
        };

        let request = DetectionRequest {
            id: Uuid::new_v4(),
            payload: source.to_base64(),
        };
        tracing::info!(request = %request.id, source = %source.name, "detection started");

        self.session.phase = Phase::Detecting;
        self.session.pending = Some(request.id);
        self.session.last_error = None;
        Ok(request)
    }

    /// Apply the detector's answer for request `id`.
    ///
    /// Results for anything but the outstanding request are dropped and
    /// reported as [`Completion::Stale`]. A detector failure moves the session
    /// to `Error` and is returned; the source stays in place for a retry.
    /// On success the masks are rendered exactly once.
    pub fn complete_detection(
        &mut self,
        id: Uuid,
        outcome: Result<Vec<NormalizedBox>, DetectionError>,
    ) -> Result<Completion, RedactError> {
        if self.session.phase != Phase::Detecting || self.session.pending != Some(id) {
            tracing::debug!(
                request = %id,
                phase = %self.session.phase,
                "discarding stale detection result"
            );
            return Ok(Completion::Stale);
        }
        self.session.pending = None;

        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) => {
                self.fail("detection failed", e.to_string());
                return Err(e.into());
            }
        };

        let (detections, dropped) = DetectionSet::from_detector(raw);
        let rendered = match self.session.source.as_ref() {
            Some(source) => {
                let rects = geometry::to_pixel_rects(
                    detections.boxes(),
                    source.width(),
                    source.height(),
                    self.config.expansion_factor,
                );
                self.renderer.render(source, &rects)
            }
            None => Err(RedactError::Render("no source image in session".to_string())),
        };

        match rendered {
            Ok(surface) => {
                let regions = detections.len();
                tracing::info!(request = %id, regions, dropped, "detections applied");
                self.session.detections = detections;
                self.session.surface = Some(surface);
                self.session.phase = Phase::Redacted;
                self.session.renders += 1;
                Ok(Completion::Redacted { regions, dropped })
            }
            Err(e) => {
                self.fail("render failed", e.to_string());
                Err(e)
            }
        }
    }

    /// Run one full detection round trip against `client`.
    pub async fn run_detection<C: DetectionClient>(
        &mut self,
        client: &C,
    ) -> Result<Completion, RedactError> {
        let request = self.begin_detection()?;
        let outcome = client.detect(&request.payload).await;
        self.complete_detection(request.id, outcome)
    }

    /// Drop everything and return to `Idle`. An outstanding request becomes stale.
    pub fn reset(&mut self) {
        if let Some(id) = self.session.pending {
            tracing::debug!(request = %id, "outstanding detection will be discarded");
        }
        self.session = PipelineSession::default();
        tracing::info!("session reset");
    }

    /// Encode the redacted surface. Only available in `Redacted`.
    ///
    /// An encoding failure is recorded for the status display; the session
    /// stays `Redacted` so the export can be retried.
    pub fn export(&mut self) -> Result<ExportArtifact, RedactError> {
        let exported = match (self.session.phase, self.session.surface.as_ref()) {
            (Phase::Redacted, Some(surface)) => self.exporter.serialize(surface),
            (phase, _) => {
                return Err(RedactError::Rejected {
                    action: "export",
                    phase,
                });
            }
        };
        self.record_export(exported)
    }

    /// [`export`](Self::export) and write the file into `dir`.
    pub async fn export_to(&mut self, dir: impl AsRef<Path>) -> Result<PathBuf, RedactError> {
        let artifact = self.export()?;
        let written = artifact.write_to(dir).await;
        self.record_export(written)
    }

    fn record_export<T>(&mut self, result: Result<T, RedactError>) -> Result<T, RedactError> {
        match &result {
            Ok(_) => self.session.last_error = None,
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                self.session.last_error = Some(e.to_string());
            }
        }
        result
    }

    fn ensure_not_detecting(&self, action: &'static str) -> Result<(), RedactError> {
        if self.session.phase == Phase::Detecting {
            return Err(RedactError::Rejected {
                action,
                phase: Phase::Detecting,
            });
        }
        Ok(())
    }

    fn fail_ingest(&mut self, name: &str, message: String) -> RedactError {
        tracing::warn!(source = %name, error = %message, "ingestion failed");
        self.session = PipelineSession::failed_ingest(message.clone());
        RedactError::Ingestion(message)
    }

    fn fail(&mut self, context: &'static str, message: String) {
        tracing::warn!(error = %message, "{}", context);
        self.session.phase = Phase::Error;
        self.session.detections = DetectionSet::new();
        self.session.surface = None;
        self.session.last_error = Some(message);
    }
}
