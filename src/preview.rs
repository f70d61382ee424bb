//! Live preview with latest-input-wins semantics
//!
//! Every submission is tagged with a generation number. A run that finishes
//! after a newer submission has been made is discarded, so the display slot
//! only ever reflects the most recent input.

use crate::metrics;
use crate::pipeline::{Pipeline, RenderRequest, RenderedImage};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What the preview currently shows
#[derive(Debug, Clone, Default)]
pub struct PreviewState {
    /// Generation of the most recent submission
    pub latest_generation: u64,
    /// Generation whose result is currently shown (if any result was applied)
    pub shown_generation: Option<u64>,
    /// Image on display; kept when the latest run failed
    pub image: Option<Arc<RenderedImage>>,
    /// Failure reason of the latest run, cleared by the next success
    pub last_error: Option<String>,
    /// Whether the latest applied input had an empty payload
    pub awaiting_input: bool,
}

/// How a submitted run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run produced an image and it is now displayed
    Displayed,
    /// The payload was empty; the previous image stays on display
    Idle,
    /// The run failed; the previous image stays on display
    Failed,
    /// A newer submission arrived first; the result was dropped
    Superseded,
}

/// Owns the display slot and dispatches pipeline runs
#[derive(Debug, Clone)]
pub struct Previewer {
    pipeline: Pipeline,
    state: Arc<watch::Sender<PreviewState>>,
}

impl Previewer {
    /// Create a previewer with an empty display
    pub fn new(pipeline: Pipeline) -> Self {
        let (state, _) = watch::channel(PreviewState::default());
        Self {
            pipeline,
            state: Arc::new(state),
        }
    }

    /// Watch display updates
    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.state.subscribe()
    }

    /// Snapshot of the current display
    pub fn current(&self) -> PreviewState {
        self.state.borrow().clone()
    }

    /// Start a pipeline run for `request`, superseding any run in flight.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, request: RenderRequest) -> JoinHandle<RunOutcome> {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.latest_generation += 1;
            generation = state.latest_generation;
        });
        tracing::debug!(generation, kind = %request.content.kind(), "Preview run submitted");

        let pipeline = self.pipeline;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let result = pipeline.run(&request).await;
            apply(&state, generation, result)
        })
    }
}

impl Default for Previewer {
    fn default() -> Self {
        Self::new(Pipeline::new())
    }
}

fn apply(
    state: &watch::Sender<PreviewState>,
    generation: u64,
    result: crate::Result<Option<RenderedImage>>,
) -> RunOutcome {
    let mut outcome = RunOutcome::Superseded;

    state.send_if_modified(|current| {
        if current.latest_generation != generation {
            return false;
        }
        match result {
            Ok(Some(image)) => {
                current.image = Some(Arc::new(image));
                current.shown_generation = Some(generation);
                current.last_error = None;
                current.awaiting_input = false;
                outcome = RunOutcome::Displayed;
            }
            Ok(None) => {
                current.last_error = None;
                current.awaiting_input = true;
                outcome = RunOutcome::Idle;
            }
            Err(err) => {
                current.last_error = Some(err.to_string());
                outcome = RunOutcome::Failed;
            }
        }
        true
    });

    if outcome == RunOutcome::Superseded {
        tracing::debug!(generation, "Discarding superseded preview result");
        metrics::record_stale();
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::payload::QrContent;
    use crate::render::RenderOptions;
    use image::RgbaImage;

    fn image(payload: &str) -> RenderedImage {
        RenderedImage {
            payload: payload.to_string(),
            kind: crate::payload::ContentKind::Text,
            ec_level: crate::render::EcLevel::High,
            version: 1,
            has_logo: false,
            image: RgbaImage::new(4, 4),
            svg: String::new(),
        }
    }

    fn sender_at(generation: u64) -> watch::Sender<PreviewState> {
        let (tx, _) = watch::channel(PreviewState {
            latest_generation: generation,
            ..PreviewState::default()
        });
        tx
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let state = sender_at(2);
        let outcome = apply(&state, 1, Ok(Some(image("old"))));

        assert_eq!(outcome, RunOutcome::Superseded);
        assert!(state.borrow().image.is_none());
    }

    #[test]
    fn test_failure_keeps_previous_image() {
        let state = sender_at(1);
        apply(&state, 1, Ok(Some(image("good"))));
        state.send_modify(|s| s.latest_generation = 2);

        let outcome = apply(&state, 2, Err(Error::QrEncode("too long".to_string())));
        let current = state.borrow().clone();

        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(current.image.as_ref().map(|i| i.payload.as_str()), Some("good"));
        assert_eq!(current.shown_generation, Some(1));
        assert!(current.last_error.unwrap().contains("too long"));
    }

    #[test]
    fn test_empty_result_keeps_previous_image() {
        let state = sender_at(1);
        apply(&state, 1, Ok(Some(image("good"))));
        state.send_modify(|s| s.latest_generation = 2);

        assert_eq!(apply(&state, 2, Ok(None)), RunOutcome::Idle);
        let current = state.borrow().clone();
        assert_eq!(current.image.as_ref().map(|i| i.payload.as_str()), Some("good"));
        assert_eq!(current.shown_generation, Some(1));
        assert!(current.awaiting_input);

        state.send_modify(|s| s.latest_generation = 3);
        assert_eq!(apply(&state, 3, Ok(Some(image("next")))), RunOutcome::Displayed);
        assert!(!state.borrow().awaiting_input);
    }

    #[tokio::test]
    async fn test_submit_displays_latest() {
        let previewer = Previewer::default();
        let options = RenderOptions {
            size: 128,
            ..RenderOptions::default()
        };

        let first = previewer.submit(RenderRequest::new(
            QrContent::Text {
                text: "first".to_string(),
            },
            options.clone(),
        ));
        let second = previewer.submit(RenderRequest::new(
            QrContent::Text {
                text: "second".to_string(),
            },
            options,
        ));

        assert_eq!(first.await.unwrap(), RunOutcome::Superseded);
        assert_eq!(second.await.unwrap(), RunOutcome::Displayed);

        let current = previewer.current();
        assert_eq!(current.latest_generation, 2);
        assert_eq!(current.shown_generation, Some(2));
        assert_eq!(current.image.unwrap().payload, "second");
    }
}
