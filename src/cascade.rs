//! Ordered detection strategies
//!
//! Runs detectors one after another on the same decoded image and stops
//! at the first one that reports anything. A strategy that fails is
//! logged and skipped, so one broken stage never hides the next.

use opencv::core::Mat;
use serde::Serialize;

use crate::config::DetectorConfig;
use crate::detection::{Detection, LesionDetector, ToothDetector, ToothSegmenter};
use crate::image_loader::ImageSource;
use crate::render::RenderStyle;
use crate::Result;

/// Result of a cascade run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeOutcome {
    /// Name of the strategy that produced the detections, if any did
    pub strategy: Option<&'static str>,
    #[serde(skip)]
    pub render_style: RenderStyle,
    pub detections: Vec<Detection>,
}

impl CascadeOutcome {
    fn empty() -> Self {
        Self {
            strategy: None,
            render_style: RenderStyle::default(),
            detections: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// Detection strategies tried in priority order
pub struct DetectionCascade {
    strategies: Vec<Box<dyn ToothDetector>>,
}

impl Default for DetectionCascade {
    fn default() -> Self {
        Self::new()
            .with_strategy(ToothSegmenter::new())
            .with_strategy(LesionDetector::new())
    }
}

impl DetectionCascade {
    /// Create an empty cascade
    pub fn new() -> Self {
        Self { strategies: Vec::new() }
    }

    /// Segmenter first, then the lesion detector
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidParameter` if either section fails validation.
    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        Ok(Self::new()
            .with_strategy(ToothSegmenter::from_config(&config.segmenter)?)
            .with_strategy(LesionDetector::from_config(&config.lesion)?))
    }

    /// Append a strategy at the lowest priority
    pub fn with_strategy(mut self, strategy: impl ToothDetector + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Decode the source once and run the strategies in order
    ///
    /// # Errors
    ///
    /// Only a source that cannot be decoded is an error; strategy failures
    /// are logged and the next strategy is tried.
    pub fn run(&self, source: &ImageSource<'_>) -> Result<CascadeOutcome> {
        let image = source.resolve()?;
        Ok(self.run_on(&image))
    }

    fn run_on(&self, image: &Mat) -> CascadeOutcome {
        for strategy in &self.strategies {
            match strategy.detect(image) {
                Ok(detections) if !detections.is_empty() => {
                    log::info!(
                        "cascade: {} found {} detections",
                        strategy.name(),
                        detections.len()
                    );
                    return CascadeOutcome {
                        strategy: Some(strategy.name()),
                        render_style: strategy.render_style(),
                        detections,
                    };
                }
                Ok(_) => log::debug!("cascade: {} found nothing", strategy.name()),
                Err(e) => log::warn!("cascade: {} failed: {}", strategy.name(), e),
            }
        }
        CascadeOutcome::empty()
    }

    /// Like [`run`](Self::run), but a decode failure yields an empty outcome
    pub fn detect_any(&self, source: &ImageSource<'_>) -> CascadeOutcome {
        self.run(source).unwrap_or_else(|e| {
            log::warn!("cascade: {}", e.user_message());
            CascadeOutcome::empty()
        })
    }
}
