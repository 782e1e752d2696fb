//! Detected face candidates
//!
//! Detection itself is external: anything implementing [`FaceDetector`] can
//! feed a lottery. The engine never looks inside a candidate; only the
//! session compares ids.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// An entity that can be entered into a lottery
pub trait Candidate: Clone {
    type Id: Clone + Eq + Hash + Debug;

    /// Stable identity, unique within one pool
    fn id(&self) -> Self::Id;
}

/// Axis-aligned bounding box in image pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    /// X coordinate of the top-left corner
    pub x: f64,
    /// Y coordinate of the top-left corner
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One face found in the photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub id: u32,
    #[serde(rename = "box")]
    pub bounds: FaceBox,
    /// Detector score in `[0, 1]`
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl DetectedFace {
    pub fn new(id: u32, bounds: FaceBox, confidence: f64) -> Self {
        Self {
            id,
            bounds,
            confidence,
        }
    }

    /// Number each face in detection order, starting at 0
    pub fn from_detections(detections: impl IntoIterator<Item = (FaceBox, f64)>) -> Vec<Self> {
        detections
            .into_iter()
            .enumerate()
            .map(|(index, (bounds, confidence))| Self::new(index as u32, bounds, confidence))
            .collect()
    }
}

impl Candidate for DetectedFace {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }
}

impl Candidate for String {
    type Id = String;

    fn id(&self) -> String {
        self.clone()
    }
}

/// Pluggable face detection backend.
///
/// Implementors own their model lifecycle (loading, warm-up) and hand back
/// numbered faces ready to become a lottery pool.
pub trait FaceDetector {
    /// Detect faces in a row-major RGBA buffer of `width` × `height` pixels
    fn detect(&self, rgba: &[u8], width: u32, height: u32) -> Vec<DetectedFace>;
}
