//! Pinhole camera model with a first-wins calibration latch.
//!
//! Intrinsics are captured once from the first calibration message and are
//! read-only afterwards; later calibration messages are ignored so the
//! projection basis cannot drift mid-stream.

use std::sync::OnceLock;

use contracts::PerceptionError;
use nalgebra::Point3;

/// Pinhole intrinsic parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

/// Back-projecting camera model.
///
/// The calibration slot uses atomic check-and-set semantics, so no lock is
/// needed even if a calibration packet races a projection.
#[derive(Debug, Default)]
pub struct CameraModel {
    slot: OnceLock<Intrinsics>,
}

impl CameraModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch intrinsics. Returns `true` if this call set them, `false` if
    /// they were already set (the new values are ignored).
    pub fn set_intrinsics(&self, fx: f64, fy: f64, cx: f64, cy: f64) -> bool {
        self.slot.set(Intrinsics { fx, fy, cx, cy }).is_ok()
    }

    /// Latch intrinsics from a flattened 3x3 matrix:
    /// fx = K[0], fy = K[4], cx = K[2], cy = K[5].
    ///
    /// Once calibrated, later matrices are ignored without validation,
    /// mirroring the first-wins contract.
    pub fn set_from_matrix(&self, k: &[f64; 9]) -> Result<bool, PerceptionError> {
        if self.slot.get().is_some() {
            return Ok(false);
        }

        let (fx, fy, cx, cy) = (k[0], k[4], k[2], k[5]);
        if !fx.is_finite() || !fy.is_finite() || fx == 0.0 || fy == 0.0 {
            return Err(PerceptionError::InvalidIntrinsics {
                message: format!("focal lengths must be finite and non-zero, got fx={fx} fy={fy}"),
            });
        }
        if !cx.is_finite() || !cy.is_finite() {
            return Err(PerceptionError::InvalidIntrinsics {
                message: format!("principal point must be finite, got cx={cx} cy={cy}"),
            });
        }

        Ok(self.set_intrinsics(fx, fy, cx, cy))
    }

    pub fn is_calibrated(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn intrinsics(&self) -> Option<Intrinsics> {
        self.slot.get().copied()
    }

    /// Back-project a pixel with its depth to a camera-frame point.
    ///
    /// Returns `None` before calibration and for non-positive or non-finite
    /// depth. Math runs in f64 and narrows only at the output.
    pub fn project(&self, u: i32, v: i32, depth_m: f32) -> Option<Point3<f32>> {
        let intr = self.slot.get()?;
        if !depth_m.is_finite() || depth_m <= 0.0 {
            return None;
        }

        let z = depth_m as f64;
        let x = (u as f64 - intr.cx) * z / intr.fx;
        let y = (v as f64 - intr.cy) * z / intr.fy;
        Some(Point3::new(x as f32, y as f32, depth_m))
    }
}
