//! Compass full-rotation detection.

/// Tracks magnetic headings until the device has turned a full circle.
///
/// A rotation is counted when the heading wraps from above 300° to below
/// 60°.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompassTracker {
    heading: f64,
    previous: Option<f64>,
    rotations: u32,
}

impl CompassTracker {
    const WRAP_FROM: f64 = 300.0;
    const WRAP_TO: f64 = 60.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a magnetic field sample. Returns true once a full rotation has
    /// been seen.
    pub fn update(&mut self, field_x: f64, field_y: f64) -> bool {
        self.update_heading(heading_degrees(field_x, field_y))
    }

    /// Feed a heading in degrees.
    pub fn update_heading(&mut self, heading: f64) -> bool {
        let heading = heading.rem_euclid(360.0);
        if let Some(previous) = self.previous
            && previous > Self::WRAP_FROM
            && heading < Self::WRAP_TO
        {
            self.rotations += 1;
        }
        self.heading = heading;
        self.previous = Some(heading);
        self.has_completed_rotation()
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Position within the current turn, `0.0..1.0`.
    pub fn progress(&self) -> f64 {
        self.heading / 360.0
    }

    pub fn has_completed_rotation(&self) -> bool {
        self.rotations >= 1
    }
}

/// Heading in `0.0..360.0` degrees from the horizontal magnetic field.
pub fn heading_degrees(field_x: f64, field_y: f64) -> f64 {
    field_y.atan2(field_x).to_degrees().rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_is_normalized() {
        assert!((heading_degrees(1.0, 0.0) - 0.0).abs() < 1e-9);
        assert!((heading_degrees(0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((heading_degrees(0.0, -1.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn full_turn_is_detected_on_wrap() {
        let mut compass = CompassTracker::new();
        for heading in [10.0, 90.0, 180.0, 270.0, 330.0] {
            assert!(!compass.update_heading(heading));
        }
        assert!(compass.update_heading(20.0));
        assert!(compass.has_completed_rotation());
    }

    #[test]
    fn turning_back_does_not_count() {
        let mut compass = CompassTracker::new();
        for heading in [200.0, 320.0, 250.0, 100.0, 40.0] {
            assert!(!compass.update_heading(heading));
        }
        assert!((compass.progress() - 40.0 / 360.0).abs() < 1e-9);
    }
}
