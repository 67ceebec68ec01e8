// Copyright (c) 2026 The ncsim developers.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Circular interpolation.
//!
//! Arcs are subdivided into straight segments whose count keeps the chordal
//! deviation below a fixed tolerance.  Sub-steps rotate the radius vector
//! with a cheap second-order small-angle approximation; every
//! `N_ARC_CORRECTION` steps the exact vector is recomputed with direct
//! trigonometry so the drift stays bounded.  The last segment never comes
//! out of the incremental accumulation: it is forced onto the programmed
//! end coordinate.

use crate::ast::{Command, GenWord, MotionKind};
use crate::error::ErrType;

use super::Interpreter;

/// Maximum chordal deviation of a sub-segment, in machine units.
const ARC_TOLERANCE: f64 = 0.0002;

/// Maximum disagreement between the start and end radius of an offset-form
/// arc before the command is rejected.
const ARC_RADIUS_TOLERANCE: f64 = 0.5;

/// Default number of approximate steps between exact re-corrections.
pub(super) const N_ARC_CORRECTION: u32 = 12;

impl Interpreter {
    pub(super) fn arc_motion(&mut self, kind: MotionKind, cmd: &mut Command)
                             -> Result<(), ErrType> {
        let target = self.resolve_target(&cmd.params);
        let ax = self.axes;
        let units = self.modal.units.factor();

        let x = target.get(ax.axis0) - self.position.get(ax.axis0);
        let y = target.get(ax.axis1) - self.position.get(ax.axis1);

        // Signed-radius form: derive the center offset from the chord via
        // the two-solution circle construction.  The sign of `h` picks the
        // solution; it is flipped for counterclockwise motion, on lathes,
        // and for a negative radius (which requests the major arc).
        let mut radius = None;
        if let Some(r_word) = cmd.params.take_word(GenWord::R) {
            let mut r = r_word * units;
            let d2 = x * x + y * y;
            let mut h = 4.0 * r * r - d2;
            if h < 0.0 {
                return Err(ErrType::RadiusTooSmall);
            }
            h = h.sqrt() / d2.sqrt() * self.invert_radius;
            if kind == MotionKind::CcwArc {
                h = -h;
            }
            if r < 0.0 {
                h = -h;
                r = -r;
            }
            cmd.params.offsets.insert(ax.off0, 0.5 * (x + y * h));
            cmd.params.offsets.insert(ax.off1, 0.5 * (y - x * h));
            radius = Some(r);
        }

        let off0 = cmd.params.offset(ax.off0).unwrap_or(0.0);
        let off1 = cmd.params.offset(ax.off1).unwrap_or(0.0);

        let center0 = self.position.get(ax.axis0) + off0;
        let center1 = self.position.get(ax.axis1) + off1;
        // Radius vector from the center to the current location, and to the
        // target location.
        let mut r0 = -off0;
        let mut r1 = -off1;
        let rt0 = target.get(ax.axis0) - center0;
        let rt1 = target.get(ax.axis1) - center1;

        let radius = match radius {
            Some(r) => r,
            None => {
                // With explicit offsets the programmed end point must
                // actually lie on the circle they describe.
                let r = (off0 * off0 + off1 * off1).sqrt();
                let target_r = (rt0 * rt0 + rt1 * rt1).sqrt();
                if (target_r - r).abs() > ARC_RADIUS_TOLERANCE {
                    return Err(ErrType::RadiusTooSmall);
                }
                r
            }
        };

        let angular = (r0 * rt1 - r1 * rt0).atan2(r0 * rt0 + r1 * rt1);

        let segments = ((0.5 * angular * radius).abs()
                        / (ARC_TOLERANCE * (2.0 * radius - ARC_TOLERANCE)).sqrt())
            .floor() as u32;
        let segments = segments.max(1);

        let theta_per_segment = angular / f64::from(segments);
        let linear_start = self.position.get(ax.linear);
        let linear_per_segment =
            (target.get(ax.linear) - linear_start) / f64::from(segments);

        // Second-order approximation of cos and sin of the step angle.
        let mut cos_t = 2.0 - theta_per_segment * theta_per_segment;
        let sin_t = theta_per_segment * 0.16666667 * (cos_t + 4.0);
        cos_t *= 0.5;

        let mut count = 0;
        for i in 1..segments {
            if count < self.arc_correction {
                // Rotate the radius vector by the approximated step.
                let r_next = r0 * sin_t + r1 * cos_t;
                r0 = r0 * cos_t - r1 * sin_t;
                r1 = r_next;
                count += 1;
            } else {
                // Recompute the exact vector from the initial offset.
                let (sin_ti, cos_ti) = (f64::from(i) * theta_per_segment).sin_cos();
                r0 = -off0 * cos_ti + off1 * sin_ti;
                r1 = -off0 * sin_ti - off1 * cos_ti;
                count = 0;
            }

            let mut pos = self.position;
            pos.set(ax.axis0, center0 + r0);
            pos.set(ax.axis1, center1 + r1);
            pos.set(ax.linear, linear_start + linear_per_segment * f64::from(i));
            self.emit(pos, kind, cmd.line.lineno);
        }

        // Land exactly on the programmed end coordinate.
        self.emit(target, kind, cmd.line.lineno);
        Ok(())
    }
}
