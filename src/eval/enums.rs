// Copyright (c) 2026 The ncsim developers.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::ast::{Axis, CutterComp, Distance, FeedRateMode, MotionKind, Offset, Plane, Units};

/// The kind of machine a program runs on.
///
/// The kind selects the default plane, the radius-solve sign convention and
/// whether motion without extrusion words produces output.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, EnumString, Serialize, Deserialize)]
pub enum MachineKind {
    Lathe,
    Mill,
    #[strum(serialize = "3D Printer")]
    #[serde(rename = "3D Printer")]
    Printer,
}

/// An absolute tool-tip position in machine units (millimeters).
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point3 { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }
}

/// Which positional letters play the "first", "second" and "linear" role for
/// the currently selected plane, and which offset letters go with them.  All
/// arc math is written against these roles, so it is plane-agnostic.
#[derive(Clone, Copy, Debug)]
pub struct PlaneAxes {
    pub axis0: Axis,
    pub axis1: Axis,
    pub linear: Axis,
    pub off0: Offset,
    pub off1: Offset,
}

impl PlaneAxes {
    pub fn for_plane(plane: Plane) -> Self {
        match plane {
            Plane::XY => PlaneAxes {
                axis0: Axis::X, axis1: Axis::Y, linear: Axis::Z,
                off0: Offset::I, off1: Offset::J,
            },
            Plane::XZ => PlaneAxes {
                axis0: Axis::X, axis1: Axis::Z, linear: Axis::Y,
                off0: Offset::I, off1: Offset::K,
            },
            Plane::YZ => PlaneAxes {
                axis0: Axis::Y, axis1: Axis::Z, linear: Axis::X,
                off0: Offset::J, off1: Offset::K,
            },
        }
    }
}

/// One value per modal group.  Exactly one member of every group is active
/// at any time.
#[derive(Debug)]
pub struct ModalState {
    pub motion: MotionKind,
    pub feed_rate_mode: FeedRateMode,
    pub units: Units,
    pub distance: Distance,
    pub plane: Plane,
    pub cutter_comp: CutterComp,
    /// Active work-offset slot; 0 is the startup system, 1-6 are G54-G59.
    pub coord_select: usize,
    /// Tool length offset applied (G43) or cancelled (G49).
    pub tool_length: bool,
}

impl Default for ModalState {
    fn default() -> Self {
        ModalState {
            motion: MotionKind::Rapid,
            feed_rate_mode: FeedRateMode::UnitsPerMinute,
            units: Units::Mm,
            distance: Distance::Absolute,
            plane: Plane::XY,
            cutter_comp: CutterComp::Off,
            coord_select: 0,
            tool_length: false,
        }
    }
}

/// Scalar runtime values outside the modal groups.
#[derive(Debug)]
pub struct Settings {
    /// Traverse speed used for rapid moves.
    pub rapid_speed: f64,
    /// Spindle speed in RPM.
    pub spindle_speed: f64,
    /// Feed rate in units per minute; cleared when G94 is (re)selected.
    pub feed_rate: Option<f64>,
    /// Feed rate in inverse-time form (1/F minutes), used under G93.
    pub feed_rate_inverse: f64,
    /// Active tool slot.
    pub tool: u16,
    /// Single shot: the next motion resolves against raw machine
    /// coordinates, then the flag clears itself.
    pub machine_coords: bool,
    /// Non-persistent origin offset set by G92.
    pub origin_offset: Point3,
    /// Tool length offset value while enabled.
    pub tool_length_offset: f64,
    /// Predefined position reached by G28.
    pub home1: Point3,
    /// Predefined position reached by G30.
    pub home2: Point3,
    /// Reserved runtime flags, never raised by the interpreter itself.
    pub abort: bool,
    pub suspend: bool,
}

impl Settings {
    pub(crate) fn new(home1: Point3, home2: Point3) -> Self {
        Settings {
            rapid_speed: 10.0,
            spindle_speed: 0.0,
            feed_rate: None,
            feed_rate_inverse: 0.0,
            tool: 0,
            machine_coords: false,
            origin_offset: Point3::default(),
            tool_length_offset: 0.0,
            home1,
            home2,
            abort: false,
            suspend: false,
        }
    }
}

/// One tool-table record.  Created only by `Interpreter::create_tool_entry`
/// and written by G10 L1.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ToolEntry {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub i: f64,
    pub j: f64,
    pub q: f64,
    pub r: f64,
}

/// One work-offset record of the seven-slot coordinate system table.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct CoordOffset {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
}

impl CoordOffset {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub(crate) fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }
}
