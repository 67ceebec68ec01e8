// Copyright (c) 2026 The ncsim developers.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! The stateful command executor.
//!
//! An [`Interpreter`] consumes classified commands one at a time, mutates
//! machine modal state and the current tool position, and emits motion
//! segments for motion commands.  All state lives for exactly one program
//! run; create a fresh interpreter per run.

mod arc;
mod enums;

use std::collections::HashMap;
use std::convert::TryFrom;

use log::debug;

use crate::ast::*;
use crate::error::{ErrType, SimError};

pub use self::enums::*;

/// A single straight sub-movement of the tool tip.
///
/// Arcs are emitted as a run of these, one per interpolated sub-step plus a
/// final segment landing exactly on the programmed end coordinate.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MotionSegment {
    pub start: Point3,
    pub end: Point3,
    pub kind: MotionKind,
    /// Source line of the originating command.
    pub lineno: usize,
}

/// The interpreter: modal state, settings, tables and position of one
/// simulated machine, plus the append-only motion segment buffer.
pub struct Interpreter {
    kind: MachineKind,
    modal: ModalState,
    settings: Settings,
    tool_table: HashMap<u16, ToolEntry>,
    coord_table: [CoordOffset; 7],
    position: Point3,
    axes: PlaneAxes,
    invert_radius: f64,
    arc_correction: u32,
    halted: bool,
    segments: Vec<MotionSegment>,
}

impl Interpreter {
    /// Creates an interpreter for the given machine kind, seeded with its
    /// predefined positions.  Lathes select the XZ plane and invert the
    /// radius-solve sign; 3D printers start with the tool at Z = 0.
    pub fn new(kind: MachineKind, home1: Point3, home2: Point3) -> Self {
        let mut interp = Interpreter {
            kind,
            modal: ModalState::default(),
            settings: Settings::new(home1, home2),
            tool_table: HashMap::new(),
            coord_table: Default::default(),
            position: home1,
            axes: PlaneAxes::for_plane(Plane::XY),
            invert_radius: 1.0,
            arc_correction: arc::N_ARC_CORRECTION,
            halted: false,
            segments: Vec::new(),
        };
        match kind {
            MachineKind::Lathe => {
                interp.invert_radius = -1.0;
                interp.select_plane(Plane::XZ);
            }
            MachineKind::Mill => interp.select_plane(Plane::XY),
            MachineKind::Printer => {
                interp.position.z = 0.0;
                interp.select_plane(Plane::XY);
            }
        }
        interp
    }

    /// Executes one classified command.  After a program stop has been
    /// executed the interpreter is inert and silently skips everything.
    ///
    /// On error the command is dropped: no segment was emitted for it and
    /// tables and position are untouched.
    pub fn execute(&mut self, mut cmd: Command) -> Result<(), SimError> {
        if self.halted {
            return Ok(());
        }
        let line = cmd.line.clone();
        self.exec_command(&mut cmd).map_err(|e| SimError::new(&line, e))
    }

    /// Current tool position.
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// Current modal state.
    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    /// Current scalar settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The segments emitted so far.
    pub fn segments(&self) -> &[MotionSegment] {
        &self.segments
    }

    /// Hands the segment buffer to the caller, leaving the interpreter's
    /// buffer empty.
    pub fn take_segments(&mut self) -> Vec<MotionSegment> {
        std::mem::replace(&mut self.segments, Vec::new())
    }

    /// Whether a program stop has been executed.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Sets how many approximate arc steps run between exact trigonometric
    /// re-corrections.
    pub fn set_arc_correction(&mut self, interval: u32) {
        self.arc_correction = interval;
    }

    /// Creates an empty tool-table entry.  G10 L1 can only write slots that
    /// exist.
    pub fn create_tool_entry(&mut self, slot: u16) {
        self.tool_table.insert(slot, ToolEntry::default());
    }

    /// Read access to a tool-table entry.
    pub fn tool_entry(&self, slot: u16) -> Option<&ToolEntry> {
        self.tool_table.get(&slot)
    }

    /// Read access to one of the seven work-offset records.
    pub fn coord_offset(&self, slot: usize) -> Option<&CoordOffset> {
        self.coord_table.get(slot)
    }

    // -- private API --

    fn exec_command(&mut self, cmd: &mut Command) -> Result<(), ErrType> {
        match cmd.op {
            Op::Motion(kind) => self.motion(kind, cmd)?,
            Op::Feed => self.feed_word(cmd),
            Op::Speed => self.speed_word(cmd)?,
            Op::SetTable => self.set_table(cmd)?,
            Op::SelectPlane(plane) => self.select_plane(plane),
            Op::SetUnits(units) => self.modal.units = units,
            Op::SetCutterComp(comp) => self.modal.cutter_comp = comp,
            Op::ToolLengthOffset(on) => self.modal.tool_length = on,
            Op::SelectCoordSystem(slot) => self.select_coord_system(slot)?,
            Op::SetDistance(mode) => self.modal.distance = mode,
            Op::SetOriginOffset => self.origin_offset(cmd),
            Op::SetFeedRateMode(mode) => self.feed_rate_mode(mode),
            Op::MachineCoords => self.settings.machine_coords = true,
            Op::End => {
                debug!("line {}: program stop", cmd.line.lineno);
                self.halted = true;
            }
            // Accepted but without effect on the simulated toolpath.
            Op::Dwell | Op::GotoPredefined | Op::SetPathMode |
            Op::SetRetractMode | Op::Pause | Op::SpindleControl |
            Op::ToolChange | Op::Coolant | Op::Override | Op::Heat |
            Op::Unsupported => (),
        }
        Ok(())
    }

    fn motion(&mut self, kind: MotionKind, cmd: &mut Command) -> Result<(), ErrType> {
        // Additive machines only draw while extruding: without an A or E
        // word the move updates the position silently.
        let travel_only = self.kind == MachineKind::Printer
            && !cmd.params.has_word(GenWord::A)
            && !cmd.params.has_word(GenWord::E);

        if travel_only {
            self.position = self.resolve_target(&cmd.params);
        } else if kind.is_arc() {
            self.arc_motion(kind, cmd)?;
        } else {
            let target = self.resolve_target(&cmd.params);
            self.emit(target, kind, cmd.line.lineno);
        }
        self.modal.motion = kind;
        Ok(())
    }

    /// Resolves the axis words of a motion command to absolute machine
    /// coordinates.  Three rules, checked in priority order: the single-shot
    /// raw-coordinates flag, incremental mode, absolute mode.  Axes without
    /// a word keep their current value.
    fn resolve_target(&mut self, params: &Params) -> Point3 {
        const AXES: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
        let units = self.modal.units.factor();
        let mut target = self.position;

        if self.settings.machine_coords {
            for &axis in &AXES {
                if let Some(value) = params.axis(axis) {
                    target.set(axis, value * units);
                }
            }
            self.settings.machine_coords = false;
            return target;
        }

        match self.modal.distance {
            Distance::Incremental => {
                for &axis in &AXES {
                    if let Some(value) = params.axis(axis) {
                        target.set(axis, value * units + self.position.get(axis));
                    }
                }
            }
            Distance::Absolute => {
                let system = self.coord_table[self.modal.coord_select];
                for &axis in &AXES {
                    if let Some(value) = params.axis(axis) {
                        target.set(axis, value
                                   + system.get(axis)
                                   + self.settings.origin_offset.get(axis));
                    }
                }
            }
        }
        target
    }

    fn emit(&mut self, end: Point3, kind: MotionKind, lineno: usize) {
        self.segments.push(MotionSegment { start: self.position, end, kind, lineno });
        self.position = end;
    }

    fn feed_word(&mut self, cmd: &Command) {
        let value = cmd.params.word_def(GenWord::F, 0.0);
        match self.modal.feed_rate_mode {
            FeedRateMode::InverseTime => self.settings.feed_rate_inverse = value,
            FeedRateMode::UnitsPerMinute => self.settings.feed_rate = Some(value),
        }
    }

    fn speed_word(&mut self, cmd: &Command) -> Result<(), ErrType> {
        // Temperature-style S words on additive machines are unconstrained
        // and do not drive a spindle.
        if self.kind != MachineKind::Printer {
            let value = cmd.params.word_def(GenWord::S, 0.0);
            if value < 0.0 {
                return Err(ErrType::NegativeSpindleSpeed);
            }
            self.settings.spindle_speed = value;
        }
        Ok(())
    }

    fn set_table(&mut self, cmd: &mut Command) -> Result<(), ErrType> {
        let l = cmd.params.take_word(GenWord::L).map_or(0, |v| v.round() as i64);
        let p = cmd.params.take_word(GenWord::P).map_or(0, |v| v.round() as i64);
        match l {
            1 => {
                if self.modal.cutter_comp != CutterComp::Off {
                    return Err(ErrType::CutterCompActive("G10 L1"));
                }
                let entry = u16::try_from(p).ok()
                    .and_then(|slot| self.tool_table.get_mut(&slot))
                    .ok_or(ErrType::InvalidSlot("G10 L1"))?;
                for (&axis, &value) in &cmd.params.axes {
                    match axis {
                        Axis::X => entry.x = value,
                        Axis::Y => entry.y = value,
                        Axis::Z => entry.z = value,
                    }
                }
                for (&offset, &value) in &cmd.params.offsets {
                    match offset {
                        Offset::I => entry.i = value,
                        Offset::J => entry.j = value,
                        Offset::K => (),
                    }
                }
                if let Some(value) = cmd.params.word(GenWord::Q) {
                    entry.q = value;
                }
                if let Some(value) = cmd.params.word(GenWord::R) {
                    entry.r = value;
                }
            }
            2 => {
                if self.modal.cutter_comp != CutterComp::Off {
                    return Err(ErrType::CutterCompActive("G10 L2"));
                }
                if !(0..=6).contains(&p) {
                    return Err(ErrType::InvalidSlot("G10 L2"));
                }
                let entry = &mut self.coord_table[p as usize];
                for (&axis, &value) in &cmd.params.axes {
                    entry.set(axis, value);
                }
                if let Some(value) = cmd.params.word(GenWord::R) {
                    entry.r = value;
                }
            }
            // Other L variants are accepted and ignored.
            _ => (),
        }
        Ok(())
    }

    fn select_plane(&mut self, plane: Plane) {
        self.modal.plane = plane;
        self.axes = PlaneAxes::for_plane(plane);
    }

    fn select_coord_system(&mut self, slot: u8) -> Result<(), ErrType> {
        if self.modal.cutter_comp != CutterComp::Off {
            let code = match slot {
                1 => "G54", 2 => "G55", 3 => "G56",
                4 => "G57", 5 => "G58", _ => "G59",
            };
            return Err(ErrType::CutterCompActive(code));
        }
        self.modal.coord_select = slot as usize;
        Ok(())
    }

    fn origin_offset(&mut self, cmd: &Command) {
        // Only positional words shift the origin; an E word merely
        // satisfies the classifier's at-least-one-axis rule.
        let units = self.modal.units.factor();
        for (&axis, &value) in &cmd.params.axes {
            self.settings.origin_offset.set(axis, value * units);
        }
    }

    fn feed_rate_mode(&mut self, mode: FeedRateMode) {
        self.modal.feed_rate_mode = mode;
        if mode == FeedRateMode::UnitsPerMinute {
            self.settings.feed_rate = None;
        }
    }
}
