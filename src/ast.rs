// Copyright (c) 2026 The ncsim developers.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Data model for tokenized lines and classified machine commands.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fixedbitset::FixedBitSet;
use strum_macros::Display;

/// A source line, retained for error messages.
#[derive(Debug)]
pub struct LineRef {
    /// 1-based line number within the program.
    pub lineno: usize,
    /// The raw, unprocessed line text.
    pub text: String,
}

/// The command letter a word was introduced by.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Category {
    G,
    M,
    Feed,
    Spindle,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Category::G => "G",
            Category::M => "M",
            Category::Feed => "F",
            Category::Spindle => "S",
        })
    }
}

/// A positional axis.  Only the three linear axes are simulated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display)]
pub enum Axis {
    X, Y, Z,
}

impl Axis {
    pub(crate) fn from_letter(letter: char) -> Option<Self> {
        Some(match letter {
            'x' => Axis::X,
            'y' => Axis::Y,
            'z' => Axis::Z,
            _ => return None,
        })
    }
}

/// An arc center offset word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display)]
pub enum Offset {
    I, J, K,
}

impl Offset {
    pub(crate) fn from_letter(letter: char) -> Option<Self> {
        Some(match letter {
            'i' => Offset::I,
            'j' => Offset::J,
            'k' => Offset::K,
            _ => return None,
        })
    }
}

/// A generic argument word, such as `P`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display)]
pub enum GenWord {
    A, D, E, F, H, L,
    P, Q, R, S,
}

impl GenWord {
    pub(crate) fn from_letter(letter: char) -> Option<Self> {
        Some(match letter {
            'a' => GenWord::A,
            'd' => GenWord::D,
            'e' => GenWord::E,
            'f' => GenWord::F,
            'h' => GenWord::H,
            'l' => GenWord::L,
            'p' => GenWord::P,
            'q' => GenWord::Q,
            'r' => GenWord::R,
            's' => GenWord::S,
            _ => return None,
        })
    }
}

/// A plane as selected by G17-G19.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display)]
pub enum Plane {
    XY, XZ, YZ,
}

impl Default for Plane {
    fn default() -> Self { Plane::XY }
}

/// Length units as selected by G20/G21.  The factor converts input values
/// to millimeters, which are used internally throughout.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Units {
    Mm,
    Inch,
}

impl Units {
    pub fn factor(&self) -> f64 {
        match self {
            Units::Mm => 1.0,
            Units::Inch => 25.4,
        }
    }
}

impl Default for Units {
    fn default() -> Self { Units::Mm }
}

/// Distance mode as selected by G90/G91.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Distance {
    Absolute,
    Incremental,
}

impl Default for Distance {
    fn default() -> Self { Distance::Absolute }
}

/// Cutter radius compensation state (G40-G42).  Only tracked as a gating
/// state; no geometric offsetting is applied.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CutterComp {
    Off,
    Left,
    Right,
}

impl Default for CutterComp {
    fn default() -> Self { CutterComp::Off }
}

/// Feed rate mode as selected by G93/G94.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FeedRateMode {
    UnitsPerMinute,
    InverseTime,
}

impl Default for FeedRateMode {
    fn default() -> Self { FeedRateMode::UnitsPerMinute }
}

/// The kind of a motion command, doubling as the kind tag of an emitted
/// motion segment.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MotionKind {
    Rapid,
    Linear,
    CwArc,
    CcwArc,
}

impl MotionKind {
    pub(crate) fn from_number(number: u16) -> Option<Self> {
        Some(match number {
            0 => MotionKind::Rapid,
            1 => MotionKind::Linear,
            2 => MotionKind::CwArc,
            3 => MotionKind::CcwArc,
            _ => return None,
        })
    }

    pub fn number(&self) -> u16 {
        match self {
            MotionKind::Rapid => 0,
            MotionKind::Linear => 1,
            MotionKind::CwArc => 2,
            MotionKind::CcwArc => 3,
        }
    }

    pub fn is_arc(&self) -> bool {
        matches!(self, MotionKind::CwArc | MotionKind::CcwArc)
    }
}

/// The modal group a command belongs to.  At most one member of each group
/// can be in effect at a time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ModalGroup {
    NonModal,      // G4, G10, G28/G30, G53, G92
    Motion,        // G0-G3
    Plane,         // G17-G19
    Distance,      // G90/G91
    Stopping,      // M0, M1, M2, M30, M60
    FeedRateMode,  // G93/G94
    Units,         // G20/G21
    CutterComp,    // G40-G42
    ToolLength,    // G43/G49
    ReturnMode,    // G98/G99
    CoordSystem,   // G54-G59
    PathControl,   // G61/G64
    ToolChange,    // M6
    Spindle,       // M3-M5
    Coolant,       // M7-M9, M109
    Override,      // M48, M49, M82, M83
}

/// A resolved opcode.  Everything the classifier accepts but the interpreter
/// does not implement lands on `Unsupported`, which executes as a no-op.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Op {
    Motion(MotionKind),
    Dwell,
    SetTable,
    SelectPlane(Plane),
    SetUnits(Units),
    SetCutterComp(CutterComp),
    ToolLengthOffset(bool),
    GotoPredefined,
    MachineCoords,
    SelectCoordSystem(u8),
    SetPathMode,
    SetDistance(Distance),
    SetOriginOffset,
    SetFeedRateMode(FeedRateMode),
    SetRetractMode,
    Feed,
    Speed,
    Pause,
    End,
    SpindleControl,
    ToolChange,
    Coolant,
    Override,
    Heat,
    Unsupported,
}

/// The unclaimed parameter words of one line.
///
/// Each command classification step *claims* the letters it consumes; a
/// claimed letter cannot be attributed to a second command on the same line.
/// The recorded values stay readable, the claim worklist is a separate
/// bitset over the letter range.
pub struct ParamSet {
    values: HashMap<char, f64>,
    claimed: FixedBitSet,
}

impl ParamSet {
    pub fn new() -> Self {
        ParamSet {
            values: HashMap::new(),
            claimed: FixedBitSet::with_capacity(26),
        }
    }

    fn index(letter: char) -> Option<usize> {
        if letter.is_ascii_lowercase() {
            Some(letter as usize - 'a' as usize)
        } else {
            None
        }
    }

    /// Records a parameter word.  A repeated letter overwrites the earlier
    /// value.
    pub fn insert(&mut self, letter: char, value: f64) {
        self.values.insert(letter, value);
    }

    /// Claims a letter for the current command.  Returns the value if the
    /// letter is present and still unclaimed.
    pub fn claim(&mut self, letter: char) -> Option<f64> {
        let idx = Self::index(letter)?;
        if self.claimed[idx] {
            return None;
        }
        let value = *self.values.get(&letter)?;
        self.claimed.insert(idx);
        Some(value)
    }

    /// True while any recorded word is still unclaimed.
    pub fn has_unclaimed(&self) -> bool {
        self.values.keys()
            .any(|&l| Self::index(l).map_or(false, |i| !self.claimed[i]))
    }
}

/// The parameter words claimed by a single command, sorted into the three
/// roles they can play.
#[derive(Default, Debug, Clone)]
pub struct Params {
    pub axes: HashMap<Axis, f64>,
    pub offsets: HashMap<Offset, f64>,
    pub words: HashMap<GenWord, f64>,
}

impl Params {
    pub(crate) fn store(&mut self, letter: char, value: f64) {
        if let Some(axis) = Axis::from_letter(letter) {
            self.axes.insert(axis, value);
        } else if let Some(offset) = Offset::from_letter(letter) {
            self.offsets.insert(offset, value);
        } else if let Some(word) = GenWord::from_letter(letter) {
            self.words.insert(word, value);
        }
    }

    pub fn axis(&self, axis: Axis) -> Option<f64> {
        self.axes.get(&axis).cloned()
    }

    pub fn offset(&self, offset: Offset) -> Option<f64> {
        self.offsets.get(&offset).cloned()
    }

    pub fn word(&self, word: GenWord) -> Option<f64> {
        self.words.get(&word).cloned()
    }

    pub fn word_def(&self, word: GenWord, def: f64) -> f64 {
        self.word(word).unwrap_or(def)
    }

    pub fn has_word(&self, word: GenWord) -> bool {
        self.words.contains_key(&word)
    }

    pub(crate) fn take_word(&mut self, word: GenWord) -> Option<f64> {
        self.words.remove(&word)
    }
}

/// A fully classified command, ready for execution.
#[derive(Debug, Clone)]
pub struct Command {
    pub category: Category,
    pub number: u16,
    pub op: Op,
    pub group: Option<ModalGroup>,
    pub params: Params,
    pub line: Arc<LineRef>,
}

impl Command {
    pub(crate) fn new(category: Category, number: u16, op: Op, line: Arc<LineRef>) -> Self {
        Command {
            category,
            number,
            op,
            group: None,
            params: Params::default(),
            line,
        }
    }

    /// Claims `letter` from the line's parameter set into this command.
    /// Returns whether the word was present.
    pub(crate) fn claim(&mut self, set: &mut ParamSet, letter: char) -> bool {
        match set.claim(letter) {
            Some(value) => {
                self.params.store(letter, value);
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.category {
            // Dotted subcodes stay in their normalized (times ten) form.
            Category::G | Category::M =>
                write!(f, "{}{}", self.category, self.number)?,
            Category::Feed => write!(f, "F{}", self.params.word_def(GenWord::F, 0.))?,
            Category::Spindle => write!(f, "S{}", self.params.word_def(GenWord::S, 0.))?,
        }
        for (axis, value) in &self.params.axes {
            write!(f, " {}{}", axis, value)?;
        }
        for (offset, value) in &self.params.offsets {
            write!(f, " {}{}", offset, value)?;
        }
        Ok(())
    }
}
