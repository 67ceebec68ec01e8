// Copyright (c) 2026 The ncsim developers.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Line tokenization, command classification and the program-level parser.
//!
//! Each line goes through three stages: cleaning (comments, whitespace and
//! the line-number word are stripped), tokenization into `(letter, number)`
//! words via the Pest grammar, and classification into [`Command`]s.  The
//! [`Parser`] runs the stages over a whole program and keeps the two pieces
//! of state that carry across lines: the active motion code and the feed
//! rate mode.

use std::collections::VecDeque;
use std::sync::Arc;

use log::debug;
use pest::Parser as PestParser;
use pest_derive::Parser;

use crate::ast::*;
use crate::error::{ErrType, SimError};
use crate::util::normalize_code;

#[derive(Parser)]
#[grammar = "gcode.pest"]
struct LineParser;

/// Number of emission slots in the classifier's priority table.
const SLOTS: usize = 24;
/// Slot of the F word; checked by the inverse-time feed rule.
const SLOT_FEED: usize = 1;
/// Slot of the motion command, explicit or synthesized.
const SLOT_MOTION: usize = 21;

/// Result of stripping one raw line.
#[derive(Debug, PartialEq)]
pub struct CleanedLine {
    /// Lowercased program text with comments and whitespace removed.
    pub text: String,
    /// Parenthesized comment bodies, in order of appearance.
    pub paren_comments: Vec<String>,
    /// Text following a `;`, if any.
    pub line_comment: Option<String>,
    /// A `(` was never closed.
    pub unclosed: bool,
}

/// Strips comments and whitespace from one raw line and lowercases the
/// remainder.  Idempotent: cleaning a cleaned line changes nothing.
pub fn clean_line(raw: &str) -> CleanedLine {
    let mut text = String::with_capacity(raw.len());
    let mut paren_comments = Vec::new();
    let mut line_comment = None;
    let mut comment = String::new();
    let mut in_paren = false;

    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if in_paren {
            if ch == ')' {
                in_paren = false;
                paren_comments.push(std::mem::replace(&mut comment, String::new()));
            } else {
                comment.push(ch);
            }
        } else {
            match ch {
                '(' => in_paren = true,
                ';' => {
                    line_comment = Some(chars.as_str().to_string());
                    break;
                }
                c if c.is_whitespace() => (),
                c => text.extend(c.to_lowercase()),
            }
        }
    }

    CleanedLine { text, paren_comments, line_comment, unclosed: in_paren }
}

/// Removes the first line-number word (`n` followed by digits) from cleaned
/// text.
fn strip_line_number(text: &str) -> String {
    match text.find('n') {
        Some(pos) => {
            let mut end = pos + 1;
            let bytes = text.as_bytes();
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            format!("{}{}", &text[..pos], &text[end..])
        }
        None => text.to_string(),
    }
}

/// Splits cleaned text into `(letter, value)` words.  A missing value is
/// reported as `None` and rejected during classification.  G and M numbers
/// are normalized to their integer identity here.
pub fn tokenize_line(cleaned: &str) -> Result<Vec<(char, Option<f64>)>, ErrType> {
    let parsed = LineParser::parse(Rule::line, cleaned)
        .map_err(|e| ErrType::Syntax(e.to_string()))?
        .next()
        .expect("line rule");

    let mut words = Vec::new();
    for word in parsed.into_inner() {
        match word.as_rule() {
            Rule::word => {
                let mut inner = word.into_inner();
                let letter = inner.next().expect("letter child")
                    .as_str().chars().next().expect("letter char");
                let value = inner.next().map(|number| {
                    let value = number.as_str().parse().expect("lexed number");
                    match letter {
                        'g' | 'm' => normalize_code(value),
                        _ => value,
                    }
                });
                words.push((letter, value));
            }
            Rule::EOI => (),
            _ => unreachable!(),
        }
    }
    Ok(words)
}

/// The command queue: classifies a program line by line and accumulates the
/// emitted commands in execution order.
pub struct Parser {
    commands: VecDeque<Command>,
    active_motion: Option<MotionKind>,
    feed_mode: Option<FeedRateMode>,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            commands: VecDeque::new(),
            active_motion: None,
            feed_mode: None,
        }
    }

    /// Parses a whole program.  Lines that fail to classify contribute no
    /// commands but never stop the parse; their errors are returned.
    pub fn parse_code(&mut self, code: &str) -> Vec<SimError> {
        let mut errors = Vec::new();
        for (index, text) in code.split('\n').enumerate() {
            let line = Arc::new(LineRef { lineno: index + 1, text: text.to_string() });
            if let Err(errtype) = self.parse_line(&line) {
                debug!("dropping line {}: {:?}", line.lineno, errtype);
                errors.push(SimError::new(&line, errtype));
            }
        }
        errors
    }

    /// Removes and returns the next queued command.
    pub fn next_command(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    // -- private API --

    fn parse_line(&mut self, line: &Arc<LineRef>) -> Result<(), ErrType> {
        let cleaned = clean_line(&line.text);
        if cleaned.unclosed {
            return Err(ErrType::Syntax("unterminated comment".into()));
        }
        let words = tokenize_line(&strip_line_number(&cleaned.text))?;

        // Partition into command words and the shared parameter set.
        let mut params = ParamSet::new();
        let mut command_words = Vec::new();
        for (letter, value) in words {
            let value = value.ok_or(ErrType::MalformedWord(letter))?;
            match letter {
                'g' | 'm' | 'f' | 's' => command_words.push((letter, value)),
                _ => params.insert(letter, value),
            }
        }

        // Classification happens in textual order, but commands are emitted
        // in the fixed slot order of the priority table, so that e.g. a
        // plane selection always precedes the motion word it affects.
        let mut slots: Vec<Option<Command>> = (0..SLOTS).map(|_| None).collect();
        for (letter, value) in command_words {
            match letter {
                'g' => self.classify_g(value, &mut params, &mut slots, line)?,
                'm' => self.classify_m(value, &mut slots, line)?,
                'f' => {
                    let mut cmd = Command::new(Category::Feed, 0, Op::Feed, line.clone());
                    cmd.params.store('f', value);
                    slots[SLOT_FEED] = Some(cmd);
                }
                's' => {
                    let mut cmd = Command::new(Category::Spindle, 0, Op::Speed, line.clone());
                    cmd.params.store('s', value);
                    slots[2] = Some(cmd);
                }
                _ => unreachable!(),
            }
        }

        self.synthesize_motion(&mut params, &mut slots, line)?;

        for cmd in slots.into_iter().flatten() {
            self.commands.push_back(cmd);
        }
        Ok(())
    }

    fn classify_g(&mut self, number: f64, params: &mut ParamSet,
                  slots: &mut Vec<Option<Command>>, line: &Arc<LineRef>)
                  -> Result<(), ErrType> {
        let n = number as i64;
        let mut group = None;

        let (mut cmd, slot) = match n {
            93 | 94 => {
                let mode = if n == 93 { FeedRateMode::InverseTime }
                           else { FeedRateMode::UnitsPerMinute };
                self.feed_mode = Some(mode);
                group = Some(ModalGroup::FeedRateMode);
                (Command::new(Category::G, n as u16, Op::SetFeedRateMode(mode), line.clone()), 0)
            }
            4 => {
                let mut cmd = Command::new(Category::G, 4, Op::Dwell, line.clone());
                if !cmd.claim(params, 'p') {
                    return Err(ErrType::MissingWord("G4", GenWord::P));
                }
                if cmd.params.word_def(GenWord::P, 0.0) < 0.0 {
                    return Err(ErrType::NegativeWord("G4", GenWord::P));
                }
                group = Some(ModalGroup::NonModal);
                (cmd, 8)
            }
            17 | 18 | 19 => {
                let plane = match n {
                    17 => Plane::XY,
                    18 => Plane::XZ,
                    _ => Plane::YZ,
                };
                group = Some(ModalGroup::Plane);
                (Command::new(Category::G, n as u16, Op::SelectPlane(plane), line.clone()), 9)
            }
            20 | 21 => {
                let units = if n == 20 { Units::Inch } else { Units::Mm };
                group = Some(ModalGroup::Units);
                (Command::new(Category::G, n as u16, Op::SetUnits(units), line.clone()), 10)
            }
            40 | 41 | 42 => {
                let comp = match n {
                    40 => CutterComp::Off,
                    41 => CutterComp::Left,
                    _ => CutterComp::Right,
                };
                let mut cmd = Command::new(Category::G, n as u16,
                                           Op::SetCutterComp(comp), line.clone());
                if comp != CutterComp::Off && !cmd.claim(params, 'd') {
                    let code = if n == 41 { "G41" } else { "G42" };
                    return Err(ErrType::MissingWord(code, GenWord::D));
                }
                group = Some(ModalGroup::CutterComp);
                (cmd, 11)
            }
            43 | 49 => {
                let mut cmd = Command::new(Category::G, n as u16,
                                           Op::ToolLengthOffset(n == 43), line.clone());
                if n == 43 && !cmd.claim(params, 'h') {
                    return Err(ErrType::MissingWord("G43", GenWord::H));
                }
                group = Some(ModalGroup::ToolLength);
                (cmd, 12)
            }
            54..=59 => {
                group = Some(ModalGroup::CoordSystem);
                (Command::new(Category::G, n as u16,
                              Op::SelectCoordSystem((n - 53) as u8), line.clone()), 13)
            }
            61 | 64 => {
                group = Some(ModalGroup::PathControl);
                (Command::new(Category::G, n as u16, Op::SetPathMode, line.clone()), 14)
            }
            90 | 91 => {
                let mode = if n == 90 { Distance::Absolute } else { Distance::Incremental };
                group = Some(ModalGroup::Distance);
                (Command::new(Category::G, n as u16, Op::SetDistance(mode), line.clone()), 15)
            }
            98 | 99 => {
                group = Some(ModalGroup::ReturnMode);
                (Command::new(Category::G, n as u16, Op::SetRetractMode, line.clone()), 16)
            }
            28 | 30 => {
                let mut cmd = Command::new(Category::G, n as u16,
                                           Op::GotoPredefined, line.clone());
                if n == 30 {
                    cmd.claim(params, 'p');
                    cmd.claim(params, 'h');
                }
                cmd.claim(params, 'x');
                cmd.claim(params, 'y');
                cmd.claim(params, 'z');
                group = Some(ModalGroup::NonModal);
                (cmd, 17)
            }
            10 => {
                let mut cmd = Command::new(Category::G, 10, Op::SetTable, line.clone());
                if !cmd.claim(params, 'l') {
                    return Err(ErrType::MissingWord("G10", GenWord::L));
                }
                if !cmd.claim(params, 'p') {
                    return Err(ErrType::MissingWord("G10", GenWord::P));
                }
                cmd.claim(params, 'x');
                cmd.claim(params, 'y');
                cmd.claim(params, 'z');
                cmd.claim(params, 'r');
                let l = cmd.params.word_def(GenWord::L, 0.0);
                if l == 1.0 || l == 10.0 || l == 11.0 {
                    cmd.claim(params, 'i');
                    cmd.claim(params, 'j');
                    cmd.claim(params, 'q');
                }
                group = Some(ModalGroup::NonModal);
                (cmd, 18)
            }
            92 => {
                let mut cmd = Command::new(Category::G, 92,
                                           Op::SetOriginOffset, line.clone());
                let mut any = false;
                for &letter in &['x', 'y', 'z', 'e'] {
                    any |= cmd.claim(params, letter);
                }
                if !any {
                    return Err(ErrType::MissingAxisWords("G92"));
                }
                group = Some(ModalGroup::NonModal);
                (cmd, 19)
            }
            53 => {
                group = Some(ModalGroup::NonModal);
                (Command::new(Category::G, 53, Op::MachineCoords, line.clone()), 20)
            }
            0..=3 => {
                let kind = MotionKind::from_number(n as u16).expect("motion code");
                // Axis words are attached by the implicit-motion synthesis,
                // which sees this code as the now-active one.
                self.active_motion = Some(kind);
                group = Some(ModalGroup::Motion);
                (Command::new(Category::G, n as u16, Op::Motion(kind), line.clone()), SLOT_MOTION)
            }
            _ => (Command::new(Category::G, 9999, Op::Unsupported, line.clone()), 23),
        };

        cmd.group = group;
        slots[slot] = Some(cmd);
        Ok(())
    }

    fn classify_m(&mut self, number: f64, slots: &mut Vec<Option<Command>>,
                  line: &Arc<LineRef>) -> Result<(), ErrType> {
        let n = number as i64;
        let mut group = None;

        let (mut cmd, slot) = match n {
            104 => (Command::new(Category::M, 104, Op::Heat, line.clone()), 3),
            6 => {
                group = Some(ModalGroup::ToolChange);
                (Command::new(Category::M, 6, Op::ToolChange, line.clone()), 4)
            }
            3 | 4 | 5 => {
                group = Some(ModalGroup::Spindle);
                (Command::new(Category::M, n as u16, Op::SpindleControl, line.clone()), 5)
            }
            7 | 8 | 9 | 109 => {
                group = Some(ModalGroup::Coolant);
                (Command::new(Category::M, n as u16, Op::Coolant, line.clone()), 6)
            }
            48 | 49 | 82 | 83 => {
                group = Some(ModalGroup::Override);
                (Command::new(Category::M, n as u16, Op::Override, line.clone()), 7)
            }
            0 | 1 | 60 => {
                group = Some(ModalGroup::Stopping);
                (Command::new(Category::M, n as u16, Op::Pause, line.clone()), 22)
            }
            2 | 30 => {
                group = Some(ModalGroup::Stopping);
                (Command::new(Category::M, n as u16, Op::End, line.clone()), 22)
            }
            _ => (Command::new(Category::M, 9999, Op::Unsupported, line.clone()), 23),
        };

        cmd.group = group;
        slots[slot] = Some(cmd);
        Ok(())
    }

    /// Attaches leftover axis words to the active motion code.  This is how
    /// explicit motion commands pick up their parameters as well: `G1 X10`
    /// sets the active code to G1 first, then this step claims the `X`.
    fn synthesize_motion(&mut self, params: &mut ParamSet,
                         slots: &mut Vec<Option<Command>>, line: &Arc<LineRef>)
                         -> Result<(), ErrType> {
        if !params.has_unclaimed() {
            return Ok(());
        }
        let kind = match self.active_motion {
            Some(kind) => kind,
            None => return Ok(()),
        };

        let mut cmd = Command::new(Category::G, kind.number(), Op::Motion(kind), line.clone());
        cmd.group = Some(ModalGroup::Motion);

        let mut has_axis = false;
        for &letter in &['x', 'y', 'z'] {
            has_axis |= cmd.claim(params, letter);
        }
        cmd.claim(params, 'a');
        cmd.claim(params, 'e');

        let mut has_center = true;
        if kind.is_arc() {
            has_center = false;
            for &letter in &['r', 'i', 'j', 'k'] {
                has_center |= cmd.claim(params, letter);
            }
        }

        if has_axis && has_center {
            if self.feed_mode == Some(FeedRateMode::InverseTime)
                && kind != MotionKind::Rapid
                && slots[SLOT_FEED].is_none()
            {
                return Err(ErrType::FeedWordMissing);
            }
            slots[SLOT_MOTION] = Some(cmd);
        } else {
            // Leftover words without a usable motion cancel the line's
            // motion command outright.
            slots[SLOT_MOTION] = None;
        }
        Ok(())
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}
