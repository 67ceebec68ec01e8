// Copyright (c) 2026 The ncsim developers.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! A library that turns G-code-like machine-control programs into
//! deterministic sequences of 3-D motion segments, for lathe, mill and
//! additive-manufacturing tool simulations.
//!
//! The pipeline has three stages: lines are tokenized and classified into
//! modal-grouped commands by `ncsim::parse`, a stateful interpreter from
//! `ncsim::eval` executes them into straight and circular motion segments,
//! and `ncsim::worker` wraps the whole run behind an isolated, cancellable
//! execution boundary that returns flat float buffers.
//!
//! Program errors never abort a run: offending lines and commands are
//! dropped, everything else still simulates, and the collected messages are
//! returned alongside the motion buffer.
//!
//! ## Basic usage
//!
//! ```rust
//! use ncsim::eval::{MachineKind, Point3};
//! use ncsim::worker::{run_program, MachineDesc};
//!
//! let machine = MachineDesc {
//!     kind: MachineKind::Mill,
//!     home1: Point3::default(),
//!     home2: Point3::default(),
//! };
//! let result = run_program(&machine, "G90\nG1 X10 Y0 Z0 F100");
//!
//! // One segment: origin to (10, 0, 0), six floats plus a kind tag per
//! // endpoint.
//! assert_eq!(result.positions.len(), 6);
//! assert_eq!(result.kinds, [1.0, 1.0]);
//! assert!(result.errors.is_empty());
//! ```
//!
//! For finer control (tool tables, inspecting machine state) drive
//! `parse::Parser` and `eval::Interpreter` directly.

pub mod ast;
pub mod error;
pub mod eval;
pub mod parse;
pub mod worker;

// internal helpers
pub(crate) mod util;
