// Copyright (c) 2026 The ncsim developers.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! The execution boundary.
//!
//! [`run_program`] is the synchronous core: one fresh parser and interpreter
//! per call, parse-then-execute to completion or first halt, and the segment
//! buffer flattened into plain float arrays.  [`Worker`] wraps it in an
//! isolated background context with an asynchronous request/response pair
//! and hard, replace-the-context cancellation.

use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;

use itertools::Itertools;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::eval::{Interpreter, MachineKind, Point3};
use crate::parse::Parser;

/// Description of the machine a program runs on, supplied wholesale per run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MachineDesc {
    pub kind: MachineKind,
    /// Initial tool position, also the G28 reference.
    pub home1: Point3,
    /// The G30 reference position.
    pub home2: Point3,
}

/// One simulation request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request {
    pub machine: MachineDesc,
    pub code: String,
}

/// The flat result buffer of one run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MotionBuffer {
    /// Six values per segment: x0 y0 z0 x1 y1 z1.
    pub positions: Vec<f32>,
    /// Two values per segment: the motion kind tag (0-3), once per endpoint
    /// for downstream per-vertex coloring.
    pub kinds: Vec<f32>,
    /// Human-readable error messages, classification errors first.
    pub errors: Vec<String>,
}

impl MotionBuffer {
    pub fn segment_count(&self) -> usize {
        self.positions.len() / 6
    }
}

/// Runs a program against a fresh parser and interpreter and serializes the
/// result.  Errors never abort the run: a fully malformed program still
/// yields an (empty) buffer plus its error list.
pub fn run_program(machine: &MachineDesc, code: &str) -> MotionBuffer {
    let mut parser = Parser::new();
    let mut interp = Interpreter::new(machine.kind, machine.home1, machine.home2);

    let mut errors = parser.parse_code(code).iter()
        .map(|e| e.to_string())
        .collect_vec();
    while let Some(cmd) = parser.next_command() {
        if let Err(e) = interp.execute(cmd) {
            errors.push(e.to_string());
        }
    }

    let segments = interp.take_segments();
    debug!("run finished: {} segments, {} errors", segments.len(), errors.len());

    let mut positions = Vec::with_capacity(segments.len() * 6);
    let mut kinds = Vec::with_capacity(segments.len() * 2);
    for segment in &segments {
        positions.push(segment.start.x as f32);
        positions.push(segment.start.y as f32);
        positions.push(segment.start.z as f32);
        positions.push(segment.end.x as f32);
        positions.push(segment.end.y as f32);
        positions.push(segment.end.z as f32);
        let tag = f32::from(segment.kind.number() as u8);
        kinds.push(tag);
        kinds.push(tag);
    }
    MotionBuffer { positions, kinds, errors }
}

/// The worker refused a request because one is already in flight.
#[derive(Debug, PartialEq, Eq)]
pub struct WorkerBusy;

impl fmt::Display for WorkerBusy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a simulation run is already in flight")
    }
}

impl std::error::Error for WorkerBusy {}

/// Handle to an isolated execution context that owns one parser/interpreter
/// pair per run.
///
/// At most one run is active at a time; `submit` refuses while the busy
/// flag is set, and the flag clears unconditionally on completion or
/// cancellation.  Cancellation replaces the whole context: the abandoned
/// run's response can never be observed and the next run starts from
/// freshly constructed state.
pub struct Worker {
    requests: Sender<Request>,
    responses: Receiver<MotionBuffer>,
    busy: bool,
}

impl Worker {
    pub fn new() -> Self {
        let (req_tx, req_rx) = channel::<Request>();
        let (res_tx, res_rx) = channel();
        thread::spawn(move || {
            while let Ok(request) = req_rx.recv() {
                let result = run_program(&request.machine, &request.code);
                if res_tx.send(result).is_err() {
                    // Cancelled while running; nobody is listening anymore.
                    break;
                }
            }
        });
        Worker { requests: req_tx, responses: res_rx, busy: false }
    }

    /// Queues a run.  Fails while a previous run is still pending.
    pub fn submit(&mut self, request: Request) -> Result<(), WorkerBusy> {
        if self.busy {
            return Err(WorkerBusy);
        }
        if let Err(returned) = self.requests.send(request) {
            // The context died (e.g. a panicking run); replace it and retry.
            warn!("execution context lost, constructing a fresh one");
            *self = Worker::new();
            let _ = self.requests.send(returned.0);
        }
        self.busy = true;
        Ok(())
    }

    /// Non-blocking check for the pending run's result.
    pub fn poll(&mut self) -> Option<MotionBuffer> {
        match self.responses.try_recv() {
            Ok(result) => {
                self.busy = false;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.busy = false;
                None
            }
        }
    }

    /// Blocks until the pending run completes.  Returns `None` when no run
    /// is pending or the context died.
    pub fn recv(&mut self) -> Option<MotionBuffer> {
        if !self.busy {
            return None;
        }
        let result = self.responses.recv().ok();
        self.busy = false;
        result
    }

    /// Cancels the pending run, if any, by replacing the execution context
    /// wholesale.  A cancelled run produces no response and leaves no
    /// residual state behind.
    pub fn cancel(&mut self) {
        *self = Worker::new();
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

impl Default for Worker {
    fn default() -> Self {
        Worker::new()
    }
}
