// Copyright (c) 2026 The ncsim developers.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use ncsim::eval::{MachineKind, Point3};
use ncsim::worker::{run_program, MachineDesc, Request, Worker};

fn mill() -> MachineDesc {
    MachineDesc {
        kind: MachineKind::Mill,
        home1: Point3::default(),
        home2: Point3::default(),
    }
}

#[test]
fn test_buffer_layout() {
    let result = run_program(&mill(), "G1 X10 Y0 Z0 F100\nG0 X0");
    assert!(result.errors.is_empty());
    assert_eq!(result.segment_count(), 2);
    assert_eq!(result.positions.len(), 12);
    assert_eq!(result.kinds.len(), 4);

    // Six floats per segment, start then end.
    assert_eq!(&result.positions[..6], &[0.0, 0.0, 0.0, 10.0, 0.0, 0.0]);
    assert_eq!(&result.positions[6..], &[10.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    // The kind tag is duplicated per endpoint.
    assert_eq!(result.kinds, [1.0, 1.0, 0.0, 0.0]);
}

#[test]
fn test_errors_do_not_abort_the_run() {
    let result = run_program(&mill(), "G4\nG1 X5 F10\nG2 X50 Y0 R1");
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors[0].starts_with("Error on line 1"));
    assert!(result.errors[1].starts_with("Error on line 3"));
    // The healthy middle line still produced its segment.
    assert_eq!(result.segment_count(), 1);
}

#[test]
fn test_empty_and_hopeless_programs() {
    let result = run_program(&mill(), "");
    assert_eq!(result.segment_count(), 0);
    assert!(result.errors.is_empty());

    // A run that is entirely malformed still returns a buffer.
    let result = run_program(&mill(), "g\ng\ng");
    assert_eq!(result.segment_count(), 0);
    assert_eq!(result.errors.len(), 3);
}

#[test]
fn test_worker_lifecycle() {
    let mut worker = Worker::new();
    assert!(!worker.is_busy());
    assert!(worker.recv().is_none());

    let request = Request { machine: mill(), code: "G1 X1 F10".into() };
    worker.submit(request.clone()).unwrap();
    assert!(worker.is_busy());

    // Only one run may be in flight.
    assert!(worker.submit(request).is_err());

    let result = worker.recv().expect("run result");
    assert!(!worker.is_busy());
    assert_eq!(result.segment_count(), 1);
    assert!(result.errors.is_empty());
}

#[test]
fn test_worker_cancel_and_reuse() {
    let mut worker = Worker::new();
    worker.submit(Request { machine: mill(), code: "G1 X1 F10".into() }).unwrap();

    // Cancelling unconditionally clears the busy flag and replaces the
    // context; the cancelled run's response can never be observed.
    worker.cancel();
    assert!(!worker.is_busy());
    assert!(worker.poll().is_none());

    worker.submit(Request { machine: mill(), code: "G0 X3".into() }).unwrap();
    let result = worker.recv().expect("fresh context runs fine");
    assert_eq!(result.segment_count(), 1);
    assert_eq!(result.kinds, [0.0, 0.0]);
}
