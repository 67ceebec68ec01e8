// Copyright (c) 2026 The ncsim developers.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use std::{env, fs};
use itertools::Itertools;
use ncsim::eval::{MachineKind, Point3};
use ncsim::worker::{run_program, MachineDesc};

fn main() {
    env_logger::init();
    let filename = env::args().nth(1).expect("file name required");
    let kind = match env::args().nth(2) {
        Some(arg) => arg.parse().expect("machine kind: Lathe, Mill or '3D Printer'"),
        None => MachineKind::Mill,
    };
    let input = fs::read_to_string(&filename).unwrap();

    let machine = MachineDesc {
        kind,
        home1: Point3::default(),
        home2: Point3::default(),
    };
    let result = run_program(&machine, &input);

    for (pos, kinds) in result.positions.chunks(6).zip(result.kinds.chunks(2)) {
        println!("G{} ({:.3}, {:.3}, {:.3}) -> ({:.3}, {:.3}, {:.3})",
                 kinds[0], pos[0], pos[1], pos[2], pos[3], pos[4], pos[5]);
    }
    if !result.errors.is_empty() {
        eprintln!("{}", result.errors.iter().join("\n"));
    }
}
