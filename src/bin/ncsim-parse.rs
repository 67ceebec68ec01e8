// Copyright (c) 2026 The ncsim developers.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use std::{env, fs};
use ncsim::parse::Parser;

fn main() {
    env_logger::init();
    let filename = env::args().nth(1).expect("file name required");
    let input = fs::read_to_string(&filename).unwrap();

    let mut parser = Parser::new();
    for err in parser.parse_code(&input) {
        eprintln!("{}", err);
    }
    while let Some(cmd) = parser.next_command() {
        println!("{}", cmd);
    }
}
