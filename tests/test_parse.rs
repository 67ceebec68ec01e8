// Copyright (c) 2026 The ncsim developers.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use ncsim::ast::{Axis, Category, Command, GenWord, MotionKind, Offset, Op, Plane};
use ncsim::error::{ErrorKind, SimError};
use ncsim::parse::{clean_line, tokenize_line, Parser};

fn parse_all(code: &str) -> (Vec<Command>, Vec<SimError>) {
    let mut parser = Parser::new();
    let errors = parser.parse_code(code);
    let mut cmds = Vec::new();
    while let Some(cmd) = parser.next_command() {
        cmds.push(cmd);
    }
    (cmds, errors)
}

#[test]
fn test_clean_line() {
    let cleaned = clean_line("N10 G1 X10 (first move) Y-2.5 ; trailing");
    assert_eq!(cleaned.text, "n10g1x10y-2.5");
    assert_eq!(cleaned.paren_comments, vec!["first move".to_string()]);
    assert_eq!(cleaned.line_comment.as_deref(), Some(" trailing"));
    assert!(!cleaned.unclosed);

    // Cleaning is idempotent: no comment markers survive the first pass.
    let again = clean_line(&cleaned.text);
    assert_eq!(again.text, cleaned.text);
    assert!(again.paren_comments.is_empty());
    assert!(again.line_comment.is_none());

    assert!(clean_line("g1 (never closed").unclosed);
}

#[test]
fn test_tokenize() {
    let words = tokenize_line("g1x10y-2.5z.5").unwrap();
    assert_eq!(words, vec![
        ('g', Some(1.0)),
        ('x', Some(10.0)),
        ('y', Some(-2.5)),
        ('z', Some(0.5)),
    ]);

    // Dotted G/M codes get a unique integer identity.
    assert_eq!(tokenize_line("g17.1").unwrap(), vec![('g', Some(171.0))]);
    assert_eq!(tokenize_line("g2.5").unwrap(), vec![('g', Some(25.0))]);

    // A letter without digits is reported with a missing value.
    let words = tokenize_line("g1p").unwrap();
    assert_eq!(words[1], ('p', None));

    // Stray symbols do not lex at all.
    assert!(tokenize_line("%").is_err());
}

#[test]
fn test_absolute_linear_line() {
    let (cmds, errors) = parse_all("G90\nG1 X10 Y0 Z0 F100");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 3);
    assert_eq!(cmds[0].op, Op::SetDistance(ncsim::ast::Distance::Absolute));
    assert_eq!(cmds[1].category, Category::Feed);
    assert_eq!(cmds[1].params.word(GenWord::F), Some(100.0));
    assert_eq!(cmds[2].op, Op::Motion(MotionKind::Linear));
    assert_eq!(cmds[2].params.axis(Axis::X), Some(10.0));
    assert_eq!(cmds[2].line.lineno, 2);
}

#[test]
fn test_modal_carry_over() {
    let (cmds, errors) = parse_all("g1 x10\ny5");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 2);
    assert_eq!(cmds[0].op, Op::Motion(MotionKind::Linear));
    // The second line reuses the active motion code.
    assert_eq!(cmds[1].op, Op::Motion(MotionKind::Linear));
    assert_eq!(cmds[1].line.lineno, 2);
    assert_eq!(cmds[1].params.axis(Axis::Y), Some(5.0));
    assert_eq!(cmds[1].params.axis(Axis::X), None);
}

#[test]
fn test_priority_order() {
    // One line, emission follows the slot table: F, plane, motion.
    let (cmds, errors) = parse_all("g1 g17 x5 f100");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 3);
    assert_eq!(cmds[0].category, Category::Feed);
    assert_eq!(cmds[1].op, Op::SelectPlane(Plane::XY));
    assert_eq!(cmds[2].op, Op::Motion(MotionKind::Linear));
}

#[test]
fn test_same_slot_last_wins() {
    let (cmds, errors) = parse_all("g17 g18");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0].op, Op::SelectPlane(Plane::XZ));
}

#[test]
fn test_missing_required_words() {
    for code in &["g4", "g41", "g42", "g43", "g10", "g10 l2", "g92", "g4 p-1"] {
        let (cmds, errors) = parse_all(code);
        assert!(cmds.is_empty(), "{} must not classify", code);
        assert_eq!(errors.len(), 1, "{} must error once", code);
        assert_eq!(errors[0].kind(), ErrorKind::Classify, "{}", code);
        assert_eq!(errors[0].lineno, 1);
    }
}

#[test]
fn test_error_recovery_continues() {
    // A malformed line drops out, the rest of the program still parses.
    let (cmds, errors) = parse_all("g4\ng0 x1");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].lineno, 1);
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0].op, Op::Motion(MotionKind::Rapid));
    assert_eq!(cmds[0].line.lineno, 2);
}

#[test]
fn test_malformed_word_rejected() {
    for code in &["g1 x", "g", "x5 y"] {
        let (cmds, errors) = parse_all(code);
        assert!(cmds.is_empty(), "{}", code);
        assert_eq!(errors.len(), 1, "{}", code);
        assert_eq!(errors[0].kind(), ErrorKind::Lex, "{}", code);
    }
}

#[test]
fn test_inverse_time_requires_feed() {
    let (cmds, errors) = parse_all("g93\ng1 x5");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::Classify);
    assert_eq!(errors[0].lineno, 2);
    // Only the G93 made it through.
    assert_eq!(cmds.len(), 1);

    // With the F word on the same line everything classifies.
    let (cmds, errors) = parse_all("g93\ng1 x5 f0.5");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 3);

    // Rapid motion is exempt.
    let (cmds, errors) = parse_all("g93\ng0 x5");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 2);
}

#[test]
fn test_arc_words_required_for_implicit_arc() {
    // An arc with center offsets classifies.
    let (cmds, errors) = parse_all("g2 x5 y0 i3 j0");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0].op, Op::Motion(MotionKind::CwArc));
    assert_eq!(cmds[0].params.offset(Offset::I), Some(3.0));

    // Without any of R/I/J/K the line's motion is cancelled, not an error.
    let (cmds, errors) = parse_all("g1 x0\ng2 x5 y0");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0].line.lineno, 1);
}

#[test]
fn test_leftover_without_axis_cancels_motion() {
    // Line 2 has only a non-axis word: no motion, no error.
    let (cmds, errors) = parse_all("g1 x1\nq5");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 1);
}

#[test]
fn test_unsupported_codes_are_sentinels() {
    let (cmds, errors) = parse_all("g33\nm42");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 2);
    assert!(cmds.iter().all(|c| c.op == Op::Unsupported && c.number == 9999));
}

#[test]
fn test_comments_and_line_numbers_ignored() {
    let (cmds, errors) = parse_all("n20 g0 (rapid) x5 ; to the start");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0].op, Op::Motion(MotionKind::Rapid));
    assert_eq!(cmds[0].params.axis(Axis::X), Some(5.0));
}

#[test]
fn test_g10_claims_its_words() {
    let (cmds, errors) = parse_all("g10 l2 p1 x5 r2");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0].op, Op::SetTable);
    assert_eq!(cmds[0].params.word(GenWord::L), Some(2.0));
    assert_eq!(cmds[0].params.word(GenWord::P), Some(1.0));
    assert_eq!(cmds[0].params.word(GenWord::R), Some(2.0));
    assert_eq!(cmds[0].params.axis(Axis::X), Some(5.0));
}

#[test]
fn test_feed_and_spindle_words() {
    let (cmds, errors) = parse_all("f120 s500");
    assert!(errors.is_empty());
    assert_eq!(cmds.len(), 2);
    assert_eq!(cmds[0].category, Category::Feed);
    assert_eq!(cmds[0].params.word(GenWord::F), Some(120.0));
    assert_eq!(cmds[1].category, Category::Spindle);
    assert_eq!(cmds[1].params.word(GenWord::S), Some(500.0));
}
