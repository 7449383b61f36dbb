use std::error::Error;
use std::fmt;
use std::mem;

use unicode_width::UnicodeWidthStr;

use crate::ir::{Inst, Program};
use crate::token::{tokenize, Token};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Reached end of input with at least one loop still open.
    UnmatchedOpenBracket,
    /// Found a `]` with no loop open.
    UnmatchedCloseBracket,
}
use ParseErrorKind::*;

#[derive(Debug)]
pub struct ParseError {
    kind: ParseErrorKind,
    line: Vec<u8>,
    linenum: usize,
    offset: usize,
}

impl ParseError {
    fn new(kind: ParseErrorKind, code: &[u8], i: usize) -> Self {
        let (line, linenum, offset) = find_line(code, i);
        Self {
            kind,
            line: line.into(),
            linenum,
            offset,
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let line = String::from_utf8_lossy(&self.line);
        let width = UnicodeWidthStr::width(&line[0..self.offset.min(line.len())]);

        match self.kind {
            UnmatchedOpenBracket => {
                writeln!(f, "reached end of input with unterminated loop")?;
                writeln!(f, "loop started at {}:{}", self.linenum, self.offset)?;
            }
            UnmatchedCloseBracket => {
                writeln!(
                    f,
                    "] found at {}:{} when not in a loop",
                    self.linenum, self.offset
                )?;
            }
        };

        writeln!(f, "{}", line)?;
        write!(f, "{}^", " ".repeat(width))?;

        Ok(())
    }
}

impl Error for ParseError {}

/// Parses brainfuck source to an instruction tree, validating bracket
/// balance. No optimization is applied; every node has count 1.
pub fn parse(code: &[u8]) -> Result<Program, ParseError> {
    // Stack of sibling lists for the loops currently open, each with the
    // offset of its [ for diagnostics. `insts` is the innermost scope.
    let mut stack: Vec<(usize, Vec<Inst>)> = Vec::new();
    let mut insts = Vec::new();

    for (i, token) in tokenize(code) {
        match token {
            Token::Right => insts.push(Inst::MoveRight(1)),
            Token::Left => insts.push(Inst::MoveLeft(1)),
            Token::Inc => insts.push(Inst::Add(1)),
            Token::Dec => insts.push(Inst::Sub(1)),
            Token::Output => insts.push(Inst::Write),
            Token::Input => insts.push(Inst::Read),
            Token::LoopStart => {
                stack.push((i, mem::replace(&mut insts, Vec::new())));
            }
            Token::LoopEnd => match stack.pop() {
                Some((_, outer)) => {
                    let body = mem::replace(&mut insts, outer);
                    insts.push(Inst::Loop(body));
                }
                None => return Err(ParseError::new(UnmatchedCloseBracket, code, i)),
            },
        }
    }

    if let Some((i, _)) = stack.pop() {
        Err(ParseError::new(UnmatchedOpenBracket, code, i))
    } else {
        Ok(Program { insts })
    }
}

fn find_line(code: &[u8], i: usize) -> (&[u8], usize, usize) {
    let offset = code[0..i].iter().rev().take_while(|x| **x != b'\n').count();
    let end = i + code[i..].iter().take_while(|x| **x != b'\n').count();
    let linenum = code[0..(i - offset)]
        .iter()
        .filter(|x| **x == b'\n')
        .count();
    (&code[(i - offset)..end], linenum, offset)
}
