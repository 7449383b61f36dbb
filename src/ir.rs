use std::fmt;

/// A node of the instruction tree. Counted variants carry a positive
/// repeat count; the parser always produces count 1 and the optimizer
/// folds runs into larger counts.
#[derive(Clone, PartialEq, Eq)]
pub enum Inst {
    MoveRight(usize),
    MoveLeft(usize),
    Add(usize),
    Sub(usize),
    Read,
    Write,
    Loop(Vec<Inst>),
}

impl fmt::Debug for Inst {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Inst::MoveRight(count) => write!(f, "MoveRight(count={})", count),
            Inst::MoveLeft(count) => write!(f, "MoveLeft(count={})", count),
            Inst::Add(count) => write!(f, "Add(count={})", count),
            Inst::Sub(count) => write!(f, "Sub(count={})", count),
            Inst::Read => write!(f, "Read"),
            Inst::Write => write!(f, "Write"),
            Inst::Loop(ref body) => {
                if f.alternate() {
                    write!(f, "Loop(body={:#?})", body)
                } else {
                    write!(f, "Loop(body={:?})", body)
                }
            }
        }
    }
}

/// Root of the instruction tree produced by the parser.
#[derive(Clone, PartialEq, Eq)]
pub struct Program {
    pub insts: Vec<Inst>,
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.insts.fmt(f)
    }
}
