use crate::ir::{Inst, Program};

/// Folds runs of identical move/arithmetic instructions into single
/// counted instructions, recursing into loop bodies. Read, Write and
/// Loop are never merged. Idempotent, and preserves instruction order,
/// so the optimized tree is observably equivalent to the input.
pub fn optimize(program: &Program) -> Program {
    Program {
        insts: fold(&program.insts),
    }
}

fn fold(insts: &[Inst]) -> Vec<Inst> {
    let mut out: Vec<Inst> = Vec::new();

    for inst in insts {
        let next = match inst {
            Inst::Loop(body) => Inst::Loop(fold(body)),
            other => other.clone(),
        };

        let merged = match (out.last_mut(), &next) {
            (Some(Inst::MoveRight(count)), Inst::MoveRight(n)) => {
                *count += n;
                true
            }
            (Some(Inst::MoveLeft(count)), Inst::MoveLeft(n)) => {
                *count += n;
                true
            }
            (Some(Inst::Add(count)), Inst::Add(n)) => {
                *count += n;
                true
            }
            (Some(Inst::Sub(count)), Inst::Sub(n)) => {
                *count += n;
                true
            }
            _ => false,
        };
        if !merged {
            out.push(next);
        }
    }

    out
}
