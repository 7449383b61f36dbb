use std::io::{self, Read, Write};

use crate::ir::{Inst, Program};

/// One tape cell. The JIT's emitted immediates assume this exact width,
/// which codegen asserts at compile time.
pub type Cell = u32;

pub const TAPE_SIZE: usize = 30_000;

/// The machine's linear memory: TAPE_SIZE cells and a pointer starting
/// at index 0. Cell arithmetic wraps. Pointer movement is unchecked by
/// the language; moving outside the tape panics here rather than being
/// undefined.
pub struct Tape {
    cells: Box<[Cell]>,
    ptr: usize,
}

impl Tape {
    pub fn new() -> Self {
        Self {
            cells: vec![0; TAPE_SIZE].into_boxed_slice(),
            ptr: 0,
        }
    }

    pub fn right(&mut self, count: usize) {
        self.ptr += count;
    }

    pub fn left(&mut self, count: usize) {
        self.ptr = self
            .ptr
            .checked_sub(count)
            .expect("tape pointer moved left of cell zero");
    }

    pub fn add(&mut self, count: usize) {
        self.cells[self.ptr] = self.cells[self.ptr].wrapping_add(count as Cell);
    }

    pub fn sub(&mut self, count: usize) {
        self.cells[self.ptr] = self.cells[self.ptr].wrapping_sub(count as Cell);
    }

    pub fn get(&self) -> Cell {
        self.cells[self.ptr]
    }

    pub fn set(&mut self, value: Cell) {
        self.cells[self.ptr] = value;
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Base address for the JIT calling convention; the generated
    /// routine keeps this in its tape-pointer register.
    pub fn base_mut(&mut self) -> *mut Cell {
        self.cells.as_mut_ptr()
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether execution runs on to the next instruction or the whole
/// program halts (end of input on Read).
enum Flow {
    Continue,
    Halt,
}

/// Tree-walking evaluator; the reference semantics the compiled backend
/// must match byte for byte.
pub struct Interpreter<R: Read, W: Write> {
    tape: Tape,
    input: R,
    output: W,
}

impl<R: Read, W: Write> Interpreter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            tape: Tape::new(),
            input,
            output,
        }
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn tape_mut(&mut self) -> &mut Tape {
        &mut self.tape
    }

    /// Runs the program to completion. End of input on a Read halts the
    /// whole program and still returns Ok.
    pub fn run(&mut self, program: &Program) -> io::Result<()> {
        self.exec(&program.insts)?;
        Ok(())
    }

    fn exec(&mut self, insts: &[Inst]) -> io::Result<Flow> {
        for inst in insts {
            match *inst {
                Inst::MoveRight(count) => self.tape.right(count),
                Inst::MoveLeft(count) => self.tape.left(count),
                Inst::Add(count) => self.tape.add(count),
                Inst::Sub(count) => self.tape.sub(count),
                Inst::Read => match self.read_byte()? {
                    Some(byte) => self.tape.set(byte as Cell),
                    // End of input halts the entire program, not just
                    // the enclosing loop.
                    None => return Ok(Flow::Halt),
                },
                Inst::Write => {
                    // One byte at a time, flushed immediately, so the
                    // output interleaves correctly with blocking reads.
                    self.output.write_all(&[self.tape.get() as u8])?;
                    self.output.flush()?;
                }
                Inst::Loop(ref body) => {
                    while self.tape.get() != 0 {
                        if let Flow::Halt = self.exec(body)? {
                            return Ok(Flow::Halt);
                        }
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::optimize;
    use crate::parser::parse;

    fn run(source: &[u8], input: &[u8]) -> (Vec<u8>, Vec<Cell>) {
        let program = optimize(&parse(source).unwrap());
        let mut output = Vec::new();
        let mut interp = Interpreter::new(input, &mut output);
        interp.run(&program).unwrap();
        let cells = interp.tape().cells().to_vec();
        (output, cells)
    }

    #[test]
    fn add_then_write() {
        let (output, _) = run(b"+++.", b"");
        assert_eq!(output, vec![3]);
    }

    #[test]
    fn echo_one_byte() {
        let (output, _) = run(b",.", b"\x41");
        assert_eq!(output, vec![0x41]);
    }

    #[test]
    fn clear_loop() {
        let (output, cells) = run(b"+++++[-]", b"");
        assert!(output.is_empty());
        assert_eq!(cells[0], 0);
    }

    #[test]
    fn loop_runs_initial_value_times() {
        // Cell 0 counts down from 5; cell 1 counts the iterations.
        let (_, cells) = run(b"+++++[>+<-]", b"");
        assert_eq!(cells[0], 0);
        assert_eq!(cells[1], 5);
    }

    #[test]
    fn loop_skipped_when_zero() {
        let (output, cells) = run(b"[.+]", b"");
        assert!(output.is_empty());
        assert_eq!(cells[0], 0);
    }

    #[test]
    fn cell_arithmetic_wraps() {
        let (_, cells) = run(b"-", b"");
        assert_eq!(cells[0], Cell::max_value());
    }

    #[test]
    fn end_of_input_halts_whole_program() {
        // The trailing +. must never run, even from inside the loop.
        let (output, cells) = run(b"+[,.]+++.", b"");
        assert!(output.is_empty());
        assert_eq!(cells[0], 1);
    }

    #[test]
    fn end_of_input_after_some_bytes() {
        let (output, _) = run(b",.,.,.", b"hi");
        assert_eq!(output, b"hi");
    }

    #[test]
    fn hello_world() {
        let source = b"++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]\
                       >>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
        let (output, _) = run(source, b"");
        assert_eq!(output, b"Hello World!\n");
    }

    #[test]
    #[should_panic(expected = "left of cell zero")]
    fn moving_left_of_cell_zero_panics() {
        run(b"<", b"");
    }
}
