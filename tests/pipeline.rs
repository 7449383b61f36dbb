use bfjit::{optimize, parse, Cell, Interpreter};

fn interp_run(source: &[u8], input: &[u8]) -> (Vec<u8>, Vec<Cell>) {
    let program = optimize(&parse(source).unwrap());
    let mut output = Vec::new();
    let mut interp = Interpreter::new(input, &mut output);
    interp.run(&program).unwrap();
    let cells = interp.tape().cells().to_vec();
    (output, cells)
}

const HELLO_WORLD: &[u8] = b"++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]\
                             >>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

#[test]
fn hello_world() {
    let (output, _) = interp_run(HELLO_WORLD, b"");
    assert_eq!(output, b"Hello World!\n");
}

#[test]
fn optimization_preserves_output() {
    let program = parse(HELLO_WORLD).unwrap();
    let optimized = optimize(&program);

    let mut raw_out = Vec::new();
    Interpreter::new(&b""[..], &mut raw_out).run(&program).unwrap();
    let mut opt_out = Vec::new();
    Interpreter::new(&b""[..], &mut opt_out).run(&optimized).unwrap();

    assert_eq!(raw_out, opt_out);
}

#[test]
fn cat_until_end_of_input() {
    let (output, _) = interp_run(b",[.,]", b"hello");
    assert_eq!(output, b"hello");
}

#[test]
fn end_of_input_stops_everything() {
    // After input runs dry mid-loop, nothing later in the program may
    // execute; the trailing writes must not appear in the output.
    let (output, cells) = interp_run(b"+[,.]>+++.", b"ab");
    assert_eq!(output, b"ab");
    assert_eq!(cells[1], 0);
}

#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
mod jit {
    use bfjit::codegen::{code_capacity, compile, ExecutableBuffer};
    use bfjit::{optimize, parse, Cell, Interpreter, Tape};

    fn jit_tape(source: &[u8]) -> Vec<Cell> {
        let program = optimize(&parse(source).unwrap());
        let mut buf = ExecutableBuffer::allocate(code_capacity(&program)).unwrap();
        compile(&program, &mut buf);
        buf.make_executable().unwrap();

        let mut tape = Tape::new();
        unsafe { buf.invoke(tape.base_mut()) };
        tape.cells().to_vec()
    }

    fn interp_tape(source: &[u8]) -> Vec<Cell> {
        let program = optimize(&parse(source).unwrap());
        let mut output = Vec::new();
        let mut interp = Interpreter::new(&b""[..], &mut output);
        interp.run(&program).unwrap();
        interp.tape().cells().to_vec()
    }

    #[test]
    fn multiply_loop_matches_interpreter() {
        let source = b"++++++[>++++++++<-]>+";
        assert_eq!(jit_tape(source), interp_tape(source));
        assert_eq!(jit_tape(source)[1], 49);
    }

    #[test]
    fn clear_loop_zeroes_cell() {
        let tape = jit_tape(b"+++++[-]");
        assert_eq!(tape[0], 0);
    }

    #[test]
    fn loop_skipped_when_cell_zero() {
        let tape = jit_tape(b"[+>+<]>>+");
        assert_eq!(tape[0], 0);
        assert_eq!(tape[1], 0);
        assert_eq!(tape[2], 1);
    }

    #[test]
    fn nested_loops_match_interpreter() {
        // The cell setup phase of hello world: nested loops, a [<]
        // scan, and pointer travel in both directions.
        let source = b"++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]";
        assert_eq!(jit_tape(source), interp_tape(source));
    }

    #[test]
    fn folded_and_unfolded_trees_agree() {
        let source = b"+++++[>+++++<-]";
        let program = parse(source).unwrap();

        let mut buf = ExecutableBuffer::allocate(code_capacity(&program)).unwrap();
        compile(&program, &mut buf);
        buf.make_executable().unwrap();
        let mut tape = Tape::new();
        unsafe { buf.invoke(tape.base_mut()) };

        assert_eq!(tape.cells(), &jit_tape(source)[..]);
    }

    #[test]
    fn cell_arithmetic_wraps() {
        let tape = jit_tape(b"-");
        assert_eq!(tape[0], Cell::max_value());
    }
}
