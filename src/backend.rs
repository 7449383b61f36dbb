use std::collections::HashMap;
use std::error::Error;
use std::io;

use lazy_static::lazy_static;

use crate::interp::Interpreter;
use crate::ir::Program;

/// An execution backend: consumes the instruction tree and runs it
/// against the process's standard streams.
pub trait Backend: Sync {
    fn run(&self, program: &Program) -> Result<(), Box<dyn Error>>;
}

/// Tree-walking reference backend; works on every platform.
pub struct InterpBackend;

impl Backend for InterpBackend {
    fn run(&self, program: &Program) -> Result<(), Box<dyn Error>> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut interp = Interpreter::new(stdin.lock(), stdout.lock());
        interp.run(program)?;
        Ok(())
    }
}

/// Compiles to native code and jumps into it. Executable memory
/// failures are fatal; the caller reports them and the run aborts.
#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
pub struct JitBackend;

#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
impl Backend for JitBackend {
    fn run(&self, program: &Program) -> Result<(), Box<dyn Error>> {
        use crate::codegen;
        use crate::interp::Tape;

        let mut buf = codegen::ExecutableBuffer::allocate(codegen::code_capacity(program))?;
        codegen::compile(program, &mut buf);
        buf.make_executable()?;

        let mut tape = Tape::new();
        unsafe { buf.invoke(tape.base_mut()) };
        Ok(())
    }
}

#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
pub const DEFAULT_BACKEND: &str = "jit";
#[cfg(not(all(target_arch = "x86_64", target_os = "linux")))]
pub const DEFAULT_BACKEND: &str = "interp";

lazy_static! {
    pub static ref BACKENDS: HashMap<&'static str, &'static dyn Backend> = {
        let mut m = HashMap::new();
        m.insert("interp", &InterpBackend as &dyn Backend);
        #[cfg(all(target_arch = "x86_64", target_os = "linux"))]
        m.insert("jit", &JitBackend as &dyn Backend);
        m
    };
}
