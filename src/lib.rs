mod token;
mod parser;
mod ir;
mod optimizer;
mod interp;
mod backend;
#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
pub mod codegen;

pub use backend::{Backend, InterpBackend, BACKENDS, DEFAULT_BACKEND};
#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
pub use backend::JitBackend;
pub use interp::{Cell, Interpreter, Tape, TAPE_SIZE};
pub use ir::{Inst, Program};
pub use optimizer::optimize;
pub use parser::{parse, ParseError, ParseErrorKind};
pub use token::{tokenize, Token};
