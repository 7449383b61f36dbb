//! x86_64 code generation for Linux.
//!
//! The generated routine receives the tape base address in `%rdi` and
//! keeps it there throughout; `,` and `.` are emitted as raw one-byte
//! read/write syscalls with `%rdi` as the buffer address. Loops use a
//! two-pass backpatch: the forward branch operand is reserved and zeroed
//! when the loop head is emitted, and filled in once the body length is
//! known; the backward branch target is already behind the cursor and is
//! written eagerly.

mod buffer;

pub use buffer::{ExecutableBuffer, MemoryError};

use static_assertions::assert_eq_size;

use crate::interp::Cell;
use crate::ir::{Inst, Program};

// The addl/subl cell updates and the `* 4` pointer scaling below encode
// 4-byte cells.
assert_eq_size!(cell_size_assert; Cell, u32);

pub const CELL_SIZE: usize = std::mem::size_of::<Cell>();

const SYS_READ: u32 = 0;
const SYS_WRITE: u32 = 1;
const STDIN: u32 = 0;
const STDOUT: u32 = 1;

// Emission size per instruction, used to size the buffer exactly.
const ADD_LEN: usize = 9;
const MOVE_LEN: usize = 10;
const WRITE_LEN: usize = 28;
const READ_LEN: usize = 39;
const LOOP_LEN: usize = 18; // head + tail, excluding the body
const RET_LEN: usize = 1;

/// Number of bytes [`compile`] will write for this program; allocate the
/// [`ExecutableBuffer`] with this capacity and emission cannot overflow.
pub fn code_capacity(program: &Program) -> usize {
    insts_len(&program.insts) + RET_LEN
}

fn insts_len(insts: &[Inst]) -> usize {
    insts
        .iter()
        .map(|inst| match inst {
            Inst::Add(_) | Inst::Sub(_) => ADD_LEN,
            Inst::MoveRight(_) | Inst::MoveLeft(_) => MOVE_LEN,
            Inst::Write => WRITE_LEN,
            Inst::Read => READ_LEN,
            Inst::Loop(body) => LOOP_LEN + insts_len(body),
        })
        .sum()
}

/// Compiles the whole tree into `buf`: an empty prologue (the calling
/// convention already has the tape base in `%rdi`), the instruction
/// emission, and a single `ret`.
pub fn compile(program: &Program, buf: &mut ExecutableBuffer) {
    let mut sites = Vec::new();
    emit(&program.insts, buf, &mut sites);
    debug_assert!(sites.is_empty());

    // retq
    buf.write(&[0xc3]);
}

fn emit(insts: &[Inst], buf: &mut ExecutableBuffer, sites: &mut Vec<usize>) {
    for inst in insts {
        match inst {
            Inst::Add(count) => {
                mov_rax_imm(buf, *count as u32);
                // addl %eax, (%rdi)
                buf.write(&[0x01, 0x07]);
            }
            Inst::Sub(count) => {
                mov_rax_imm(buf, *count as u32);
                // subl %eax, (%rdi)
                buf.write(&[0x29, 0x07]);
            }
            Inst::MoveRight(count) => {
                mov_rax_imm(buf, (count * CELL_SIZE) as u32);
                // addq %rax, %rdi
                buf.write(&[0x48, 0x01, 0xc7]);
            }
            Inst::MoveLeft(count) => {
                mov_rax_imm(buf, (count * CELL_SIZE) as u32);
                // subq %rax, %rdi
                buf.write(&[0x48, 0x29, 0xc7]);
            }
            Inst::Write => {
                syscall_one_byte(buf, SYS_WRITE, STDOUT);
            }
            Inst::Read => {
                syscall_one_byte(buf, SYS_READ, STDIN);
                // read() returned zero bytes: end of input, and the
                // whole program halts by returning to the host. The
                // stack is balanced here, so a bare ret is safe.
                // testq %rax, %rax; jne +1; retq
                buf.write(&[0x48, 0x85, 0xc0, 0x75, 0x01, 0xc3]);
                // The syscall filled only the low byte of the cell;
                // zero-extend so the cell holds exactly the input byte,
                // as the interpreter does.
                // movzbl (%rdi), %eax; movl %eax, (%rdi)
                buf.write(&[0x0f, 0xb6, 0x07, 0x89, 0x07]);
            }
            Inst::Loop(body) => {
                // cmpl $0, (%rdi); je <end of loop> with the 4-byte
                // operand reserved and zeroed; the position after the
                // operand is the backpatch site.
                buf.write(&[0x83, 0x3f, 0x00, 0x0f, 0x84]);
                buf.write_u32(0);
                sites.push(buf.position());

                emit(body, buf, sites);

                let site = sites.pop().unwrap();

                // cmpl $0, (%rdi); jne <body start>. The target is
                // behind the cursor, so the offset is known: it lands
                // on the first body instruction, right after the site.
                buf.write(&[0x83, 0x3f, 0x00, 0x0f, 0x85]);
                let back = site as i64 - buf.position() as i64 - 4;
                buf.write_u32(back as u32);

                // Fill the reserved forward operand with the distance
                // past the backward jump, then restore the cursor.
                let end = buf.position();
                let forward = end as i64 - site as i64;
                buf.seek(site - 4);
                buf.write_u32(forward as u32);
                buf.seek(end);
            }
        }
    }
}

// movq $imm32, %rax (sign-extended; counts stay well below 2^31)
fn mov_rax_imm(buf: &mut ExecutableBuffer, imm: u32) {
    buf.write(&[0x48, 0xc7, 0xc0]);
    buf.write_u32(imm);
}

// pushq %rdi
// movq $nr, %rax
// movq %rdi, %rsi    (buffer = current cell)
// movq $fd, %rdi
// movq $1, %rdx      (one byte)
// syscall
// popq %rdi
fn syscall_one_byte(buf: &mut ExecutableBuffer, nr: u32, fd: u32) {
    buf.write(&[0x57]);
    mov_rax_imm(buf, nr);
    buf.write(&[0x48, 0x89, 0xfe]);
    buf.write(&[0x48, 0xc7, 0xc7]);
    buf.write_u32(fd);
    buf.write(&[0x48, 0xc7, 0xc2]);
    buf.write_u32(1);
    buf.write(&[0x0f, 0x05]);
    buf.write(&[0x5f]);
}
