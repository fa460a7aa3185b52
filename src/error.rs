use std::io;

use crate::constants::STACK_DEPTH;

/// Errors surfaced by the machine to whoever is driving it
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("stack overflow: more than {depth} nested subroutine calls")]
    StackOverflow { depth: usize },

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("unknown instruction {0:#06X}")]
    UnknownInstruction(u16),

    #[error("machine is blocked waiting for a key press")]
    Blocked,

    #[error("unable to read program: {0}")]
    LoadIo(#[from] io::Error),
}

impl Error {
    pub(crate) fn stack_overflow() -> Self {
        Error::StackOverflow { depth: STACK_DEPTH }
    }
}
