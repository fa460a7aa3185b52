//! A fetch-decode-execute interpreter for the CHIP-8 virtual machine.
//!
//! The `Machine` owns registers, memory, the call stack, timers and a `FrameBuffer`.
//! Something outside drives it: load a program, call `step` a few hundred times a
//! second, `tick_timers` at 60Hz, and forward key presses through a `KeySurface`.

pub use error::Error;
pub use frame_buffer::FrameBuffer;
pub use instruction::Instruction;
pub use keys::{KeyListener, KeySurface, Keypad, ListenerId};
pub use machine::{Loaded, Machine, SharedMachine};
pub use random::{EntropyRandom, RandomSource, ReplayRandom};

pub mod constants;
mod error;
mod frame_buffer;
mod instruction;
mod keys;
mod machine;
mod opcode;
mod operations;
mod random;
pub mod state;
