use crate::constants::{
    ADDRESS_MASK, MEMORY_SIZE, PROGRAM_START, REGISTER_COUNT, SPRITE_SHEET, STACK_DEPTH,
};
use crate::frame_buffer::FrameBuffer;

/// A snapshot of the machine's internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - VF is also written as the carry/borrow/collision flag
/// - (i) a 12-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter, starting at 0x200
///
/// Pointer
/// - (sp) index of the next free stack slot, always within `0..=STACK_DEPTH`
///
/// Timers
/// - 2 8-bit timers (delay & sound), counted down by the driver at 60Hz
///
/// ## Memory
/// - a 32 entry stack of return addresses
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the hexadecimal sprite sheet
///     - programs live from 0x200 upwards
/// - a 64x32 frame buffer
///
/// ## Input
/// - Execution halts while `register_needing_key` is Some, until a key's value is written to it
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub sp: usize,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_DEPTH],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub register_needing_key: Option<usize>,
}

impl State {
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_DEPTH],
            memory,
            frame_buffer: FrameBuffer::new(),
            draw_flag: false,
            register_needing_key: None,
        }
    }

    /// Reads the byte at `address`, wrapping past the end of memory
    pub fn peek(&self, address: u16) -> u8 {
        self.memory[(address & ADDRESS_MASK) as usize]
    }

    /// Writes the byte at `address`, wrapping past the end of memory
    pub fn poke(&mut self, address: u16, value: u8) {
        self.memory[(address & ADDRESS_MASK) as usize] = value;
    }

    /// Gets the opcode currently pointed at by the pc.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    pub fn fetch(&self) -> u16 {
        let left = u16::from(self.peek(self.pc));
        let right = u16::from(self.peek(self.pc.wrapping_add(1)));
        left << 8 | right
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
