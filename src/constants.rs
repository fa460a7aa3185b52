/// Width of the display in pixels
pub const DISPLAY_WIDTH: usize = 64;

/// Height of the display in pixels
pub const DISPLAY_HEIGHT: usize = 32;

/// Bytes of addressable memory
pub const MEMORY_SIZE: usize = 0x1000;

/// Addresses are 12 bits wide; anything driven by the index register wraps with this mask
pub const ADDRESS_MASK: u16 = 0x0FFF;

/// Where programs are loaded and where the program counter starts
pub const PROGRAM_START: u16 = 0x200;

/// The largest program image that fits above `PROGRAM_START`
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Every instruction is two bytes
pub const INSTRUCTION_SIZE: u16 = 0x2;

/// Number of general purpose registers (V0..VF)
pub const REGISTER_COUNT: usize = 16;

/// VF doubles as the carry/borrow/collision flag
pub const FLAG_REGISTER: usize = 0xF;

/// Nested subroutine calls allowed before overflowing
pub const STACK_DEPTH: usize = 32;

/// Number of keys on the hexadecimal keypad (0x0..0xF)
pub const KEY_COUNT: usize = 16;

/// Bytes per hexadecimal glyph in the sprite sheet
pub const GLYPH_SIZE: u16 = 5;

/// Frequency at which the delay and sound timers count down
pub const TIMER_FREQUENCY: u32 = 60;

/// Instructions executed per timer tick unless configured otherwise
pub const DEFAULT_STEPS_PER_FRAME: u32 = 10;

/// # Sprite Sheet
/// Glyphs for the hexadecimal digits 0..F, loaded at address 0x000.
///
/// Each glyph is 5 rows of 8 bits where only the high nibble is drawn, e.g. `0`:
/// ```text
/// 0xF0  ****
/// 0x90  *  *
/// 0x90  *  *
/// 0x90  *  *
/// 0xF0  ****
/// ```
pub const SPRITE_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
