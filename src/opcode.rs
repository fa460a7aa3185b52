/// Field access on a raw 16-bit instruction word.
///
/// Every instruction is read as four nibbles `[o x y n]`, most significant first.
/// The top nibble `o` picks the instruction family and `Instruction::decode` narrows
/// it down by matching on the remaining nibbles where a family holds several forms
/// (`8xy_`, `Ex__`, `Fx__`). The same words double as operands:
/// - `x` and `y` are register numbers
/// - `kk` is the low byte, an immediate value
/// - `addr` is the low 12 bits, a memory address
/// - `n` is the low nibble, a sprite height
pub trait Opcode {
    /// All four nibbles, most significant first
    fn nibbles(&self) -> (u8, u8, u8, u8);

    /// First register operand, `[_x__]`
    fn x(&self) -> usize;

    /// Second register operand, `[__y_]`
    fn y(&self) -> usize;

    /// Trailing nibble, `[___n]`
    fn n(&self) -> u8;

    /// Immediate byte, `[__kk]`
    fn kk(&self) -> u8;

    /// 12-bit address, `[_adr]`
    fn addr(&self) -> u16;
}

impl Opcode for u16 {
    fn nibbles(&self) -> (u8, u8, u8, u8) {
        (
            ((self & 0xF000) >> 12) as u8,
            self.x() as u8,
            self.y() as u8,
            self.n(),
        )
    }

    fn x(&self) -> usize {
        ((self & 0x0F00) >> 8) as usize
    }

    fn y(&self) -> usize {
        ((self & 0x00F0) >> 4) as usize
    }

    fn n(&self) -> u8 {
        (self & 0x000F) as u8
    }

    fn kk(&self) -> u8 {
        (self & 0x00FF) as u8
    }

    fn addr(&self) -> u16 {
        self & 0x0FFF
    }
}
