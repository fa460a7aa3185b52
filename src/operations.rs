use log::error;

use crate::constants::{ADDRESS_MASK, FLAG_REGISTER, GLYPH_SIZE, INSTRUCTION_SIZE, STACK_DEPTH};
use crate::error::Error;
use crate::instruction::Instruction;
use crate::keys::KeySurface;
use crate::random::RandomSource;
use crate::state::State;

/// Applies a decoded instruction to `state`.
///
/// The program counter is not advanced here; the caller adds `INSTRUCTION_SIZE` afterwards.
/// Branches therefore land on `target - 2` and skips add one extra instruction.
/// Nothing is mutated when an error is returned.
pub fn apply(
    instruction: Instruction,
    state: &mut State,
    random: &mut dyn RandomSource,
    keys: &dyn KeySurface,
) -> Result<(), Error> {
    match instruction {
        Instruction::Clear => clr(state),
        Instruction::Return => rts(state)?,
        Instruction::System { .. } => {}
        Instruction::Jump { addr } => state.pc = addr.wrapping_sub(INSTRUCTION_SIZE),
        Instruction::Call { addr } => call(state, addr)?,
        Instruction::SkipIfEqualByte { x, kk } => skip_if(state.v[x] == kk, state),
        Instruction::SkipIfNotEqualByte { x, kk } => skip_if(state.v[x] != kk, state),
        Instruction::SkipIfEqual { x, y } => skip_if(state.v[x] == state.v[y], state),
        Instruction::LoadByte { x, kk } => state.v[x] = kk,
        Instruction::AddByte { x, kk } => state.v[x] = state.v[x].wrapping_add(kk),
        Instruction::Move { x, y } => state.v[x] = state.v[y],
        Instruction::Or { x, y } => state.v[x] |= state.v[y],
        Instruction::And { x, y } => state.v[x] &= state.v[y],
        Instruction::Xor { x, y } => state.v[x] ^= state.v[y],
        Instruction::Add { x, y } => add(state, x, y),
        Instruction::Sub { x, y } => sub(state, x, y),
        Instruction::ShiftRight { x } => shr(state, x),
        Instruction::SubReversed { x, y } => subn(state, x, y),
        Instruction::ShiftLeft { x } => shl(state, x),
        Instruction::SkipIfNotEqual { x, y } => skip_if(state.v[x] != state.v[y], state),
        Instruction::LoadIndex { addr } => state.i = addr,
        Instruction::JumpOffset { addr } => {
            state.pc = (addr + u16::from(state.v[0x0])).wrapping_sub(INSTRUCTION_SIZE)
        }
        Instruction::Random { x, kk } => state.v[x] = random.next_byte() & kk,
        Instruction::Draw { x, y, n } => draw(state, x, y, n),
        Instruction::SkipIfPressed { x } => skip_if(keys.is_key_pressed(state.v[x]), state),
        Instruction::SkipIfNotPressed { x } => skip_if(!keys.is_key_pressed(state.v[x]), state),
        Instruction::LoadDelay { x } => state.v[x] = state.delay_timer,
        Instruction::WaitForKey { x } => state.register_needing_key = Some(x),
        Instruction::SetDelay { x } => state.delay_timer = state.v[x],
        Instruction::SetSound { x } => state.sound_timer = state.v[x],
        Instruction::AddIndex { x } => {
            state.i = state.i.wrapping_add(u16::from(state.v[x])) & ADDRESS_MASK
        }
        Instruction::LoadGlyph { x } => state.i = u16::from(state.v[x] & 0xF) * GLYPH_SIZE,
        Instruction::StoreBcd { x } => bcd(state, x),
        Instruction::StoreRegisters { x } => stor(state, x),
        Instruction::LoadRegisters { x } => read(state, x),
    }
    Ok(())
}

/// clear
fn clr(state: &mut State) {
    state.frame_buffer.clear_screen();
    state.draw_flag = true;
}

/// PC = STACK.pop()
fn rts(state: &mut State) -> Result<(), Error> {
    if state.sp == 0 {
        error!("stack underflow at {:#05X}", state.pc);
        return Err(Error::StackUnderflow);
    }
    state.sp -= 1;
    state.pc = state.stack[state.sp];
    Ok(())
}

/// STACK.push(PC); PC = addr
fn call(state: &mut State, addr: u16) -> Result<(), Error> {
    if state.sp >= STACK_DEPTH {
        error!("stack overflow at {:#05X}", state.pc);
        return Err(Error::stack_overflow());
    }
    state.stack[state.sp] = state.pc;
    state.sp += 1;
    state.pc = addr.wrapping_sub(INSTRUCTION_SIZE);
    Ok(())
}

/// if condition then pc += 2
fn skip_if(condition: bool, state: &mut State) {
    if condition {
        state.pc = state.pc.wrapping_add(INSTRUCTION_SIZE);
    }
}

/// Vx += Vy; VF = overflow
fn add(state: &mut State, x: usize, y: usize) {
    let (res, over) = state.v[x].overflowing_add(state.v[y]);
    state.v[x] = res;
    state.v[FLAG_REGISTER] = u8::from(over);
}

/// Vx -= Vy; VF = Vx > Vy
fn sub(state: &mut State, x: usize, y: usize) {
    let (vx, vy) = (state.v[x], state.v[y]);
    state.v[x] = vx.wrapping_sub(vy);
    state.v[FLAG_REGISTER] = u8::from(vx > vy);
}

/// Vx >>= 1; VF = lsb
fn shr(state: &mut State, x: usize) {
    let vx = state.v[x];
    state.v[x] = vx >> 1;
    state.v[FLAG_REGISTER] = vx & 0x1;
}

/// Vx = Vy - Vx; VF = Vy > Vx
fn subn(state: &mut State, x: usize, y: usize) {
    let (vx, vy) = (state.v[x], state.v[y]);
    state.v[x] = vy.wrapping_sub(vx);
    state.v[FLAG_REGISTER] = u8::from(vy > vx);
}

/// Vx <<= 1; VF = msb
fn shl(state: &mut State, x: usize) {
    let vx = state.v[x];
    state.v[x] = vx << 1;
    state.v[FLAG_REGISTER] = vx >> 7;
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory I..I+n at position Vx, Vy on the FrameBuffer with wrapping.
/// Sets VF if any pixels were erased
fn draw(state: &mut State, x: usize, y: usize, n: u8) {
    let (origin_x, origin_y) = (state.v[x] as usize, state.v[y] as usize);
    let mut collision = false;
    for row in 0..n {
        let line = state.peek(state.i.wrapping_add(u16::from(row)));
        collision |= state
            .frame_buffer
            .paint(origin_x, origin_y + row as usize, line);
    }
    state.v[FLAG_REGISTER] = u8::from(collision);
    state.draw_flag = true;
}

/// mem[I..I+3] = bcd(Vx)
fn bcd(state: &mut State, x: usize) {
    let value = state.v[x];
    let digits = [value / 100, value / 10 % 10, value % 10];
    for (offset, digit) in (0..).zip(digits) {
        state.poke(state.i.wrapping_add(offset), digit);
    }
}

/// mem[I..=I+x] = V0..=Vx; I += x + 1
fn stor(state: &mut State, x: usize) {
    for register in 0..=x {
        state.poke(state.i.wrapping_add(register as u16), state.v[register]);
    }
    state.i = state.i.wrapping_add(x as u16 + 1) & ADDRESS_MASK;
}

/// V0..=Vx = mem[I..=I+x]; I += x + 1
fn read(state: &mut State, x: usize) {
    for register in 0..=x {
        state.v[register] = state.peek(state.i.wrapping_add(register as u16));
    }
    state.i = state.i.wrapping_add(x as u16 + 1) & ADDRESS_MASK;
}

#[cfg(test)]
mod test_operations {
    use super::*;
    use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
    use crate::keys::Keypad;
    use crate::random::ReplayRandom;

    /// Decodes and applies `op` against `state` with no keys held
    fn run(op: u16, state: &mut State) -> Result<(), Error> {
        run_with_keys(op, state, &Keypad::new())
    }

    fn run_with_keys(op: u16, state: &mut State, keys: &Keypad) -> Result<(), Error> {
        let mut random = ReplayRandom::new(vec![0b1010_1111]);
        apply(Instruction::decode(op)?, state, &mut random, keys)
    }

    #[test]
    fn test_00e0_cls() {
        let mut state = State::new();
        state.frame_buffer.set_pixel(0, 0, true);
        run(0x00E0, &mut state).unwrap();
        assert!(state.frame_buffer.is_blank());
        assert!(state.draw_flag);
    }

    #[test]
    fn test_00ee_ret() {
        let mut state = State::new();
        state.sp = 0x1;
        state.stack[0] = 0x0ABC;
        run(0x00EE, &mut state).unwrap();
        assert_eq!(state.sp, 0x0);
        assert_eq!(state.pc, 0x0ABC);
    }

    #[test]
    fn test_00ee_ret_underflows() {
        let mut state = State::new();
        let before = state.clone();
        assert!(matches!(run(0x00EE, &mut state), Err(Error::StackUnderflow)));
        assert_eq!(state, before);
    }

    #[test]
    fn test_0nnn_sys_is_ignored() {
        let mut state = State::new();
        let before = state.clone();
        run(0x0123, &mut state).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_1nnn_jp() {
        let mut state = State::new();
        run(0x1ABC, &mut state).unwrap();
        // the caller bumps the pc after execution
        assert_eq!(state.pc, 0x0ABA);
    }

    #[test]
    fn test_2nnn_call() {
        let mut state = State::new();
        state.pc = 0x0ABC;
        run(0x2123, &mut state).unwrap();
        assert_eq!(state.sp, 0x1);
        assert_eq!(state.stack[0], 0x0ABC);
        assert_eq!(state.pc, 0x0121);
    }

    #[test]
    fn test_2nnn_call_then_ret_restores_pc() {
        let mut state = State::new();
        state.pc = 0x0346;
        run(0x2ABC, &mut state).unwrap();
        run(0x00EE, &mut state).unwrap();
        assert_eq!(state.pc, 0x0346);
        assert_eq!(state.sp, 0);
    }

    #[test]
    fn test_2nnn_call_overflows() {
        let mut state = State::new();
        for _ in 0..STACK_DEPTH {
            run(0x2400, &mut state).unwrap();
        }
        assert_eq!(state.sp, STACK_DEPTH);
        let before = state.clone();
        assert!(matches!(
            run(0x2400, &mut state),
            Err(Error::StackOverflow { depth: STACK_DEPTH })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_3xkk_se() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        run(0x3111, &mut state).unwrap();
        assert_eq!(state.pc, 0x0202);
        run(0x3112, &mut state).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_4xkk_sne() {
        let mut state = State::new();
        run(0x4111, &mut state).unwrap();
        assert_eq!(state.pc, 0x0202);
        run(0x4100, &mut state).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_5xy0_se() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x11;
        run(0x5120, &mut state).unwrap();
        assert_eq!(state.pc, 0x0202);
        state.v[0x2] = 0x12;
        run(0x5120, &mut state).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_6xkk_ld() {
        for kk in [0x00, 0x22, 0xFF] {
            let mut state = State::new();
            run(0x6A00 | kk, &mut state).unwrap();
            assert_eq!(u16::from(state.v[0xA]), kk);
        }
    }

    #[test]
    fn test_7xkk_add_wraps_without_flag() {
        let mut state = State::new();
        state.v[0x1] = 0xF0;
        run(0x7122, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x12);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy0_to_8xy3_logic() {
        let mut state = State::new();
        state.v[0x2] = 0x3;
        run(0x8120, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x3);
        state.v[0x1] = 0x6;
        run(0x8121, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x7);
        state.v[0x1] = 0x6;
        run(0x8122, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x2);
        state.v[0x1] = 0x6;
        run(0x8123, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x5);
    }

    #[test]
    fn test_8xy4_add_sets_carry() {
        for (vx, vy) in [(0xEE, 0x11), (0xFF, 0x11), (0x80, 0x80), (0x00, 0x00), (0xFF, 0x01)] {
            let mut state = State::new();
            state.v[0x1] = vx;
            state.v[0x2] = vy;
            run(0x8124, &mut state).unwrap();
            let sum = u16::from(vx) + u16::from(vy);
            assert_eq!(u16::from(state.v[0x1]), sum % 0x100);
            assert_eq!(state.v[0xF], u8::from(sum > 0xFF));
        }
    }

    #[test]
    fn test_8xy5_sub() {
        let mut state = State::new();
        state.v[0x1] = 0x33;
        state.v[0x2] = 0x11;
        run(0x8125, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x22);
        assert_eq!(state.v[0xF], 0x1);

        state.v[0x1] = 0x11;
        state.v[0x2] = 0x12;
        run(0x8125, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x0);

        // equal operands borrow nothing but Vx is not greater
        state.v[0x1] = 0x12;
        run(0x8125, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x0);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy6_shr() {
        let mut state = State::new();
        state.v[0x1] = 0x5;
        run(0x8106, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x2);
        assert_eq!(state.v[0xF], 0x1);
        run(0x8106, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x1);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xy7_subn() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        state.v[0x2] = 0x33;
        run(0x8127, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x22);
        assert_eq!(state.v[0xF], 0x1);

        state.v[0x1] = 0x12;
        state.v[0x2] = 0x11;
        run(0x8127, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0xFF);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_8xye_shl() {
        let mut state = State::new();
        state.v[0x1] = 0xFF;
        run(0x810E, &mut state).unwrap();
        // 0xFF * 2 = 0x01FE
        assert_eq!(state.v[0x1], 0xFE);
        assert_eq!(state.v[0xF], 0x1);
        state.v[0x1] = 0x4;
        run(0x810E, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x8);
        assert_eq!(state.v[0xF], 0x0);
    }

    #[test]
    fn test_flag_register_as_operand() {
        let mut state = State::new();
        state.v[0xF] = 0x81;
        run(0x8F0E, &mut state).unwrap();
        // the flag write lands after the result
        assert_eq!(state.v[0xF], 0x1);
    }

    #[test]
    fn test_9xy0_sne() {
        let mut state = State::new();
        state.v[0x1] = 0x11;
        run(0x9120, &mut state).unwrap();
        assert_eq!(state.pc, 0x0202);
        state.v[0x2] = 0x11;
        run(0x9120, &mut state).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_annn_ld() {
        let mut state = State::new();
        run(0xAABC, &mut state).unwrap();
        assert_eq!(state.i, 0xABC);
    }

    #[test]
    fn test_bnnn_jp() {
        let mut state = State::new();
        state.v[0x0] = 0x2;
        run(0xBABC, &mut state).unwrap();
        assert_eq!(state.pc, 0xABC);
    }

    #[test]
    fn test_cxkk_rnd_masks() {
        let mut state = State::new();
        run(0xC10F, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0x0F);
        run(0xC1F0, &mut state).unwrap();
        assert_eq!(state.v[0x1], 0xA0);
    }

    #[test]
    fn test_dxyn_drw_draws() {
        let mut state = State::new();
        state.v[0x0] = 0x1;
        // Draw the 0x0 glyph with a 1x 1y offset
        run(0xD005, &mut state).unwrap();
        let expected = [
            [true, true, true, true],
            [true, false, false, true],
            [true, false, false, true],
            [true, false, false, true],
            [true, true, true, true],
        ];
        for (dy, row) in expected.iter().enumerate() {
            for (dx, &pixel) in row.iter().enumerate() {
                assert_eq!(state.frame_buffer.get_pixel(1 + dx, 1 + dy), pixel);
            }
        }
        assert!(!state.frame_buffer.get_pixel(5, 1));
        assert_eq!(state.v[0xF], 0x0);
        assert!(state.draw_flag);
    }

    #[test]
    fn test_dxyn_drw_collides() {
        let mut state = State::new();
        state.frame_buffer.set_pixel(0, 0, true);
        run(0xD001, &mut state).unwrap();
        assert_eq!(state.v[0xF], 0x1);
        assert!(!state.frame_buffer.get_pixel(0, 0));
        assert!(state.frame_buffer.get_pixel(1, 0));
    }

    #[test]
    fn test_dxyn_drw_wraps_the_screen() {
        let mut state = State::new();
        state.v[0x1] = (DISPLAY_WIDTH - 2) as u8;
        state.v[0x2] = (DISPLAY_HEIGHT - 1) as u8;
        state.i = 0x300;
        state.memory[0x300..0x302].copy_from_slice(&[0xF0, 0xF0]);
        run(0xD122, &mut state).unwrap();
        assert!(state.frame_buffer.get_pixel(DISPLAY_WIDTH - 1, DISPLAY_HEIGHT - 1));
        assert!(state.frame_buffer.get_pixel(1, DISPLAY_HEIGHT - 1));
        assert!(state.frame_buffer.get_pixel(0, 0));
        assert!(!state.frame_buffer.get_pixel(2, 0));
    }

    #[test]
    fn test_dxyn_drw_reads_sprite_across_end_of_memory() {
        let mut state = State::new();
        state.i = 0xFFF;
        state.memory[0xFFF] = 0x80;
        // the second row wraps around to the first byte of the `0` glyph
        run(0xD002, &mut state).unwrap();
        assert!(state.frame_buffer.get_pixel(0, 0));
        assert!(state.frame_buffer.get_pixel(3, 1));
        assert!(!state.frame_buffer.get_pixel(4, 1));
    }

    #[test]
    fn test_ex9e_skp() {
        let keys = Keypad::new();
        let mut state = State::new();
        state.v[0x1] = 0xE;
        run_with_keys(0xE19E, &mut state, &keys).unwrap();
        assert_eq!(state.pc, 0x0200);
        keys.press(0xE);
        run_with_keys(0xE19E, &mut state, &keys).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_exa1_sknp() {
        let keys = Keypad::new();
        let mut state = State::new();
        state.v[0x1] = 0xE;
        run_with_keys(0xE1A1, &mut state, &keys).unwrap();
        assert_eq!(state.pc, 0x0202);
        keys.press(0xE);
        run_with_keys(0xE1A1, &mut state, &keys).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_exa1_sknp_out_of_range_key_is_never_held() {
        let keys = Keypad::new();
        let mut state = State::new();
        state.v[0x1] = 0x42;
        run_with_keys(0xE1A1, &mut state, &keys).unwrap();
        assert_eq!(state.pc, 0x0202);
    }

    #[test]
    fn test_fx07_fx15_fx18_timers() {
        let mut state = State::new();
        state.v[0x1] = 0xF;
        run(0xF115, &mut state).unwrap();
        run(0xF118, &mut state).unwrap();
        assert_eq!(state.delay_timer, 0xF);
        assert_eq!(state.sound_timer, 0xF);
        state.delay_timer = 0x9;
        run(0xF207, &mut state).unwrap();
        assert_eq!(state.v[0x2], 0x9);
    }

    #[test]
    fn test_fx0a_ld_sets_register_needing_key() {
        let mut state = State::new();
        run(0xF10A, &mut state).unwrap();
        assert_eq!(state.register_needing_key, Some(0x1));
    }

    #[test]
    fn test_fx1e_add() {
        let mut state = State::new();
        state.i = 0x1;
        state.v[0x1] = 0x1;
        run(0xF11E, &mut state).unwrap();
        assert_eq!(state.i, 0x2);
        state.i = 0xFFF;
        run(0xF11E, &mut state).unwrap();
        assert_eq!(state.i, 0x000);
    }

    #[test]
    fn test_fx29_ld_replaces_index() {
        let mut state = State::new();
        state.i = 0x300;
        state.v[0x1] = 0x2;
        run(0xF129, &mut state).unwrap();
        assert_eq!(state.i, 0xA);
        state.v[0x1] = 0x1F;
        run(0xF129, &mut state).unwrap();
        assert_eq!(state.i, 0xF * 5);
    }

    #[test]
    fn test_fx33_ld() {
        let mut state = State::new();
        // 0x7B -> 123
        state.v[0x1] = 0x7B;
        state.i = 0x200;
        run(0xF133, &mut state).unwrap();
        assert_eq!(state.memory[0x200..0x203], [0x1, 0x2, 0x3]);
        assert_eq!(state.i, 0x200);
    }

    #[test]
    fn test_fx33_ld_wraps_past_end_of_memory() {
        let mut state = State::new();
        state.v[0x1] = 0xFF;
        state.i = 0xFFE;
        run(0xF133, &mut state).unwrap();
        assert_eq!(state.memory[0xFFE..], [0x2, 0x5]);
        assert_eq!(state.memory[0x000], 0x5);
    }

    #[test]
    fn test_fx55_ld_stores_and_advances_index() {
        let mut state = State::new();
        state.i = 0x200;
        state.v[0x0..0x5].copy_from_slice(&[0x1, 0x2, 0x3, 0x4, 0x5]);
        run(0xF455, &mut state).unwrap();
        assert_eq!(state.memory[0x200..0x206], [0x1, 0x2, 0x3, 0x4, 0x5, 0x0]);
        assert_eq!(state.i, 0x205);
    }

    #[test]
    fn test_fx65_ld_reads_and_advances_index() {
        let mut state = State::new();
        state.i = 0x200;
        state.memory[0x200..0x206].copy_from_slice(&[0x1, 0x2, 0x3, 0x4, 0x5, 0x6]);
        run(0xF465, &mut state).unwrap();
        assert_eq!(state.v[0x0..0x6], [0x1, 0x2, 0x3, 0x4, 0x5, 0x0]);
        assert_eq!(state.i, 0x205);
    }

    #[test]
    fn test_fx55_fx65_wrap_past_end_of_memory() {
        let mut state = State::new();
        state.i = 0xFFF;
        state.v[0x0] = 0xAA;
        state.v[0x1] = 0xBB;
        run(0xF155, &mut state).unwrap();
        assert_eq!(state.memory[0xFFF], 0xAA);
        assert_eq!(state.memory[0x000], 0xBB);
        assert_eq!(state.i, 0x001);

        state.i = 0xFFF;
        state.v[0x0] = 0;
        state.v[0x1] = 0;
        run(0xF165, &mut state).unwrap();
        assert_eq!(state.v[0x0..0x2], [0xAA, 0xBB]);
    }
}
