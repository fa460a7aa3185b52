use std::cell::RefCell;
use std::io::Read;
use std::rc::{Rc, Weak};

use log::{error, info, trace, warn};

use crate::constants::{
    INSTRUCTION_SIZE, MAX_PROGRAM_SIZE, MEMORY_SIZE, PROGRAM_START, REGISTER_COUNT,
};
use crate::error::Error;
use crate::frame_buffer::FrameBuffer;
use crate::instruction::Instruction;
use crate::keys::{KeyListener, KeySurface, ListenerId};
use crate::operations;
use crate::random::RandomSource;
use crate::state::State;

/// A machine shared with the `KeySurface` it listens to
pub type SharedMachine = Rc<RefCell<Machine>>;

/// What `load` managed to copy into memory
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Loaded {
    /// The whole image of `len` bytes fit
    Complete { len: usize },
    /// Only the first `len` of `size` bytes fit; execution can still go ahead
    Truncated { len: usize, size: usize },
}

/// # Machine
/// The fetch-decode-execute core.
///
/// Is interfaced with by the outside world via methods to:
/// - load programs
/// - step the CPU one instruction at a time
/// - tick its timers
/// - hear key presses from the `KeySurface` it is attached to
/// - inspect its registers and frame buffer for rendering by some display
pub struct Machine {
    state: State,
    random: Box<dyn RandomSource>,
    keys: Rc<dyn KeySurface>,
    listener: Option<ListenerId>,
}

impl Machine {
    /// Creates a machine in its initial state that is not yet listening for key presses.
    /// See `attach`.
    pub fn new(random: Box<dyn RandomSource>, keys: Rc<dyn KeySurface>) -> Self {
        Machine {
            state: State::new(),
            random,
            keys,
            listener: None,
        }
    }

    /// Moves the machine behind an `Rc` and subscribes it to its `KeySurface`.
    /// The subscription is dropped along with the machine.
    pub fn attach(self) -> SharedMachine {
        let keys = Rc::clone(&self.keys);
        let machine = Rc::new(RefCell::new(self));
        let listener: Weak<RefCell<dyn KeyListener>> = Rc::downgrade(&machine) as _;
        let id = keys.add_listener(listener);
        machine.borrow_mut().listener = Some(id);
        machine
    }

    /// Unsubscribes from the `KeySurface`, if subscribed
    pub fn detach(&mut self) {
        if let Some(id) = self.listener.take() {
            self.keys.remove_listener(id);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    /// Restores registers, memory, timers and the screen to their initial values
    pub fn reset(&mut self) {
        self.state = State::new();
    }

    /// Load a program from a source file
    ///
    /// # Arguments
    /// * `reader` a reader positioned at the start of a raw program image
    pub fn load(&mut self, reader: &mut dyn Read) -> Result<Loaded, Error> {
        let mut image = Vec::new();
        reader.read_to_end(&mut image)?;
        Ok(self.load_bytes(&image))
    }

    /// Copies as much of `image` as fits into memory at 0x200 and rewinds the pc there
    pub fn load_bytes(&mut self, image: &[u8]) -> Loaded {
        let len = image.len().min(MAX_PROGRAM_SIZE);
        let start = PROGRAM_START as usize;
        self.state.memory[start..].fill(0);
        self.state.memory[start..start + len].copy_from_slice(&image[..len]);
        self.state.pc = PROGRAM_START;

        if len < image.len() {
            warn!(
                "program is {} bytes but only {} fit; loaded a truncated image",
                image.len(),
                len
            );
            Loaded::Truncated {
                len,
                size: image.len(),
            }
        } else {
            info!("loaded {} byte program", len);
            Loaded::Complete { len }
        }
    }

    /// Advances the CPU by a single instruction
    /// - idles without fetching while awaiting a keypress
    /// - gets and executes the next opcode
    /// - moves the pc on by one instruction, only if execution succeeded
    pub fn step(&mut self) -> Result<(), Error> {
        if self.is_waiting_for_key() {
            return Ok(());
        }
        let op = self.state.fetch();
        self.execute(op)?;
        self.state.pc = self.state.pc.wrapping_add(INSTRUCTION_SIZE);
        Ok(())
    }

    /// Decodes and executes `op` without touching the pc afterwards.
    /// Fails with `Blocked` while awaiting a keypress.
    pub fn execute(&mut self, op: u16) -> Result<(), Error> {
        if self.is_waiting_for_key() {
            return Err(Error::Blocked);
        }
        let instruction = Instruction::decode(op).inspect_err(|_| {
            error!("unknown instruction {:#06X} at {:#05X}", op, self.state.pc);
        })?;
        trace!(
            "{:04X} {:04X} {:<16} v{:02X?} i{:04X}",
            self.state.pc,
            op,
            instruction.to_string(),
            self.state.v,
            self.state.i
        );
        operations::apply(
            instruction,
            &mut self.state,
            self.random.as_mut(),
            self.keys.as_ref(),
        )
    }

    /// Counts both timers down towards 0; call at 60Hz
    pub fn tick_timers(&mut self) {
        self.state.delay_timer = self.state.delay_timer.saturating_sub(1);
        self.state.sound_timer = self.state.sound_timer.saturating_sub(1);
    }

    pub fn is_waiting_for_key(&self) -> bool {
        self.state.register_needing_key.is_some()
    }

    /// Returns the FrameBuffer if it changed since the last call
    pub fn take_frame(&mut self) -> Option<&FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(&self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Returns Vx, or None when `register` is past VF
    pub fn v(&self, register: usize) -> Option<u8> {
        self.state.v.get(register).copied()
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.state.v
    }

    pub fn index(&self) -> u16 {
        self.state.i
    }

    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    pub fn sp(&self) -> usize {
        self.state.sp
    }

    pub fn delay_timer(&self) -> u8 {
        self.state.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.state.sound_timer
    }

    /// Whether a beep should currently be playing
    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    /// Returns the contents of memory at `address`
    pub fn peek(&self, address: u16) -> u8 {
        self.state.peek(address)
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.state.memory
    }

    pub fn state(&self) -> &State {
        &self.state
    }
}

impl KeyListener for Machine {
    /// Resolves a pending `Fx0A` by writing `key` to the register waiting on it
    fn on_key_press(&mut self, key: u8) {
        if let Some(register) = self.state.register_needing_key.take() {
            self.state.v[register] = key;
        }
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        self.detach();
    }
}
