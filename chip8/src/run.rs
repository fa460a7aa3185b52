use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{info, warn};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use chip8_core::constants::TIMER_FREQUENCY;
use chip8_core::{EntropyRandom, Keypad, Loaded, Machine, RandomSource};
use display::Display;

use crate::keymap::keymap;
use crate::Config;

pub fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let keypad = Rc::new(Keypad::new());
    let random: Box<dyn RandomSource> = match config.seed {
        Some(seed) => Box::new(EntropyRandom::with_seed(seed)),
        None => Box::new(EntropyRandom::new()),
    };
    let machine = Machine::new(random, keypad.clone()).attach();

    // Load ROM
    let file = File::open(&config.rom)?;
    let mut reader = BufReader::new(file);
    match machine.borrow_mut().load(&mut reader)? {
        Loaded::Complete { len } => info!("running {} ({} bytes)", config.rom.display(), len),
        Loaded::Truncated { len, size } => warn!(
            "running {} with only {} of its {} bytes",
            config.rom.display(),
            len,
            size
        ),
    };

    // Get SDL2 context
    let sdl = sdl2::init()?;
    let mut display = Display::new(&sdl, config.scale)?;
    let mut events = sdl.event_pump()?;

    // One frame per timer tick
    let frame_time = Duration::from_secs(1) / TIMER_FREQUENCY;
    let mut last_frame = Instant::now();

    // Whether or not the default clock speed should be respected
    let mut fast_forward = false;

    'event: loop {
        // Handle input; presses reach the machine through the keypad
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => match (key, keymap(key)) {
                    (_, Some(kc)) => keypad.press(kc),
                    (Keycode::Space, _) => fast_forward = true,
                    (Keycode::Escape, _) => break 'event,
                    _ => continue,
                },
                Event::KeyUp {
                    keycode: Some(key), ..
                } => match (key, keymap(key)) {
                    (_, Some(kc)) => keypad.release(kc),
                    (Keycode::Space, _) => fast_forward = false,
                    _ => continue,
                },
                _ => continue,
            };
        }

        // Update state
        let mut chip8 = machine.borrow_mut();
        for _ in 0..config.steps_per_frame {
            chip8.step()?;
        }
        chip8.tick_timers();

        // Only redraw when the frame buffer changed
        if let Some(frame) = chip8.take_frame() {
            display.render(frame)?;
        }
        drop(chip8);

        // Handle timing
        let current_time = Instant::now();
        let elapsed = current_time - last_frame;
        if !fast_forward && frame_time > elapsed {
            std::thread::sleep(frame_time - elapsed);
        }
        last_frame = Instant::now();
    }

    info!("stopped at pc {:#05X}", machine.borrow().pc());
    Ok(())
}
