use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::warn;

use crate::constants::KEY_COUNT;

/// Something interested in keys going down, e.g. a machine waiting on `Fx0A`
pub trait KeyListener {
    fn on_key_press(&mut self, key: u8);
}

/// Identifies a registration with a `KeySurface` so it can be removed later
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

/// # Key Surface
/// The 16-key hexadecimal keypad as seen by the machine.
///
/// Keys are numbered 0x0..0xF; anything larger is never pressed.
/// Listeners are held weakly, the surface never keeps one alive.
pub trait KeySurface {
    fn is_key_pressed(&self, key: u8) -> bool;

    fn add_listener(&self, listener: Weak<RefCell<dyn KeyListener>>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

/// # Keypad
/// A `KeySurface` fed by whatever maps physical input onto the hexadecimal keypad.
///
/// It is shared through an `Rc`, so state changes go through `&self`.
pub struct Keypad {
    pressed: Cell<[bool; KEY_COUNT]>,
    listeners: RefCell<Vec<(ListenerId, Weak<RefCell<dyn KeyListener>>)>>,
    next_id: Cell<usize>,
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            pressed: Cell::new([false; KEY_COUNT]),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Marks `key` as held.
    /// Listeners hear about it only when the key was previously up.
    pub fn press(&self, key: u8) {
        let Some(index) = Self::index(key) else {
            warn!("ignoring press of key {:#04X}", key);
            return;
        };
        let mut pressed = self.pressed.get();
        if pressed[index] {
            return;
        }
        pressed[index] = true;
        self.pressed.set(pressed);
        self.dispatch_key_press(key);
    }

    pub fn release(&self, key: u8) {
        let Some(index) = Self::index(key) else {
            warn!("ignoring release of key {:#04X}", key);
            return;
        };
        let mut pressed = self.pressed.get();
        pressed[index] = false;
        self.pressed.set(pressed);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, listener)| listener.strong_count() > 0)
            .count()
    }

    fn index(key: u8) -> Option<usize> {
        let index = key as usize;
        (index < KEY_COUNT).then_some(index)
    }

    /// Hands `key` to every live listener.
    /// The registration list is released before calling out so listeners may deregister.
    fn dispatch_key_press(&self, key: u8) {
        let live: Vec<Rc<RefCell<dyn KeyListener>>> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|(_, listener)| listener.strong_count() > 0);
            listeners
                .iter()
                .filter_map(|(_, listener)| listener.upgrade())
                .collect()
        };
        for listener in live {
            match listener.try_borrow_mut() {
                Ok(mut listener) => listener.on_key_press(key),
                Err(_) => warn!("dropping press of key {:#X}: listener is busy", key),
            }
        }
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySurface for Keypad {
    fn is_key_pressed(&self, key: u8) -> bool {
        match Self::index(key) {
            Some(index) => self.pressed.get()[index],
            None => false,
        }
    }

    fn add_listener(&self, listener: Weak<RefCell<dyn KeyListener>>) -> ListenerId {
        let mut listeners = self.listeners.borrow_mut();
        if let Some((id, _)) = listeners
            .iter()
            .find(|(_, existing)| Weak::ptr_eq(existing, &listener))
        {
            warn!("listener is already registered as {:?}", id);
            return *id;
        }
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        listeners.push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|(existing, _)| *existing == id) {
            Some(position) => {
                listeners.remove(position);
            }
            None => warn!("attempted to remove unregistered listener {:?}", id),
        }
    }
}
