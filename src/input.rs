//! Polled input
//!
//! Host event callbacks write into an `InputBuffer`; the orchestrator takes
//! one `InputSnapshot` per frame. Mouse delta and key edges are consumed by
//! the snapshot, held keys and buttons persist.

use glam::Vec2;

/// Keys the game reacts to, named after DOM `KeyboardEvent.code`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    E,
    Q,
    R,
    Space,
    ShiftLeft,
    Escape,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
}

impl Key {
    pub const ALL: [Key; 14] = [
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::E,
        Key::Q,
        Key::R,
        Key::Space,
        Key::ShiftLeft,
        Key::Escape,
        Key::Digit1,
        Key::Digit2,
        Key::Digit3,
        Key::Digit4,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" => Some(Key::W),
            "KeyA" => Some(Key::A),
            "KeyS" => Some(Key::S),
            "KeyD" => Some(Key::D),
            "KeyE" => Some(Key::E),
            "KeyQ" => Some(Key::Q),
            "KeyR" => Some(Key::R),
            "Space" => Some(Key::Space),
            "ShiftLeft" => Some(Key::ShiftLeft),
            "Escape" => Some(Key::Escape),
            "Digit1" => Some(Key::Digit1),
            "Digit2" => Some(Key::Digit2),
            "Digit3" => Some(Key::Digit3),
            "Digit4" => Some(Key::Digit4),
            _ => None,
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Weapon slot for the digit row
    pub fn weapon_slot(self) -> Option<usize> {
        match self {
            Key::Digit1 => Some(0),
            Key::Digit2 => Some(1),
            Key::Digit3 => Some(2),
            Key::Digit4 => Some(3),
            _ => None,
        }
    }
}

/// Set of keys packed into a bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySet(u16);

impl KeySet {
    pub fn contains(&self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    fn insert(&mut self, key: Key) {
        self.0 |= key.bit();
    }

    fn remove(&mut self, key: Key) {
        self.0 &= !key.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// One frame of input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    /// Held right now
    pub keys: KeySet,
    /// Went down since the previous snapshot
    pub pressed: KeySet,
    pub mouse_left: bool,
    pub mouse_right: bool,
    /// Pointer movement since the previous snapshot, in pixels
    pub mouse_delta: Vec2,
    pub mouse_pos: Vec2,
}

impl InputSnapshot {
    pub fn held(&self, key: Key) -> bool {
        self.keys.contains(key)
    }

    pub fn just_pressed(&self, key: Key) -> bool {
        self.pressed.contains(key)
    }

    /// First weapon slot pressed this frame
    pub fn weapon_slot(&self) -> Option<usize> {
        Key::ALL
            .iter()
            .filter(|k| self.pressed.contains(**k))
            .find_map(|k| k.weapon_slot())
    }
}

/// Accumulates host events between frames
#[derive(Debug, Default)]
pub struct InputBuffer {
    current: InputSnapshot,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false for codes the game ignores
    pub fn key_down(&mut self, code: &str) -> bool {
        let Some(key) = Key::from_code(code) else {
            return false;
        };
        // Auto-repeat arrives as more keydowns; only the first one is an edge
        if !self.current.keys.contains(key) {
            self.current.pressed.insert(key);
        }
        self.current.keys.insert(key);
        true
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        let Some(key) = Key::from_code(code) else {
            return false;
        };
        self.current.keys.remove(key);
        true
    }

    /// DOM button numbering: 0 left, 2 right
    pub fn mouse_button(&mut self, button: i16, down: bool) {
        match button {
            0 => self.current.mouse_left = down,
            2 => self.current.mouse_right = down,
            _ => {}
        }
    }

    pub fn mouse_move(&mut self, dx: f32, dy: f32, x: f32, y: f32) {
        if dx.is_finite() && dy.is_finite() {
            self.current.mouse_delta += Vec2::new(dx, dy);
        }
        if x.is_finite() && y.is_finite() {
            self.current.mouse_pos = Vec2::new(x, y);
        }
    }

    /// Drop everything held (focus loss means keyups never arrive)
    pub fn release_all(&mut self) {
        self.current = InputSnapshot {
            mouse_pos: self.current.mouse_pos,
            ..Default::default()
        };
    }

    /// Read this frame's input and reset the consume-once parts
    pub fn snapshot(&mut self) -> InputSnapshot {
        let snapshot = self.current;
        self.current.pressed = KeySet::default();
        self.current.mouse_delta = Vec2::ZERO;
        snapshot
    }
}
