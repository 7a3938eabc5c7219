use std::collections::HashSet;

/// SDL-style keyboard scancodes for the keys the demo content binds.
pub mod scancode {
    pub const A: u32 = 4;
    pub const C: u32 = 6;
    pub const V: u32 = 25;
    pub const RETURN: u32 = 40;
    pub const ESCAPE: u32 = 41;
    pub const SPACE: u32 = 44;
}

pub fn scancode_name(code: u32) -> Option<&'static str> {
    match code {
        scancode::A => Some("A"),
        scancode::C => Some("C"),
        scancode::V => Some("V"),
        scancode::RETURN => Some("Return"),
        scancode::ESCAPE => Some("Escape"),
        scancode::SPACE => Some("Space"),
        _ => None,
    }
}

/// Per-frame keyboard state. Presses accumulate until the runtime drains
/// them onto the event bus at the start of a step.
#[derive(Default)]
pub struct Input {
    pressed: Vec<u32>,
    held: HashSet<u32>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, code: u32) {
        if self.held.insert(code) {
            self.pressed.push(code);
        }
    }

    pub fn release(&mut self, code: u32) {
        self.held.remove(&code);
    }

    pub fn is_held(&self, code: u32) -> bool {
        self.held.contains(&code)
    }

    pub fn drain_pressed(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.pressed)
    }

    pub fn clear_frame(&mut self) {
        self.pressed.clear();
    }
}
