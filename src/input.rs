// Input module - Controller shift registers
//
// The standard controller is a parallel-in serial-out shift register.
// Writing 1 to $4016 holds both controllers in strobe mode (continuously
// reloading from the live button state); writing 0 releases them, after
// which each read of $4016/$4017 shifts out one button bit in the order
// A, B, Select, Start, Up, Down, Left, Right. Reads past the eighth
// return 1, like the floating input of the real shift register.

/// The eight buttons of a standard controller, in shift-out order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

/// Live button state for one controller
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct Controller {
    pub button_a: bool,
    pub button_b: bool,
    pub select: bool,
    pub start: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Controller {
    /// Create a controller with every button released
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one button
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        match button {
            Button::A => self.button_a = pressed,
            Button::B => self.button_b = pressed,
            Button::Select => self.select = pressed,
            Button::Start => self.start = pressed,
            Button::Up => self.up = pressed,
            Button::Down => self.down = pressed,
            Button::Left => self.left = pressed,
            Button::Right => self.right = pressed,
        }
    }

    /// Pack the state into shift-register order (A in bit 0)
    pub fn to_bits(self) -> u8 {
        u8::from(self.button_a)
            | (u8::from(self.button_b) << 1)
            | (u8::from(self.select) << 2)
            | (u8::from(self.start) << 3)
            | (u8::from(self.up) << 4)
            | (u8::from(self.down) << 5)
            | (u8::from(self.left) << 6)
            | (u8::from(self.right) << 7)
    }
}

/// The two controller ports at $4016/$4017
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ControllerIo {
    /// Live button state per port
    controllers: [Controller; 2],
    /// Latched shift registers
    shift: [u8; 2],
    /// Bits already shifted out per port
    shifted: [u8; 2],
    /// Strobe line ($4016 bit 0)
    strobe: bool,
}

impl ControllerIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update a button on one port (0 or 1)
    pub fn set_button(&mut self, port: usize, button: Button, pressed: bool) {
        self.controllers[port & 1].set_button(button, pressed);
    }

    /// Write $4016: drive the strobe line
    ///
    /// While the strobe is high both shift registers track the live
    /// buttons; dropping it latches them for serial readout.
    pub fn write_strobe(&mut self, data: u8) {
        let strobe = data & 0x01 != 0;
        if self.strobe && !strobe {
            self.latch();
        }
        self.strobe = strobe;
        if self.strobe {
            self.latch();
        }
    }

    fn latch(&mut self) {
        for port in 0..2 {
            self.shift[port] = self.controllers[port].to_bits();
            self.shifted[port] = 0;
        }
    }

    /// Read one bit from a port ($4016 reads port 0, $4017 port 1)
    pub fn read(&mut self, port: usize) -> u8 {
        let port = port & 1;

        // Strobe held high: the register keeps reloading, so every read
        // reports the current A button
        if self.strobe {
            return self.controllers[port].to_bits() & 0x01;
        }

        if self.shifted[port] >= 8 {
            return 1;
        }

        let bit = self.shift[port] & 0x01;
        self.shift[port] >>= 1;
        self.shifted[port] += 1;
        bit
    }
}
