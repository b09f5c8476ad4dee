//! Normalized key and mouse button table
//!
//! Every backend maps its host key codes into [`Keycode`], so engine code
//! never sees library specific values.

/// Keys known to the engine
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keycode {
    // Letters
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Digits row
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Cursor control
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,

    // Modifiers
    LShift,
    RShift,
    LCtrl,
    RCtrl,
    LAlt,
    RAlt,
    LSuper,
    RSuper,
    CapsLock,

    // Number pad
    NumLock,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    NumDecimal,
    NumDivide,
    NumMultiply,
    NumSubtract,
    NumAdd,
    NumEnter,
    NumEqual,

    // Misc
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,
    Insert,
    Delete,
    Pause,
    PrintScreen,
    ScrollLock,
    Menu,
    Minus,
    Equal,
    Comma,
    Period,
    Slash,
    Backslash,
    Semicolon,
    Apostrophe,
    BracketLeft,
    BracketRight,
    Grave,
}

impl Keycode {
    /// Whether this is a shift, control, alt, super or caps lock key
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::LShift
                | Self::RShift
                | Self::LCtrl
                | Self::RCtrl
                | Self::LAlt
                | Self::RAlt
                | Self::LSuper
                | Self::RSuper
                | Self::CapsLock
        )
    }

    /// Key that types `c` on a US layout, for letters, digits and space
    pub fn from_char(c: char) -> Option<Self> {
        const LETTERS: [Keycode; 26] = [
            Keycode::A,
            Keycode::B,
            Keycode::C,
            Keycode::D,
            Keycode::E,
            Keycode::F,
            Keycode::G,
            Keycode::H,
            Keycode::I,
            Keycode::J,
            Keycode::K,
            Keycode::L,
            Keycode::M,
            Keycode::N,
            Keycode::O,
            Keycode::P,
            Keycode::Q,
            Keycode::R,
            Keycode::S,
            Keycode::T,
            Keycode::U,
            Keycode::V,
            Keycode::W,
            Keycode::X,
            Keycode::Y,
            Keycode::Z,
        ];
        const DIGITS: [Keycode; 10] = [
            Keycode::Digit0,
            Keycode::Digit1,
            Keycode::Digit2,
            Keycode::Digit3,
            Keycode::Digit4,
            Keycode::Digit5,
            Keycode::Digit6,
            Keycode::Digit7,
            Keycode::Digit8,
            Keycode::Digit9,
        ];

        let c = c.to_ascii_uppercase();
        match c {
            'A'..='Z' => LETTERS.get((c as usize) - ('A' as usize)).copied(),
            '0'..='9' => DIGITS.get((c as usize) - ('0' as usize)).copied(),
            ' ' => Some(Self::Space),
            _ => None,
        }
    }
}

/// Mouse buttons tracked by the input state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Middle mouse button
    Middle,
    /// Right mouse button
    Right,
}

impl MouseButton {
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Middle => 1,
            Self::Right => 2,
        }
    }
}
