//! GLFW window and input backend
//!
//! Opens an OpenGL 4.3 core window and translates GLFW events into the
//! engine's normalized [`Event`] stream. Cursor positions are flipped so
//! that y grows upwards from the bottom edge.

use glfw::Context;

use super::backend::{BackendError, EventBackend, InputMode};
use super::event::Event;
use super::keyboard::{Keycode, MouseButton};
use super::state::InputState;

/// Backend built on GLFW
pub struct GlfwBackend {
    glfw: glfw::Glfw,
    window: Option<glfw::PWindow>,
    events: Option<glfw::GlfwReceiver<(f64, glfw::WindowEvent)>>,
    title: String,
    width: u32,
    height: u32,
    fullscreen: bool,
    running: bool,
    input: InputState,
    mode: InputMode,
}

impl GlfwBackend {
    /// Initialize GLFW
    pub fn new() -> Result<Self, BackendError> {
        let glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|error| BackendError::InitializationFailed(format!("{error:?}")))?;
        log::info!("Run game backend : GlfwBackend");
        Ok(Self {
            glfw,
            window: None,
            events: None,
            title: String::new(),
            width: 0,
            height: 0,
            fullscreen: false,
            running: false,
            input: InputState::default(),
            mode: InputMode::None,
        })
    }

    fn translate(&mut self, event: glfw::WindowEvent) -> Option<Event> {
        match event {
            glfw::WindowEvent::Close => Some(Event::Quit),
            glfw::WindowEvent::FramebufferSize(width, height) => {
                let width = u32::try_from(width).ok()?;
                let height = u32::try_from(height).ok()?;
                if width == 0 || height == 0 {
                    return None;
                }
                self.width = width;
                self.height = height;
                Some(Event::VideoResize { width, height })
            }
            glfw::WindowEvent::Key(key, _, glfw::Action::Press, _) => {
                map_key(key).map(|keycode| Event::KeyDown { keycode })
            }
            glfw::WindowEvent::Key(key, _, glfw::Action::Release, _) => {
                map_key(key).map(|keycode| Event::KeyUp { keycode })
            }
            glfw::WindowEvent::Char(c) => Some(Event::Text { text: c.to_string() }),
            glfw::WindowEvent::CursorPos(x, y) => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
                let event = Event::MouseMove {
                    x: x as f32,
                    y: self.height as f32 - y as f32,
                };
                Some(event)
            }
            glfw::WindowEvent::MouseButton(button, action, _) => {
                let button = map_mouse_button(button)?;
                match action {
                    glfw::Action::Press => Some(Event::MouseButtonDown { button }),
                    glfw::Action::Release => Some(Event::MouseButtonUp { button }),
                    glfw::Action::Repeat => None,
                }
            }
            glfw::WindowEvent::Scroll(_, y) => {
                #[allow(clippy::cast_possible_truncation)]
                self.input.scroll(y as f32);
                None
            }
            _ => None,
        }
    }
}

impl EventBackend for GlfwBackend {
    fn create_window(&mut self, width: u32, height: u32, fullscreen: bool) -> Result<(), BackendError> {
        self.glfw.window_hint(glfw::WindowHint::ContextVersion(4, 3));
        self.glfw
            .window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        self.glfw.window_hint(glfw::WindowHint::Resizable(true));

        let title = if self.title.is_empty() { "scene_engine" } else { self.title.as_str() };
        let created = if fullscreen {
            self.glfw.with_primary_monitor(|glfw, monitor| {
                let mode = monitor.map_or(glfw::WindowMode::Windowed, |m| glfw::WindowMode::FullScreen(&*m));
                glfw.create_window(width, height, title, mode)
            })
        } else {
            self.glfw
                .create_window(width, height, title, glfw::WindowMode::Windowed)
        };
        let (mut window, events) = created.ok_or_else(|| {
            log::error!("Failed to create a {width}x{height} window");
            BackendError::WindowCreationFailed(format!("{width}x{height}"))
        })?;

        window.make_current();
        window.set_key_polling(true);
        window.set_char_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_mouse_button_polling(true);
        window.set_scroll_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_close_polling(true);

        let (fb_width, fb_height) = window.get_framebuffer_size();
        self.width = u32::try_from(fb_width).unwrap_or(width);
        self.height = u32::try_from(fb_height).unwrap_or(height);
        self.fullscreen = fullscreen;
        self.input.set_size(self.width, self.height);
        self.window = Some(window);
        self.events = Some(events);
        self.running = true;
        Ok(())
    }

    fn set_window_title(&mut self, title: &str) {
        self.title = title.to_string();
        if let Some(window) = &mut self.window {
            window.set_title(title);
        }
    }

    fn change_resolution(&mut self, width: u32, height: u32, fullscreen: bool) {
        let Some(window) = &mut self.window else {
            return;
        };
        if fullscreen {
            self.glfw.with_primary_monitor(|_, monitor| {
                if let Some(monitor) = monitor {
                    window.set_monitor(glfw::WindowMode::FullScreen(monitor), 0, 0, width, height, None);
                }
            });
        } else {
            window.set_monitor(glfw::WindowMode::Windowed, 64, 64, width, height, None);
        }
        self.fullscreen = fullscreen;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_mouse_grab(&mut self, grab: bool) {
        self.input.set_mouse_grab(grab);
        if let Some(window) = &mut self.window {
            let mode = if grab { glfw::CursorMode::Disabled } else { glfw::CursorMode::Normal };
            window.set_cursor_mode(mode);
        }
    }

    fn poll_events(&mut self) -> Vec<Event> {
        self.input.begin_tick();
        self.glfw.poll_events();

        let raw: Vec<glfw::WindowEvent> = self
            .events
            .as_ref()
            .map(|events| glfw::flush_messages(events).map(|(_, event)| event).collect())
            .unwrap_or_default();
        let mut events = Vec::with_capacity(raw.len());
        for raw_event in raw {
            if let Some(event) = self.translate(raw_event) {
                self.input.apply(&event);
                events.push(event);
            }
        }
        self.input.end_tick();

        if self.input.mouse_grab() {
            if let Some(window) = &mut self.window {
                let center = self.input.center();
                window.set_cursor_pos(f64::from(center.x), f64::from(center.y));
            }
        }
        events
    }

    fn input(&self) -> &InputState {
        &self.input
    }

    fn input_mode(&self) -> InputMode {
        self.mode
    }

    fn set_input_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    fn flip(&mut self) {
        if let Some(window) = &mut self.window {
            window.swap_buffers();
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn close(&mut self) {
        self.running = false;
    }

    fn quit(&mut self) {
        self.running = false;
        if let Some(window) = &mut self.window {
            window.set_should_close(true);
        }
        self.window = None;
        self.events = None;
    }
}

fn map_mouse_button(button: glfw::MouseButton) -> Option<MouseButton> {
    match button {
        glfw::MouseButton::Button1 => Some(MouseButton::Left),
        glfw::MouseButton::Button2 => Some(MouseButton::Right),
        glfw::MouseButton::Button3 => Some(MouseButton::Middle),
        _ => None,
    }
}

fn map_key(key: glfw::Key) -> Option<Keycode> {
    use glfw::Key as G;
    let keycode = match key {
        G::A => Keycode::A,
        G::B => Keycode::B,
        G::C => Keycode::C,
        G::D => Keycode::D,
        G::E => Keycode::E,
        G::F => Keycode::F,
        G::G => Keycode::G,
        G::H => Keycode::H,
        G::I => Keycode::I,
        G::J => Keycode::J,
        G::K => Keycode::K,
        G::L => Keycode::L,
        G::M => Keycode::M,
        G::N => Keycode::N,
        G::O => Keycode::O,
        G::P => Keycode::P,
        G::Q => Keycode::Q,
        G::R => Keycode::R,
        G::S => Keycode::S,
        G::T => Keycode::T,
        G::U => Keycode::U,
        G::V => Keycode::V,
        G::W => Keycode::W,
        G::X => Keycode::X,
        G::Y => Keycode::Y,
        G::Z => Keycode::Z,
        G::Num0 => Keycode::Digit0,
        G::Num1 => Keycode::Digit1,
        G::Num2 => Keycode::Digit2,
        G::Num3 => Keycode::Digit3,
        G::Num4 => Keycode::Digit4,
        G::Num5 => Keycode::Digit5,
        G::Num6 => Keycode::Digit6,
        G::Num7 => Keycode::Digit7,
        G::Num8 => Keycode::Digit8,
        G::Num9 => Keycode::Digit9,
        G::F1 => Keycode::F1,
        G::F2 => Keycode::F2,
        G::F3 => Keycode::F3,
        G::F4 => Keycode::F4,
        G::F5 => Keycode::F5,
        G::F6 => Keycode::F6,
        G::F7 => Keycode::F7,
        G::F8 => Keycode::F8,
        G::F9 => Keycode::F9,
        G::F10 => Keycode::F10,
        G::F11 => Keycode::F11,
        G::F12 => Keycode::F12,
        G::Left => Keycode::Left,
        G::Right => Keycode::Right,
        G::Up => Keycode::Up,
        G::Down => Keycode::Down,
        G::Home => Keycode::Home,
        G::End => Keycode::End,
        G::PageUp => Keycode::PageUp,
        G::PageDown => Keycode::PageDown,
        G::LeftShift => Keycode::LShift,
        G::RightShift => Keycode::RShift,
        G::LeftControl => Keycode::LCtrl,
        G::RightControl => Keycode::RCtrl,
        G::LeftAlt => Keycode::LAlt,
        G::RightAlt => Keycode::RAlt,
        G::LeftSuper => Keycode::LSuper,
        G::RightSuper => Keycode::RSuper,
        G::CapsLock => Keycode::CapsLock,
        G::NumLock => Keycode::NumLock,
        G::Kp0 => Keycode::Num0,
        G::Kp1 => Keycode::Num1,
        G::Kp2 => Keycode::Num2,
        G::Kp3 => Keycode::Num3,
        G::Kp4 => Keycode::Num4,
        G::Kp5 => Keycode::Num5,
        G::Kp6 => Keycode::Num6,
        G::Kp7 => Keycode::Num7,
        G::Kp8 => Keycode::Num8,
        G::Kp9 => Keycode::Num9,
        G::KpDecimal => Keycode::NumDecimal,
        G::KpDivide => Keycode::NumDivide,
        G::KpMultiply => Keycode::NumMultiply,
        G::KpSubtract => Keycode::NumSubtract,
        G::KpAdd => Keycode::NumAdd,
        G::KpEnter => Keycode::NumEnter,
        G::KpEqual => Keycode::NumEqual,
        G::Escape => Keycode::Escape,
        G::Enter => Keycode::Enter,
        G::Tab => Keycode::Tab,
        G::Backspace => Keycode::Backspace,
        G::Space => Keycode::Space,
        G::Insert => Keycode::Insert,
        G::Delete => Keycode::Delete,
        G::Pause => Keycode::Pause,
        G::PrintScreen => Keycode::PrintScreen,
        G::ScrollLock => Keycode::ScrollLock,
        G::Menu => Keycode::Menu,
        G::Minus => Keycode::Minus,
        G::Equal => Keycode::Equal,
        G::Comma => Keycode::Comma,
        G::Period => Keycode::Period,
        G::Slash => Keycode::Slash,
        G::Backslash => Keycode::Backslash,
        G::Semicolon => Keycode::Semicolon,
        G::Apostrophe => Keycode::Apostrophe,
        G::LeftBracket => Keycode::BracketLeft,
        G::RightBracket => Keycode::BracketRight,
        G::GraveAccent => Keycode::Grave,
        _ => return None,
    };
    Some(keycode)
}
