//! Host I/O seam.
//!
//! The VM never touches stdio directly; `read` blocks inside
//! [`Hooks::request_input`] until the host delivers one line, and all
//! output (including runtime error reports) flows through
//! [`Hooks::emit_output`]. Hosts must not call back into the VM from
//! inside a hook.

use skt_core::Type;
use std::collections::VecDeque;

pub trait Hooks {
    /// Deliver one line of input for a value of `ty`. `None` means the
    /// input side is closed.
    fn request_input(&mut self, ty: Type) -> Option<String>;

    /// Receive program output. `is_error` selects the error channel.
    fn emit_output(&mut self, text: &str, is_error: bool);
}

/// In-memory hooks for tests and embedding: queued input lines, captured
/// output and error text.
#[derive(Debug, Default)]
pub struct BufferHooks {
    input: VecDeque<String>,
    pub output: String,
    pub errors: String,
}

impl BufferHooks {
    pub fn new() -> Self {
        BufferHooks::default()
    }

    pub fn with_input(lines: &[&str]) -> Self {
        BufferHooks {
            input: lines.iter().map(|s| s.to_string()).collect(),
            output: String::new(),
            errors: String::new(),
        }
    }
}

impl Hooks for BufferHooks {
    fn request_input(&mut self, _ty: Type) -> Option<String> {
        self.input.pop_front()
    }

    fn emit_output(&mut self, text: &str, is_error: bool) {
        if is_error {
            self.errors.push_str(text);
        } else {
            self.output.push_str(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_hooks_queue_input_in_order() {
        let mut hooks = BufferHooks::with_input(&["1", "2"]);
        assert_eq!(hooks.request_input(Type::Int), Some("1".to_string()));
        assert_eq!(hooks.request_input(Type::Int), Some("2".to_string()));
        assert_eq!(hooks.request_input(Type::Int), None);
    }

    #[test]
    fn test_buffer_hooks_split_channels() {
        let mut hooks = BufferHooks::new();
        hooks.emit_output("out", false);
        hooks.emit_output("err", true);
        assert_eq!(hooks.output, "out");
        assert_eq!(hooks.errors, "err");
    }
}
