//! Line-buffered stdio implementation of the VM's host hooks.

use skt_vm::Hooks;
use std::io::{BufRead, Write};

/// Program output goes to stdout, runtime error reports to stderr, and
/// each `cin` read takes one line from stdin. Stdout is flushed before
/// every read so prompts printed without a newline are visible.
pub struct StdioHooks {
    stdin: std::io::Stdin,
}

impl StdioHooks {
    pub fn new() -> Self {
        StdioHooks {
            stdin: std::io::stdin(),
        }
    }
}

impl Hooks for StdioHooks {
    fn request_input(&mut self, _ty: skt_core::Type) -> Option<String> {
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        match self.stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Some(line)
            }
        }
    }

    fn emit_output(&mut self, text: &str, is_error: bool) {
        if is_error {
            eprint!("{}", text);
        } else {
            print!("{}", text);
            if text.contains('\n') {
                let _ = std::io::stdout().flush();
            }
        }
    }
}
