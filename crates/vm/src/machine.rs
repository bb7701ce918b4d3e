//! Fetch-decode-execute loop.

use crate::error::RuntimeError;
use crate::hooks::Hooks;
use skt_core::{Instruction, Program, Stack, Type, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of one execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub success: bool,
    pub error: Option<String>,
}

/// Run `program` to completion.
///
/// `cancel`, when supplied, is checked at every instruction boundary; a
/// set flag stops the machine with a `Cancelled` outcome. Division by zero
/// and unparsable input are reported through the hooks' error channel and
/// execution continues with a zero value.
pub fn execute(program: &Program, hooks: &mut dyn Hooks, cancel: Option<&AtomicBool>) -> Outcome {
    let mut machine = Machine::new(program);
    match machine.run(hooks, cancel) {
        Ok(()) => Outcome {
            success: true,
            error: None,
        },
        Err(e) => Outcome {
            success: false,
            error: Some(e.to_string()),
        },
    }
}

struct Machine<'p> {
    program: &'p Program,
    ip: usize,
    stack: Stack,
    env: HashMap<String, Value>,
}

impl<'p> Machine<'p> {
    fn new(program: &'p Program) -> Self {
        let env = program
            .globals
            .iter()
            .map(|(name, ty)| (name.clone(), Value::zero(*ty)))
            .collect();
        Machine {
            program,
            ip: 0,
            stack: Stack::new(),
            env,
        }
    }

    fn run(
        &mut self,
        hooks: &mut dyn Hooks,
        cancel: Option<&AtomicBool>,
    ) -> Result<(), RuntimeError> {
        if !self.program.is_resolved() {
            return Err(RuntimeError::Internal(
                "program contains unresolved labels or out-of-range jumps".to_string(),
            ));
        }

        let code = &self.program.code;
        while self.ip < code.len() {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(RuntimeError::Cancelled);
                }
            }

            match &code[self.ip] {
                Instruction::PushConst(index) => {
                    let value = self
                        .program
                        .constants
                        .get(*index)
                        .ok_or_else(|| internal(format!("bad constant index {}", index)))?;
                    self.stack.push(value.clone());
                }
                Instruction::PushVar(name) => {
                    let value = self
                        .env
                        .get(name)
                        .ok_or_else(|| internal(format!("unknown variable '{}'", name)))?;
                    self.stack.push(value.clone());
                }
                Instruction::Store(name) => {
                    let value = self.pop()?;
                    if !self.env.contains_key(name) {
                        return Err(internal(format!("store to unknown variable '{}'", name)));
                    }
                    self.env.insert(name.clone(), value);
                }

                Instruction::Add => self.arithmetic(hooks, "add")?,
                Instruction::Sub => self.arithmetic(hooks, "sub")?,
                Instruction::Mul => self.arithmetic(hooks, "mul")?,
                Instruction::Div => self.arithmetic(hooks, "div")?,
                Instruction::Mod => self.arithmetic(hooks, "mod")?,
                Instruction::Pow => self.arithmetic(hooks, "pow")?,

                Instruction::Neg => {
                    let value = self.pop()?;
                    let negated = match value {
                        Value::Int(n) => Value::Int(n.wrapping_neg()),
                        Value::Float(x) => Value::Float(-x),
                        other => {
                            return Err(internal(format!("neg on non-numeric {:?}", other)))
                        }
                    };
                    self.stack.push(negated);
                }

                Instruction::Eq => self.comparison("eq")?,
                Instruction::Ne => self.comparison("ne")?,
                Instruction::Lt => self.comparison("lt")?,
                Instruction::Le => self.comparison("le")?,
                Instruction::Gt => self.comparison("gt")?,
                Instruction::Ge => self.comparison("ge")?,

                Instruction::And | Instruction::Or => {
                    let b = self.pop_bool()?;
                    let a = self.pop_bool()?;
                    let result = if matches!(code[self.ip], Instruction::And) {
                        a && b
                    } else {
                        a || b
                    };
                    self.stack.push(Value::Bool(result));
                }
                Instruction::Not => {
                    let a = self.pop_bool()?;
                    self.stack.push(Value::Bool(!a));
                }

                Instruction::I2F => {
                    let value = self.pop()?;
                    match value {
                        Value::Int(n) => self.stack.push(Value::Float(n as f64)),
                        other => {
                            return Err(internal(format!("i2f on non-int {:?}", other)))
                        }
                    }
                }

                Instruction::Jump(addr) => {
                    self.ip = *addr;
                    continue;
                }
                Instruction::JumpIfFalse(addr) => {
                    let cond = self.pop_bool()?;
                    if !cond {
                        self.ip = *addr;
                        continue;
                    }
                }

                Instruction::Read(name, ty) => {
                    let value = self.read_value(hooks, *ty);
                    if !self.env.contains_key(name) {
                        return Err(internal(format!("read into unknown variable '{}'", name)));
                    }
                    self.env.insert(name.clone(), value);
                }
                Instruction::Write(kind) => {
                    let value = self.pop()?;
                    debug_assert_eq!(value.type_of(), *kind, "write kind disagrees with value");
                    hooks.emit_output(&value.to_string(), false);
                }
                Instruction::WriteLn => {
                    hooks.emit_output("\n", false);
                }

                Instruction::Label(id) => {
                    return Err(internal(format!("label sentinel L{} reached the VM", id)));
                }
                Instruction::Halt => break,
            }
            self.ip += 1;
        }
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or_else(|| internal("operand stack underflow".to_string()))
    }

    fn pop_bool(&mut self) -> Result<bool, RuntimeError> {
        match self.pop()? {
            Value::Bool(b) => Ok(b),
            other => Err(internal(format!("expected bool on stack, found {:?}", other))),
        }
    }

    /// Binary arithmetic. Codegen widens operands to a common type, so a
    /// mixed pair here is a compiler bug. Integer division or modulus by
    /// zero is reported and replaced with 0.
    fn arithmetic(&mut self, hooks: &mut dyn Hooks, op: &str) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = match (a, b) {
            (Value::Int(a), Value::Int(b)) => {
                if (op == "div" || op == "mod") && b == 0 {
                    hooks.emit_output("runtime error: division by zero\n", true);
                    Value::Int(0)
                } else {
                    Value::Int(match op {
                        "add" => a.wrapping_add(b),
                        "sub" => a.wrapping_sub(b),
                        "mul" => a.wrapping_mul(b),
                        "div" => a.wrapping_div(b),
                        "mod" => a.wrapping_rem(b),
                        "pow" => int_pow(a, b),
                        _ => unreachable!("arithmetic called with '{}'", op),
                    })
                }
            }
            (Value::Float(a), Value::Float(b)) => Value::Float(match op {
                "add" => a + b,
                "sub" => a - b,
                "mul" => a * b,
                // IEEE semantics: float division by zero is inf/nan
                "div" => a / b,
                "mod" => a % b,
                "pow" => a.powf(b),
                _ => unreachable!("arithmetic called with '{}'", op),
            }),
            (a, b) => {
                return Err(internal(format!(
                    "'{}' on mismatched operands {:?} and {:?}",
                    op, a, b
                )))
            }
        };
        self.stack.push(result);
        Ok(())
    }

    fn comparison(&mut self, op: &str) -> Result<(), RuntimeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = match (&a, &b) {
            (Value::Int(a), Value::Int(b)) => compare(op, a.partial_cmp(b)),
            (Value::Float(a), Value::Float(b)) => compare(op, a.partial_cmp(b)),
            (Value::Bool(x), Value::Bool(y)) if op == "eq" || op == "ne" => {
                Some((x == y) == (op == "eq"))
            }
            (Value::Str(x), Value::Str(y)) if op == "eq" || op == "ne" => {
                Some((x == y) == (op == "eq"))
            }
            _ => None,
        };
        match result {
            Some(value) => {
                self.stack.push(Value::Bool(value));
                Ok(())
            }
            None => Err(internal(format!(
                "'{}' on mismatched operands {:?} and {:?}",
                op, a, b
            ))),
        }
    }

    /// One `cin` read: request a line, parse it by the target's declared
    /// type. Unparsable (or closed) input is reported and replaced by the
    /// type's zero value.
    fn read_value(&mut self, hooks: &mut dyn Hooks, ty: Type) -> Value {
        let Some(line) = hooks.request_input(ty) else {
            hooks.emit_output("runtime error: input is closed\n", true);
            return Value::zero(ty);
        };
        match parse_input(&line, ty) {
            Some(value) => value,
            None => {
                hooks.emit_output(
                    &format!("runtime error: '{}' is not a valid {}\n", line.trim_end(), ty),
                    true,
                );
                Value::zero(ty)
            }
        }
    }
}

fn internal(message: String) -> RuntimeError {
    RuntimeError::Internal(message)
}

/// `a ^ b` over 64-bit integers: wrapping, with negative exponents
/// truncating to zero.
fn int_pow(a: i64, b: i64) -> i64 {
    if b < 0 {
        return 0;
    }
    a.wrapping_pow(u32::try_from(b).unwrap_or(u32::MAX))
}

fn compare(op: &str, ordering: Option<std::cmp::Ordering>) -> Option<bool> {
    use std::cmp::Ordering::*;
    let ordering = ordering?;
    Some(match op {
        "eq" => ordering == Equal,
        "ne" => ordering != Equal,
        "lt" => ordering == Less,
        "le" => ordering != Greater,
        "gt" => ordering == Greater,
        "ge" => ordering != Less,
        _ => unreachable!("comparison called with '{}'", op),
    })
}

fn parse_input(line: &str, ty: Type) -> Option<Value> {
    match ty {
        Type::Int => line.trim().parse::<i64>().ok().map(Value::Int),
        Type::Float => line.trim().parse::<f64>().ok().map(Value::Float),
        Type::Bool => match line.trim() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        Type::Str => Some(Value::Str(line.to_string())),
    }
}
