use std::fmt;

use crate::symbols::StorageClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Static,
    Local,
    Argument,
    Temp,
}

impl From<StorageClass> for Segment {
    fn from(class: StorageClass) -> Self {
        match class {
            StorageClass::Static => Segment::Static,
            StorageClass::Argument => Segment::Argument,
            StorageClass::Local => Segment::Local,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Segment::Constant => "constant",
            Segment::Static => "static",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::Temp => "temp",
        })
    }
}

/// Arithmetic and logic mnemonics of the target VM. `Neg` is part of the
/// VM's vocabulary even though no imp construct currently compiles to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmOp {
    Add,
    Sub,
    #[allow(dead_code)]
    Neg,
    Eq,
    Gt,
    Lt,
    Not,
}

impl fmt::Display for VmOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VmOp::Add => "add",
            VmOp::Sub => "sub",
            VmOp::Neg => "neg",
            VmOp::Eq => "eq",
            VmOp::Gt => "gt",
            VmOp::Lt => "lt",
            VmOp::Not => "not",
        })
    }
}

/// Append-only buffer of VM instruction text, serialized once at the end
/// of compilation. Label declarations and function headers sit flush-left;
/// every other instruction is indented with a tab.
pub struct Emitter {
    lines: Vec<String>,
}

impl Emitter {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn push(&mut self, segment: Segment, offset: u32) {
        self.lines.push(format!("\tpush {segment} {offset}"));
    }

    pub fn pop(&mut self, segment: Segment, offset: u32) {
        self.lines.push(format!("\tpop {segment} {offset}"));
    }

    pub fn op(&mut self, op: VmOp) {
        self.lines.push(format!("\t{op}"));
    }

    pub fn label(&mut self, label: &str) {
        self.lines.push(format!("label {label}"));
    }

    pub fn goto(&mut self, label: &str) {
        self.lines.push(format!("\tgoto {label}"));
    }

    pub fn if_goto(&mut self, label: &str) {
        self.lines.push(format!("\tif-goto {label}"));
    }

    pub fn call(&mut self, target: &str, args: u32) {
        self.lines.push(format!("\tcall {target} {args}"));
    }

    pub fn function(&mut self, target: &str, locals: u32) {
        self.lines.push(format!("function {target} {locals}"));
    }

    pub fn ret(&mut self) {
        self.lines.push("\treturn".to_string());
    }

    /// One instruction per line, trailing newline included.
    pub fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_every_instruction_kind() {
        let mut emitter = Emitter::new();
        emitter.function("main.mult", 2);
        emitter.push(Segment::Constant, 7);
        emitter.pop(Segment::Local, 0);
        emitter.op(VmOp::Add);
        emitter.op(VmOp::Neg);
        emitter.label("label0");
        emitter.goto("label0");
        emitter.if_goto("label1");
        emitter.call("main.mult", 2);
        emitter.ret();
        assert_eq!(
            emitter.finish(),
            "function main.mult 2\n\
             \tpush constant 7\n\
             \tpop local 0\n\
             \tadd\n\
             \tneg\n\
             label label0\n\
             \tgoto label0\n\
             \tif-goto label1\n\
             \tcall main.mult 2\n\
             \treturn\n"
        );
    }

    #[test]
    fn storage_classes_map_to_segments() {
        assert_eq!(Segment::from(StorageClass::Static), Segment::Static);
        assert_eq!(Segment::from(StorageClass::Argument), Segment::Argument);
        assert_eq!(Segment::from(StorageClass::Local), Segment::Local);
    }

    #[test]
    fn empty_emitter_finishes_to_a_single_newline() {
        assert_eq!(Emitter::new().finish(), "\n");
    }
}
