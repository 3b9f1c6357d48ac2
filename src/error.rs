use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// Every fault is fatal to the compilation run: the first error aborts and
/// no partial output is produced. Lines are 1-based.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("line {line}: syntax error: expected `{expected}`, found `{found}`")]
    Syntax {
        expected: String,
        found: String,
        line: u32,
    },

    #[error("line {line}: undefined variable `{name}`")]
    Undefined { name: String, line: u32 },

    #[error("line {line}: variable `{name}` is already defined")]
    Redefined { name: String, line: u32 },

    #[error("line {line}: integer constant `{literal}` out of range")]
    BadConstant { literal: String, line: u32 },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
