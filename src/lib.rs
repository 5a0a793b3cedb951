//! Library surface for integration tests and the `picobase` binary: the
//! storage engine, the statement grammar, the REPL loop, and the console
//! and error types they share.

pub mod console;
pub mod errors;
pub mod repl;
pub mod statement;
pub mod storage;
