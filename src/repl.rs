//! The REPL (Read-Eval-Print-Loop) loop.
//!
//! Reading a line and parsing command text are treated as external
//! collaborators (`console`, `statement`); this module's only job is to
//! wire them to a `Table` and decide, per line, whether to keep looping.

use crate::console::{print_prompt, read_line};
use crate::errors::Error;
use crate::statement::{do_meta_command, execute_statement, prepare_statement, MetaCommandResult, PrepareResult};
use crate::storage::table::Table;

pub fn run(table: &mut Table) -> Result<(), Error> {
    loop {
        print_prompt()?;
        let line = match read_line()? {
            Some(line) => line,
            None => break,
        };

        if line.starts_with('.') {
            match do_meta_command(&line, table)? {
                MetaCommandResult::Success => {
                    if line == ".exit" {
                        break;
                    }
                }
                MetaCommandResult::Unrecognized => {
                    println!("Unrecognized command '{}'.", line);
                }
            }
            continue;
        }

        match prepare_statement(&line) {
            PrepareResult::Success(statement) => match execute_statement(&statement, table) {
                Ok(()) => println!("Executed."),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => println!("{}", e),
            },
            PrepareResult::SyntaxError => {
                println!("Syntax error. Could not parse statement.");
            }
            PrepareResult::NegativeId => {
                println!("ID must be positive.");
            }
            PrepareResult::StringTooLong => {
                println!("String is too long.");
            }
            PrepareResult::UnrecognizedStatement => {
                println!("Unrecognized keyword at start of '{}'.", line);
            }
        }
    }

    table.close()
}
