//! Meta-commands and the tiny `insert`/`select` statement grammar.
//!
//! This is the textual surface the REPL speaks: lines starting with `.`
//! are meta-commands handled without ever reaching the table; everything
//! else is prepared into a `Statement` and then executed against one.

use crate::errors::Error;
use crate::storage::row::Row;
use crate::storage::table::Table;

pub enum MetaCommandResult {
    Success,
    Unrecognized,
}

/// Handles a leading-dot command. `.exit` is reported back to the caller
/// as `Success` — the REPL itself decides what exiting means (flush and
/// break the loop) since this function has no owning access to the table.
pub fn do_meta_command(input: &str, table: &mut Table) -> Result<MetaCommandResult, Error> {
    match input {
        ".exit" => Ok(MetaCommandResult::Success),
        ".btree" => {
            print!("{}", table.print_tree()?);
            Ok(MetaCommandResult::Success)
        }
        ".constants" => {
            println!("Constants:");
            println!("{}", Table::print_constants());
            Ok(MetaCommandResult::Success)
        }
        _ => Ok(MetaCommandResult::Unrecognized),
    }
}

pub enum StatementType {
    Insert,
    Select,
}

pub struct Statement {
    pub kind: StatementType,
    pub row_to_insert: Option<Row>,
}

pub enum PrepareResult {
    Success(Statement),
    SyntaxError,
    NegativeId,
    StringTooLong,
    UnrecognizedStatement,
}

/// Parses one line of input into a `Statement`. Only `insert` needs
/// argument parsing; `select` takes none.
pub fn prepare_statement(input: &str) -> PrepareResult {
    if input.starts_with("insert") {
        prepare_insert(input)
    } else if input == "select" {
        PrepareResult::Success(Statement {
            kind: StatementType::Select,
            row_to_insert: None,
        })
    } else {
        PrepareResult::UnrecognizedStatement
    }
}

fn prepare_insert(input: &str) -> PrepareResult {
    // Splits on single spaces, at most 4 parts, matching the "insert" /
    // "id" / "username" / "rest of line" carve-up of the original
    // tutorial's `buffer.split(" ", 3)`: anything after the username,
    // spaces included, becomes the email verbatim. This never rejects
    // for "too many tokens" — only for too few.
    let parts: Vec<&str> = input.splitn(4, ' ').collect();
    if parts.len() < 4 {
        return PrepareResult::SyntaxError;
    }
    let (id_str, username, email) = (parts[1], parts[2], parts[3]);

    let id: i64 = match id_str.parse() {
        Ok(id) => id,
        Err(_) => return PrepareResult::SyntaxError,
    };
    if id < 0 {
        return PrepareResult::NegativeId;
    }
    if id > u32::MAX as i64 {
        return PrepareResult::SyntaxError;
    }

    match Row::new(id as u32, username, email) {
        Ok(row) => PrepareResult::Success(Statement {
            kind: StatementType::Insert,
            row_to_insert: Some(row),
        }),
        Err(_) => PrepareResult::StringTooLong,
    }
}

/// Runs a prepared statement against `table`, printing `select` results
/// the way the original tutorial's `print_row` does: `(id, username,
/// email)`, one row per line.
pub fn execute_statement(statement: &Statement, table: &mut Table) -> Result<(), Error> {
    match statement.kind {
        StatementType::Insert => {
            let row = statement.row_to_insert.as_ref().expect("insert statement carries a row");
            table.insert(row)
        }
        StatementType::Select => {
            for row in table.select()? {
                println!("({}, {}, {})", row.id, row.username, row.email);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_insert() {
        match prepare_statement("insert 1 alice alice@example.com") {
            PrepareResult::Success(stmt) => {
                let row = stmt.row_to_insert.unwrap();
                assert_eq!(row.id, 1);
                assert_eq!(row.username, "alice");
                assert_eq!(row.email, "alice@example.com");
            }
            _ => panic!("expected a successful parse"),
        }
    }

    #[test]
    fn rejects_negative_id() {
        assert!(matches!(
            prepare_statement("insert -1 alice alice@example.com"),
            PrepareResult::NegativeId
        ));
    }

    #[test]
    fn rejects_missing_arguments() {
        assert!(matches!(
            prepare_statement("insert 1 alice"),
            PrepareResult::SyntaxError
        ));
    }

    #[test]
    fn rejects_string_too_long() {
        let email = "a".repeat(256);
        let input = format!("insert 1 alice {email}");
        assert!(matches!(
            prepare_statement(&input),
            PrepareResult::StringTooLong
        ));
    }

    #[test]
    fn recognizes_select_with_no_arguments() {
        assert!(matches!(
            prepare_statement("select"),
            PrepareResult::Success(_)
        ));
    }

    #[test]
    fn rejects_unknown_keyword() {
        assert!(matches!(
            prepare_statement("delete 1"),
            PrepareResult::UnrecognizedStatement
        ));
    }

    #[test]
    fn extra_whitespace_separated_words_fold_into_the_email() {
        match prepare_statement("insert 1 alice foo bar") {
            PrepareResult::Success(stmt) => {
                let row = stmt.row_to_insert.unwrap();
                assert_eq!(row.username, "alice");
                assert_eq!(row.email, "foo bar");
            }
            _ => panic!("expected a successful parse with the rest of the line as the email"),
        }
    }
}
