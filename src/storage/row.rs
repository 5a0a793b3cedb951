//! Row type and its fixed-width on-disk encoding.
//!
//! A row is the only record type this engine knows about: an integer
//! primary key plus two zero-padded byte strings. The layout is a direct
//! `memcpy`-style packing, matching how the leaf cells that hold rows are
//! laid out on a page.

use crate::errors::Error;

pub const USERNAME_SIZE: usize = 32;
pub const EMAIL_SIZE: usize = 255;

const ID_SIZE: usize = 4;
const ID_OFFSET: usize = 0;
const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Total serialized width of one row: 4 + 32 + 255.
pub const ROW_SIZE: usize = EMAIL_OFFSET + EMAIL_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    pub username: String,
    pub email: String,
}

impl Row {
    /// Builds a row from parsed REPL arguments, rejecting strings that
    /// don't fit the fixed-width columns. This is the "upstream" validation
    /// the codec itself assumes has already happened.
    pub fn new(id: u32, username: &str, email: &str) -> Result<Row, RowValidationError> {
        if username.len() > USERNAME_SIZE {
            return Err(RowValidationError::StringTooLong);
        }
        if email.len() > EMAIL_SIZE {
            return Err(RowValidationError::StringTooLong);
        }
        Ok(Row {
            id,
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    pub fn serialize(&self) -> [u8; ROW_SIZE] {
        let mut buf = [0u8; ROW_SIZE];
        buf[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        let username = self.username.as_bytes();
        buf[USERNAME_OFFSET..USERNAME_OFFSET + username.len()].copy_from_slice(username);
        let email = self.email.as_bytes();
        buf[EMAIL_OFFSET..EMAIL_OFFSET + email.len()].copy_from_slice(email);
        buf
    }

    pub fn deserialize(buf: &[u8]) -> Result<Row, Error> {
        if buf.len() != ROW_SIZE {
            return Err(Error::CorruptFile(format!(
                "row buffer has {} bytes, expected {}",
                buf.len(),
                ROW_SIZE
            )));
        }
        let id = u32::from_le_bytes(buf[ID_OFFSET..ID_OFFSET + ID_SIZE].try_into().unwrap());
        let username = trim_padding(&buf[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]);
        let email = trim_padding(&buf[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]);
        Ok(Row {
            id,
            username,
            email,
        })
    }
}

fn trim_padding(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowValidationError {
    StringTooLong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_serialize_deserialize() {
        let row = Row::new(7, "alice", "alice@example.com").unwrap();
        let bytes = row.serialize();
        assert_eq!(bytes.len(), ROW_SIZE);
        let back = Row::deserialize(&bytes).unwrap();
        assert_eq!(row, back);
    }

    #[test]
    fn round_trips_empty_strings() {
        let row = Row::new(0, "", "").unwrap();
        let back = Row::deserialize(&row.serialize()).unwrap();
        assert_eq!(back.username, "");
        assert_eq!(back.email, "");
    }

    #[test]
    fn round_trips_boundary_ids() {
        for id in [0u32, u32::MAX] {
            let row = Row::new(id, "u", "e").unwrap();
            let back = Row::deserialize(&row.serialize()).unwrap();
            assert_eq!(back.id, id);
        }
    }

    #[test]
    fn username_at_max_length_is_accepted() {
        let username = "a".repeat(USERNAME_SIZE);
        assert!(Row::new(1, &username, "e").is_ok());
    }

    #[test]
    fn username_over_max_length_is_rejected() {
        let username = "a".repeat(USERNAME_SIZE + 1);
        assert_eq!(
            Row::new(1, &username, "e").unwrap_err(),
            RowValidationError::StringTooLong
        );
    }

    #[test]
    fn email_over_max_length_is_rejected() {
        let email = "a".repeat(EMAIL_SIZE + 1);
        assert_eq!(
            Row::new(1, "u", &email).unwrap_err(),
            RowValidationError::StringTooLong
        );
    }

    #[test]
    fn padding_bytes_are_zero_after_content() {
        let row = Row::new(1, "ab", "c@d").unwrap();
        let bytes = row.serialize();
        assert_eq!(
            &bytes[USERNAME_OFFSET + 2..USERNAME_OFFSET + USERNAME_SIZE],
            &[0u8; USERNAME_SIZE - 2][..]
        );
    }
}
