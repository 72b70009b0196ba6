//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Scripts rely on them, so existing values never change meaning.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (store rejected an operation)      |
//! | 2    | Usage error (bad arguments, bad config)          |
//! | 3    | I/O error (missing file, unwritable output)      |
//! | 4    | Parse error (malformed JSON, CSV or cell key)    |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - an operation failed against the table, e.g. an unknown
/// cell or a duplicate column.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments or an invalid settings file.
pub const EXIT_USAGE: u8 = 2;

/// I/O error - reading or writing a file failed.
pub const EXIT_IO: u8 = 3;

/// Parse error - input exists but could not be decoded.
pub const EXIT_PARSE: u8 = 4;
