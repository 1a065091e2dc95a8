//! Standard exit codes (BSD sysexits.h compatible)

/// Data format error (tree file cannot be decoded)
pub const DATAERR: i32 = 65;

/// Cannot open input (operator input closed)
pub const NOINPUT: i32 = 66;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
