//! Host line protocol.
//!
//! Commands arrive one per line on stdin; replies leave one per line on
//! stdout as `<keyword> [json]`. Diagnostics never go to stdout.

pub mod parser;
pub mod response;

pub use parser::{parse_command, Command};
pub use response::{
    board_rows, write_error, write_info, write_json, write_keyword, write_raw, ResponseError,
};
