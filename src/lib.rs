pub mod error;
pub mod report;
pub mod scanner;
pub mod token;

pub use crate::{
    error::{Error, ErrorKind, Result},
    report::{Diagnostic, Diagnostics, Reporter, WriteReporter},
    scanner::Scanner,
    token::{Literal, Token, TokenKind},
};
