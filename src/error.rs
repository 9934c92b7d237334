//! Centralised error hierarchy for the interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables
//! a uniform `Result<T>` alias throughout the crate and ergonomic
//! inter-operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! The `Display` impls produce the exact strings shown to the user:
//! lexical errors render as `[line L] Error: message`, parse and resolve
//! errors add the offending token (`[line L] Error at 'x': message`), and
//! runtime errors render as `message` followed by `[line L]` on its own line.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error, located at a token.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,

        /// ` at 'lexeme'`, or ` at end` when the offender is EOF.
        location: String,
    },

    /// Static-analysis failure (early-binding errors, bad `this`/`super`/`return`).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**, locating the error at a token.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: line={}, at={:?}, msg={}",
            token.line, token.lexeme, message
        );

        LoxError::Parse {
            message,
            line: token.line,
            location: locate(token),
        }
    }

    /// Helper constructor for the **resolver**, locating the error at a token.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, at={:?}, msg={}",
            token.line, token.lexeme, message
        );

        LoxError::Resolve {
            message,
            line: token.line,
            location: locate(token),
        }
    }

    /// Helper constructor for **runtime** failures.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }
}

/// Renders the ` at ...` part of a parse/resolve diagnostic.
fn locate(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
