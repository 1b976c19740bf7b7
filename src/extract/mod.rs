//! Text extraction module
//!
//! This module turns raw page text into structured contact data. Today that
//! means email addresses, including the common `(at)`/`(dot)` obfuscations.

mod email;

pub use email::{extract_emails, extract_emails_chunked, is_valid_email, DEFAULT_CHUNK_SIZE};
