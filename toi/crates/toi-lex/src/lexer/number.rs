//! Number literals: a contiguous run of digits, optionally interrupted by
//! `'` separators which are stripped before parsing. A leading `0` on a
//! number with more than one digit is a lexical error.

use crate::cursor::Cursor;

/// Scans a number literal. Returns the raw lexeme (including any `'`
/// separators, for faithful re-serialization) and the parsed value, or
/// `Err(())` if the literal has a disallowed leading zero.
pub fn scan(cursor: &mut Cursor<'_>) -> Result<(String, i64), ()> {
    let start = cursor.position();
    while cursor.current_char().is_ascii_digit() || cursor.current_char() == '\'' {
        cursor.advance();
    }
    let lexeme = cursor.slice_from(start).to_string();
    let digits: String = lexeme.chars().filter(|c| *c != '\'').collect();

    if digits.len() > 1 && digits.starts_with('0') {
        return Err(());
    }

    let value: i64 = digits.parse().unwrap_or(i64::MAX);
    Ok((lexeme, value))
}
