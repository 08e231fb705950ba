//! Line comments (`// ...`).
//!
//! A comment-only line also consumes its trailing newline, so the parser
//! never sees a statement terminator for a line that was pure comment.

use crate::cursor::Cursor;

/// If the cursor is positioned at `//`, consumes the comment (and, when
/// `at_line_start` says only whitespace preceded it on this line, the
/// trailing newline too) and returns `true`. Otherwise leaves the cursor
/// untouched and returns `false`.
pub fn try_consume(cursor: &mut Cursor<'_>, at_line_start: bool) -> bool {
    if cursor.current_char() != '/' || cursor.peek_char(1) != '/' {
        return false;
    }

    cursor.advance(); // first '/'
    cursor.advance(); // second '/'
    while !cursor.is_at_end() && cursor.current_char() != '\n' && cursor.current_char() != '\r' {
        cursor.advance();
    }

    if at_line_start && !cursor.is_at_end() {
        let c = cursor.current_char();
        cursor.advance();
        if c == '\r' && cursor.current_char() == '\n' {
            cursor.advance();
        }
    }

    true
}
