//! String literals: `"..."`, with the four-character escape `${"}`
//! standing for a literal `"` inside the body.

use crate::cursor::Cursor;

/// Scans a string literal starting at the opening `"`. Returns the raw
/// lexeme (including both quotes) and the unescaped contents, or
/// `Err(())` if the string runs to end-of-input unterminated.
pub fn scan(cursor: &mut Cursor<'_>) -> Result<(String, String), ()> {
    let start = cursor.position();
    cursor.advance(); // opening quote

    let mut value = String::new();
    loop {
        if cursor.is_at_end() {
            return Err(());
        }
        if cursor.current_char() == '"' {
            cursor.advance();
            break;
        }
        if starts_with_quote_escape(cursor) {
            value.push('"');
            cursor.advance_n(4);
            continue;
        }
        value.push(cursor.current_char());
        cursor.advance();
    }

    let lexeme = cursor.slice_from(start).to_string();
    Ok((lexeme, value))
}

fn starts_with_quote_escape(cursor: &Cursor<'_>) -> bool {
    cursor.peek_char(0) == '$'
        && cursor.peek_char(1) == '{'
        && cursor.peek_char(2) == '"'
        && cursor.peek_char(3) == '}'
}

#[cfg(test)]
mod tests {
    use crate::{tokenize, Literal, LexError};

    #[test]
    fn plain_string() {
        let (tokens, errors) = tokenize(r#""hello""#);
        assert!(errors.is_empty());
        assert_eq!(tokens[0].literal, Some(Literal::Str("hello".to_string())));
    }

    #[test]
    fn escaped_quote() {
        let (tokens, errors) = tokenize(r#""say ${"}hi${"}""#);
        assert!(errors.is_empty());
        assert_eq!(
            tokens[0].literal,
            Some(Literal::Str("say \"hi\"".to_string()))
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let (_, errors) = tokenize("\"abc");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
    }
}
