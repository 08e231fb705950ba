//! Identifiers and keywords: `[A-Za-z_][A-Za-z0-9_]*`, with keyword
//! lexemes reclassified to their dedicated token kind.

use crate::cursor::Cursor;
use crate::TokenKind;

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Scans an identifier or keyword starting at the cursor's current
/// position, returning its token kind and lexeme text.
///
/// A lone `_` is the string-concatenation operator (spec §4.A), not an
/// identifier — even though `_` alone also satisfies the identifier
/// grammar `[A-Za-z_][A-Za-z0-9_]*`. Only a `_` with no continuation
/// characters is reclassified this way; `_foo`, `_1`, etc. scan as
/// ordinary identifiers.
pub fn scan(cursor: &mut Cursor<'_>) -> (TokenKind, String) {
    let start = cursor.position();
    while is_ident_continue(cursor.current_char()) {
        cursor.advance();
    }
    let lexeme = cursor.slice_from(start).to_string();
    if lexeme == "_" {
        return (TokenKind::Concat, lexeme);
    }
    let kind = TokenKind::keyword(&lexeme).unwrap_or(TokenKind::Identifier);
    (kind, lexeme)
}

#[cfg(test)]
mod tests {
    use crate::tokenize;
    use crate::TokenKind;

    #[test]
    fn plain_identifier() {
        let (tokens, _) = tokenize("my_var1");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme.as_str(), "my_var1");
    }

    #[test]
    fn keyword_identifier_boundary() {
        let (tokens, _) = tokenize("ifx");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
    }

    #[test]
    fn keyword_recognized() {
        let (tokens, _) = tokenize("while");
        assert_eq!(tokens[0].kind, TokenKind::While);
    }

    /// A lone `_` is the concat operator, not an identifier, even though
    /// it satisfies the identifier grammar on its own (spec §4.A).
    #[test]
    fn lone_underscore_is_concat_not_an_identifier() {
        let (tokens, _) = tokenize("_");
        assert_eq!(tokens[0].kind, TokenKind::Concat);
    }

    #[test]
    fn underscore_prefixed_identifier_is_still_an_identifier() {
        let (tokens, _) = tokenize("_for_container");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme.as_str(), "_for_container");
    }
}
