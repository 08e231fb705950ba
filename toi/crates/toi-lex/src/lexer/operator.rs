//! Single- and two-character punctuators and operators. `=`, `<` and `>`
//! each lead a two-character operator, so they're scanned by advancing past
//! the lead character and then trying `Cursor::match_char` on the second;
//! every other punctuator is single-character only.

use crate::cursor::Cursor;
use crate::TokenKind;

/// Scans the punctuator or operator starting at the cursor's current
/// character. Returns `None` if the current character is neither.
pub fn scan(cursor: &mut Cursor<'_>) -> Option<(TokenKind, String)> {
    let c0 = cursor.current_char();
    match c0 {
        '=' => {
            cursor.advance();
            if cursor.match_char('=') {
                Some((TokenKind::EqualEqual, "==".to_string()))
            } else {
                Some((TokenKind::Equal, "=".to_string()))
            }
        }
        '<' => {
            cursor.advance();
            if cursor.match_char('>') {
                Some((TokenKind::NotEqual, "<>".to_string()))
            } else if cursor.match_char('=') {
                Some((TokenKind::LessEqual, "<=".to_string()))
            } else if cursor.match_char('<') {
                Some((TokenKind::ShiftLeft, "<<".to_string()))
            } else {
                Some((TokenKind::Less, "<".to_string()))
            }
        }
        '>' => {
            cursor.advance();
            if cursor.match_char('=') {
                Some((TokenKind::GreaterEqual, ">=".to_string()))
            } else {
                Some((TokenKind::Greater, ">".to_string()))
            }
        }
        _ => {
            let kind = single_char_kind(c0)?;
            cursor.advance();
            Some((kind, c0.to_string()))
        }
    }
}

fn single_char_kind(c: char) -> Option<TokenKind> {
    Some(match c {
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        '_' => TokenKind::Concat,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        ',' => TokenKind::Comma,
        '.' => TokenKind::Dot,
        '|' => TokenKind::Pipe,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use crate::{tokenize, TokenKind};

    #[test]
    fn two_char_ops_are_greedy() {
        let (tokens, errors) = tokenize("a <> b >= c <= d == e");
        assert!(errors.is_empty());
        let kinds: Vec<_> = tokens
            .iter()
            .map(|t| t.kind)
            .filter(|k| {
                matches!(
                    k,
                    TokenKind::NotEqual
                        | TokenKind::GreaterEqual
                        | TokenKind::LessEqual
                        | TokenKind::EqualEqual
                )
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::NotEqual,
                TokenKind::GreaterEqual,
                TokenKind::LessEqual,
                TokenKind::EqualEqual,
            ]
        );
    }

    #[test]
    fn single_char_fallback() {
        let (tokens, errors) = tokenize("a < b > c = d");
        assert!(errors.is_empty());
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Less));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Greater));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Equal));
    }

    #[test]
    fn concat_operator() {
        let (tokens, errors) = tokenize(r#""a" _ "b""#);
        assert!(errors.is_empty());
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Concat));
    }
}
