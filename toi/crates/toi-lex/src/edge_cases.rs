//! Edge cases from spec §4.A that are easy to get subtly wrong.

use crate::{tokenize, LexError, TokenKind};

#[test]
fn whitespace_does_not_reset_column_tracking() {
    let (tokens, _) = tokenize("   x");
    let ident = tokens.iter().find(|t| t.kind == TokenKind::Identifier).unwrap();
    assert_eq!(ident.col, 4);
}

#[test]
fn crlf_is_a_single_newline_token() {
    let (tokens, errors) = tokenize("x\r\ny");
    assert!(errors.is_empty());
    let newline_count = tokens.iter().filter(|t| t.kind == TokenKind::Newline).count();
    assert_eq!(newline_count, 1);
}

#[test]
fn comment_at_end_of_line_preserves_statement_terminator() {
    let (tokens, _) = tokenize("x = 1 // trailing\n");
    assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Newline).count(), 1);
}

#[test]
fn leading_zero_single_digit_is_fine_but_multi_digit_errors() {
    let (_, errors) = tokenize("0 00 007 10");
    assert_eq!(errors.len(), 2);
    for e in &errors {
        assert!(matches!(e, LexError::LeadingZero { .. }));
    }
}

#[test]
fn number_separators_do_not_change_the_value() {
    let (tokens, errors) = tokenize("1'2'3");
    assert!(errors.is_empty());
    assert_eq!(
        tokens[0].literal,
        Some(crate::Literal::Int(123))
    );
}

#[test]
fn unterminated_string_reports_start_location() {
    let (_, errors) = tokenize("x = \"abc\ny = 2");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        LexError::UnterminatedString { line, col } => {
            assert_eq!(*line, 1);
            assert_eq!(*col, 5);
        }
        _ => panic!("expected UnterminatedString"),
    }
}

#[test]
fn identifiers_with_keyword_prefix_are_not_keywords() {
    let (tokens, _) = tokenize("forward nextValue typeName");
    for t in &tokens {
        if t.kind != TokenKind::Eof {
            assert_eq!(t.kind, TokenKind::Identifier);
        }
    }
}

#[test]
fn every_token_has_one_based_line_and_col() {
    let (tokens, _) = tokenize("a\nb\nc");
    for t in &tokens {
        assert!(t.line >= 1);
        assert!(t.col >= 1);
    }
}
