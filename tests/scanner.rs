use rlox::scanner::Scanner;
use rlox::token::{Token, TokenType};

fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
    let scanner = Scanner::new(source.as_bytes());
    let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

    assert_eq!(
        tokens.len(),
        expected.len(),
        "token count mismatch for {:?}",
        source
    );

    for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
        assert_eq!(actual.token_type, *expected_type);
        assert_eq!(actual.lexeme, *expected_lexeme);
    }
}

#[test]
fn scans_punctuation() {
    assert_token_sequence(
        "({*.,+*})",
        &[
            (TokenType::LEFT_PAREN, "("),
            (TokenType::LEFT_BRACE, "{"),
            (TokenType::STAR, "*"),
            (TokenType::DOT, "."),
            (TokenType::COMMA, ","),
            (TokenType::PLUS, "+"),
            (TokenType::STAR, "*"),
            (TokenType::RIGHT_BRACE, "}"),
            (TokenType::RIGHT_PAREN, ")"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn scans_one_and_two_char_operators() {
    assert_token_sequence(
        "! != = == < <= > >= / ",
        &[
            (TokenType::BANG, "!"),
            (TokenType::BANG_EQUAL, "!="),
            (TokenType::EQUAL, "="),
            (TokenType::EQUAL_EQUAL, "=="),
            (TokenType::LESS, "<"),
            (TokenType::LESS_EQUAL, "<="),
            (TokenType::GREATER, ">"),
            (TokenType::GREATER_EQUAL, ">="),
            (TokenType::SLASH, "/"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn scans_keywords_and_identifiers() {
    assert_token_sequence(
        "var language = lox; class fun _under score99",
        &[
            (TokenType::VAR, "var"),
            (TokenType::IDENTIFIER, "language"),
            (TokenType::EQUAL, "="),
            (TokenType::IDENTIFIER, "lox"),
            (TokenType::SEMICOLON, ";"),
            (TokenType::CLASS, "class"),
            (TokenType::FUN, "fun"),
            (TokenType::IDENTIFIER, "_under"),
            (TokenType::IDENTIFIER, "score99"),
            (TokenType::EOF, ""),
        ],
    );
}

#[test]
fn scans_number_literals() {
    let tokens: Vec<Token> = Scanner::new(b"12 12.5 0.75 7.")
        .filter_map(Result::ok)
        .collect();

    let numbers: Vec<f64> = tokens
        .iter()
        .filter_map(|t| match t.token_type {
            TokenType::NUMBER(n) => Some(n),
            _ => None,
        })
        .collect();

    // `7.` is a number followed by a dot, not a fractional literal.
    assert_eq!(numbers, vec![12.0, 12.5, 0.75, 7.0]);
    assert_eq!(tokens[tokens.len() - 2].token_type, TokenType::DOT);
}

#[test]
fn scans_string_literals_unquoted() {
    let tokens: Vec<Token> = Scanner::new(b"\"hi there\"")
        .filter_map(Result::ok)
        .collect();

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].lexeme, "\"hi there\"");

    match &tokens[0].token_type {
        TokenType::STRING(s) => assert_eq!(s, "hi there"),
        other => panic!("expected STRING, got {:?}", other),
    }
}

#[test]
fn multiline_string_advances_line_counter() {
    let tokens: Vec<Token> = Scanner::new(b"\"a\nb\"\nx")
        .filter_map(Result::ok)
        .collect();

    // The string starts on line 1; the identifier after it lands on line 3.
    assert_eq!(tokens[0].line, 2);
    assert_eq!(tokens[1].lexeme, "x");
    assert_eq!(tokens[1].line, 3);
}

#[test]
fn comments_and_whitespace_produce_no_tokens() {
    assert_token_sequence(
        "// a comment\n  \t\r\n1 // trailing\n",
        &[(TokenType::NUMBER(1.0), "1"), (TokenType::EOF, "")],
    );
}

#[test]
fn unexpected_characters_are_reported_and_scanning_continues() {
    let results: Vec<_> = Scanner::new(b",.$(#").collect();

    // 2 tokens, error, token, error, EOF.
    assert_eq!(results.len(), 6);

    let errors: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().err().map(|e| e.to_string()))
        .collect();

    assert_eq!(
        errors,
        vec![
            "[line 1] Error: Unexpected character.",
            "[line 1] Error: Unexpected character.",
        ]
    );

    let kinds: Vec<TokenType> = results
        .iter()
        .filter_map(|r| r.as_ref().ok().map(|t| t.token_type.clone()))
        .collect();

    assert_eq!(
        kinds,
        vec![
            TokenType::COMMA,
            TokenType::DOT,
            TokenType::LEFT_PAREN,
            TokenType::EOF,
        ]
    );
}

#[test]
fn unterminated_string_is_an_error() {
    let results: Vec<_> = Scanner::new(b"\"oops").collect();

    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0].as_ref().unwrap_err().to_string(),
        "[line 1] Error: Unterminated string."
    );
    assert_eq!(results[1].as_ref().unwrap().token_type, TokenType::EOF);
}

#[test]
fn every_input_ends_with_exactly_one_eof() {
    for source in ["", "   ", "// only a comment", "1 + 2", "\"s\""] {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(Result::ok)
            .collect();

        let eof_count = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::EOF)
            .count();

        assert_eq!(eof_count, 1, "source {:?}", source);
        assert_eq!(tokens.last().unwrap().token_type, TokenType::EOF);
    }
}

#[test]
fn line_numbers_are_monotonic() {
    let tokens: Vec<Token> = Scanner::new(b"1\n2\n\n3 4\n5")
        .filter_map(Result::ok)
        .collect();

    let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();

    assert_eq!(lines, sorted);
    assert_eq!(lines, vec![1, 2, 4, 4, 5, 5]);
}
