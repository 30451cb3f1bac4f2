use crate::{
    error::{Error, Result},
    report::Reporter,
    token::{Literal, Token, TokenKind},
};
use peekmore::{PeekMore, PeekMoreIterator};
use phf::phf_map;
use std::str::Chars;

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "and" => TokenKind::And,
    "class" => TokenKind::Class,
    "else" => TokenKind::Else,
    "false" => TokenKind::False,
    "for" => TokenKind::For,
    "fun" => TokenKind::Fun,
    "if" => TokenKind::If,
    "nil" => TokenKind::Nil,
    "or" => TokenKind::Or,
    "print" => TokenKind::Print,
    "return" => TokenKind::Return,
    "super" => TokenKind::Super,
    "this" => TokenKind::This,
    "true" => TokenKind::True,
    "var" => TokenKind::Var,
    "while" => TokenKind::While,
};

/// Looks up a reserved word.
pub fn keyword(text: &str) -> Option<TokenKind> {
    KEYWORDS.get(text).copied()
}

/// Single forward pass over a source string.
///
/// Iterating yields every token or lexical error in source order and stops at
/// end of input without an `EndOfFile` token. [`Scanner::scan_tokens`] is the
/// usual entry point: it drains the iterator, forwards errors to a
/// [`Reporter`] and appends the terminating `EndOfFile`.
pub struct Scanner<'a> {
    src: PeekMoreIterator<Chars<'a>>,
    lexeme_buffer: String,
    line: usize,
}

impl <'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Result<Token>> {
        loop {
            let line = self.line;
            let scanned = self.next_token_kind()?;

            let lexeme = self.lexeme_buffer.clone();
            self.lexeme_buffer.clear();

            if let Some(scanned) = scanned {
                return Some(scanned.map(|(kind, literal)| Token {
                    kind,
                    lexeme,
                    literal,
                    line,
                }));
            }
        }
    }
}

type Scanned = Result<(TokenKind, Option<Literal>)>;

impl <'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.chars().peekmore(),
            lexeme_buffer: String::new(),
            line: 1,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn scan_tokens<R: Reporter + ?Sized>(mut self, reporter: &mut R) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(scanned) = self.next() {
            match scanned {
                Ok(token) => tokens.push(token),
                Err(e) => reporter.report(e.line(), e.message()),
            }
        }
        tokens.push(Token::end_of_file(self.line));
        tokens
    }

    /// `None` at end of input; `Some(None)` when the consumed characters
    /// produce no token (whitespace, comments).
    fn next_token_kind(&mut self) -> Option<Option<Scanned>> {
        let next_char = self.advance()?;

        use TokenKind::*;
        let kind = match next_char {
            '(' => LeftParen,
            ')' => RightParen,
            '{' => LeftBrace,
            '}' => RightBrace,
            ',' => Comma,
            '.' => Dot,
            '-' => Minus,
            '+' => Plus,
            ';' => Semicolon,
            '*' => Star,
            '!' => if self.does_next_match('=') { BangEqual } else { Bang },
            '=' => if self.does_next_match('=') { EqualEqual } else { Equal },
            '<' => if self.does_next_match('=') { LessEqual } else { Less },
            '>' => if self.does_next_match('=') { GreaterEqual } else { Greater },
            '/' => {
                if self.does_next_match('/') {
                    self.advance_until_match('\n');
                    return Some(None);
                }
                Slash
            },
            ' ' | '\r' | '\t' => return Some(None),
            '\n' => {
                self.line += 1;
                return Some(None);
            },
            '"' => return Some(Some(self.extract_string())),
            c if c.is_ascii_digit() => return Some(Some(self.extract_number())),
            c if can_start_identifier(c) => return Some(Some(Ok((self.extract_identifier(), None)))),
            c => return Some(Some(Err(Error::unexpected_character(self.line, c)))),
        };
        Some(Some(Ok((kind, None))))
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.src.next()?;
        self.lexeme_buffer.push(c);
        Some(c)
    }

    fn does_next_match(&mut self, c: char) -> bool {
        if self.src.peek() != Some(&c) {
            return false;
        }
        self.advance();
        true
    }

    fn extract_string(&mut self) -> Scanned {
        let mut newline_count = 0;
        self.advance_until_for_each(|n| n == '"', |c| if c == '\n' { newline_count += 1 });
        self.line += newline_count;

        if self.advance().is_none() {
            return Err(Error::unterminated_string(self.line));
        }

        // Drop the opening and closing quote; both are one byte.
        let contents = &self.lexeme_buffer[1..self.lexeme_buffer.len() - 1];
        Ok((TokenKind::String, Some(Literal::String(contents.to_string()))))
    }

    fn extract_number(&mut self) -> Scanned {
        self.advance_until(|n| !n.is_ascii_digit());

        if self.src.peek() == Some(&'.') {
            let followed_by_digit = self.src.peek_nth(1).map_or(false, char::is_ascii_digit);
            if followed_by_digit {
                self.advance();
                self.advance_until(|n| !n.is_ascii_digit());
            }
        }

        match self.lexeme_buffer.parse() {
            Ok(number) => Ok((TokenKind::Number, Some(Literal::Number(number)))),
            Err(_) => Err(Error::invalid_number(self.line, &self.lexeme_buffer)),
        }
    }

    fn extract_identifier(&mut self) -> TokenKind {
        self.advance_until(|n| !is_part_of_valid_identifier(n));
        keyword(&self.lexeme_buffer).unwrap_or(TokenKind::Identifier)
    }

    fn advance_until_match(&mut self, c: char) {
        self.advance_until(|n| n == c)
    }

    fn advance_until(&mut self, should_stop: impl Fn(char) -> bool) {
        self.advance_until_for_each(should_stop, |_| {})
    }

    fn advance_until_for_each(
        &mut self,
        should_stop: impl Fn(char) -> bool,
        mut f: impl FnMut(char),
    ) {
        while let Some(&next) = self.src.peek() {
            if should_stop(next) {
                break;
            }
            self.advance();
            f(next);
        }
    }
}

fn can_start_identifier(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_part_of_valid_identifier(c: char) -> bool {
    can_start_identifier(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, report::Diagnostics};

    fn scan(src: &str) -> (Vec<Token>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(src).scan_tokens(&mut diagnostics);
        (tokens, diagnostics)
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        scan(src).0.iter().map(Token::kind).collect()
    }

    fn errors(src: &str) -> Vec<Error> {
        Scanner::new(src).filter_map(|r| r.err()).collect()
    }

    #[test]
    fn empty_source_is_just_end_of_file() {
        let (tokens, diagnostics) = scan("");
        assert_eq!(vec![Token::end_of_file(1)], tokens);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn single_character_punctuation() {
        use TokenKind::*;
        let cases = [
            ("(", LeftParen), (")", RightParen), ("{", LeftBrace), ("}", RightBrace),
            (",", Comma), (".", Dot), ("-", Minus), ("+", Plus),
            (";", Semicolon), ("/", Slash), ("*", Star),
            ("!", Bang), ("=", Equal), ("<", Less), (">", Greater),
        ];
        for (src, kind) in cases.iter() {
            let (tokens, _) = scan(src);
            assert_eq!(vec![Token::new(*kind, *src, None, 1), Token::end_of_file(1)], tokens);
        }
    }

    #[test]
    fn two_character_operators_prefer_longest_match() {
        use TokenKind::*;
        assert_eq!(vec![BangEqual, EndOfFile], kinds("!="));
        assert_eq!(vec![EqualEqual, EndOfFile], kinds("=="));
        assert_eq!(vec![LessEqual, EndOfFile], kinds("<="));
        assert_eq!(vec![GreaterEqual, EndOfFile], kinds(">="));
        assert_eq!(vec![EqualEqual, Equal, EndOfFile], kinds("==="));
        assert_eq!(vec![Bang, BangEqual, EndOfFile], kinds("!!="));
    }

    #[test]
    fn tracks_lines_across_newlines() {
        let (tokens, _) = scan("a\nb");
        assert_eq!(
            vec![
                Token::new(TokenKind::Identifier, "a", None, 1),
                Token::new(TokenKind::Identifier, "b", None, 2),
                Token::end_of_file(2),
            ],
            tokens
        );
    }

    #[test]
    fn string_literal_excludes_quotes() {
        let (tokens, _) = scan("\"hello\"");
        assert_eq!(
            vec![
                Token::new(TokenKind::String, "\"hello\"", Some(Literal::String("hello".into())), 1),
                Token::end_of_file(1),
            ],
            tokens
        );
    }

    #[test]
    fn string_keeps_backslashes_verbatim() {
        let (tokens, _) = scan(r#""a\nb""#);
        assert_eq!(Some(&Literal::String(r"a\nb".into())), tokens[0].literal());
    }

    #[test]
    fn multi_line_string_starts_on_opening_line() {
        let (tokens, _) = scan("\"one\ntwo\" x");
        assert_eq!(1, tokens[0].line());
        assert_eq!(Some(&Literal::String("one\ntwo".into())), tokens[0].literal());
        assert_eq!(Token::new(TokenKind::Identifier, "x", None, 2), tokens[1]);
        assert_eq!(2, tokens[2].line());
    }

    #[test]
    fn unterminated_string_reports_once_and_emits_nothing() {
        let (tokens, diagnostics) = scan("\"abc");
        assert_eq!(vec![Token::end_of_file(1)], tokens);
        assert_eq!(1, diagnostics.len());

        let errs = errors("\"abc");
        assert_eq!(1, errs.len());
        assert_eq!(&ErrorKind::UnterminatedString { line: 1 }, errs[0].kind());
    }

    #[test]
    fn unterminated_string_reports_the_line_it_stopped_on() {
        let errs = errors("\"abc\n\ndef");
        assert_eq!(vec![Error::unterminated_string(3)], errs);
    }

    #[test]
    fn number_with_fraction() {
        let (tokens, _) = scan("123.45");
        assert_eq!(
            Token::new(TokenKind::Number, "123.45", Some(Literal::Number(123.45)), 1),
            tokens[0]
        );
        assert_eq!(2, tokens.len());
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        let (tokens, _) = scan("123.");
        assert_eq!(
            vec![
                Token::new(TokenKind::Number, "123", Some(Literal::Number(123.0)), 1),
                Token::new(TokenKind::Dot, ".", None, 1),
                Token::end_of_file(1),
            ],
            tokens
        );
    }

    #[test]
    fn dot_then_identifier_after_number() {
        use TokenKind::*;
        assert_eq!(vec![Number, Dot, Identifier, EndOfFile], kinds("1.abs"));
    }

    #[test]
    fn leading_minus_is_separate() {
        let (tokens, _) = scan("-7");
        assert_eq!(TokenKind::Minus, tokens[0].kind());
        assert_eq!(Some(&Literal::Number(7.0)), tokens[1].literal());
    }

    #[test]
    fn keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(vec![Identifier, EndOfFile], kinds("classic"));
        assert_eq!(vec![Class, EndOfFile], kinds("class"));
        assert_eq!(vec![Identifier, EndOfFile], kinds("_under_score9"));
        assert_eq!(
            vec![And, Class, Else, False, Fun, For, If, Nil, Or, Print, Return, Super, This, True, Var, While, EndOfFile],
            kinds("and class else false fun for if nil or print return super this true var while")
        );
    }

    #[test]
    fn keyword_table_lookup() {
        assert_eq!(Some(TokenKind::Nil), keyword("nil"));
        assert_eq!(None, keyword("Nil"));
        assert_eq!(None, keyword("identifier"));
    }

    #[test]
    fn comment_produces_no_tokens() {
        let (tokens, _) = scan("1 // two\n3");
        assert_eq!(
            vec![
                Token::new(TokenKind::Number, "1", Some(Literal::Number(1.0)), 1),
                Token::new(TokenKind::Number, "3", Some(Literal::Number(3.0)), 2),
                Token::end_of_file(2),
            ],
            tokens
        );
    }

    #[test]
    fn comment_at_end_of_input() {
        use TokenKind::*;
        assert_eq!(vec![Slash, EndOfFile], kinds("/ // trailing"));
    }

    #[test]
    fn unexpected_characters_are_reported_and_skipped() {
        let (tokens, diagnostics) = scan("@a#\n$");
        let kinds: Vec<_> = tokens.iter().map(Token::kind).collect();
        assert_eq!(vec![TokenKind::Identifier, TokenKind::EndOfFile], kinds);

        let lines: Vec<_> = diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(vec![1, 1, 2], lines);
        assert_eq!("Unexpected character '@'.", diagnostics.iter().next().unwrap().message);
    }

    #[test]
    fn iterator_yields_errors_in_order_without_end_of_file() {
        let items: Vec<_> = Scanner::new("( # )").collect();
        assert_eq!(3, items.len());
        assert!(items[0].is_ok());
        assert_eq!(
            &ErrorKind::UnexpectedCharacter { line: 1, character: '#' },
            items[1].as_ref().unwrap_err().kind()
        );
        assert!(items[2].is_ok());
    }

    #[test]
    fn long_runs_of_whitespace_do_not_recurse() {
        let src = " ".repeat(200_000) + "x";
        assert_eq!(vec![TokenKind::Identifier, TokenKind::EndOfFile], kinds(&src));
    }

    #[test]
    fn small_program() {
        let src = "var x = 10;\nif (x >= 2) print \"big\";";
        let rendered: Vec<_> = scan(src).0.iter().map(Token::to_string).collect();
        assert_eq!(
            vec![
                "VAR var null",
                "IDENTIFIER x null",
                "EQUAL = null",
                "NUMBER 10 10",
                "SEMICOLON ; null",
                "IF if null",
                "LEFT_PAREN ( null",
                "IDENTIFIER x null",
                "GREATER_EQUAL >= null",
                "NUMBER 2 2",
                "RIGHT_PAREN ) null",
                "PRINT print null",
                "STRING \"big\" big",
                "SEMICOLON ; null",
                "EOF  null",
            ],
            rendered
        );
    }
}
