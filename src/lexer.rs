use crate::utils::{is_delimiter, DEFAULT_QUOTATION_MARK};

/// Represents the different kinds of tokens that the lexer can produce.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenType {
    // == Special Tokens ==
    /// Represents the end of the input.
    Eof,
    /// Represents a sequence of one or more whitespace characters (spaces, tabs, newlines).
    Whitespace,
    /// A quoted label, a tag or a comment that is still open at the end of the input.
    /// The associated `char` is the opening character (quotation mark, `{` or `[`).
    Unterminated(char),

    // == Literals ==
    /// A bare label, i.e. a run of characters without whitespace or reserved characters.
    Label(String),
    /// A label enclosed in quotation marks. Doubled quotation marks are already unescaped.
    QuotedLabel(String),
    /// A bare run that reads as a number. Kept as raw text, e.g. `2.0` or `1e-5`.
    Number(String),
    /// Raw content between `{` and `}` or between `[` and `]`.
    Text(String),

    // == Punctuation ==
    /// Left Parenthesis: `(`
    LParen,
    /// Right Parenthesis: `)`
    RParen,
    /// Comma: `,`
    Comma,
    /// Colon: `:` (introduces a value, usually a branch length)
    Colon,
    /// Semicolon: `;` (terminates a tree)
    Semicolon,
    /// Left Brace: `{` (opens a tag)
    LBrace,
    /// Right Brace: `}`
    RBrace,
    /// Left Bracket: `[` (opens a comment)
    LBracket,
    /// Right Bracket: `]`
    RBracket,
}

/// A token with its type and position.
///
/// `pos_start`/`pos_end` are byte offsets into the input; `line`/`column` are
/// the 1-based position of the first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub ttype: TokenType,
    pub pos_start: usize,
    pub pos_end: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(ttype: TokenType, pos_start: usize, pos_end: usize, line: usize, column: usize) -> Token {
        Token {
            ttype,
            pos_start,
            pos_end,
            line,
            column,
        }
    }
}

/// Lazy tokenizer for Newick text.
///
/// Iterating yields every token up to and including [`TokenType::Eof`], then stops.
/// Call [`Lexer::reset`] to start over from the beginning of the input.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    position: usize,
    line: usize,
    column: usize,
    quotation_mark: char,
    // Closing char plus the position of the opening one while inside `{...}` or `[...]`.
    enclosed: Option<(char, usize, usize, usize)>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_quotation_mark(input, DEFAULT_QUOTATION_MARK)
    }

    pub fn with_quotation_mark(input: &'a str, quotation_mark: char) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            line: 1,
            column: 1,
            quotation_mark,
            enclosed: None,
            finished: false,
        }
    }

    /// Rewinds to the start of the input.
    pub fn reset(&mut self) {
        *self = Self::with_quotation_mark(self.input, self.quotation_mark);
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn quotation_mark(&self) -> char {
        self.quotation_mark
    }

    /// Tokenizes the remaining input eagerly. The last token is always `Eof`.
    pub fn lex(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if token.ttype == TokenType::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    pub fn next_token(&mut self) -> Token {
        if let Some((close, start, line, column)) = self.enclosed {
            return self.next_enclosed_token(close, start, line, column);
        }

        let start_pos = self.position;
        let (line, column) = (self.line, self.column);

        let ttype = if let Some(char) = self.advance() {
            match char {
                '(' => TokenType::LParen,
                ')' => TokenType::RParen,
                ',' => TokenType::Comma,
                ':' => TokenType::Colon,
                ';' => TokenType::Semicolon,
                '}' => TokenType::RBrace,
                ']' => TokenType::RBracket,
                '{' => {
                    self.enclosed = Some(('}', start_pos, line, column));
                    TokenType::LBrace
                }
                '[' => {
                    self.enclosed = Some((']', start_pos, line, column));
                    TokenType::LBracket
                }
                c if c == self.quotation_mark => self.read_quoted(),
                c if c.is_whitespace() => self.read_whitespace(),
                c => self.read_bare(c),
            }
        } else {
            TokenType::Eof
        };

        Token::new(ttype, start_pos, self.position, line, column)
    }

    fn next_enclosed_token(&mut self, close: char, open_pos: usize, open_line: usize, open_column: usize) -> Token {
        let start_pos = self.position;
        let (line, column) = (self.line, self.column);

        match self.peek() {
            None => {
                self.enclosed = None;
                let open = if close == '}' { '{' } else { '[' };
                Token::new(TokenType::Unterminated(open), open_pos, self.position, open_line, open_column)
            }
            Some(&c) if c == close => {
                self.advance();
                self.enclosed = None;
                let ttype = if close == '}' {
                    TokenType::RBrace
                } else {
                    TokenType::RBracket
                };
                Token::new(ttype, start_pos, self.position, line, column)
            }
            Some(_) => {
                let mut text = String::new();
                while let Some(&c) = self.peek() {
                    if c == close {
                        break;
                    }
                    self.advance();
                    text.push(c);
                }
                Token::new(TokenType::Text(text), start_pos, self.position, line, column)
            }
        }
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.position += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        char
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn read_whitespace(&mut self) -> TokenType {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
        TokenType::Whitespace
    }

    fn read_quoted(&mut self) -> TokenType {
        let quote = self.quotation_mark;
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return TokenType::Unterminated(quote),
                Some(c) if c == quote => {
                    // A doubled quotation mark stands for a literal one.
                    if self.peek() == Some(&quote) {
                        self.advance();
                        value.push(quote);
                    } else {
                        return TokenType::QuotedLabel(value);
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn read_bare(&mut self, first_char: char) -> TokenType {
        let mut text = String::new();
        text.push(first_char);

        while let Some(&c) = self.peek() {
            if is_delimiter(c, self.quotation_mark) {
                break;
            }
            self.advance();
            text.push(c);
        }

        let numeric_start = first_char.is_ascii_digit() || matches!(first_char, '-' | '+' | '.');
        if numeric_start && text.parse::<f64>().is_ok() {
            TokenType::Number(text)
        } else {
            TokenType::Label(text)
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.ttype == TokenType::Eof {
            self.finished = true;
        }
        Some(token)
    }
}
