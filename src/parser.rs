use crate::broker::{Broker, Element};
use crate::error::{NewickError, ParserError};
use crate::lexer::{Lexer, Token, TokenType};
use log::{debug, trace};
use miette::{NamedSource, SourceSpan};
use std::sync::Arc;

/// A stack-based parser that turns Newick text into [`Broker`]s.
///
/// ```text
/// tree    := subtree ";"
/// subtree := "(" subtree ("," subtree)* ")" label? | label?
/// label   := name? (":" value)* tag* comment*
/// ```
///
/// Tokens are pulled lazily from the [`Lexer`]; whitespace is skipped.
#[derive(Debug)]
pub struct Parser<'a> {
    source: Arc<NamedSource<String>>,
    source_text: &'a str,
    lexer: Lexer<'a>,
    current: Token,
}

/// Where the parser stands inside the tree that is currently read.
#[derive(Debug, Default)]
struct TreeState {
    elements: Vec<Element>,
    // Indices of elements whose '(' is not closed yet.
    open: Vec<usize>,
    // Depth at which the next subtree starts, if one is expected.
    pending: Option<usize>,
    // Element that receives name/values/tags/comments.
    current: Option<usize>,
    named: bool,
    // Comments seen before the element they belong to was started.
    leading_comments: Vec<String>,
}

impl TreeState {
    fn new() -> Self {
        Self {
            pending: Some(0),
            ..Self::default()
        }
    }

    fn start_element(&mut self, depth: usize) -> usize {
        let mut element = Element::default().with_depth(depth);
        element.comments.append(&mut self.leading_comments);
        self.elements.push(element);
        let index = self.elements.len() - 1;
        self.current = Some(index);
        self.named = false;
        index
    }

    /// Starts an unnamed element if a subtree was expected but none was given, e.g. in `(,)`.
    fn close_pending(&mut self) {
        if let Some(depth) = self.pending.take() {
            self.start_element(depth);
        }
    }

    fn current_element(&mut self) -> Option<&mut Element> {
        self.current.map(|index| &mut self.elements[index])
    }
}

impl<'a> Parser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "source.nwk".to_string())
    }

    pub fn new_with_name(source_text: &'a str, name: String) -> Self {
        let source = Arc::new(NamedSource::new(name, source_text.to_string()));
        let mut lexer = Lexer::new(source_text);
        let current = Self::next_significant(&mut lexer);
        Self {
            source,
            source_text,
            lexer,
            current,
        }
    }

    /// Uses `quotation_mark` instead of `'` for quoted labels. Restarts lexing.
    pub fn with_quotation_mark(mut self, quotation_mark: char) -> Self {
        self.lexer = Lexer::with_quotation_mark(self.source_text, quotation_mark);
        self.current = Self::next_significant(&mut self.lexer);
        self
    }

    // === Main Parsing Methods ===

    /// Parses exactly one tree. Only whitespace may follow its `;`.
    /// The returned broker is ranked.
    pub fn parse_broker(&mut self) -> Result<Broker, NewickError> {
        if self.check(&TokenType::Eof) {
            return Err(ParserError::EmptyInput {
                src: self.src(),
                span: Self::span(&self.current),
            }
            .into());
        }

        let broker = self.parse_tree()?;

        match self.current.ttype {
            TokenType::Eof => Ok(broker),
            TokenType::Semicolon => Err(self.err_multiple_terminators()),
            _ => Err(ParserError::TrailingContent {
                src: self.src(),
                span: Self::span(&self.current),
                line: self.current.line,
                column: self.current.column,
            }
            .into()),
        }
    }

    /// Parses every tree up to the end of the input, e.g. the content of a
    /// file with one tree per line. Each returned broker is ranked.
    pub fn parse_all(&mut self) -> Result<Vec<Broker>, NewickError> {
        let mut brokers = Vec::new();
        while !self.check(&TokenType::Eof) {
            if !brokers.is_empty() && self.check(&TokenType::Semicolon) {
                return Err(self.err_multiple_terminators());
            }
            brokers.push(self.parse_tree()?);
        }
        debug!("Parsed {} trees", brokers.len());
        Ok(brokers)
    }

    /// tree ::= subtree ";"
    fn parse_tree(&mut self) -> Result<Broker, NewickError> {
        let mut state = TreeState::new();

        loop {
            let token = self.current.clone();
            match &token.ttype {
                TokenType::LParen => {
                    let Some(depth) = state.pending else {
                        return self.err_unexpected(&token, "',', ')' or ';'");
                    };
                    let index = state.start_element(depth);
                    state.open.push(index);
                    state.pending = Some(depth + 1);
                    state.current = None;
                    self.advance();
                }
                TokenType::Comma => {
                    let Some(&parent) = state.open.last() else {
                        return Err(ParserError::StrayComma {
                            src: self.src(),
                            span: Self::span(&token),
                            line: token.line,
                            column: token.column,
                        }
                        .into());
                    };
                    state.close_pending();
                    state.pending = Some(state.elements[parent].depth + 1);
                    state.current = None;
                    self.advance();
                }
                TokenType::RParen => {
                    if state.open.is_empty() {
                        return Err(ParserError::UnmatchedClose {
                            src: self.src(),
                            span: Self::span(&token),
                            line: token.line,
                            column: token.column,
                        }
                        .into());
                    }
                    state.close_pending();
                    state.current = state.open.pop();
                    state.named = false;
                    self.advance();
                }
                TokenType::Semicolon => {
                    if !state.open.is_empty() {
                        return Err(self.err_unbalanced(&token, state.open.len()));
                    }
                    state.close_pending();
                    self.advance();
                    break;
                }
                TokenType::Eof => {
                    if !state.open.is_empty() {
                        return Err(self.err_unbalanced(&token, state.open.len()));
                    }
                    return Err(ParserError::MissingTerminator {
                        src: self.src(),
                        span: Self::span(&token),
                        line: token.line,
                        column: token.column,
                    }
                    .into());
                }
                TokenType::LBracket if state.pending.is_some() => {
                    let comment = self.parse_enclosed(TokenType::RBracket)?;
                    state.leading_comments.push(comment);
                }
                TokenType::Label(_)
                | TokenType::QuotedLabel(_)
                | TokenType::Number(_)
                | TokenType::Colon
                | TokenType::LBrace
                | TokenType::LBracket => {
                    if let Some(depth) = state.pending.take() {
                        state.start_element(depth);
                    }
                    self.parse_label_item(&mut state)?;
                }
                TokenType::Unterminated(open) => return Err(self.err_unterminated(&token, *open)),
                _ => return self.err_unexpected(&token, "a label, '(', ',', ')' or ';'"),
            }
        }

        trace!("Tree closed with {} elements", state.elements.len());
        let mut broker = Broker::from_preorder(state.elements);
        broker.assign_ranks()?;
        debug!("Parsed tree with {} elements", broker.len());
        Ok(broker)
    }

    /// label ::= name? (":" value)* tag* comment*
    /// Consumes one item of the label of the current element.
    fn parse_label_item(&mut self, state: &mut TreeState) -> Result<(), NewickError> {
        let token = self.current.clone();
        let has_values_or_tags = match state.current_element() {
            Some(element) => !element.values.is_empty() || !element.tags.is_empty(),
            None => return self.err_unexpected(&token, "',' or ')'"),
        };

        match &token.ttype {
            TokenType::Label(name) | TokenType::QuotedLabel(name) | TokenType::Number(name) => {
                if state.named || has_values_or_tags {
                    return self.err_unexpected(&token, "',', ')' or ';'");
                }
                self.advance();
                state.named = true;
                if let Some(element) = state.current_element() {
                    element.name = name.clone();
                }
            }
            TokenType::Colon => {
                self.advance();
                let value = self.parse_value()?;
                if let Some(element) = state.current_element() {
                    element.values.push(value);
                }
            }
            TokenType::LBrace => {
                let tag = self.parse_enclosed(TokenType::RBrace)?;
                if let Some(element) = state.current_element() {
                    element.tags.push(tag);
                }
            }
            TokenType::LBracket => {
                let comment = self.parse_enclosed(TokenType::RBracket)?;
                if let Some(element) = state.current_element() {
                    element.comments.push(comment);
                }
            }
            _ => return self.err_unexpected(&token, "a label"),
        }
        Ok(())
    }

    /// value ::= number-or-text
    fn parse_value(&mut self) -> Result<String, NewickError> {
        let token = self.current.clone();
        match token.ttype {
            TokenType::Number(value) | TokenType::Label(value) => {
                self.advance();
                Ok(value)
            }
            TokenType::Unterminated(open) => Err(self.err_unterminated(&token, open)),
            _ => self.err_unexpected(&token, "a value after ':'"),
        }
    }

    /// tag ::= "{" text "}", comment ::= "[" text "]"
    fn parse_enclosed(&mut self, close: TokenType) -> Result<String, NewickError> {
        // Opening brace or bracket.
        self.advance();

        let token = self.current.clone();
        let text = match token.ttype {
            TokenType::Text(text) => {
                self.advance();
                text
            }
            _ => String::new(),
        };

        let token = self.current.clone();
        match token.ttype {
            ref t if *t == close => {
                self.advance();
                Ok(text)
            }
            TokenType::Unterminated(open) => Err(self.err_unterminated(&token, open)),
            _ => {
                let expected = if close == TokenType::RBrace { "'}'" } else { "']'" };
                self.err_unexpected(&token, expected)
            }
        }
    }

    // === Tokenizer Helper Methods ===

    fn next_significant(lexer: &mut Lexer<'a>) -> Token {
        loop {
            let token = lexer.next_token();
            if token.ttype != TokenType::Whitespace {
                return token;
            }
        }
    }

    fn advance(&mut self) {
        if self.current.ttype != TokenType::Eof {
            self.current = Self::next_significant(&mut self.lexer);
        }
    }

    fn check(&self, ttype: &TokenType) -> bool {
        std::mem::discriminant(&self.current.ttype) == std::mem::discriminant(ttype)
    }

    fn src(&self) -> NamedSource<String> {
        (*self.source).clone()
    }

    fn span(token: &Token) -> SourceSpan {
        (token.pos_start, token.pos_end - token.pos_start).into()
    }

    fn err_unexpected<T>(&self, token: &Token, expected: &str) -> Result<T, NewickError> {
        Err(ParserError::UnexpectedToken {
            src: self.src(),
            span: Self::span(token),
            expected: expected.to_string(),
            line: token.line,
            column: token.column,
        }
        .into())
    }

    fn err_unterminated(&self, token: &Token, open: char) -> NewickError {
        if open == self.lexer.quotation_mark() {
            ParserError::UnterminatedQuote {
                src: self.src(),
                span: Self::span(token),
                line: token.line,
                column: token.column,
            }
            .into()
        } else {
            ParserError::UnterminatedBracket {
                src: self.src(),
                span: Self::span(token),
                open,
                line: token.line,
                column: token.column,
            }
            .into()
        }
    }

    fn err_unbalanced(&self, token: &Token, open: usize) -> NewickError {
        ParserError::UnbalancedParentheses {
            src: self.src(),
            span: Self::span(token),
            open,
            line: token.line,
            column: token.column,
        }
        .into()
    }

    fn err_multiple_terminators(&self) -> NewickError {
        ParserError::MultipleTerminators {
            src: self.src(),
            span: Self::span(&self.current),
            line: self.current.line,
            column: self.current.column,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    fn parse_ok(source: &str) -> Broker {
        let mut parser = Parser::new_with_name(source, "test.nwk".to_string());
        match parser.parse_broker() {
            Ok(broker) => broker,
            Err(err) => {
                let report = Report::from(err);
                panic!("{:?}", report);
            }
        }
    }

    fn parse_err(source: &str) -> ParserError {
        match Parser::new(source).parse_broker() {
            Err(NewickError::Parser(err)) => err,
            other => panic!("expected parser error for {source:?}, got {other:?}"),
        }
    }

    fn names(broker: &Broker) -> Vec<&str> {
        broker.iter().map(|e| e.name.as_str()).collect()
    }

    fn depths(broker: &Broker) -> Vec<usize> {
        broker.iter().map(|e| e.depth).collect()
    }

    #[test]
    fn test_single_leaf() {
        let broker = parse_ok("A;");
        assert_eq!(names(&broker), vec!["A"]);
        assert_eq!(broker.root().unwrap().rank().unwrap(), 0);
    }

    #[test]
    fn test_lone_terminator_is_unnamed_root() {
        let broker = parse_ok(";");
        assert_eq!(broker.len(), 1);
        assert_eq!(broker.root().unwrap().name, "");
    }

    #[test]
    fn test_preorder_with_inner_labels() {
        let broker = parse_ok("(B:2.0{0},(D:2.0{1},E:2.0{2})C:2.0{3})A:2.0{4};");
        assert_eq!(names(&broker), vec!["A", "B", "C", "D", "E"]);
        assert_eq!(depths(&broker), vec![0, 1, 1, 2, 2]);

        let c = broker.get(2).unwrap();
        assert_eq!(c.values, vec!["2.0"]);
        assert_eq!(c.tags, vec!["3"]);
        assert_eq!(c.rank().unwrap(), 2);
    }

    #[test]
    fn test_empty_children() {
        let broker = parse_ok("(,(,));");
        assert_eq!(depths(&broker), vec![0, 1, 1, 2, 2]);
        assert!(broker.iter().all(|e| e.name.is_empty()));
    }

    #[test]
    fn test_multiple_values_tags_and_comments_are_kept_in_order() {
        let broker = parse_ok("(A:1:2{x}{y}[c1][c2])R;");
        let a = broker.get(1).unwrap();
        assert_eq!(a.values, vec!["1", "2"]);
        assert_eq!(a.tags, vec!["x", "y"]);
        assert_eq!(a.comments, vec!["c1", "c2"]);
    }

    #[test]
    fn test_leading_comment_attaches_to_next_element() {
        let broker = parse_ok("[&R] ([first]A,B);");
        assert_eq!(broker.root().unwrap().comments, vec!["&R"]);
        assert_eq!(broker.get(1).unwrap().comments, vec!["first"]);
    }

    #[test]
    fn test_quoted_and_numeric_names() {
        let broker = parse_ok("('Homo sapiens','it''s',42);");
        assert_eq!(names(&broker), vec!["", "Homo sapiens", "it's", "42"]);
    }

    #[test]
    fn test_custom_quotation_mark() {
        let mut parser = Parser::new("(\"a b\",c);").with_quotation_mark('"');
        let broker = parser.parse_broker().unwrap();
        assert_eq!(names(&broker), vec!["", "a b", "c"]);
    }

    #[test]
    fn test_whitespace_and_newlines() {
        let broker = parse_ok("(\n  A : 1.5 ,\n  B\t:2\n) Root ;\n");
        assert_eq!(names(&broker), vec!["Root", "A", "B"]);
        assert_eq!(broker.get(1).unwrap().values, vec!["1.5"]);
    }

    #[test]
    fn test_parse_all() {
        let mut parser = Parser::new("(A,B);\n(C,(D,E));\n");
        let brokers = parser.parse_all().unwrap();
        assert_eq!(brokers.len(), 2);
        assert_eq!(brokers[1].len(), 5);
        assert!(brokers.iter().all(Broker::is_ranked));
    }

    #[test]
    fn test_parse_all_empty_input() {
        assert!(Parser::new("  ").parse_all().unwrap().is_empty());
    }

    #[test]
    fn test_unbalanced() {
        assert!(matches!(
            parse_err("(A,B"),
            ParserError::UnbalancedParentheses { open: 1, .. }
        ));
        assert!(matches!(
            parse_err("((A,B);"),
            ParserError::UnbalancedParentheses { .. }
        ));
    }

    #[test]
    fn test_unmatched_close_points_at_first_paren() {
        match parse_err(")(;") {
            ParserError::UnmatchedClose { span, line, column, .. } => {
                assert_eq!(span.offset(), 0);
                assert_eq!((line, column), (1, 1));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_stray_comma() {
        assert!(matches!(parse_err("A,B;"), ParserError::StrayComma { .. }));
        assert!(matches!(parse_err("(A),(B);"), ParserError::StrayComma { .. }));
    }

    #[test]
    fn test_terminators() {
        assert!(matches!(parse_err("(A,B)"), ParserError::MissingTerminator { .. }));
        assert!(matches!(parse_err("(A,B);;"), ParserError::MultipleTerminators { .. }));
        assert!(matches!(parse_err("(A,B);C"), ParserError::TrailingContent { .. }));
        assert!(matches!(parse_err(""), ParserError::EmptyInput { .. }));
    }

    #[test]
    fn test_unterminated() {
        assert!(matches!(parse_err("('A,B);"), ParserError::UnterminatedQuote { .. }));
        assert!(matches!(
            parse_err("(A[comment,B);"),
            ParserError::UnterminatedBracket { open: '[', .. }
        ));
        assert!(matches!(
            parse_err("(A{1,B);"),
            ParserError::UnterminatedBracket { open: '{', .. }
        ));
    }

    #[test]
    fn test_unexpected_tokens() {
        assert!(matches!(parse_err("(A B);"), ParserError::UnexpectedToken { .. }));
        assert!(matches!(parse_err("(A:);"), ParserError::UnexpectedToken { .. }));
        assert!(matches!(parse_err("(A)B(C);"), ParserError::UnexpectedToken { .. }));
        assert!(matches!(parse_err("(A});"), ParserError::UnexpectedToken { .. }));
    }
}
