use std::fmt;

/// Scanner for imp source. Tokens must be separated by whitespace: the
/// lexer splits the input into blank-delimited fragments and classifies
/// each one whole, so `a=1` is a single (invalid) fragment, not three
/// tokens.
pub struct Lexer<'a> {
    source: &'a str,
    current: usize,
    line: u32,
}

pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub line: u32,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, lexeme: &'a str, line: u32) -> Self {
        Self { kind, lexeme, line }
    }

    /// How the token reads in a diagnostic: the literal text for names,
    /// constants, and invalid fragments, the fixed spelling otherwise.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Variable | TokenKind::Constant | TokenKind::Invalid => {
                self.lexeme.to_string()
            }
            kind => kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Program,
    EndProgram,
    Def,
    EndDef,
    If,
    Else,
    EndIf,
    While,
    EndWhile,
    Repeat,
    Until,
    Int,
    Call,
    Callf,
    Return,
    Print,
    Read,
    Assign,
    Eq,
    Neq,
    Gt,
    Ge,
    Lt,
    Le,
    Plus,
    Minus,
    Star,
    LParen,
    RParen,
    Variable,
    Constant,
    Invalid,
    Eof,
}

/// Reserved spellings, checked before the variable-name rule so no
/// identifier can collide with a keyword.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("program", TokenKind::Program),
    ("endprogram", TokenKind::EndProgram),
    ("def", TokenKind::Def),
    ("enddef", TokenKind::EndDef),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("endif", TokenKind::EndIf),
    ("while", TokenKind::While),
    ("endwhile", TokenKind::EndWhile),
    ("repeat", TokenKind::Repeat),
    ("until", TokenKind::Until),
    ("int", TokenKind::Int),
    ("call", TokenKind::Call),
    ("callf", TokenKind::Callf),
    ("return", TokenKind::Return),
    ("print", TokenKind::Print),
    ("read", TokenKind::Read),
    ("=", TokenKind::Assign),
    ("==", TokenKind::Eq),
    ("!=", TokenKind::Neq),
    (">", TokenKind::Gt),
    (">=", TokenKind::Ge),
    ("<", TokenKind::Lt),
    ("<=", TokenKind::Le),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
];

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Variable => "variable",
            TokenKind::Constant => "constant",
            TokenKind::Invalid => "invalid token",
            TokenKind::Eof => "end of input",
            kind => KEYWORDS
                .iter()
                .find(|(_, k)| k == kind)
                .map(|(text, _)| *text)
                .unwrap_or(""),
        };
        f.write_str(text)
    }
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            current: 0,
            line: 1,
        }
    }

    /// Classify the next fragment. Once the input is exhausted every call
    /// returns an `Eof` token.
    pub fn next(&mut self) -> Token<'a> {
        match self.next_fragment() {
            Some((fragment, line)) => Token::new(classify(fragment), fragment, line),
            None => Token::new(TokenKind::Eof, "", self.line),
        }
    }

    /// The next whitespace-delimited fragment, with the line it starts on.
    /// Blank lines and runs of whitespace are skipped transparently.
    fn next_fragment(&mut self) -> Option<(&'a str, u32)> {
        self.skip_whitespace();
        if self.current >= self.source.len() {
            return None;
        }
        let start = self.current;
        let line = self.line;
        while self.current < self.source.len() && !self.peek_byte().is_ascii_whitespace() {
            self.current += 1;
        }
        Some((&self.source[start..self.current], line))
    }

    fn skip_whitespace(&mut self) {
        while self.current < self.source.len() {
            match self.peek_byte() {
                b'\n' => {
                    self.current += 1;
                    self.line += 1;
                }
                b if b.is_ascii_whitespace() => self.current += 1,
                _ => break,
            }
        }
    }

    fn peek_byte(&self) -> u8 {
        self.source.as_bytes()[self.current]
    }
}

fn classify(fragment: &str) -> TokenKind {
    if let Some((_, kind)) = KEYWORDS.iter().find(|(text, _)| *text == fragment) {
        *kind
    } else if fragment.chars().all(|c| c.is_alphabetic()) {
        TokenKind::Variable
    } else if fragment.chars().all(|c| c.is_ascii_digit()) {
        TokenKind::Constant
    } else {
        TokenKind::Invalid
    }
}
