/// Token kinds for Go source.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // Literals keep their source text so they print back unchanged.
    Int(String),
    Float(String),
    Rune(String),
    Str(String),
    Ident(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    AndNot,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,
    AndNotEq,
    AndAnd,
    OrOr,
    Arrow, // <-
    Inc,
    Dec,
    EqEq,
    Lt,
    Gt,
    Eq,
    Bang,
    Tilde,
    NotEq,
    Le,
    Ge,
    Define, // :=
    Ellipsis,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semi,
    Colon,

    // Special
    Eof,
}

impl TokenKind {
    /// Whether a newline after this token terminates the statement.
    fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident(_)
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Rune(_)
                | TokenKind::Str(_)
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }
}

/// Source location information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A token with its kind, location and the comments around it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Comments on their own lines directly before this token. An empty
    /// string marks a blank line between two comment groups.
    pub doc: Vec<String>,
    /// Comment closing the line this token ends.
    pub trailing: Option<String>,
    /// A blank line separates this token (or its doc) from the previous token.
    pub blank_before: bool,
    /// Semicolon inserted by the lexer at a newline or at end of file.
    pub implicit: bool,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            doc: Vec::new(),
            trailing: None,
            blank_before: false,
            implicit: false,
        }
    }
}

/// The lexer for Go source code.
pub struct Lexer<'a> {
    filename: &'a str,
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
    /// Newlines seen since the last token or comment.
    newlines: usize,
    /// The last emitted token asks for a semicolon at the next newline.
    insert_semi: bool,
    doc: Vec<String>,
    blank_before: bool,
    trailing: Option<String>,
}

impl<'a> Lexer<'a> {
    pub fn new(filename: &'a str, source: &'a str) -> Self {
        Self {
            filename,
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            newlines: 0,
            insert_semi: false,
            doc: Vec::new(),
            blank_before: false,
            trailing: None,
        }
    }

    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments(&mut tokens)?;

            let span = Span::new(self.line, self.column);

            let Some((_, ch)) = self.peek() else {
                if self.insert_semi {
                    self.push_semi(&mut tokens, span);
                } else if let Some(comment) = self.trailing.take() {
                    self.doc.push(comment);
                }
                let mut eof = Token::new(TokenKind::Eof, span);
                self.attach_doc(&mut eof);
                tokens.push(eof);
                break;
            };

            let kind = match ch {
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                ',' => self.single(TokenKind::Comma),
                ';' => self.single(TokenKind::Semi),
                '~' => self.single(TokenKind::Tilde),
                ':' => {
                    self.advance();
                    if self.match_char('=') {
                        TokenKind::Define
                    } else {
                        TokenKind::Colon
                    }
                }
                '.' => {
                    if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
                        self.scan_number()?
                    } else if self.peek_nth(1) == Some('.') && self.peek_nth(2) == Some('.') {
                        self.advance();
                        self.advance();
                        self.advance();
                        TokenKind::Ellipsis
                    } else {
                        self.single(TokenKind::Dot)
                    }
                }
                '+' => {
                    self.advance();
                    if self.match_char('+') {
                        TokenKind::Inc
                    } else if self.match_char('=') {
                        TokenKind::PlusEq
                    } else {
                        TokenKind::Plus
                    }
                }
                '-' => {
                    self.advance();
                    if self.match_char('-') {
                        TokenKind::Dec
                    } else if self.match_char('=') {
                        TokenKind::MinusEq
                    } else {
                        TokenKind::Minus
                    }
                }
                '*' => self.with_assign(TokenKind::Star, TokenKind::StarEq),
                '/' => self.with_assign(TokenKind::Slash, TokenKind::SlashEq),
                '%' => self.with_assign(TokenKind::Percent, TokenKind::PercentEq),
                '^' => self.with_assign(TokenKind::Caret, TokenKind::CaretEq),
                '&' => {
                    self.advance();
                    if self.match_char('&') {
                        TokenKind::AndAnd
                    } else if self.match_char('^') {
                        if self.match_char('=') {
                            TokenKind::AndNotEq
                        } else {
                            TokenKind::AndNot
                        }
                    } else if self.match_char('=') {
                        TokenKind::AmpEq
                    } else {
                        TokenKind::Amp
                    }
                }
                '|' => {
                    self.advance();
                    if self.match_char('|') {
                        TokenKind::OrOr
                    } else if self.match_char('=') {
                        TokenKind::PipeEq
                    } else {
                        TokenKind::Pipe
                    }
                }
                '<' => {
                    self.advance();
                    if self.match_char('<') {
                        if self.match_char('=') {
                            TokenKind::ShlEq
                        } else {
                            TokenKind::Shl
                        }
                    } else if self.match_char('=') {
                        TokenKind::Le
                    } else if self.match_char('-') {
                        TokenKind::Arrow
                    } else {
                        TokenKind::Lt
                    }
                }
                '>' => {
                    self.advance();
                    if self.match_char('>') {
                        if self.match_char('=') {
                            TokenKind::ShrEq
                        } else {
                            TokenKind::Shr
                        }
                    } else if self.match_char('=') {
                        TokenKind::Ge
                    } else {
                        TokenKind::Gt
                    }
                }
                '=' => self.with_assign(TokenKind::Eq, TokenKind::EqEq),
                '!' => self.with_assign(TokenKind::Bang, TokenKind::NotEq),
                '"' => self.scan_string()?,
                '`' => self.scan_raw_string()?,
                '\'' => self.scan_rune()?,
                '0'..='9' => self.scan_number()?,
                c if c == '_' || c.is_alphabetic() => self.scan_identifier(),
                _ => return Err(self.error(&format!("unexpected character '{}'", ch))),
            };

            // A comment followed by more code on its line leads that code.
            if let Some(comment) = self.trailing.take() {
                self.doc.push(comment);
            }
            self.insert_semi = kind.ends_statement();

            let mut token = Token::new(kind, span);
            self.attach_doc(&mut token);
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn with_assign(&mut self, plain: TokenKind, assign: TokenKind) -> TokenKind {
        self.advance();
        if self.match_char('=') { assign } else { plain }
    }

    fn attach_doc(&mut self, token: &mut Token) {
        if self.newlines >= 2 {
            if self.doc.is_empty() {
                self.blank_before = true;
            } else {
                self.doc.push(String::new());
            }
        }
        token.doc = std::mem::take(&mut self.doc);
        token.blank_before = std::mem::take(&mut self.blank_before);
        self.newlines = 0;
    }

    fn push_semi(&mut self, tokens: &mut Vec<Token>, span: Span) {
        let mut semi = Token::new(TokenKind::Semi, span);
        semi.implicit = true;
        semi.trailing = self.trailing.take();
        tokens.push(semi);
        self.insert_semi = false;
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        let mut chars = self.chars.clone();
        chars.nth(n).map(|(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.peek().map(|(i, _)| i).unwrap_or(self.source.len())
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((_, ch)) = result {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek().map(|(_, c)| c) == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn newline(&mut self, tokens: &mut Vec<Token>) {
        let span = Span::new(self.line, self.column);
        if self.insert_semi {
            self.push_semi(tokens, span);
        } else if let Some(comment) = self.trailing.take() {
            match tokens.last_mut() {
                Some(last) => last.trailing = Some(comment),
                None => self.doc.push(comment),
            }
        }
        self.newlines += 1;
    }

    fn skip_whitespace_and_comments(&mut self, tokens: &mut Vec<Token>) -> Result<(), String> {
        loop {
            match self.peek() {
                Some((_, ' ' | '\t' | '\r')) => {
                    self.advance();
                }
                Some((_, '\n')) => {
                    self.newline(tokens);
                    self.advance();
                }
                Some((_, '/')) if matches!(self.peek_nth(1), Some('/' | '*')) => {
                    let same_line = self.newlines == 0 && !tokens.is_empty();
                    let start_line = self.line;
                    let text = self.scan_comment()?;
                    let spans_lines = self.line > start_line;

                    if same_line {
                        self.trailing = Some(match self.trailing.take() {
                            Some(previous) => format!("{} {}", previous, text),
                            None => text,
                        });
                    } else {
                        if self.newlines >= 2 {
                            if self.doc.is_empty() {
                                self.blank_before = true;
                            } else {
                                self.doc.push(String::new());
                            }
                        }
                        self.doc.push(text);
                        self.newlines = 0;
                    }

                    // A general comment containing newlines acts like a newline.
                    if spans_lines && self.insert_semi {
                        self.newline(tokens);
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn scan_comment(&mut self) -> Result<String, String> {
        let start = self.offset();
        self.advance(); // '/'
        if self.match_char('/') {
            while let Some((_, ch)) = self.peek() {
                if ch == '\n' {
                    break;
                }
                self.advance();
            }
        } else {
            self.advance(); // '*'
            loop {
                match self.advance() {
                    None => return Err(self.error("comment not terminated")),
                    Some((_, '*')) if self.match_char('/') => break,
                    Some(_) => {}
                }
            }
        }
        let end = self.offset();
        Ok(self.source[start..end].trim_end().to_string())
    }

    fn scan_digits(&mut self, accept: fn(char) -> bool) {
        while let Some((_, ch)) = self.peek() {
            if accept(ch) || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_number(&mut self) -> Result<TokenKind, String> {
        let start = self.offset();
        let mut is_float = false;

        if self.peek().map(|(_, c)| c) == Some('0')
            && matches!(self.peek_nth(1), Some('x' | 'X' | 'b' | 'B' | 'o' | 'O'))
        {
            self.advance();
            let radix = self.advance().map(|(_, c)| c.to_ascii_lowercase());
            match radix {
                Some('x') => self.scan_digits(|c| c.is_ascii_hexdigit()),
                Some('b') => self.scan_digits(|c| c == '0' || c == '1'),
                _ => self.scan_digits(|c| ('0'..='7').contains(&c)),
            }
        } else {
            self.scan_digits(|c| c.is_ascii_digit());
            if self.peek().map(|(_, c)| c) == Some('.') {
                is_float = true;
                self.advance();
                self.scan_digits(|c| c.is_ascii_digit());
            }
            if matches!(self.peek(), Some((_, 'e' | 'E'))) {
                is_float = true;
                self.advance();
                if matches!(self.peek(), Some((_, '+' | '-'))) {
                    self.advance();
                }
                self.scan_digits(|c| c.is_ascii_digit());
            }
        }

        let end = self.offset();
        let text = &self.source[start..end];

        if text.ends_with('_') || text.contains("__") {
            return Err(self.error(&format!("invalid number '{}'", text)));
        }

        if is_float {
            Ok(TokenKind::Float(text.to_string()))
        } else {
            Ok(TokenKind::Int(text.to_string()))
        }
    }

    fn scan_escape(&mut self, quote: char) -> Result<(), String> {
        match self.advance() {
            Some((_, c)) if c == quote => Ok(()),
            Some((_, 'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\')) => Ok(()),
            Some((_, 'x')) => self.scan_hex_escape(2),
            Some((_, 'u')) => self.scan_hex_escape(4),
            Some((_, 'U')) => self.scan_hex_escape(8),
            Some((_, '0'..='7')) => {
                for _ in 0..2 {
                    match self.advance() {
                        Some((_, '0'..='7')) => {}
                        _ => return Err(self.error("invalid octal escape")),
                    }
                }
                Ok(())
            }
            Some((_, ch)) => Err(self.error(&format!("invalid escape sequence '\\{}'", ch))),
            None => Err(self.error("escape sequence not terminated")),
        }
    }

    fn scan_hex_escape(&mut self, digits: usize) -> Result<(), String> {
        for _ in 0..digits {
            match self.advance() {
                Some((_, c)) if c.is_ascii_hexdigit() => {}
                _ => return Err(self.error("invalid hex escape")),
            }
        }
        Ok(())
    }

    fn scan_string(&mut self) -> Result<TokenKind, String> {
        let start = self.offset();
        self.advance(); // consume opening quote

        loop {
            match self.peek() {
                None | Some((_, '\n')) => return Err(self.error("string literal not terminated")),
                Some((_, '"')) => {
                    self.advance();
                    break;
                }
                Some((_, '\\')) => {
                    self.advance();
                    self.scan_escape('"')?;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        let end = self.offset();
        Ok(TokenKind::Str(self.source[start..end].to_string()))
    }

    fn scan_raw_string(&mut self) -> Result<TokenKind, String> {
        let start = self.offset();
        self.advance(); // consume opening backtick

        loop {
            match self.advance() {
                None => return Err(self.error("raw string literal not terminated")),
                Some((_, '`')) => break,
                Some(_) => {}
            }
        }

        let end = self.offset();
        Ok(TokenKind::Str(self.source[start..end].to_string()))
    }

    fn scan_rune(&mut self) -> Result<TokenKind, String> {
        let start = self.offset();
        self.advance(); // consume opening quote

        match self.advance() {
            None | Some((_, '\n')) | Some((_, '\'')) => {
                return Err(self.error("invalid rune literal"));
            }
            Some((_, '\\')) => self.scan_escape('\'')?,
            Some(_) => {}
        }

        if !self.match_char('\'') {
            return Err(self.error("rune literal not terminated"));
        }

        let end = self.offset();
        Ok(TokenKind::Rune(self.source[start..end].to_string()))
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.offset();

        while let Some((_, ch)) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let end = self.offset();
        let ident = &self.source[start..end];

        match ident {
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "chan" => TokenKind::Chan,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "default" => TokenKind::Default,
            "defer" => TokenKind::Defer,
            "else" => TokenKind::Else,
            "fallthrough" => TokenKind::Fallthrough,
            "for" => TokenKind::For,
            "func" => TokenKind::Func,
            "go" => TokenKind::Go,
            "goto" => TokenKind::Goto,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "interface" => TokenKind::Interface,
            "map" => TokenKind::Map,
            "package" => TokenKind::Package,
            "range" => TokenKind::Range,
            "return" => TokenKind::Return,
            "select" => TokenKind::Select,
            "struct" => TokenKind::Struct,
            "switch" => TokenKind::Switch,
            "type" => TokenKind::Type,
            "var" => TokenKind::Var,
            _ => TokenKind::Ident(ident.to_string()),
        }
    }

    fn error(&self, message: &str) -> String {
        format!(
            "error: {}\n  --> {}:{}:{}",
            message, self.filename, self.line, self.column
        )
    }
}

/// Decode the value of an interpreted or raw string literal.
pub fn unquote(literal: &str) -> Option<String> {
    if let Some(raw) = literal.strip_prefix('`') {
        return raw.strip_suffix('`').map(|s| s.replace('\r', ""));
    }

    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut value = String::new();
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next()? {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'a' => value.push('\u{7}'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '\\' => value.push('\\'),
            '"' => value.push('"'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                value.push(char::from(u8::from_str_radix(&hex, 16).ok()?));
            }
            c @ ('u' | 'U') => {
                let len = if c == 'u' { 4 } else { 8 };
                let hex: String = chars.by_ref().take(len).collect();
                value.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            c @ '0'..='7' => {
                let rest: String = chars.by_ref().take(2).collect();
                let octal = format!("{}{}", c, rest);
                value.push(char::from(u8::from_str_radix(&octal, 8).ok()?));
            }
            _ => return None,
        }
    }
    Some(value)
}
