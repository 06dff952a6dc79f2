//! Go source header scanning
//!
//! Rule generation only needs the top of a Go file: the package clause, the
//! import declarations, and the comment attached to `import "C"`. [`HeaderScanner`]
//! reads exactly that much and stops at the first declaration that is not an
//! import, so the rest of the file is never tokenized.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{line}: expected 'package', found {found}")]
    ExpectedPackage { line: usize, found: String },

    #[error("{line}: expected package name, found {found}")]
    ExpectedPackageName { line: usize, found: String },

    #[error("{line}: expected import path, found {found}")]
    ExpectedImportPath { line: usize, found: String },

    #[error("{line}: comment not terminated")]
    UnterminatedComment { line: usize },

    #[error("{line}: string literal not terminated")]
    UnterminatedString { line: usize },

    #[error("{line}: unknown escape sequence \\{escape}")]
    UnknownEscape { line: usize, escape: char },
}

/// One import spec and the comment that documents it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub path: String,
    /// Comment text with the comment markers stripped. For a declaration with a
    /// single spec this falls back to the comment above the `import` keyword.
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceHeader {
    pub package_name: String,
    pub imports: Vec<ImportSpec>,
}

/// Extracts the package clause and imports from a Go source file.
pub trait SourceParser: Send + Sync {
    fn parse_header(&self, source: &str) -> Result<SourceHeader, ParseError>;
}

/// Hand-written scanner covering the subset of Go needed for file headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderScanner;

impl SourceParser for HeaderScanner {
    fn parse_header(&self, source: &str) -> Result<SourceHeader, ParseError> {
        let mut lexer = Lexer::new(source);

        let tok = lexer.next_token()?;
        if tok.kind != TokenKind::Ident("package".to_string()) {
            return Err(ParseError::ExpectedPackage {
                line: tok.line,
                found: tok.kind.describe(),
            });
        }

        let tok = lexer.next_token()?;
        let package_name = match tok.kind {
            TokenKind::Ident(name) => name,
            other => {
                return Err(ParseError::ExpectedPackageName {
                    line: tok.line,
                    found: other.describe(),
                })
            }
        };

        let mut imports = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            match &tok.kind {
                TokenKind::Punct(';') => continue,
                TokenKind::Ident(kw) if kw == "import" => {
                    imports.extend(parse_import_decl(&mut lexer, tok.doc)?);
                }
                _ => break,
            }
        }

        Ok(SourceHeader {
            package_name,
            imports,
        })
    }
}

fn parse_import_decl(
    lexer: &mut Lexer<'_>,
    decl_doc: Option<String>,
) -> Result<Vec<ImportSpec>, ParseError> {
    let mut specs = Vec::new();
    let tok = lexer.next_token()?;

    if tok.kind == TokenKind::Punct('(') {
        loop {
            let tok = lexer.next_token()?;
            match tok.kind {
                TokenKind::Punct(')') => break,
                TokenKind::Punct(';') => continue,
                _ => specs.push(parse_import_spec(lexer, tok)?),
            }
        }
    } else {
        specs.push(parse_import_spec(lexer, tok)?);
    }

    if specs.len() == 1 && specs[0].doc.is_none() {
        specs[0].doc = decl_doc;
    }
    Ok(specs)
}

fn parse_import_spec(lexer: &mut Lexer<'_>, first: Token) -> Result<ImportSpec, ParseError> {
    let doc = first.doc;
    let path_tok = match first.kind {
        TokenKind::Ident(_) | TokenKind::Punct('.') => lexer.next_token()?,
        kind => Token {
            kind,
            line: first.line,
            doc: None,
        },
    };

    match path_tok.kind {
        TokenKind::Str(path) => Ok(ImportSpec { path, doc }),
        other => Err(ParseError::ExpectedImportPath {
            line: path_tok.line,
            found: other.describe(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    Str(String),
    Punct(char),
    Other,
    Eof,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Str(value) => format!("{:?}", value),
            TokenKind::Punct(c) => format!("'{}'", c),
            TokenKind::Other => "literal".to_string(),
            TokenKind::Eof => "EOF".to_string(),
        }
    }
}

#[derive(Debug)]
struct Token {
    kind: TokenKind,
    line: usize,
    /// Lead comment: the comment group ending on the line just above the token.
    doc: Option<String>,
}

#[derive(Debug)]
struct CommentGroup {
    lines: Vec<String>,
    end_line: usize,
    own_line: bool,
}

fn push_char(bytes: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    last_token_line: usize,
    group: Option<CommentGroup>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            last_token_line: 0,
            group: None,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;

        let line = self.line;
        let doc = self
            .group
            .take()
            .filter(|g| g.own_line && g.end_line + 1 == line)
            .map(|g| g.lines.join("\n"));
        self.last_token_line = line;

        let kind = match self.bump() {
            None => TokenKind::Eof,
            Some(c) if c == '_' || c.is_alphabetic() => {
                let mut ident = c.to_string();
                while let Some(&c) = self.chars.peek() {
                    if c == '_' || c.is_alphanumeric() {
                        ident.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(ident)
            }
            Some('"') => TokenKind::Str(self.interpreted_string(line)?),
            Some('`') => TokenKind::Str(self.raw_string(line)?),
            Some(c) if c.is_ascii_digit() => {
                while matches!(self.chars.peek(), Some(c) if c.is_ascii_alphanumeric() || *c == '.') {
                    self.bump();
                }
                TokenKind::Other
            }
            Some(c) => TokenKind::Punct(c),
        };

        Ok(Token { kind, line, doc })
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some('/') => self.line_comment(),
                        Some('*') => self.block_comment()?,
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn line_comment(&mut self) {
        let start = self.line;
        self.bump();
        self.bump();
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        self.push_comment(start, start, vec![text]);
    }

    fn block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.line;
        self.bump();
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedComment { line: start }),
                Some('*') if self.chars.peek() == Some(&'/') => {
                    self.bump();
                    break;
                }
                Some(c) => text.push(c),
            }
        }
        let lines = text.lines().map(String::from).collect();
        self.push_comment(start, self.line, lines);
        Ok(())
    }

    fn push_comment(&mut self, start: usize, end: usize, lines: Vec<String>) {
        if let Some(group) = self.group.as_mut() {
            if start <= group.end_line + 1 {
                group.lines.extend(lines);
                group.end_line = end;
                return;
            }
        }
        self.group = Some(CommentGroup {
            lines,
            end_line: end,
            own_line: start > self.last_token_line,
        });
    }

    /// Decodes a double-quoted literal. `\x` and octal escapes are bytes, so the
    /// result is decoded lossily once the closing quote is reached.
    fn interpreted_string(&mut self, line: usize) -> Result<String, ParseError> {
        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(ParseError::UnterminatedString { line }),
                Some('"') => return Ok(String::from_utf8_lossy(&bytes).into_owned()),
                Some('\\') => self.escape(line, &mut bytes)?,
                Some(c) => push_char(&mut bytes, c),
            }
        }
    }

    fn escape(&mut self, line: usize, bytes: &mut Vec<u8>) -> Result<(), ParseError> {
        let escape = self.bump().ok_or(ParseError::UnterminatedString { line })?;
        let unknown = ParseError::UnknownEscape { line, escape };
        let c = match escape {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0B}',
            '\\' | '"' | '\'' => escape,
            'x' => {
                let byte = self.digits(2, 16).ok_or(unknown)?;
                bytes.push(byte as u8);
                return Ok(());
            }
            '0'..='7' => {
                let rest = self.digits(2, 8).ok_or(unknown.clone())?;
                let value = escape.to_digit(8).unwrap_or_default() * 64 + rest;
                let byte = u8::try_from(value).map_err(|_| unknown)?;
                bytes.push(byte);
                return Ok(());
            }
            'u' => self
                .digits(4, 16)
                .and_then(char::from_u32)
                .ok_or(unknown)?,
            'U' => self
                .digits(8, 16)
                .and_then(char::from_u32)
                .ok_or(unknown)?,
            _ => return Err(unknown),
        };
        push_char(bytes, c);
        Ok(())
    }

    /// Reads exactly `count` digits in `radix`.
    fn digits(&mut self, count: usize, radix: u32) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self.chars.next_if(|c| c.is_digit(radix))?;
            value = value * radix + digit.to_digit(radix)?;
        }
        Some(value)
    }

    fn raw_string(&mut self, line: usize) -> Result<String, ParseError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString { line }),
                Some('`') => return Ok(value),
                Some(c) => value.push(c),
            }
        }
    }
}
