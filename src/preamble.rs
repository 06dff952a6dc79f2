//! `#cgo` directive parsing
//!
//! A Go file that imports `"C"` may carry compiler and linker flags in the comment
//! directly above that import:
//!
//! ```text
//! // #cgo linux,!arm CFLAGS: -DLINUX -I${SRCDIR}/include
//! // #cgo LDFLAGS: -lm
//! import "C"
//! ```
//!
//! Each directive may be gated by a build tag expression that is evaluated later,
//! once per platform.

use serde::Serialize;
use thiserror::Error;

const DIRECTIVE_MARKER: &str = "#cgo";
const SRCDIR_PLACEHOLDER: &str = "${SRCDIR}";

/// Characters allowed in a flag outside of the expanded source directory.
const SAFE_CHARS: &[u8] =
    b"+-.,/0123456789=ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz:$@%";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreambleError {
    #[error("invalid #cgo line: {0}")]
    InvalidLine(String),

    #[error("invalid #cgo verb: {0}")]
    InvalidVerb(String),

    #[error("{verb} not supported: {line}")]
    UnsupportedVerb { verb: String, line: String },

    #[error("malformed #cgo argument: {0}")]
    MalformedArgument(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("unclosed quote")]
    UnclosedQuote,

    #[error("unfinished escaping")]
    UnfinishedEscape,
}

/// A flag string together with the tag expression that gates it.
///
/// An empty `tags` string means the flag applies wherever its file does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaggedOpt {
    pub tags: String,
    pub opts: String,
}

impl TaggedOpt {
    pub fn new(tags: impl Into<String>, opts: impl Into<String>) -> Self {
        Self {
            tags: tags.into(),
            opts: opts.into(),
        }
    }

    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// Compiler and linker flags collected from one preamble.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgoFlags {
    pub copts: Vec<TaggedOpt>,
    pub clinkopts: Vec<TaggedOpt>,
}

/// Parses every `#cgo` directive in `text`.
///
/// `src_dir` replaces `${SRCDIR}` in the arguments. Lines that are not directives
/// are skipped. The first malformed directive aborts parsing.
pub fn parse_directives(text: &str, src_dir: &str) -> Result<CgoFlags, PreambleError> {
    let mut flags = CgoFlags::default();

    for orig in text.lines() {
        let line = orig.trim();
        let Some(rest) = line.strip_prefix(DIRECTIVE_MARKER) else {
            continue;
        };
        if !rest.starts_with([' ', '\t']) {
            continue;
        }

        let rest = rest.trim();
        let (head, args) = rest
            .split_once(':')
            .ok_or_else(|| PreambleError::InvalidLine(orig.to_string()))?;

        let mut fields: Vec<&str> = head.split_whitespace().collect();
        let verb = fields
            .pop()
            .ok_or_else(|| PreambleError::InvalidLine(orig.to_string()))?;
        let tags = fields.join(" ");

        let opts =
            split_quoted(args.trim()).map_err(|_| PreambleError::MalformedArgument(orig.to_string()))?;
        let mut expanded = Vec::with_capacity(opts.len());
        for opt in opts {
            let (opt, safe) = expand_src_dir(&opt, src_dir);
            if !safe {
                return Err(PreambleError::MalformedArgument(orig.to_string()));
            }
            expanded.push(opt);
        }
        let opt = TaggedOpt::new(tags, expanded.join(" "));

        match verb {
            "CFLAGS" | "CPPFLAGS" | "CXXFLAGS" => flags.copts.push(opt),
            "LDFLAGS" => flags.clinkopts.push(opt),
            "pkg-config" => {
                return Err(PreambleError::UnsupportedVerb {
                    verb: verb.to_string(),
                    line: orig.to_string(),
                })
            }
            _ => return Err(PreambleError::InvalidVerb(orig.to_string())),
        }
    }

    Ok(flags)
}

/// Splits `s` into shell-style words.
///
/// Single and double quotes group words and a backslash escapes the next
/// character. Quotes are removed from the result.
pub fn split_quoted(s: &str) -> Result<Vec<String>, QuoteError> {
    let mut args = Vec::new();
    let mut arg = String::new();
    let mut escaped = false;
    let mut quoted = false;
    let mut quote: Option<char> = None;

    for c in s.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
            continue;
        } else if let Some(q) = quote {
            if c == q {
                quote = None;
                continue;
            }
        } else if c == '"' || c == '\'' {
            quoted = true;
            quote = Some(c);
            continue;
        } else if c.is_whitespace() {
            if quoted || !arg.is_empty() {
                quoted = false;
                args.push(std::mem::take(&mut arg));
            }
            continue;
        }
        arg.push(c);
    }

    if quoted || !arg.is_empty() {
        args.push(arg);
    }

    if quote.is_some() {
        Err(QuoteError::UnclosedQuote)
    } else if escaped {
        Err(QuoteError::UnfinishedEscape)
    } else {
        Ok(args)
    }
}

/// Replaces every `${SRCDIR}` in `s` with `src_dir`.
///
/// The boolean is false when the result is not safe to hand to a compiler as a
/// single argument: the text outside the placeholder may only contain
/// [`SAFE_CHARS`], and `src_dir` may additionally contain spaces. The expanded
/// string is returned either way. Forms such as `$SRCDIR` or `${` are left as is.
pub fn expand_src_dir(s: &str, src_dir: &str) -> (String, bool) {
    let src_dir = if src_dir.is_empty() {
        ".".to_string()
    } else {
        src_dir.replace(std::path::MAIN_SEPARATOR, "/")
    };

    let chunks: Vec<&str> = s.split(SRCDIR_PLACEHOLDER).collect();
    if chunks.len() < 2 {
        return (s.to_string(), is_safe_arg(s, false));
    }

    let safe = chunks
        .iter()
        .all(|chunk| chunk.is_empty() || is_safe_arg(chunk, false))
        && is_safe_arg(&src_dir, true);
    let expanded = chunks.join(&src_dir);
    let safe = safe && !expanded.is_empty();
    (expanded, safe)
}

fn is_safe_arg(s: &str, allow_spaces: bool) -> bool {
    if s.is_empty() {
        return false;
    }
    s.bytes()
        .all(|b| !b.is_ascii() || SAFE_CHARS.contains(&b) || (allow_spaces && b == b' '))
}
