//! Tokenizer and generic reader for RFC 4512 schema descriptions.
//!
//! Every schema element kind shares the same outer grammar:
//!
//! ```text
//! ( <numericoid|ruleid> [ KEYWORD [value] ]* )
//! ```
//!
//! where a value is a quoted string, a bare word, or a parenthesised list of
//! either, optionally separated by `$`. The per-kind modules decide which
//! keywords exist and whether they carry a value; this module only knows the
//! shape. Quoted OIDs (`SYNTAX '1.3.6...'`) are accepted where bare OIDs are
//! expected, matching the lenient parsing the directory has always done.

use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a keyword is a bare flag or is followed by a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arity {
    Flag,
    Value,
}

/// A vendor extension term (`X-NAME 'value'`), kept verbatim for re-rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Dollar,
    Quoted(String),
    Word(String),
}

#[derive(Debug, Clone)]
enum Term {
    Flag,
    Values(Vec<String>),
}

/// A parsed description: the leading identifier plus its keyword terms.
#[derive(Debug, Clone, Default)]
pub(crate) struct Description {
    pub id: String,
    terms: Vec<(String, Term)>,
}

impl Description {
    /// Parses `input`, stripping any of the given LDIF attribute tags first.
    pub fn parse(
        input: &str,
        tags: &[&str],
        arity: impl Fn(&str) -> Option<Arity>,
    ) -> SchemaResult<Self> {
        let body = strip_tag(input, tags);
        let mut tokens = tokenize(body)?.into_iter();

        if tokens.next() != Some(Token::Open) {
            return Err(SchemaError::invalid(format!(
                "definition must start with '(': {body}"
            )));
        }

        let id = match tokens.next() {
            Some(Token::Word(w)) | Some(Token::Quoted(w)) => w,
            _ => {
                return Err(SchemaError::invalid(format!(
                    "definition is missing its identifier: {body}"
                )));
            }
        };

        let mut desc = Description {
            id,
            terms: Vec::new(),
        };

        loop {
            match tokens.next() {
                Some(Token::Close) => break,
                Some(Token::Word(keyword)) => {
                    let upper = keyword.to_ascii_uppercase();
                    let kind = if upper.starts_with("X-") {
                        Arity::Value
                    } else {
                        arity(&upper).ok_or_else(|| {
                            SchemaError::invalid(format!("unknown keyword {keyword} in: {body}"))
                        })?
                    };

                    if desc.terms.iter().any(|(k, _)| k.eq_ignore_ascii_case(&keyword)) {
                        return Err(SchemaError::invalid(format!(
                            "duplicate keyword {keyword} in: {body}"
                        )));
                    }

                    let term = match kind {
                        Arity::Flag => Term::Flag,
                        Arity::Value => Term::Values(read_values(&mut tokens, &keyword, body)?),
                    };
                    // Extensions keep their spelling; standard keywords are canonicalised.
                    let key = if upper.starts_with("X-") { keyword } else { upper };
                    desc.terms.push((key, term));
                }
                Some(other) => {
                    return Err(SchemaError::invalid(format!(
                        "unexpected token {other:?} in: {body}"
                    )));
                }
                None => {
                    return Err(SchemaError::invalid(format!(
                        "definition is missing its closing ')': {body}"
                    )));
                }
            }
        }

        if tokens.next().is_some() {
            return Err(SchemaError::invalid(format!(
                "trailing data after closing ')': {body}"
            )));
        }

        Ok(desc)
    }

    fn term(&self, keyword: &str) -> Option<&Term> {
        self.terms
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(keyword))
            .map(|(_, t)| t)
    }

    pub fn flag(&self, keyword: &str) -> bool {
        matches!(self.term(keyword), Some(Term::Flag))
    }

    pub fn values(&self, keyword: &str) -> Vec<String> {
        match self.term(keyword) {
            Some(Term::Values(v)) => v.clone(),
            _ => Vec::new(),
        }
    }

    pub fn first(&self, keyword: &str) -> Option<String> {
        self.values(keyword).into_iter().next()
    }

    /// Returns `(name, aliases)` from the `NAME` term.
    pub fn names(&self) -> (String, Vec<String>) {
        let mut names = self.values("NAME").into_iter();
        let name = names.next().unwrap_or_default();
        (name, names.collect())
    }

    pub fn extensions(&self) -> Vec<Extension> {
        self.terms
            .iter()
            .filter(|(k, _)| k.len() > 2 && k[..2].eq_ignore_ascii_case("X-"))
            .map(|(k, t)| Extension {
                name: k.clone(),
                values: match t {
                    Term::Values(v) => v.clone(),
                    Term::Flag => Vec::new(),
                },
            })
            .collect()
    }
}

fn read_values(
    tokens: &mut impl Iterator<Item = Token>,
    keyword: &str,
    body: &str,
) -> SchemaResult<Vec<String>> {
    match tokens.next() {
        Some(Token::Word(w)) | Some(Token::Quoted(w)) => Ok(vec![w]),
        Some(Token::Open) => {
            let mut values = Vec::new();
            loop {
                match tokens.next() {
                    Some(Token::Close) => break,
                    Some(Token::Dollar) => continue,
                    Some(Token::Word(w)) | Some(Token::Quoted(w)) => values.push(w),
                    _ => {
                        return Err(SchemaError::invalid(format!(
                            "malformed value list for {keyword} in: {body}"
                        )));
                    }
                }
            }
            Ok(values)
        }
        _ => Err(SchemaError::invalid(format!(
            "keyword {keyword} is missing its value in: {body}"
        ))),
    }
}

fn tokenize(input: &str) -> SchemaResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '$' => {
                chars.next();
                tokens.push(Token::Dollar);
            }
            '\'' => {
                chars.next();
                let mut raw = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '\'' {
                        closed = true;
                        break;
                    }
                    raw.push(c);
                }
                if !closed {
                    return Err(SchemaError::invalid(format!(
                        "unterminated quoted string at offset {start}"
                    )));
                }
                tokens.push(Token::Quoted(unescape(&raw)));
            }
            _ => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '$' | '\'') {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Word(input[start..end].to_string()));
            }
        }
    }

    Ok(tokens)
}

/// Strips a leading `tag:` (case-insensitive) when present.
pub(crate) fn strip_tag<'a>(input: &'a str, tags: &[&str]) -> &'a str {
    let trimmed = input.trim();
    for tag in tags {
        if trimmed.len() >= tag.len()
            && trimmed.is_char_boundary(tag.len())
            && trimmed[..tag.len()].eq_ignore_ascii_case(tag)
        {
            return trimmed[tag.len()..].trim_start();
        }
    }
    trimmed
}

fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        if tail.len() >= 2 && tail.is_char_boundary(2) {
            if tail[..2].eq_ignore_ascii_case("27") {
                out.push('\'');
                rest = &tail[2..];
                continue;
            }
            if tail[..2].eq_ignore_ascii_case("5c") {
                out.push('\\');
                rest = &tail[2..];
                continue;
            }
        }
        out.push('\\');
        rest = tail;
    }
    out.push_str(rest);
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\5C").replace('\'', "\\27")
}

/// Splits `oid{len}` into the OID and its optional length bound.
pub(crate) fn split_noidlen(value: &str) -> SchemaResult<(String, Option<u32>)> {
    match value.find('{') {
        None => Ok((value.to_string(), None)),
        Some(pos) => {
            let bound = value[pos + 1..]
                .strip_suffix('}')
                .and_then(|n| n.parse::<u32>().ok())
                .ok_or_else(|| SchemaError::invalid(format!("malformed syntax length: {value}")))?;
            Ok((value[..pos].to_string(), Some(bound)))
        }
    }
}

// ── Rendering helpers ────────────────────────────────────────────

pub(crate) fn write_names(f: &mut fmt::Formatter<'_>, name: &str, aliases: &[String]) -> fmt::Result {
    if name.is_empty() {
        return Ok(());
    }
    if aliases.is_empty() {
        write!(f, " NAME '{}'", escape(name))
    } else {
        write!(f, " NAME ( '{}'", escape(name))?;
        for alias in aliases {
            write!(f, " '{}'", escape(alias))?;
        }
        f.write_str(" )")
    }
}

pub(crate) fn write_qdstring(f: &mut fmt::Formatter<'_>, keyword: &str, value: Option<&str>) -> fmt::Result {
    match value {
        Some(v) => write!(f, " {keyword} '{}'", escape(v)),
        None => Ok(()),
    }
}

pub(crate) fn write_oid(f: &mut fmt::Formatter<'_>, keyword: &str, value: Option<&str>) -> fmt::Result {
    match value {
        Some(v) if !v.is_empty() => write!(f, " {keyword} {v}"),
        _ => Ok(()),
    }
}

pub(crate) fn write_oids(f: &mut fmt::Formatter<'_>, keyword: &str, values: &[String]) -> fmt::Result {
    match values {
        [] => Ok(()),
        [single] => write!(f, " {keyword} {single}"),
        many => write!(f, " {keyword} ( {} )", many.join(" $ ")),
    }
}

pub(crate) fn write_flag(f: &mut fmt::Formatter<'_>, keyword: &str, on: bool) -> fmt::Result {
    if on {
        write!(f, " {keyword}")
    } else {
        Ok(())
    }
}

pub(crate) fn write_extensions(f: &mut fmt::Formatter<'_>, extensions: &[Extension]) -> fmt::Result {
    for ext in extensions {
        match ext.values.as_slice() {
            [single] => write!(f, " {} '{}'", ext.name, escape(single))?,
            many => {
                write!(f, " {} (", ext.name)?;
                for v in many {
                    write!(f, " '{}'", escape(v))?;
                }
                f.write_str(" )")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arity(kw: &str) -> Option<Arity> {
        match kw {
            "NAME" | "DESC" | "SUP" | "MUST" => Some(Arity::Value),
            "OBSOLETE" => Some(Arity::Flag),
            _ => None,
        }
    }

    #[test]
    fn parses_lists_and_flags() {
        let d = Description::parse(
            "objectclasses: ( 1.2.3 NAME ( 'a' 'b' ) OBSOLETE MUST ( x $ y ) X-ORIGIN 'test' )",
            &["objectclasses:"],
            arity,
        )
        .unwrap();
        assert_eq!(d.id, "1.2.3");
        assert_eq!(d.names(), ("a".to_string(), vec!["b".to_string()]));
        assert!(d.flag("OBSOLETE"));
        assert_eq!(d.values("must"), vec!["x", "y"]);
        assert_eq!(d.extensions()[0].values, vec!["test"]);
    }

    #[test]
    fn rejects_unknown_keyword() {
        assert!(Description::parse("( 1.2.3 BOGUS x )", &[], arity).is_err());
    }

    #[test]
    fn rejects_duplicate_keyword() {
        assert!(Description::parse("( 1.2.3 NAME 'a' NAME 'b' )", &[], arity).is_err());
    }

    #[test]
    fn rejects_unbalanced() {
        assert!(Description::parse("( 1.2.3 NAME 'a'", &[], arity).is_err());
        assert!(Description::parse("1.2.3 NAME 'a' )", &[], arity).is_err());
        assert!(Description::parse("( 1.2.3 NAME 'a ) ", &[], arity).is_err());
    }

    #[test]
    fn unescapes_quoted_strings() {
        let d = Description::parse(r"( 1.2.3 DESC 'it\27s a \5C' )", &[], arity).unwrap();
        assert_eq!(d.first("DESC").as_deref(), Some("it's a \\"));
    }

    #[test]
    fn splits_noidlen() {
        assert_eq!(
            split_noidlen("1.3.6.1.4.1.1466.115.121.1.15{256}").unwrap(),
            ("1.3.6.1.4.1.1466.115.121.1.15".to_string(), Some(256))
        );
        assert_eq!(split_noidlen("1.2").unwrap(), ("1.2".to_string(), None));
        assert!(split_noidlen("1.2{x}").is_err());
    }
}
