//! Shell-style tokenizer for inbound ffmpeg command text.
//!
//! The command is never handed to a shell. Quoting rules follow POSIX `sh` so
//! that users can paste commands they would type in a terminal, but any
//! unquoted control or redirection operator rejects the whole command.

use crate::common::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Operator(String),
}

/// Strips the `"{binary_name} "` prefix and tokenizes the rest.
pub fn parse_command(raw: &str, binary_name: &str) -> PipelineResult<Vec<String>> {
    let prefix = format!("{} ", binary_name);
    let rest = raw.strip_prefix(&prefix).ok_or_else(|| {
        PipelineError::validation(format!("command must start with '{}'", prefix))
    })?;

    let mut args = Vec::new();
    for token in tokenize(rest)? {
        match token {
            Token::Word(word) => args.push(word),
            Token::Operator(op) => {
                return Err(PipelineError::parse(format!("disallowed operator '{}'", op)));
            }
        }
    }

    if args.is_empty() {
        return Err(PipelineError::parse("no arguments after binary name"));
    }

    Ok(args)
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '|' | '&' | ';' | '<' | '>' | '(' | ')' | '`')
}

/// Longest-match operator starting at `first`.
fn read_operator(first: char, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut op = String::from(first);
    if let Some(&next) = chars.peek() {
        let two = matches!(
            (first, next),
            ('|', '|')
                | ('&', '&')
                | (';', ';')
                | ('>', '>')
                | ('<', '<')
                | ('>', '&')
                | ('<', '&')
                | ('&', '>')
                | ('>', '|')
        );
        if two {
            op.push(next);
            chars.next();
        }
    }
    op
}

pub fn tokenize(input: &str) -> PipelineResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    // An empty quoted string ('' or "") still yields a word.
    let mut in_word = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    tokens.push(Token::Word(std::mem::take(&mut word)));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => word.push(ch),
                        None => return Err(PipelineError::parse("unterminated single quote")),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('\n') => {}
                            Some(ch @ ('$' | '`' | '"' | '\\')) => word.push(ch),
                            Some(ch) => {
                                word.push('\\');
                                word.push(ch);
                            }
                            None => return Err(PipelineError::parse("unterminated double quote")),
                        },
                        Some(ch) => word.push(ch),
                        None => return Err(PipelineError::parse("unterminated double quote")),
                    }
                }
            }
            '\\' => match chars.next() {
                Some('\n') => {}
                Some(ch) => {
                    in_word = true;
                    word.push(ch);
                }
                None => return Err(PipelineError::parse("dangling escape at end of command")),
            },
            c if is_operator_char(c) => {
                if in_word {
                    tokens.push(Token::Word(std::mem::take(&mut word)));
                    in_word = false;
                }
                tokens.push(Token::Operator(read_operator(c, &mut chars)));
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }

    if in_word {
        tokens.push(Token::Word(word));
    }

    Ok(tokens)
}
