//! Line lexer for annotated command sources.
//!
//! Splits each source line into code and comment text (tracking quotes and
//! block comments), then classifies it into the tokens the annotation
//! parsers consume. Keywords are only recognized outside string literals.
//! Positions are 1-based line numbers.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CoreError, Result};

/// Work item sub-tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkTag {
    Description,
    Inputs,
    Entity,
    /// `-shouldHave`, or the legacy `-result`.
    ShouldHave,
    ShouldNotHave,
}

impl WorkTag {
    fn from_suffix(suffix: Option<&str>) -> Option<Self> {
        match suffix {
            None => Some(WorkTag::Description),
            Some("inputs") => Some(WorkTag::Inputs),
            Some("entity") => Some(WorkTag::Entity),
            Some("shouldHave") | Some("result") => Some(WorkTag::ShouldHave),
            Some("shouldNotHave") => Some(WorkTag::ShouldNotHave),
            Some(_) => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            WorkTag::Description => "",
            WorkTag::Inputs => "-inputs",
            WorkTag::Entity => "-entity",
            WorkTag::ShouldHave => "-shouldHave",
            WorkTag::ShouldNotHave => "-shouldNotHave",
        }
    }
}

/// Event annotation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTag {
    /// `@requiredInputs`, or the legacy `@requiredInput`.
    RequiredInputs,
    /// `@evaluatedEntity`, or the legacy `@aReducingEntity`.
    EvaluatedEntity,
}

impl EventTag {
    pub fn name(&self) -> &'static str {
        match self {
            EventTag::RequiredInputs => "@requiredInputs",
            EventTag::EvaluatedEntity => "@evaluatedEntity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `authorize:` followed by its value text, joined across lines when a
    /// bracketed list spans several.
    Authorize { line: usize, value: String },
    /// Text after one `readonly` marker, with the line's `@validExample`
    /// value attached to the last field on the line.
    ReadonlyField {
        line: usize,
        declaration: String,
        example: Option<String>,
    },
    Work {
        line: usize,
        ordinal: u8,
        tag: WorkTag,
        value: String,
    },
    RegisterOpen { line: usize },
    RegisterClose { line: usize },
    /// `new Name(` inside a `register.events(` call.
    Constructor { line: usize, name: String },
    Event {
        line: usize,
        tag: EventTag,
        value: String,
    },
    /// Any other non-blank code.
    Code { line: usize },
}

/// One source line split into code and comment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub code: String,
    /// `code` with string literal contents blanked. Byte offsets match `code`.
    pub masked: String,
    pub comment: String,
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

fn authorize_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\bauthorize\s*:\s*(.*)$")
}

fn readonly_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\breadonly\s+")
}

fn work_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"@work(\d+)(?:-([A-Za-z]+))?\s*:\s*(.*)$")
}

fn event_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"@(requiredInputs|requiredInput|evaluatedEntity|aReducingEntity)\s*:\s*(.*)$",
    )
}

fn valid_example_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"@validExample\s*:\s*(.*)$")
}

fn register_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\bregister\s*\.\s*events\s*\(")
}

fn constructor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\bnew\s+([A-Za-z_$][\w$]*)\s*\(")
}

/// Split source text into code and comment parts per line.
pub fn split_lines(source: &str) -> Vec<SourceLine> {
    let mut in_block = false;
    source
        .lines()
        .enumerate()
        .map(|(idx, text)| {
            let (code, masked, comment) = split_line(text, &mut in_block);
            SourceLine {
                number: idx + 1,
                code,
                masked,
                comment,
            }
        })
        .collect()
}

fn split_line(line: &str, in_block: &mut bool) -> (String, String, String) {
    let chars: Vec<char> = line.chars().collect();
    let mut code = String::new();
    let mut masked = String::new();
    let mut comment = String::new();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if *in_block {
            if c == '*' && next == Some('/') {
                *in_block = false;
                comment.push(' ');
                i += 2;
            } else {
                comment.push(c);
                i += 1;
            }
            continue;
        }

        if let Some(q) = quote {
            code.push(c);
            if c == '\\' {
                blank(&mut masked, c);
                if let Some(n) = next {
                    code.push(n);
                    blank(&mut masked, n);
                    i += 1;
                }
            } else if c == q {
                masked.push(c);
                quote = None;
            } else {
                blank(&mut masked, c);
            }
            i += 1;
            continue;
        }

        match (c, next) {
            ('/', Some('/')) => {
                comment.extend(&chars[i + 2..]);
                break;
            }
            ('/', Some('*')) => {
                *in_block = true;
                i += 2;
                continue;
            }
            ('\'' | '"' | '`', _) => {
                quote = Some(c);
                code.push(c);
                masked.push(c);
            }
            _ => {
                code.push(c);
                masked.push(c);
            }
        }
        i += 1;
    }

    (code, masked, comment.trim().to_string())
}

/// Blank one char, keeping its UTF-8 width so offsets line up with `code`.
fn blank(masked: &mut String, c: char) {
    masked.extend(std::iter::repeat(' ').take(c.len_utf8()));
}

fn paren_delta(code: &str) -> i32 {
    code.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

/// Tokenize a command source.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let lines = split_lines(source);
    let mut tokens = Vec::new();
    let mut register_depth = 0i32;
    let mut idx = 0;

    while idx < lines.len() {
        let line = &lines[idx];
        let number = line.number;
        let mut classified = false;

        if let Some(caps) = authorize_re().captures(&line.masked) {
            let start = caps.get(1).map_or(line.code.len(), |m| m.start());
            let mut value = line.code[start..].trim().to_string();
            if value.starts_with('[') {
                while !value.contains(']') && idx + 1 < lines.len() {
                    idx += 1;
                    value.push(' ');
                    value.push_str(lines[idx].code.trim());
                }
            }
            tokens.push(Token::Authorize {
                line: number,
                value,
            });
            classified = true;
        }

        let markers: Vec<_> = readonly_re().find_iter(&line.masked).collect();
        if !markers.is_empty() {
            let example = valid_example_re()
                .captures(&line.comment)
                .map(|caps| caps[1].trim().to_string());
            for (pos, marker) in markers.iter().enumerate() {
                let end = markers
                    .get(pos + 1)
                    .map(|m| m.start())
                    .unwrap_or(line.code.len());
                let is_last = pos + 1 == markers.len();
                tokens.push(Token::ReadonlyField {
                    line: number,
                    declaration: line.code[marker.end()..end].trim().to_string(),
                    example: if is_last { example.clone() } else { None },
                });
            }
            classified = true;
        }

        // register.events( ... ) regions, tracked by paren depth
        let mut region_code: Option<&str> = None;
        if register_depth > 0 {
            region_code = Some(line.masked.as_str());
            register_depth += paren_delta(&line.masked);
        } else if let Some(m) = register_re().find(&line.masked) {
            tokens.push(Token::RegisterOpen { line: number });
            region_code = Some(&line.masked[m.end()..]);
            register_depth = paren_delta(&line.masked[m.start()..]);
            classified = true;
        }

        if let Some(code) = region_code {
            for caps in constructor_re().captures_iter(code) {
                tokens.push(Token::Constructor {
                    line: number,
                    name: caps[1].to_string(),
                });
                classified = true;
            }
        }

        if !classified && !line.code.trim().is_empty() {
            tokens.push(Token::Code { line: number });
        }

        if let Some(caps) = work_re().captures(&line.comment) {
            let digits = &caps[1];
            let ordinal = match digits.parse::<u8>() {
                Ok(n) if digits.len() == 2 => n,
                _ => {
                    return Err(CoreError::parse(
                        number,
                        format!("work ordinal '{digits}' must be two digits"),
                    ))
                }
            };
            let suffix = caps.get(2).map(|m| m.as_str());
            let tag = WorkTag::from_suffix(suffix).ok_or_else(|| {
                CoreError::parse(
                    number,
                    format!("unknown work tag '@work{digits}-{}'", suffix.unwrap_or_default()),
                )
            })?;
            tokens.push(Token::Work {
                line: number,
                ordinal,
                tag,
                value: caps[3].trim().to_string(),
            });
        }

        if let Some(caps) = event_tag_re().captures(&line.comment) {
            let tag = match &caps[1] {
                "requiredInputs" | "requiredInput" => EventTag::RequiredInputs,
                _ => EventTag::EvaluatedEntity,
            };
            tokens.push(Token::Event {
                line: number,
                tag,
                value: caps[2].trim().to_string(),
            });
        }

        if region_code.is_some() && register_depth <= 0 {
            register_depth = 0;
            tokens.push(Token::RegisterClose { line: number });
        }

        idx += 1;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_strips_line_comment_outside_strings() {
        let lines = split_lines("const url = 'http://x' // @validExample: 'water'");
        assert_eq!(lines[0].code.trim(), "const url = 'http://x'");
        assert_eq!(lines[0].comment, "@validExample: 'water'");
    }

    #[test]
    fn test_split_tracks_block_comments_across_lines() {
        let lines = split_lines("a /* one\n two */ b\nc");
        assert_eq!(lines[0].code.trim(), "a");
        assert_eq!(lines[0].comment, "one");
        assert_eq!(lines[1].code.trim(), "b");
        assert_eq!(lines[1].comment, "two");
        assert_eq!(lines[2].code, "c");
    }

    #[test]
    fn test_split_masks_string_contents() {
        let lines = split_lines("throw new Error('fruit is readonly') // done");
        assert_eq!(lines[0].code.trim(), "throw new Error('fruit is readonly')");
        assert_eq!(lines[0].masked.len(), lines[0].code.len());
        assert!(!lines[0].masked.contains("readonly"));
        assert!(lines[0].masked.contains("Error('"));
    }

    #[test]
    fn test_keywords_inside_strings_are_code() {
        let source = "export class OrderSnack {\n  public constructor(readonly fruit: string) {}\n  handle() {\n    throw new Error('fruit is readonly once set')\n    log(\"authorize: [Dad]\")\n  }\n}";
        let tokens = tokenize(source).unwrap();
        let fields = tokens
            .iter()
            .filter(|t| matches!(t, Token::ReadonlyField { .. }))
            .count();
        assert_eq!(fields, 1);
        assert!(!tokens.iter().any(|t| matches!(t, Token::Authorize { .. })));
        assert!(tokens.contains(&Token::Code { line: 4 }));
        assert!(tokens.contains(&Token::Code { line: 5 }));
    }

    #[test]
    fn test_quoted_authorize_value_is_kept() {
        let tokens = tokenize("@Command({ authorize: 'all' })").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Authorize {
                line: 1,
                value: "'all' })".to_string()
            }]
        );
    }

    #[test]
    fn test_multiline_authorize_list() {
        let tokens = tokenize("@Command({\n  authorize: [\n    Mom,\n    Dad,\n  ],\n})").unwrap();
        let value = tokens
            .iter()
            .find_map(|t| match t {
                Token::Authorize { value, .. } => Some(value.clone()),
                _ => None,
            })
            .unwrap();
        assert!(value.starts_with('['));
        assert!(value.contains("Mom,"));
        assert!(value.contains(']'));
    }

    #[test]
    fn test_several_readonly_fields_on_one_line() {
        let tokens =
            tokenize("constructor(readonly a: string, readonly b?: number) {} // @validExample: 3")
                .unwrap();
        let fields: Vec<_> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::ReadonlyField {
                    declaration,
                    example,
                    ..
                } => Some((declaration.clone(), example.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], ("a: string,".to_string(), None));
        assert_eq!(fields[1].0, "b?: number) {}");
        assert_eq!(fields[1].1.as_deref(), Some("3"));
    }

    #[test]
    fn test_work_tags_and_legacy_result_alias() {
        let tokens = tokenize("// @work01: do it\n// @work01-result: 'Apple'").unwrap();
        assert!(matches!(
            &tokens[0],
            Token::Work { ordinal: 1, tag: WorkTag::Description, value, .. } if value == "do it"
        ));
        assert!(matches!(
            &tokens[1],
            Token::Work { tag: WorkTag::ShouldHave, .. }
        ));
    }

    #[test]
    fn test_bad_work_tags() {
        assert!(tokenize("// @work1: x").is_err());
        assert!(tokenize("// @work01-outputs: x").is_err());
    }

    #[test]
    fn test_register_region_constructors() {
        let source = "register.events(\n  new FruitOrdered(\n    // @requiredInputs: { fruit: string }\n    id\n  )\n)\nconst d = new Date()";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0], Token::RegisterOpen { line: 1 });
        assert_eq!(
            tokens[1],
            Token::Constructor {
                line: 2,
                name: "FruitOrdered".to_string()
            }
        );
        assert!(matches!(
            tokens[2],
            Token::Event {
                line: 3,
                tag: EventTag::RequiredInputs,
                ..
            }
        ));
        assert!(tokens.contains(&Token::RegisterClose { line: 6 }));
        // constructor outside the region is plain code
        assert_eq!(tokens.last(), Some(&Token::Code { line: 7 }));
    }

    #[test]
    fn test_single_line_register_call() {
        let tokens = tokenize("register.events(new Ping(id))").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::RegisterOpen { line: 1 },
                Token::Constructor {
                    line: 1,
                    name: "Ping".to_string()
                },
                Token::RegisterClose { line: 1 },
            ]
        );
    }
}
