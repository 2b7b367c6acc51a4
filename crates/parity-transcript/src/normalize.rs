use crate::room::strip_room_description;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_PROMPT_MARKER: &str = ">";

// ── Pipeline ──

/// Which stages run and with what prompt marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    #[serde(default = "default_prompt_marker")]
    pub prompt_marker: String,
    #[serde(default = "yes")]
    pub strip_header: bool,
    #[serde(default = "yes")]
    pub strip_status_bar: bool,
    #[serde(default = "yes")]
    pub strip_room_description: bool,
    #[serde(default = "yes")]
    pub unwrap_lines: bool,
}

fn yes() -> bool {
    true
}

fn default_prompt_marker() -> String {
    DEFAULT_PROMPT_MARKER.into()
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            prompt_marker: DEFAULT_PROMPT_MARKER.into(),
            strip_header: true,
            strip_status_bar: true,
            strip_room_description: true,
            unwrap_lines: true,
        }
    }
}

/// Runs the transforms in order: header, status bar, prompt, room block,
/// line unwrap, whitespace. The header stage only runs on the intro, since
/// banner words ("Loading", "Release 2") also occur in ordinary responses.
#[derive(Debug, Clone, Default)]
pub struct NormalizationPipeline {
    options: NormalizeOptions,
}

impl NormalizationPipeline {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Normalize the output produced in response to `command`.
    pub fn normalize(&self, output: &str, command: &str) -> String {
        self.normalize_body(output.to_string(), command)
    }

    /// Normalize the output printed before the first command.
    pub fn normalize_intro(&self, output: &str) -> String {
        let text = if self.options.strip_header {
            strip_game_header(output)
        } else {
            output.to_string()
        };
        self.normalize_body(text, "")
    }

    /// Entry 0 is the intro; every later entry is a response.
    pub fn normalize_entry(&self, index: usize, output: &str, command: &str) -> String {
        if index == 0 {
            self.normalize_intro(output)
        } else {
            self.normalize(output, command)
        }
    }

    fn normalize_body(&self, mut text: String, command: &str) -> String {
        let opts = &self.options;
        if opts.strip_status_bar {
            text = strip_status_bar(&text);
        }
        text = strip_prompt(&text, &opts.prompt_marker);
        if opts.strip_room_description {
            text = strip_room_description(&text, command);
        }
        if opts.unwrap_lines {
            text = normalize_line_wrapping(&text);
        }
        normalize_output(&text)
    }
}

// ── Header ──

fn banner_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(copyright|\(c\)|©|\brelease\s+\d+|serial\s+(number|no\.?)|\brevision\s+\d+|trademark|all rights reserved|^\s*loading\b|^\s*using\s+\w+\s+formatting|interpreter\s+version|\bversion\s+\d)",
        )
        .expect("banner pattern is valid")
    })
}

fn is_banner_line(line: &str) -> bool {
    banner_re().is_match(line)
}

/// Remove banner blocks (title, copyright, release/serial, loading notices)
/// from the start of the text.
///
/// A block runs to the first blank line or the first non-banner line after a
/// banner line. One leading title line is tolerated before the first banner
/// line; a block with no banner line at all is not a header and the text is
/// returned unchanged. Repeats while blocks keep matching, since some
/// interpreters print a loading notice block before the game's own banner.
pub fn strip_game_header(text: &str) -> String {
    let mut current = text.to_string();
    while let Some(rest) = strip_one_header_block(&current) {
        current = rest;
    }
    current
}

fn strip_one_header_block(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    while i < lines.len() && lines[i].trim().is_empty() {
        i += 1;
    }

    let mut seen_banner = false;
    let mut title_taken = false;
    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            break;
        }
        if is_banner_line(line) {
            seen_banner = true;
        } else if seen_banner {
            // first room name or other content after the banner
            break;
        } else if !title_taken {
            title_taken = true;
        } else {
            return None;
        }
        i += 1;
    }

    if !seen_banner {
        return None;
    }
    // the blank line closing the banner goes with it
    if i < lines.len() && lines[i].trim().is_empty() {
        i += 1;
    }
    Some(lines[i..].join("\n"))
}

// ── Status bar ──

fn status_bar_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\S.*?\s+Score:\s*-?\d+\s+Moves:\s*\d+\s*$")
            .expect("status bar pattern is valid")
    })
}

/// Remove the interpreter's embedded status line
/// (`<location>  Score: <n>  Moves: <n>`).
pub fn strip_status_bar(text: &str) -> String {
    text.lines()
        .filter(|l| !status_bar_re().is_match(l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turn count from an embedded status line, if one is present.
pub fn parse_status_moves(text: &str) -> Option<u32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*\S.*?\s+Score:\s*-?\d+\s+Moves:\s*(\d+)\s*$")
            .expect("moves pattern is valid")
    });
    re.captures_iter(text)
        .last()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// ── Prompt ──

/// Remove lines consisting solely of the prompt marker (trailing whitespace
/// allowed). The marker inside other text is left alone.
pub fn strip_prompt(text: &str, marker: &str) -> String {
    if marker.is_empty() {
        return text.to_string();
    }
    text.lines()
        .filter(|l| l.trim_end() != marker)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Line wrapping ──

fn ends_sentence(line: &str) -> bool {
    matches!(
        line.trim_end().chars().last(),
        Some('.' | '!' | '?' | '"' | '\'' | '\u{201D}' | '\u{2019}')
    )
}

/// Undo hard wrapping. Blank lines are paragraph breaks and kept; other lines
/// are joined with one space onto the line being built unless that line
/// already ends a sentence.
pub fn normalize_line_wrapping(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut acc: Option<String> = None;

    for raw in text.lines() {
        if raw.trim().is_empty() {
            if let Some(a) = acc.take() {
                out.push(a);
            }
            out.push(raw.to_string());
            continue;
        }
        let line = raw.trim_end();
        match acc.as_mut() {
            Some(a) if !ends_sentence(a) => {
                a.push(' ');
                a.push_str(line.trim_start());
            }
            _ => {
                if let Some(a) = acc.take() {
                    out.push(a);
                }
                acc = Some(line.to_string());
            }
        }
    }
    if let Some(a) = acc {
        out.push(a);
    }
    out.join("\n")
}

// ── Whitespace ──

/// Canonical whitespace: `\n` line endings, single spaces, trimmed lines, at
/// most one blank line in a row, no leading or trailing blank lines.
/// Idempotent.
pub fn normalize_output(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out: Vec<String> = Vec::new();
    for line in unified.split('\n') {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() && out.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        out.push(collapsed);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}
