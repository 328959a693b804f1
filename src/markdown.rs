//! Markdown rendering for streamed replies.
//!
//! A terminal cannot re-render already printed output the way a DOM does,
//! so this renderer works line by line: each completed markdown line is
//! printed with inline styling as soon as it arrives, and fenced code
//! blocks are held until their closing fence, then emitted with syntax
//! highlighting. The transform is display-only; the transcript stores the
//! raw reply text.

use std::io::{self, Stdout, Write};

use once_cell::sync::Lazy;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};

use crate::render::{ANSI_DIM, ANSI_RESET, Renderer};

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for italic text.
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code for underlined text.
const ANSI_UNDERLINE: &str = "\x1b[4m";

/// ANSI escape code for strikethrough text.
const ANSI_STRIKE: &str = "\x1b[9m";

/// ANSI escape code for cyan text (used for inline code).
const ANSI_CYAN: &str = "\x1b[36m";

/// Highlighting theme for fenced code blocks.
const CODE_THEME: &str = "base16-ocean.dark";

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// An open fenced code block: its language tag and buffered source.
struct FenceState {
    language: Option<String>,
    buffer: String,
}

/// Markdown renderer with syntax-highlighted fenced code blocks.
///
/// With color disabled every line is printed verbatim, preserving the raw
/// markdown for piping and redirection.
pub struct MarkdownRenderer {
    stdout: Stdout,
    use_color: bool,
    pending: String,
    fence: Option<FenceState>,
}

impl MarkdownRenderer {
    /// Creates a new MarkdownRenderer with ANSI styling enabled.
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            use_color: true,
            pending: String::new(),
            fence: None,
        }
    }

    /// Creates a new MarkdownRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            pending: String::new(),
            fence: None,
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    /// Renders one completed source line.
    fn handle_line(&mut self, line: &str) {
        if !self.use_color {
            println!("{line}");
            return;
        }
        if self.fence.is_some() {
            if fence_language(line).is_some() {
                if let Some(fence) = self.fence.take() {
                    print!(
                        "{}",
                        highlight_code(&fence.buffer, fence.language.as_deref(), true)
                    );
                }
            } else if let Some(fence) = self.fence.as_mut() {
                fence.buffer.push_str(line);
                fence.buffer.push('\n');
            }
            return;
        }
        if let Some(language) = fence_language(line) {
            self.fence = Some(FenceState {
                language,
                buffer: String::new(),
            });
            return;
        }
        println!("{}", render_line(line, true));
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for MarkdownRenderer {
    fn print_text(&mut self, text: &str) {
        self.pending.push_str(text);
        while let Some(index) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=index).collect();
            self.handle_line(line.trim_end_matches('\n'));
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        eprintln!("\nError: {error}");
    }

    fn print_info(&mut self, info: &str) {
        if self.use_color {
            println!("{ANSI_DIM}{info}{ANSI_RESET}");
        } else {
            println!("{info}");
        }
        self.flush();
    }

    fn finish_response(&mut self) {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.handle_line(&line);
        }
        // An unterminated fence at end of reply is emitted as-is.
        if let Some(fence) = self.fence.take() {
            print!(
                "{}",
                highlight_code(&fence.buffer, fence.language.as_deref(), self.use_color)
            );
        }
        println!();
        self.flush();
    }
}

/// Recognizes a fence line and extracts its language tag.
///
/// Returns `None` for ordinary lines, `Some(None)` for a bare fence, and
/// `Some(Some(lang))` for an opening fence with an info string.
fn fence_language(line: &str) -> Option<Option<String>> {
    let rest = line.trim_start().strip_prefix("```")?;
    let token = rest
        .split_whitespace()
        .next()
        .filter(|token| !token.is_empty());
    Some(token.map(|token| token.to_string()))
}

/// Renders a single markdown source line with inline ANSI styling.
///
/// With color disabled the line is returned unchanged.
pub fn render_line(line: &str, use_color: bool) -> String {
    if !use_color {
        return line.to_string();
    }

    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut out = String::new();
    let mut styles: Vec<&'static str> = Vec::new();
    let mut ordered_next: Option<u64> = None;

    for event in Parser::new_ext(line, options) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading(level, ..) => {
                    push_style(&mut out, &mut styles, heading_style(level));
                }
                Tag::Emphasis => push_style(&mut out, &mut styles, ANSI_ITALIC),
                Tag::Strong => push_style(&mut out, &mut styles, ANSI_BOLD),
                Tag::Strikethrough => push_style(&mut out, &mut styles, ANSI_STRIKE),
                Tag::Link(..) | Tag::Image(..) => {
                    push_style(&mut out, &mut styles, ANSI_UNDERLINE);
                }
                Tag::BlockQuote => {
                    out.push_str(ANSI_DIM);
                    out.push_str("\u{2502} ");
                    reapply_styles(&mut out, &styles);
                }
                Tag::List(start) => ordered_next = start,
                Tag::Item => match ordered_next.as_mut() {
                    Some(next) => {
                        out.push_str(&format!("{next}. "));
                        *next += 1;
                    }
                    None => out.push_str("- "),
                },
                Tag::CodeBlock(CodeBlockKind::Indented) => {
                    push_style(&mut out, &mut styles, ANSI_DIM);
                }
                _ => {}
            },
            Event::End(tag) => match tag {
                Tag::Heading(..)
                | Tag::Emphasis
                | Tag::Strong
                | Tag::Strikethrough
                | Tag::Link(..)
                | Tag::Image(..)
                | Tag::CodeBlock(CodeBlockKind::Indented) => {
                    pop_style(&mut out, &mut styles);
                }
                _ => {}
            },
            Event::Text(text) => out.push_str(&text),
            Event::Code(code) => {
                out.push_str(ANSI_CYAN);
                out.push_str(&code);
                reapply_styles(&mut out, &styles);
            }
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::Rule => out.push_str(&"\u{2500}".repeat(40)),
            Event::TaskListMarker(checked) => {
                out.push_str(if checked { "[x] " } else { "[ ] " });
            }
            Event::Html(html) => out.push_str(&html),
            Event::FootnoteReference(_) => {}
        }
    }

    out.push_str(ANSI_RESET);
    out
}

fn heading_style(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 | HeadingLevel::H2 => "\x1b[1m\x1b[4m",
        _ => ANSI_BOLD,
    }
}

fn push_style(out: &mut String, styles: &mut Vec<&'static str>, style: &'static str) {
    styles.push(style);
    reapply_styles(out, styles);
}

fn pop_style(out: &mut String, styles: &mut Vec<&'static str>) {
    styles.pop();
    reapply_styles(out, styles);
}

fn reapply_styles(out: &mut String, styles: &[&'static str]) {
    out.push_str(ANSI_RESET);
    for style in styles {
        out.push_str(style);
    }
}

/// Highlights a fenced code block for terminal display.
///
/// The language tag selects the syntax; an unknown or missing tag falls
/// back to plain text. With color disabled the source is returned
/// unchanged.
pub fn highlight_code(code: &str, language: Option<&str>, use_color: bool) -> String {
    if !use_color {
        return code.to_string();
    }

    let syntax = language
        .and_then(|lang| SYNTAX_SET.find_syntax_by_token(lang))
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
    let Some(theme) = THEME_SET.themes.get(CODE_THEME) else {
        return code.to_string();
    };

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut out = String::new();
    for line in LinesWithEndings::from(code) {
        match highlighter.highlight_line(line, &SYNTAX_SET) {
            Ok(ranges) => out.push_str(&as_24_bit_terminal_escaped(&ranges[..], false)),
            Err(_) => out.push_str(line),
        }
    }
    out.push_str(ANSI_RESET);
    out
}
