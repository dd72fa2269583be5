// Markdown styling for finished posts

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const HASHTAG_COLOR: Color = Color::LightBlue;

/// Convert a finished post to styled lines
pub fn render_markdown_to_lines(markdown: &str) -> Vec<Line<'static>> {
    markdown.lines().map(render_markdown_line).collect()
}

/// Raw lines for a post that is still streaming, with a cursor at the end
pub fn render_streaming_lines(text: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = text
        .split('\n')
        .map(|line| Line::from(vec![Span::raw(line.to_string())]))
        .collect();

    let cursor = Span::styled("▌", Style::default().fg(Color::Cyan));
    if let Some(last) = lines.last_mut() {
        last.spans.push(cursor);
    }
    lines
}

/// Heading level when the line is `#`, `##`, ... followed by a space
fn heading_level(line: &str) -> Option<usize> {
    let level = line.chars().take_while(|&c| c == '#').count();
    (level > 0 && line[level..].starts_with(' ')).then_some(level)
}

fn flush(spans: &mut Vec<Span<'static>>, current: &mut String) {
    if !current.is_empty() {
        spans.push(Span::raw(std::mem::take(current)));
    }
}

/// Render a single line of markdown with basic styling
fn render_markdown_line(line: &str) -> Line<'static> {
    let trimmed = line.trim_start();

    if let Some(level) = heading_level(trimmed) {
        let color = match level {
            1 => Color::Yellow,
            2 => Color::Cyan,
            _ => Color::Blue,
        };
        return Line::from(Span::styled(
            trimmed[level..].trim().to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    let mut spans = Vec::new();
    let body = if let Some(rest) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        spans.push(Span::styled("• ", Style::default().fg(Color::Cyan)));
        rest
    } else {
        line
    };

    let mut current = String::new();
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            // Bold: **text**
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut bold = String::new();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    if ch == '*' && chars.peek() == Some(&'*') {
                        chars.next();
                        closed = true;
                        break;
                    }
                    bold.push(ch);
                }

                if closed {
                    flush(&mut spans, &mut current);
                    spans.push(Span::styled(
                        bold,
                        Style::default().add_modifier(Modifier::BOLD),
                    ));
                } else {
                    current.push_str("**");
                    current.push_str(&bold);
                }
            }
            // Italic: *text* or _text_
            '*' | '_' => {
                let mut italic = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ch {
                        closed = true;
                        break;
                    }
                    italic.push(next);
                }

                if closed && !italic.is_empty() {
                    flush(&mut spans, &mut current);
                    spans.push(Span::styled(
                        italic,
                        Style::default().add_modifier(Modifier::ITALIC),
                    ));
                } else {
                    current.push(ch);
                    current.push_str(&italic);
                    if closed {
                        current.push(ch);
                    }
                }
            }
            // Hashtags: #Blessed
            '#' if chars.peek().is_some_and(|c| c.is_alphanumeric()) => {
                flush(&mut spans, &mut current);
                let mut tag = String::from("#");
                while let Some(&next) = chars.peek() {
                    if !(next.is_alphanumeric() || next == '_') {
                        break;
                    }
                    tag.push(next);
                    chars.next();
                }
                spans.push(Span::styled(
                    tag,
                    Style::default()
                        .fg(HASHTAG_COLOR)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            _ => current.push(ch),
        }
    }

    flush(&mut spans, &mut current);

    if spans.is_empty() {
        Line::from("")
    } else {
        Line::from(spans)
    }
}
