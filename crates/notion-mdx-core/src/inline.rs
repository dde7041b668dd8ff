//! Rich text → inline MDX
//!
//! Each run is escaped first, then wrapped in a fixed order from the inside
//! out: code, bold, italic, strikethrough, underline, link. Keeping the
//! order fixed makes overlapping annotations nest the same way every time.

use crate::rich_text::RichText;

/// Escape characters MDX would otherwise read as JSX or expressions
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Translate a sequence of runs into one inline span
pub fn translate(runs: &[RichText]) -> String {
    runs.iter().map(translate_run).collect()
}

fn translate_run(run: &RichText) -> String {
    let ann = &run.annotations;
    let mut out = escape(&run.plain_text);

    if ann.code {
        out = format!("`{}`", out);
    }
    if ann.bold {
        out = format!("**{}**", out);
    }
    if ann.italic {
        out = format!("*{}*", out);
    }
    if ann.strikethrough {
        out = format!("~~{}~~", out);
    }
    if ann.underline {
        out = format!("<u>{}</u>", out);
    }
    if let Some(href) = &run.href {
        out = format!("[{}]({})", out, href);
    }

    out
}
