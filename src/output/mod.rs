pub mod report;

use colored::Colorize;

use crate::directory::view::{Body, DirectoryView, ListingEntry, SectionView, Status, StudentCard};
use crate::render::Fragment;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn render(view: &DirectoryView, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(view),
        OutputFormat::Json => render_json(view),
        OutputFormat::Html => report::render_html(view),
    }
}

pub fn render_json(view: &DirectoryView) -> Vec<u8> {
    let mut out = serde_json::to_vec_pretty(view).unwrap_or_else(|_| b"{}".to_vec());
    out.push(b'\n');
    out
}

fn fragment_lines(fragment: &Fragment, indent: usize, out: &mut Vec<String>) {
    let pad = " ".repeat(indent);
    match fragment {
        Fragment::Empty => {}
        Fragment::Text { text } => {
            for line in text.lines() {
                out.push(format!("{pad}{line}"));
            }
        }
        Fragment::Link { href } => out.push(format!("{pad}{}", href.underline().blue())),
        Fragment::Image { src } => out.push(format!("{pad}{} {}", "[img]".magenta(), src)),
        Fragment::List { items } => {
            for item in items {
                let mut nested = Vec::new();
                fragment_lines(item, indent + 2, &mut nested);
                if let Some(first) = nested.first_mut() {
                    let trimmed = first.trim_start().to_string();
                    *first = format!("{pad}- {trimmed}");
                }
                out.extend(nested);
            }
        }
        Fragment::Pairs { entries } => {
            for (key, value) in entries {
                let mut nested = Vec::new();
                fragment_lines(value, indent + 2, &mut nested);
                match nested.len() {
                    0 => out.push(format!("{pad}{}:", key.bold())),
                    1 => out.push(format!(
                        "{pad}{}: {}",
                        key.bold(),
                        nested[0].trim_start()
                    )),
                    _ => {
                        out.push(format!("{pad}{}:", key.bold()));
                        out.extend(nested);
                    }
                }
            }
        }
    }
}

fn push_section(section: &SectionView, out: &mut String) {
    let mut lines = Vec::new();
    fragment_lines(&section.fragment, 4, &mut lines);
    let heading = if section.title == section.field {
        section.title.bold().white().to_string()
    } else {
        format!("{} ({})", section.title.bold().white(), section.field.dimmed())
    };
    out.push_str(&format!("  {heading}\n"));
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
}

fn push_card(card: &StudentCard, out: &mut String) {
    out.push_str(&format!(
        "{}{}{} {}  {}\n",
        "[".bold().white(),
        (card.index + 1).to_string().bold().cyan(),
        "]".bold().white(),
        card.name.bold().green(),
        card.position_label().dimmed(),
    ));
    if let Some(email) = card.email.as_ref() {
        out.push_str(&format!("    {}\n", email));
    }
    match card.photo.as_ref() {
        Some(photo) => out.push_str(&format!("    {} {}\n", "[img]".magenta(), photo)),
        None => out.push_str(&format!("    {} {}\n", "[initial]".magenta(), card.initial)),
    }
    out.push_str(&format!("    {} {}\n", "link:".dimmed(), card.path));
    out.push('\n');
    for section in card.sections.iter() {
        push_section(section, out);
    }
    let nav = |enabled: bool, label: &str| {
        if enabled {
            label.bold().white().to_string()
        } else {
            label.dimmed().to_string()
        }
    };
    out.push('\n');
    out.push_str(&format!(
        "  {}  {}  {}\n",
        nav(true, "< list"),
        nav(card.has_prev, "< prev"),
        nav(card.has_next, "next >"),
    ));
}

fn push_listing(entries: &[ListingEntry], out: &mut String) {
    for entry in entries {
        out.push_str(&format!(
            "{}{}{} {} {}\n",
            "[".bold().white(),
            (entry.index + 1).to_string().bold().cyan(),
            "]".bold().white(),
            entry.name.bold().green(),
            entry.path.dimmed(),
        ));
    }
}

/// Terminal rendering. Colors follow `colored`'s global override.
pub fn render_text(view: &DirectoryView) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Student Introductions".bold().white()));

    let toggles = view
        .toggles
        .iter()
        .map(|t| {
            if t.enabled {
                t.label.green().to_string()
            } else {
                t.label.dimmed().strikethrough().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(&format!(":: {:<10}: {}\n", "Route", view.route));
    if !view.search_text.is_empty() {
        out.push_str(&format!(
            ":: {:<10}: {} ({} of {})\n",
            "Search", view.search_text, view.matches, view.total
        ));
    }
    out.push_str(&format!(":: {:<10}: {}\n\n", "Fields", toggles));

    match view.status.as_ref() {
        Some(Status::Loading) => out.push_str("Loading student data…\n"),
        Some(Status::Error { message }) => out.push_str(&format!(
            "{} Error loading data: {}\n",
            "[ERR]".bold().red(),
            message
        )),
        Some(Status::Empty { message }) => out.push_str(&format!("{message}\n")),
        None => {}
    }

    match &view.body {
        Body::Nothing => {}
        Body::Blob { json } => {
            out.push_str(json);
            out.push('\n');
        }
        Body::Listing { entries } => push_listing(entries, &mut out),
        Body::Viewing { card } => push_card(card, &mut out),
    }
    out.into_bytes()
}
