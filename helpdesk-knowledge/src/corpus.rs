//! Splitting a plain-text corpus into titled sections.
//!
//! Markdown headings delimit sections. A corpus without any heading falls
//! back to blank-line separated blocks whose first line is the title.

/// Untokenized section as it appears in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub title: String,
    pub body: String,
}

pub fn split_sections(input: &str) -> Vec<RawSection> {
    if input.lines().any(|line| parse_heading(line).is_some()) {
        split_by_headings(input)
    } else {
        split_by_paragraphs(input)
    }
}

fn split_by_headings(input: &str) -> Vec<RawSection> {
    let mut sections = Vec::new();
    let mut current_title = String::from("Introduction");
    let mut current_lines: Vec<&str> = Vec::new();

    for line in input.lines() {
        if let Some(title) = parse_heading(line) {
            push_section(&mut sections, &current_title, &current_lines);
            current_title = title;
            current_lines.clear();
        } else {
            current_lines.push(line);
        }
    }
    push_section(&mut sections, &current_title, &current_lines);

    sections
}

fn push_section(sections: &mut Vec<RawSection>, title: &str, lines: &[&str]) {
    let body = lines.join("\n").trim().to_string();
    if body.is_empty() {
        return;
    }
    sections.push(RawSection {
        title: title.to_string(),
        body,
    });
}

fn split_by_paragraphs(input: &str) -> Vec<RawSection> {
    let mut sections = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in input.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if let Some((first, rest)) = block.split_first() {
                sections.push(RawSection {
                    title: first.trim().to_string(),
                    body: rest.join("\n").trim().to_string(),
                });
            }
            block.clear();
        } else {
            block.push(line);
        }
    }

    sections
}

fn parse_heading(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return None;
    }
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let title = rest.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
