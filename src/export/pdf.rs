use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};
use std::path::{Path, PathBuf};

use super::ExportError;
use crate::models::Recipe;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;

const TITLE_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 11.0;
const FOOTER_SIZE: f32 = 9.0;
const LEADING: f32 = 1.4;

/// Helvetica averages about half an em per glyph.
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

const FONT_NAME: Name<'static> = Name(b"F1");

#[derive(Debug, Clone, PartialEq)]
struct Line {
    text: String,
    size: f32,
    indent: f32,
}

impl Line {
    fn new(text: impl Into<String>, size: f32) -> Self {
        Self {
            text: text.into(),
            size,
            indent: 0.0,
        }
    }

    fn indented(mut self, indent: f32) -> Self {
        self.indent = indent;
        self
    }

    fn height(&self) -> f32 {
        self.size * LEADING
    }
}

/// Replaces everything outside `[A-Za-z0-9-_.]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "recipe".to_string()
    } else {
        sanitized
    }
}

/// Writes recipes as A4 PDF documents into a fixed directory.
pub struct PdfExporter {
    dir: PathBuf,
}

impl PdfExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the recipe will be written to.
    pub fn target_path(&self, recipe: &Recipe) -> PathBuf {
        self.dir
            .join(format!("{}.pdf", sanitize_file_name(&recipe.name)))
    }

    pub async fn export(&self, recipe: &Recipe) -> Result<PathBuf, ExportError> {
        let path = self.target_path(recipe);
        let dir = self.dir.clone();
        let recipe = recipe.clone();
        let target = path.clone();

        tokio::task::spawn_blocking(move || -> Result<(), ExportError> {
            std::fs::create_dir_all(&dir)?;
            std::fs::write(&target, render(&recipe))?;
            Ok(())
        })
        .await
        .map_err(|e| ExportError::Task(e.to_string()))??;

        tracing::info!(path = %path.display(), "Exported recipe PDF");
        Ok(path)
    }
}

/// Renders the recipe into PDF bytes.
pub fn render(recipe: &Recipe) -> Vec<u8> {
    let pages = paginate(layout(recipe));
    let page_count = pages.len();

    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let font_id = Ref::new(3);
    let mut next_id = 4;
    let mut page_ids = Vec::with_capacity(page_count);
    let mut content_ids = Vec::with_capacity(page_count);
    for _ in 0..page_count {
        page_ids.push(Ref::new(next_id));
        content_ids.push(Ref::new(next_id + 1));
        next_id += 2;
    }

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().copied())
        .count(page_count as i32);
    pdf.type1_font(font_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    for (index, lines) in pages.iter().enumerate() {
        let mut page = pdf.page(page_ids[index]);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
        page.parent(tree_id);
        page.contents(content_ids[index]);
        page.resources().fonts().pair(FONT_NAME, font_id);
        page.finish();

        let mut content = Content::new();
        let mut y = PAGE_HEIGHT - MARGIN;
        for line in lines {
            y -= line.height();
            if !line.text.is_empty() {
                show_line(&mut content, &line.text, line.size, MARGIN + line.indent, y);
            }
        }

        let footer = format!("{} / {}", index + 1, page_count);
        let footer_x = PAGE_WIDTH / 2.0 - text_width(&footer, FOOTER_SIZE) / 2.0;
        show_line(&mut content, &footer, FOOTER_SIZE, footer_x, MARGIN / 2.0);

        pdf.stream(content_ids[index], &content.finish());
    }

    pdf.finish()
}

fn show_line(content: &mut Content, text: &str, size: f32, x: f32, y: f32) {
    let encoded = encode_latin1(text);
    content.begin_text();
    content.set_font(FONT_NAME, size);
    content.next_line(x, y);
    content.show(Str(&encoded));
    content.end_text();
}

/// The standard fonts only cover single-byte encodings.
fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVERAGE_GLYPH_WIDTH
}

fn layout(recipe: &Recipe) -> Vec<Line> {
    let mut lines = Vec::new();

    wrap_into(&mut lines, &recipe.name, TITLE_SIZE, 0.0);
    lines.push(Line::new("", BODY_SIZE));

    if !recipe.description.is_empty() {
        wrap_into(&mut lines, &recipe.description, BODY_SIZE, 0.0);
        lines.push(Line::new("", BODY_SIZE));
    }

    let mut facts = vec![
        format!("Time: {}", recipe.formatted_prep_time()),
        format!("Servings: {}", recipe.servings),
    ];
    if let Some(difficulty) = recipe.difficulty {
        facts.push(format!("Difficulty: {}", difficulty));
    }
    if let Some(category) = &recipe.category {
        facts.push(format!("Category: {}", category));
    }
    for fact in facts {
        lines.push(Line::new(fact, BODY_SIZE));
    }
    lines.push(Line::new("", BODY_SIZE));

    lines.push(Line::new("Ingredients", HEADING_SIZE));
    for ingredient in &recipe.ingredients {
        wrap_into(
            &mut lines,
            &format!("- {}", ingredient.full_text()),
            BODY_SIZE,
            10.0,
        );
    }
    lines.push(Line::new("", BODY_SIZE));

    lines.push(Line::new("Preparation", HEADING_SIZE));
    for (index, step) in recipe.steps.iter().enumerate() {
        wrap_into(
            &mut lines,
            &format!("{}. {}", index + 1, step.text),
            BODY_SIZE,
            10.0,
        );
    }

    lines
}

fn wrap_into(lines: &mut Vec<Line>, text: &str, size: f32, indent: f32) {
    let available = PAGE_WIDTH - 2.0 * MARGIN - indent;
    let max_chars = ((available / (size * AVERAGE_GLYPH_WIDTH)) as usize).max(1);
    for wrapped in wrap(text, max_chars) {
        lines.push(Line::new(wrapped, size).indented(indent));
    }
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn paginate(lines: Vec<Line>) -> Vec<Vec<Line>> {
    let usable = PAGE_HEIGHT - 2.0 * MARGIN;
    let mut pages = vec![Vec::new()];
    let mut used = 0.0;

    for line in lines {
        if used + line.height() > usable && used > 0.0 {
            pages.push(Vec::new());
            used = 0.0;
        }
        used += line.height();
        if let Some(page) = pages.last_mut() {
            page.push(line);
        }
    }
    pages
}
