//! Text pipeline for generated wiki pages.
//!
//! Wiki sections arrive as loosely formatted Markdown with embedded Mermaid
//! diagrams. Everything here is pure string processing: cleanup before
//! rendering, heading anchors for the table of contents, and post-processing
//! of the SVG the diagram renderer produces.

use std::collections::HashMap;
use std::sync::OnceLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::debug;

/// Dark-theme palette applied to rendered diagrams.
pub const SVG_NODE_FILL: &str = "#101c33";
pub const SVG_NODE_STROKE: &str = "#5c7698";
pub const SVG_BACKGROUND: &str = "#080f1c";
pub const SVG_TEXT: &str = "#ffffff";

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    // Patterns are literals below; compiling one can only fail on a typo.
    cell.get_or_init(|| Regex::new(pattern).expect("static wiki regex"))
}

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static CELL: OnceLock<Regex> = OnceLock::new();
            cached(&CELL, $pattern)
        }
    };
}

static_regex!(escaped_structure_re, r"\\n(?:#{1,6}\s|```|지금 항목 식별자는)");
static_regex!(spaced_mermaid_fence_re, r"(?i)```\s+mermaid");
static_regex!(identifier_line_re, r"^지금 항목 식별자는\s+sec-\d+/sub-\d+-\d+/\d+이다\.?");
static_regex!(blank_run_re, r"\n{3,}");
static_regex!(atx_heading_re, r"^ {0,3}(#{1,6})[ \t]+(.*?)(?:[ \t]+#+)?[ \t]*$");
static_regex!(inline_link_re, r"\[([^\]]*)\]\([^)]*\)");
static_regex!(mermaid_open_re, r"(?i)^```\s*mermaid\s*");
static_regex!(fence_open_re, r"^```\s*");
static_regex!(fence_close_re, r"```\s*$");
static_regex!(view_box_re, r#"(?i)viewBox="[-\d.]+\s+[-\d.]+\s+([\d.]+)\s+([\d.]+)""#);
static_regex!(max_width_style_re, r#"(?i)\sstyle="[^"]*max-width:[^"]*""#);
static_regex!(width_attr_re, r#"(?i)\swidth="[^"]*""#);
static_regex!(height_attr_re, r#"(?i)\sheight="[^"]*""#);
static_regex!(color_attr_re, r#"(fill|stroke)="([^"]*)""#);
static_regex!(color_style_re, r"(fill|stroke)(:\s*)(#?[0-9a-fA-F]{3,8})\b");
static_regex!(text_tag_re, r"<(text|tspan)\b([^>]*?)(/?)>");
static_regex!(fill_attr_re, r#"\sfill="[^"]*""#);
static_regex!(svg_open_re, r"<svg\b[^>]*>");
static_regex!(style_attr_re, r#"\sstyle="([^"]*)""#);
static_regex!(node_class_re, r"\bnode\b");

// ── Markdown cleanup ────────────────────────────────────────────────────────

/// Clean generated wiki Markdown before rendering.
pub fn sanitize_wiki_markdown(raw: &str) -> String {
    let mut text = raw.replace("\r\n", "\n");

    // Some sections arrive with newlines double-escaped.
    if escaped_structure_re().is_match(&text) {
        text = text.replace("\\n", "\n");
    }

    let text = spaced_mermaid_fence_re().replace_all(&text, "```mermaid");

    let mut cleaned: Vec<&str> = Vec::new();
    let mut previous = "";
    for line in text.split('\n') {
        let trimmed = line.trim();
        if identifier_line_re().is_match(trimmed) {
            continue;
        }
        if !trimmed.is_empty() && trimmed == previous {
            continue;
        }
        cleaned.push(line);
        previous = trimmed;
    }

    blank_run_re()
        .replace_all(&cleaned.join("\n"), "\n\n")
        .into_owned()
}

// ── Headings ────────────────────────────────────────────────────────────────

/// Anchor slug for heading text: lowercase ASCII letters, digits, Hangul and
/// dashes. Falls back to `section`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_dash = false;

    for ch in lowered.trim().chars() {
        let ch = if ('\u{0}'..='\u{1f}').contains(&ch) { ' ' } else { ch };
        if ('\u{7f}'..='\u{9f}').contains(&ch) {
            continue;
        }
        if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ('가'..='힣').contains(&ch) {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        }
    }

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// Hands out heading ids that are unique per (level, slug) within one page.
#[derive(Debug, Clone, Default)]
pub struct HeadingSlugger {
    prefix: String,
    seen: HashMap<(u8, String), usize>,
}

impl HeadingSlugger {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            seen: HashMap::new(),
        }
    }

    /// Id for the next heading at `level`. Repeats get `-2`, `-3`, ...
    pub fn id(&mut self, level: u8, text: &str) -> String {
        let text = text.trim();
        let base = if text.is_empty() {
            slugify(&format!("section-{}", level))
        } else {
            slugify(text)
        };

        let count = self.seen.entry((level, base.clone())).or_insert(0);
        *count += 1;
        if *count > 1 {
            format!("{}{}-{}", self.prefix, base, count)
        } else {
            format!("{}{}", self.prefix, base)
        }
    }
}

/// Table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiHeading {
    pub id: String,
    pub level: u8,
    pub label: String,
}

/// ATX headings outside code fences, in document order, with anchor ids.
pub fn extract_headings(markdown: &str, prefix: &str) -> Vec<WikiHeading> {
    let mut slugger = HeadingSlugger::new(prefix);
    let mut headings = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        let Some(caps) = atx_heading_re().captures(line) else {
            continue;
        };

        let level = caps[1].len() as u8;
        let label = heading_label(&caps[2]);
        if label.is_empty() {
            continue;
        }
        headings.push(WikiHeading {
            id: slugger.id(level, &label),
            level,
            label,
        });
    }
    headings
}

/// Visible text of a heading: link targets and emphasis markers removed.
fn heading_label(raw: &str) -> String {
    let text = inline_link_re().replace_all(raw, "$1");
    text.chars()
        .filter(|c| !matches!(c, '*' | '`'))
        .collect::<String>()
        .trim()
        .to_string()
}

// ── Blocks ──────────────────────────────────────────────────────────────────

/// A run of Markdown or one Mermaid diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "source", rename_all = "lowercase")]
pub enum WikiBlock {
    Markdown(String),
    Mermaid(String),
}

/// Split Markdown into prose and Mermaid blocks, in order. Other fenced code
/// stays inside the prose. An unterminated diagram runs to the end.
pub fn split_blocks(markdown: &str) -> Vec<WikiBlock> {
    let mut blocks = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    let mut diagram: Option<Vec<&str>> = None;
    let mut in_code = false;

    fn flush_prose(prose: &mut Vec<&str>, blocks: &mut Vec<WikiBlock>) {
        let text = prose.join("\n");
        if !text.trim().is_empty() {
            blocks.push(WikiBlock::Markdown(text));
        }
        prose.clear();
    }

    for line in markdown.lines() {
        let trimmed = line.trim();

        if let Some(lines) = diagram.as_mut() {
            if trimmed == "```" {
                blocks.push(WikiBlock::Mermaid(normalize_mermaid_source(&lines.join("\n"))));
                diagram = None;
            } else {
                lines.push(line);
            }
            continue;
        }

        if !in_code && mermaid_open_re().is_match(trimmed) {
            flush_prose(&mut prose, &mut blocks);
            diagram = Some(Vec::new());
            continue;
        }
        if trimmed.starts_with("```") {
            in_code = !in_code;
        }
        prose.push(line);
    }

    match diagram {
        Some(lines) => blocks.push(WikiBlock::Mermaid(normalize_mermaid_source(&lines.join("\n")))),
        None => flush_prose(&mut prose, &mut blocks),
    }
    blocks
}

/// Diagram source without surrounding code fences.
pub fn normalize_mermaid_source(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let stripped = mermaid_open_re().replace(trimmed, "");
    let stripped = fence_open_re().replace(&stripped, "");
    fence_close_re().replace(&stripped, "").trim().to_string()
}

// ── SVG post-processing ─────────────────────────────────────────────────────

/// Give a rendered diagram intrinsic dimensions from its `viewBox` so it can
/// scroll horizontally instead of shrinking. SVG without a usable `viewBox`
/// is returned as is.
pub fn normalize_rendered_svg(svg: &str) -> String {
    let Some(caps) = view_box_re().captures(svg) else {
        return svg.to_string();
    };
    let (Ok(width), Ok(height)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) else {
        return svg.to_string();
    };
    if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
        return svg.to_string();
    }

    let mut out = max_width_style_re().replace(svg, "").into_owned();

    let width_attr = format!(" width=\"{}\"", width);
    out = if width_attr_re().is_match(&out) {
        width_attr_re().replace(&out, width_attr.as_str()).into_owned()
    } else {
        out.replacen("<svg", &format!("<svg{}", width_attr), 1)
    };

    let height_attr = format!(" height=\"{}\"", height);
    out = if height_attr_re().is_match(&out) {
        height_attr_re().replace(&out, height_attr.as_str()).into_owned()
    } else {
        out.replacen("<svg", &format!("<svg{}", height_attr), 1)
    };

    if !out.contains(" data-wiki-normalized=\"1\"") {
        out = out.replacen("<svg", "<svg data-wiki-normalized=\"1\"", 1);
    }
    out
}

/// Recolor a rendered diagram for the dark theme.
///
/// Walks the parsed elements and pins colors with `!important` inline
/// styles: node shapes get the node fill, strokes get the node stroke, text
/// turns white and the root gets the page background. `none` and `url(...)`
/// paints are kept. SVG that does not parse falls back to rewriting literal
/// hex colors in attributes and styles.
pub fn sanitize_svg_colors(svg: &str) -> String {
    match recolor_elements(svg) {
        Some(out) => out,
        None => {
            debug!("Diagram SVG did not parse, recoloring literal colors only");
            recolor_literals(svg)
        }
    }
}

const SKIPPED_ELEMENTS: [&str; 5] = ["style", "defs", "marker", "title", "desc"];
const NODE_SHAPES: [&str; 5] = ["rect", "circle", "ellipse", "polygon", "path"];

fn recolor_elements(svg: &str) -> Option<String> {
    let mut reader = Reader::from_str(svg);
    let mut writer = Writer::new(Vec::with_capacity(svg.len() + 256));
    let mut open = 0usize;
    let mut root_seen = false;

    loop {
        match reader.read_event().ok()? {
            Event::Eof => break,
            Event::Start(element) => {
                let element = recolor_element(&element, !root_seen)?;
                root_seen = true;
                open += 1;
                writer.write_event(Event::Start(element)).ok()?;
            }
            Event::Empty(element) => {
                let element = recolor_element(&element, !root_seen)?;
                root_seen = true;
                writer.write_event(Event::Empty(element)).ok()?;
            }
            Event::End(element) => {
                open = open.checked_sub(1)?;
                writer.write_event(Event::End(element)).ok()?;
            }
            other => writer.write_event(other).ok()?,
        }
    }

    if !root_seen || open != 0 {
        return None;
    }
    String::from_utf8(writer.into_inner()).ok()
}

/// Copy of `element` with the palette merged into its `style`. The first
/// element of the document must be the `<svg>` root.
fn recolor_element(element: &BytesStart<'_>, is_root: bool) -> Option<BytesStart<'static>> {
    let tag = String::from_utf8_lossy(element.local_name().as_ref()).to_ascii_lowercase();

    let mut attrs: Vec<(Vec<u8>, String)> = Vec::new();
    for attr in element.attributes() {
        let attr = attr.ok()?;
        let value = String::from_utf8(attr.value.into_owned()).ok()?;
        attrs.push((attr.key.as_ref().to_vec(), value));
    }
    let attr = |name: &str| {
        attrs
            .iter()
            .find(|(key, _)| key.as_slice() == name.as_bytes())
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    };

    let properties = if is_root {
        if tag != "svg" {
            return None;
        }
        vec![("background-color", SVG_BACKGROUND)]
    } else {
        paint_overrides(&tag, attr("fill"), attr("stroke"), attr("class"))
    };

    let name = String::from_utf8(element.name().as_ref().to_vec()).ok()?;
    let mut out = BytesStart::new(name);
    let mut styled = false;
    for (key, value) in &attrs {
        if key.as_slice() == b"style" && !properties.is_empty() {
            let merged = with_style_properties(value, &properties);
            out.push_attribute((key.as_slice(), merged.as_bytes()));
            styled = true;
        } else {
            out.push_attribute((key.as_slice(), value.as_bytes()));
        }
    }
    if !styled && !properties.is_empty() {
        let style = with_style_properties("", &properties);
        out.push_attribute((b"style".as_slice(), style.as_bytes()));
    }
    Some(out)
}

/// Inline style overrides for one non-root element.
fn paint_overrides(
    tag: &str,
    fill: Option<&str>,
    stroke: Option<&str>,
    class: Option<&str>,
) -> Vec<(&'static str, &'static str)> {
    if SKIPPED_ELEMENTS.contains(&tag) {
        return Vec::new();
    }
    if tag == "text" || tag == "tspan" {
        return vec![("fill", SVG_TEXT), ("stroke", SVG_TEXT), ("color", SVG_TEXT)];
    }

    let mut properties = Vec::new();
    let node_like = NODE_SHAPES.contains(&tag) || class.is_some_and(|c| node_class_re().is_match(c));
    if node_like && !fill.is_some_and(is_paint_reference) {
        properties.push(("fill", SVG_NODE_FILL));
    }

    let foreign = tag == "foreignobject";
    match stroke {
        Some(value) if is_paint_reference(value) => {}
        Some(_) => properties.push(("stroke", SVG_NODE_STROKE)),
        None if !foreign => properties.push(("stroke", SVG_NODE_STROKE)),
        None => {}
    }

    if foreign {
        properties.push(("color", SVG_TEXT));
    }
    properties
}

/// `style` declarations with `properties` replacing any existing ones of the
/// same name, each pinned with `!important`.
fn with_style_properties(style: &str, properties: &[(&str, &str)]) -> String {
    let mut declarations: Vec<String> = style
        .split(';')
        .map(str::trim)
        .filter(|declaration| !declaration.is_empty())
        .filter(|declaration| {
            let name = declaration.split(':').next().unwrap_or_default().trim();
            !properties.iter().any(|(property, _)| name.eq_ignore_ascii_case(property))
        })
        .map(str::to_string)
        .collect();
    declarations.extend(
        properties
            .iter()
            .map(|(property, value)| format!("{}: {} !important", property, value)),
    );
    declarations.join("; ")
}

/// Regex pass for SVG the parser rejects: literal hex fills and strokes in
/// attributes and styles, text tags and the root background.
fn recolor_literals(svg: &str) -> String {
    let out = color_attr_re().replace_all(svg, |caps: &Captures| {
        let value = caps[2].trim();
        if is_paint_reference(value) || !is_hex_color(value) {
            return caps[0].to_string();
        }
        format!("{}=\"{}\"", &caps[1], palette_for(&caps[1]))
    });

    let out = color_style_re().replace_all(&out, |caps: &Captures| {
        format!("{}{}{}", &caps[1], &caps[2], palette_for(&caps[1]))
    });

    let out = text_tag_re().replace_all(&out, |caps: &Captures| {
        let attrs = fill_attr_re().replace_all(&caps[2], "");
        let attrs = with_style_attr(&attrs, &TEXT_PAINT);
        format!("<{}{} fill=\"{}\"{}>", &caps[1], attrs, SVG_TEXT, &caps[3])
    });

    svg_open_re()
        .replace(&out, |caps: &Captures| {
            with_style_attr(&caps[0], &[("background-color", SVG_BACKGROUND)])
        })
        .into_owned()
}

const TEXT_PAINT: [(&str, &str); 3] = [("fill", SVG_TEXT), ("stroke", SVG_TEXT), ("color", SVG_TEXT)];

fn palette_for(property: &str) -> &'static str {
    if property == "fill" {
        SVG_NODE_FILL
    } else {
        SVG_NODE_STROKE
    }
}

fn is_paint_reference(value: &str) -> bool {
    value.eq_ignore_ascii_case("none") || value.to_ascii_lowercase().starts_with("url(")
}

fn is_hex_color(value: &str) -> bool {
    let digits = value.strip_prefix('#').unwrap_or(value);
    (3..=8).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Merge `properties` into the `style` attribute of a raw tag or attribute
/// run, adding one at the end when there is none.
fn with_style_attr(tag: &str, properties: &[(&str, &str)]) -> String {
    if let Some(caps) = style_attr_re().captures(tag) {
        let merged = format!(" style=\"{}\"", with_style_properties(&caps[1], properties));
        return tag.replacen(&caps[0], &merged, 1);
    }
    let style = format!(" style=\"{}\"", with_style_properties("", properties));
    match tag.strip_suffix("/>").or_else(|| tag.strip_suffix('>')) {
        Some(head) => format!("{}{}{}", head, style, &tag[head.len()..]),
        None => format!("{}{}", tag, style),
    }
}

// ── Whole page ──────────────────────────────────────────────────────────────

/// A wiki section ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiDocument {
    pub blocks: Vec<WikiBlock>,
    pub headings: Vec<WikiHeading>,
}

/// Sanitize, split and index a section. `None` when nothing is left to show.
pub fn prepare_wiki(content: &str, heading_prefix: &str) -> Option<WikiDocument> {
    let markdown = sanitize_wiki_markdown(content);
    let markdown = markdown.trim();
    if markdown.is_empty() {
        return None;
    }
    Some(WikiDocument {
        blocks: split_blocks(markdown),
        headings: extract_headings(markdown, heading_prefix),
    })
}
