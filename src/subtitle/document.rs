/*!
 * Canonical style-sheet subtitle document.
 *
 * A `SubtitleDocument` holds the script metadata, the style table and the
 * event table of an ASS script. Both source formats are loaded into it:
 * style-sheet files are parsed section by section, sequential captions are
 * converted into `Dialogue` events on a placeholder `Default` style.
 *
 * `render` is deterministic and always writes the canonical column layout,
 * so rendering a parsed rendering reproduces the same text.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;

use crate::errors::SubtitleError;
use crate::subtitle::format::{
    strip_bom, SubtitleFormat, EVENTS_MARKER, SCRIPT_INFO_MARKER, STYLES_MARKER,
};
use crate::subtitle::srt::{parse_srt_string, SubtitleEntry};

/// Column header written for the style table
pub const STYLE_FORMAT_LINE: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

/// Column header written for the event table
pub const EVENT_FORMAT_LINE: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

const STYLE_COLUMNS: [&str; 23] = [
    "name", "fontname", "fontsize", "primarycolour", "secondarycolour", "outlinecolour",
    "backcolour", "bold", "italic", "underline", "strikeout", "scalex", "scaley", "spacing",
    "angle", "borderstyle", "outline", "shadow", "alignment", "marginl", "marginr", "marginv",
    "encoding",
];

const EVENT_COLUMNS: [&str; 10] = [
    "layer", "start", "end", "style", "name", "marginl", "marginr", "marginv", "effect", "text",
];

/// Name of the style every converted caption uses
pub const DEFAULT_STYLE_NAME: &str = "Default";

// @const: Any HTML-like caption tag
static MARKUP_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([A-Za-z]+)([^<>]*)>").unwrap());

// @const: Attributes of a caption `<font>` tag
static FONT_ATTR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(color|face|size)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

const NAMED_COLORS: [(&str, &str); 10] = [
    ("white", "FFFFFF"),
    ("black", "000000"),
    ("red", "FF0000"),
    ("lime", "00FF00"),
    ("green", "008000"),
    ("blue", "0000FF"),
    ("yellow", "FFFF00"),
    ("cyan", "00FFFF"),
    ("magenta", "FF00FF"),
    ("gray", "808080"),
];

/// Event timestamp with centisecond precision (`H:MM:SS.CC`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Build from hours, minutes, seconds and centiseconds
    ///
    /// Saturates at the largest representable timestamp.
    pub fn from_hmsc(hours: u64, minutes: u64, seconds: u64, centis: u64) -> Self {
        Self(total_centis(hours, minutes, seconds, centis).unwrap_or(u64::MAX))
    }

    /// Convert milliseconds, rounding to the nearest centisecond
    pub fn from_millis(ms: u64) -> Self {
        Self(ms / 10 + u64::from(ms % 10 >= 5))
    }

    pub fn centiseconds(&self) -> u64 {
        self.0
    }

    /// Parse `H:MM:SS.CC`; a two digit fraction is centiseconds, three digits milliseconds
    pub fn parse(value: &str) -> Result<Self, SubtitleError> {
        let invalid = || SubtitleError::Parse(format!("invalid timestamp: {}", value));

        let mut parts = value.trim().split(':');
        let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let hours: u64 = h.trim().parse().map_err(|_| invalid())?;
        let minutes: u64 = m.trim().parse().map_err(|_| invalid())?;
        let (secs, frac) = s.trim().split_once('.').unwrap_or((s.trim(), "0"));
        let seconds: u64 = secs.parse().map_err(|_| invalid())?;

        if frac.is_empty() || frac.len() > 3 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let frac_value: u64 = frac.parse().map_err(|_| invalid())?;
        let centis = match frac.len() {
            1 => frac_value * 10,
            2 => frac_value,
            _ => (frac_value + 5) / 10,
        };

        total_centis(hours, minutes, seconds, centis)
            .map(Self)
            .ok_or_else(invalid)
    }
}

fn total_centis(hours: u64, minutes: u64, seconds: u64, centis: u64) -> Option<u64> {
    hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(100)?
        .checked_add(centis)
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let centis = self.0 % 100;
        let total_seconds = self.0 / 100;
        let seconds = total_seconds % 60;
        let minutes = (total_seconds / 60) % 60;
        let hours = total_seconds / 3600;
        write!(f, "{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
    }
}

/// Colour layer value, `&HAABBGGRR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssColor(pub u32);

impl AssColor {
    /// Accepts `&HAABBGGRR`, `&HBBGGRR`, an optional trailing `&`, or a decimal value
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().trim_end_matches('&');
        let hex = value
            .strip_prefix("&H")
            .or_else(|| value.strip_prefix("&h"));

        match hex {
            Some(hex) => u32::from_str_radix(hex, 16).ok().map(Self),
            None => value.parse::<i64>().ok().map(|v| Self(v as u32)),
        }
    }
}

impl fmt::Display for AssColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&H{:08X}", self.0)
    }
}

/// One row of the style table
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefinition {
    pub name: String,
    pub font_name: String,
    pub font_size: f64,
    pub primary_colour: AssColor,
    pub secondary_colour: AssColor,
    pub outline_colour: AssColor,
    pub back_colour: AssColor,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike_out: bool,
    pub scale_x: f64,
    pub scale_y: f64,
    pub spacing: f64,
    pub angle: f64,
    pub border_style: u8,
    pub outline: f64,
    pub shadow: f64,
    pub alignment: u8,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub encoding: i32,
}

impl StyleDefinition {
    /// Style given to documents converted from sequential captions
    pub fn placeholder_default() -> Self {
        Self {
            name: DEFAULT_STYLE_NAME.to_string(),
            font_name: "Arial".to_string(),
            font_size: 20.0,
            primary_colour: AssColor(0x00FF_FFFF),
            secondary_colour: AssColor(0x0300_FFFF),
            outline_colour: AssColor(0x0000_0000),
            back_colour: AssColor(0x0200_0000),
            bold: false,
            italic: false,
            underline: false,
            strike_out: false,
            scale_x: 100.0,
            scale_y: 100.0,
            spacing: 0.0,
            angle: 0.0,
            border_style: 1,
            outline: 2.0,
            shadow: 1.0,
            alignment: 2,
            margin_l: 10,
            margin_r: 10,
            margin_v: 10,
            encoding: 1,
        }
    }

    /// Parse the value part of a `Style:` line using the section's column order
    fn parse_values(values: &str, columns: &[String]) -> Self {
        let mut style = Self::placeholder_default();
        style.name.clear();

        for (column, value) in columns.iter().zip(values.splitn(columns.len(), ',')) {
            style.set_field(column, value.trim());
        }
        style
    }

    fn set_field(&mut self, column: &str, value: &str) {
        match column {
            "name" => self.name = value.to_string(),
            "fontname" => self.font_name = value.to_string(),
            "fontsize" => parse_into(&mut self.font_size, value, column),
            "primarycolour" => parse_colour(&mut self.primary_colour, value),
            "secondarycolour" => parse_colour(&mut self.secondary_colour, value),
            "outlinecolour" | "tertiarycolour" => parse_colour(&mut self.outline_colour, value),
            "backcolour" => parse_colour(&mut self.back_colour, value),
            "bold" => self.bold = parse_flag(value),
            "italic" => self.italic = parse_flag(value),
            "underline" => self.underline = parse_flag(value),
            "strikeout" => self.strike_out = parse_flag(value),
            "scalex" => parse_into(&mut self.scale_x, value, column),
            "scaley" => parse_into(&mut self.scale_y, value, column),
            "spacing" => parse_into(&mut self.spacing, value, column),
            "angle" => parse_into(&mut self.angle, value, column),
            "borderstyle" => parse_into(&mut self.border_style, value, column),
            "outline" => parse_into(&mut self.outline, value, column),
            "shadow" => parse_into(&mut self.shadow, value, column),
            "alignment" => parse_into(&mut self.alignment, value, column),
            "marginl" => parse_into(&mut self.margin_l, value, column),
            "marginr" => parse_into(&mut self.margin_r, value, column),
            "marginv" => parse_into(&mut self.margin_v, value, column),
            "encoding" => parse_into(&mut self.encoding, value, column),
            _ => debug!("Ignoring style column {}", column),
        }
    }
}

impl fmt::Display for StyleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Style: {},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.name,
            self.font_name,
            format_number(self.font_size),
            self.primary_colour,
            self.secondary_colour,
            self.outline_colour,
            self.back_colour,
            format_flag(self.bold),
            format_flag(self.italic),
            format_flag(self.underline),
            format_flag(self.strike_out),
            format_number(self.scale_x),
            format_number(self.scale_y),
            format_number(self.spacing),
            format_number(self.angle),
            self.border_style,
            format_number(self.outline),
            format_number(self.shadow),
            self.alignment,
            self.margin_l,
            self.margin_r,
            self.margin_v,
            self.encoding,
        )
    }
}

/// Event line type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Dialogue,
    Comment,
}

impl EventKind {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Dialogue => "Dialogue",
            Self::Comment => "Comment",
        }
    }
}

/// One row of the event table
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEvent {
    pub kind: EventKind,
    pub layer: i32,
    pub start: Timestamp,
    pub end: Timestamp,
    pub style: String,
    pub name: String,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub effect: String,
    pub text: String,
}

impl OverlayEvent {
    /// Dialogue on layer 0 with zero margins and no actor name
    pub fn dialogue(start: Timestamp, end: Timestamp, style: &str, effect: &str, text: &str) -> Self {
        Self {
            kind: EventKind::Dialogue,
            layer: 0,
            start,
            end,
            style: style.to_string(),
            name: String::new(),
            margin_l: 0,
            margin_r: 0,
            margin_v: 0,
            effect: effect.to_string(),
            text: text.replace("\r\n", "\\N").replace('\n', "\\N"),
        }
    }

    fn parse_values(kind: EventKind, values: &str, columns: &[String]) -> Result<Self, SubtitleError> {
        let mut event = Self::dialogue(Timestamp::default(), Timestamp::default(), "", "", "");
        event.kind = kind;

        for (column, value) in columns.iter().zip(values.splitn(columns.len(), ',')) {
            match column.as_str() {
                "layer" => parse_into(&mut event.layer, value.trim(), column),
                "start" => event.start = Timestamp::parse(value)?,
                "end" => event.end = Timestamp::parse(value)?,
                "style" => event.style = value.trim().to_string(),
                "name" | "actor" => event.name = value.trim().to_string(),
                "marginl" => parse_into(&mut event.margin_l, value.trim(), column),
                "marginr" => parse_into(&mut event.margin_r, value.trim(), column),
                "marginv" => parse_into(&mut event.margin_v, value.trim(), column),
                "effect" => event.effect = value.trim().to_string(),
                "text" => event.text = value.to_string(),
                _ => debug!("Ignoring event column {}", column),
            }
        }
        Ok(event)
    }
}

impl fmt::Display for OverlayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {},{},{},{},{},{},{},{},{},{}",
            self.kind.prefix(),
            self.layer,
            self.start,
            self.end,
            self.style,
            self.name,
            self.margin_l,
            self.margin_r,
            self.margin_v,
            self.effect,
            self.text,
        )
    }
}

/// A section this crate does not interpret, kept verbatim (`[Fonts]`, `[Graphics]`, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    pub header: String,
    pub lines: Vec<String>,
}

/// Structured style-sheet script.
///
/// A section is `None` when the source text had no such section header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubtitleDocument {
    /// `[Script Info]` key/value pairs in file order
    pub script_info: Option<Vec<(String, String)>>,
    /// `[V4+ Styles]` rows in file order
    pub styles: Option<Vec<StyleDefinition>>,
    /// `[Events]` rows in file order
    pub events: Option<Vec<OverlayEvent>>,
    /// Other sections, rendered after the events
    pub extra_sections: Vec<RawSection>,
}

#[derive(Clone, Copy)]
enum Section {
    None,
    ScriptInfo,
    Styles,
    Events,
    Extra,
}

impl SubtitleDocument {
    /// Load a subtitle file of either format.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::parse_named(&content, &title)
    }

    /// Load subtitle content of either format.
    pub fn parse_str(content: &str) -> Result<Self, SubtitleError> {
        Self::parse_named(content, "")
    }

    /// Load subtitle content, using `title` for documents built from captions.
    pub fn parse_named(content: &str, title: &str) -> Result<Self, SubtitleError> {
        match SubtitleFormat::detect(content).effective() {
            SubtitleFormat::StyleSheet => Ok(Self::parse_style_sheet(content)),
            _ => {
                let entries = parse_srt_string(content)?;
                Ok(Self::from_captions(&entries, title))
            }
        }
    }

    /// Build a minimal style-sheet document from sequential captions.
    pub fn from_captions(entries: &[SubtitleEntry], title: &str) -> Self {
        let events = entries
            .iter()
            .map(|entry| {
                let text = entry.text.lines().collect::<Vec<_>>().join("\\N");
                let text = convert_caption_markup(&text);
                OverlayEvent::dialogue(
                    Timestamp::from_millis(entry.start_time_ms),
                    Timestamp::from_millis(entry.end_time_ms),
                    DEFAULT_STYLE_NAME,
                    "",
                    &text,
                )
            })
            .collect();

        Self {
            script_info: Some(vec![
                ("Title".to_string(), title.to_string()),
                ("ScriptType".to_string(), "v4.00+".to_string()),
                ("WrapStyle".to_string(), "0".to_string()),
                ("ScaledBorderAndShadow".to_string(), "yes".to_string()),
            ]),
            styles: Some(vec![StyleDefinition::placeholder_default()]),
            events: Some(events),
            extra_sections: Vec::new(),
        }
    }

    /// Parse style-sheet text section by section.
    ///
    /// Tolerant by construction: unknown lines are skipped, missing sections
    /// stay `None`, and events with unreadable timestamps are dropped.
    pub fn parse_style_sheet(content: &str) -> Self {
        let content = strip_bom(content);
        let mut doc = Self::default();
        let mut section = Section::None;
        let mut style_columns = default_columns(&STYLE_COLUMNS);
        let mut event_columns = default_columns(&EVENT_COLUMNS);

        for (line_idx, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim_end_matches('\r');
            let trimmed = line.trim();

            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                section = if trimmed.eq_ignore_ascii_case(SCRIPT_INFO_MARKER) {
                    doc.script_info.get_or_insert_with(Vec::new);
                    Section::ScriptInfo
                } else if trimmed.eq_ignore_ascii_case(STYLES_MARKER)
                    || trimmed.eq_ignore_ascii_case("[V4 Styles]")
                {
                    doc.styles.get_or_insert_with(Vec::new);
                    Section::Styles
                } else if trimmed.eq_ignore_ascii_case(EVENTS_MARKER) {
                    doc.events.get_or_insert_with(Vec::new);
                    Section::Events
                } else {
                    doc.extra_sections.push(RawSection {
                        header: trimmed.to_string(),
                        lines: Vec::new(),
                    });
                    Section::Extra
                };
                continue;
            }

            match section {
                Section::None => {}
                Section::Extra => {
                    if let Some(raw) = doc.extra_sections.last_mut() {
                        raw.lines.push(line.to_string());
                    }
                }
                _ if trimmed.is_empty() || trimmed.starts_with(';') => {}
                Section::ScriptInfo => {
                    if let Some((key, value)) = trimmed.split_once(':') {
                        if let Some(info) = doc.script_info.as_mut() {
                            info.push((key.trim().to_string(), value.trim().to_string()));
                        }
                    }
                }
                Section::Styles => {
                    let Some((key, values)) = trimmed.split_once(':') else { continue };
                    match key.trim() {
                        "Format" => style_columns = parse_columns(values),
                        "Style" => {
                            let style = StyleDefinition::parse_values(values, &style_columns);
                            if let Some(styles) = doc.styles.as_mut() {
                                styles.push(style);
                            }
                        }
                        other => debug!("Ignoring style line type {}", other),
                    }
                }
                Section::Events => {
                    let Some((key, values)) = line.split_once(':') else { continue };
                    let kind = match key.trim() {
                        "Format" => {
                            event_columns = parse_columns(values);
                            continue;
                        }
                        "Dialogue" => EventKind::Dialogue,
                        "Comment" => EventKind::Comment,
                        other => {
                            debug!("Ignoring event line type {}", other);
                            continue;
                        }
                    };
                    // A single space follows the colon; anything beyond belongs to the values
                    let values = values.strip_prefix(' ').unwrap_or(values);
                    match OverlayEvent::parse_values(kind, values, &event_columns) {
                        Ok(event) => {
                            if let Some(events) = doc.events.as_mut() {
                                events.push(event);
                            }
                        }
                        Err(e) => warn!("Skipping event at line {}: {}", line_idx + 1, e),
                    }
                }
            }
        }

        for raw in &mut doc.extra_sections {
            while raw.lines.last().is_some_and(|l| l.trim().is_empty()) {
                raw.lines.pop();
            }
        }

        doc
    }

    /// Drop every event whose text is blank, keeping the order of the rest.
    ///
    /// Returns the number of removed events.
    pub fn remove_empty_events(&mut self) -> usize {
        let Some(events) = self.events.as_mut() else { return 0 };
        let before = events.len();
        events.retain(|event| !event.text.trim().is_empty());
        before - events.len()
    }

    /// Consuming form of [`Self::remove_empty_events`]
    pub fn normalized(mut self) -> Self {
        let removed = self.remove_empty_events();
        if removed > 0 {
            debug!("Removed {} empty events", removed);
        }
        self
    }

    /// Serialize to canonical style-sheet text
    pub fn render(&self) -> String {
        let mut blocks: Vec<String> = Vec::new();

        if let Some(info) = &self.script_info {
            let mut lines = vec![SCRIPT_INFO_MARKER.to_string()];
            lines.extend(info.iter().map(|(key, value)| format!("{}: {}", key, value)));
            blocks.push(lines.join("\n"));
        }

        if let Some(styles) = &self.styles {
            let mut lines = vec![STYLES_MARKER.to_string(), STYLE_FORMAT_LINE.to_string()];
            lines.extend(styles.iter().map(|style| style.to_string()));
            blocks.push(lines.join("\n"));
        }

        if let Some(events) = &self.events {
            let mut lines = vec![EVENTS_MARKER.to_string(), EVENT_FORMAT_LINE.to_string()];
            lines.extend(events.iter().map(|event| event.to_string()));
            blocks.push(lines.join("\n"));
        }

        for raw in &self.extra_sections {
            let mut lines = vec![raw.header.clone()];
            lines.extend(raw.lines.iter().cloned());
            blocks.push(lines.join("\n"));
        }

        let mut text = blocks.join("\n\n");
        text.push('\n');
        text
    }

    /// Look up a style by exact name
    pub fn style(&self, name: &str) -> Option<&StyleDefinition> {
        self.styles.as_ref()?.iter().find(|style| style.name == name)
    }

    /// Events in file order (empty when there is no event table)
    pub fn events(&self) -> &[OverlayEvent] {
        self.events.as_deref().unwrap_or(&[])
    }
}

fn default_columns(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

fn parse_columns(values: &str) -> Vec<String> {
    values
        .split(',')
        .map(|column| column.trim().to_lowercase())
        .collect()
}

fn parse_into<T: std::str::FromStr>(target: &mut T, value: &str, column: &str) {
    match value.parse::<T>() {
        Ok(parsed) => *target = parsed,
        Err(_) => debug!("Keeping default for column {}: unreadable value {:?}", column, value),
    }
}

fn parse_colour(target: &mut AssColor, value: &str) {
    if let Some(colour) = AssColor::parse(value) {
        *target = colour;
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "-1" | "1")
}

fn format_flag(value: bool) -> &'static str {
    if value { "-1" } else { "0" }
}

/// Turn caption markup into override tags.
///
/// `<i> <b> <u> <s>` toggle the matching flag, `<font>` colour, face and size
/// become `\c`, `\fn` and `\fs` overrides that `</font>` resets. Any other
/// tag is dropped.
fn convert_caption_markup(text: &str) -> String {
    let mut open_fonts: Vec<String> = Vec::new();

    MARKUP_TAG_REGEX
        .replace_all(text, |caps: &regex::Captures| {
            let closing = !caps[1].is_empty();
            let tag = caps[2].to_ascii_lowercase();
            match tag.as_str() {
                "i" | "b" | "u" | "s" if caps[3].trim().is_empty() => {
                    format!("{{\\{}{}}}", tag, if closing { 0 } else { 1 })
                }
                "font" if closing => open_fonts.pop().unwrap_or_default(),
                "font" => {
                    let (open, reset) = font_overrides(&caps[3]);
                    open_fonts.push(reset);
                    open
                }
                _ => String::new(),
            }
        })
        .into_owned()
}

// @returns: Override block opening the font attributes, and the block resetting them
fn font_overrides(attributes: &str) -> (String, String) {
    let mut open = String::new();
    let mut reset = String::new();

    for caps in FONT_ATTR_REGEX.captures_iter(attributes) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();

        match caps[1].to_ascii_lowercase().as_str() {
            "color" => {
                if let Some(color) = html_color_to_ass(value) {
                    open.push_str(&format!("\\c{}", color));
                    reset.push_str("\\c");
                }
            }
            "face" if !value.is_empty() => {
                open.push_str(&format!("\\fn{}", value));
                reset.push_str("\\fn");
            }
            "size" => {
                if let Ok(size) = value.parse::<u32>() {
                    open.push_str(&format!("\\fs{}", size));
                    reset.push_str("\\fs");
                }
            }
            _ => {}
        }
    }

    let wrap = |tags: String| if tags.is_empty() { tags } else { format!("{{{}}}", tags) };
    (wrap(open), wrap(reset))
}

/// `#RRGGBB`, `#RGB` or a basic colour name to `&HBBGGRR&`
fn html_color_to_ass(value: &str) -> Option<String> {
    let lowered = value.to_ascii_lowercase();
    let hex = NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lowered)
        .map(|(_, hex)| hex.to_string())
        .unwrap_or_else(|| lowered.trim_start_matches('#').to_string());

    let hex = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => hex,
        _ => return None,
    };
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let (rr, rest) = hex.split_at(2);
    let (gg, bb) = rest.split_at(2);
    Some(format!("&H{}{}{}&", bb, gg, rr).to_uppercase())
}

/// Integral values print without a fraction, others in shortest round-trip form
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
