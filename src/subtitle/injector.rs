/*!
 * Style and overlay injection.
 *
 * Rewrites the `Default` style from the run settings, adds the `Marquee`
 * and `Logo-Font` styles right after it, and puts the watermark and the two
 * marquee passes in front of every existing event.
 */

use log::{debug, warn};

use crate::app_config::StyleSettings;
use crate::errors::SubtitleError;
use crate::subtitle::document::{
    AssColor, OverlayEvent, StyleDefinition, SubtitleDocument, Timestamp, DEFAULT_STYLE_NAME,
};

/// Style of the scrolling banner
pub const MARQUEE_STYLE_NAME: &str = "Marquee";
/// Style of the watermark caption
pub const LOGO_STYLE_NAME: &str = "Logo-Font";
/// Typeface of the watermark caption
pub const LOGO_FONT_NAME: &str = "Bowlby One SC";
/// Left-to-right banner effect understood by libass
pub const BANNER_EFFECT: &str = "Banner;50;0;50[delay;left to right;fadeawaywidth;]";
/// Watermark placement, in script coordinates
pub const WATERMARK_POSITION_TAG: &str = "{\\pos(343.6,35.733)}";

/// Percentage of the base size used by the marquee
pub const MARQUEE_SIZE_PERCENT: u32 = 60;
/// Percentage of the base size used by the watermark
pub const LOGO_SIZE_PERCENT: u32 = 90;

/// Which parts of the document were rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InjectionOutcome {
    /// The style table existed and now holds the three styles
    pub styles_injected: bool,
    /// The event table existed and now starts with the three overlays
    pub events_injected: bool,
}

/// Injects the run's styles and overlay events into a document
pub struct StyleInjector<'a> {
    settings: &'a StyleSettings,
}

impl<'a> StyleInjector<'a> {
    pub fn new(settings: &'a StyleSettings) -> Self {
        Self { settings }
    }

    /// Dialogue style derived from the settings
    pub fn default_style(&self) -> StyleDefinition {
        StyleDefinition {
            name: DEFAULT_STYLE_NAME.to_string(),
            font_name: self.settings.font_name.clone(),
            font_size: self.settings.font_size as f64,
            primary_colour: AssColor(0x00FF_FFFF),
            secondary_colour: AssColor(0x0000_0000),
            outline_colour: AssColor(0x0000_0000),
            back_colour: AssColor(0x0000_0000),
            bold: true,
            italic: false,
            underline: false,
            strike_out: false,
            scale_x: 100.0,
            scale_y: 100.0,
            spacing: 0.0,
            angle: 0.0,
            border_style: 1,
            outline: self.settings.font_outline,
            shadow: 0.0,
            alignment: 2,
            margin_l: 10,
            margin_r: 10,
            margin_v: 10,
            encoding: 1,
        }
    }

    /// Banner style: opaque box, top-center
    pub fn marquee_style(&self) -> StyleDefinition {
        StyleDefinition {
            name: MARQUEE_STYLE_NAME.to_string(),
            font_name: self.settings.font_name.clone(),
            font_size: scaled_size(self.settings.font_size, MARQUEE_SIZE_PERCENT) as f64,
            primary_colour: AssColor(0x00FF_FFFF),
            secondary_colour: AssColor(0x0000_00FF),
            outline_colour: AssColor(0x00FF_C900),
            back_colour: AssColor(0x0000_0000),
            bold: true,
            italic: false,
            underline: false,
            strike_out: false,
            scale_x: 100.0,
            scale_y: 100.0,
            spacing: 0.0,
            angle: 0.0,
            border_style: 3,
            outline: 1.5,
            shadow: 0.0,
            alignment: 8,
            margin_l: 10,
            margin_r: 10,
            margin_v: 4,
            encoding: 1,
        }
    }

    /// Watermark style
    pub fn logo_style(&self) -> StyleDefinition {
        StyleDefinition {
            name: LOGO_STYLE_NAME.to_string(),
            font_name: LOGO_FONT_NAME.to_string(),
            font_size: scaled_size(self.settings.font_size, LOGO_SIZE_PERCENT) as f64,
            primary_colour: AssColor(0x00FF_FFFF),
            secondary_colour: AssColor(0x0000_00FF),
            outline_colour: AssColor(0x0000_0000),
            back_colour: AssColor(0x0000_0000),
            bold: false,
            italic: false,
            underline: false,
            strike_out: false,
            scale_x: 100.0,
            scale_y: 100.0,
            spacing: 0.75,
            angle: 0.0,
            border_style: 1,
            outline: 0.5,
            shadow: 0.2,
            alignment: 2,
            margin_l: 10,
            margin_r: 10,
            margin_v: 10,
            encoding: 1,
        }
    }

    /// Watermark for the whole runtime, then the marquee at minute 0 and minute 11
    pub fn overlay_events(&self, watermark_label: &str, marquee_text: &str) -> [OverlayEvent; 3] {
        let zero = Timestamp::default();
        [
            OverlayEvent::dialogue(
                zero,
                Timestamp::from_hmsc(5, 0, 0, 0),
                LOGO_STYLE_NAME,
                "",
                &format!("{}{}", WATERMARK_POSITION_TAG, watermark_label.to_uppercase()),
            ),
            OverlayEvent::dialogue(
                zero,
                Timestamp::from_hmsc(0, 1, 0, 0),
                MARQUEE_STYLE_NAME,
                BANNER_EFFECT,
                marquee_text,
            ),
            OverlayEvent::dialogue(
                Timestamp::from_hmsc(0, 11, 0, 0),
                Timestamp::from_hmsc(0, 12, 0, 0),
                MARQUEE_STYLE_NAME,
                BANNER_EFFECT,
                marquee_text,
            ),
        ]
    }

    /// Rewrite the style and event tables in place.
    ///
    /// A missing table is left alone and reported through the outcome.
    pub fn inject(
        &self,
        doc: &mut SubtitleDocument,
        watermark_label: &str,
        marquee_text: &str,
    ) -> InjectionOutcome {
        let mut outcome = InjectionOutcome::default();

        match doc.styles.as_mut() {
            Some(styles) => {
                let existing = std::mem::take(styles);
                *styles = self.rebuild_style_table(existing);
                outcome.styles_injected = true;
            }
            None => warn!("{}", SubtitleError::AnchorNotFound("style table".to_string())),
        }

        match doc.events.as_mut() {
            Some(events) => {
                let existing = std::mem::take(events);
                events.extend(self.overlay_events(watermark_label, marquee_text));
                events.extend(existing);
                outcome.events_injected = true;
            }
            None => warn!("{}", SubtitleError::AnchorNotFound("event table".to_string())),
        }

        outcome
    }

    /// Parse, inject and render style-sheet text.
    ///
    /// Text without either table comes back unchanged.
    pub fn inject_text(&self, text: &str, watermark_label: &str, marquee_text: &str) -> String {
        let mut doc = SubtitleDocument::parse_style_sheet(text);
        let outcome = self.inject(&mut doc, watermark_label, marquee_text);

        if !outcome.styles_injected && !outcome.events_injected {
            return text.to_string();
        }
        doc.render()
    }

    fn rebuild_style_table(&self, existing: Vec<StyleDefinition>) -> Vec<StyleDefinition> {
        let mut rebuilt = Vec::with_capacity(existing.len() + 2);
        let mut placed = false;

        for style in existing {
            match style.name.as_str() {
                DEFAULT_STYLE_NAME if !placed => {
                    rebuilt.push(self.default_style());
                    rebuilt.push(self.marquee_style());
                    rebuilt.push(self.logo_style());
                    placed = true;
                }
                DEFAULT_STYLE_NAME | MARQUEE_STYLE_NAME | LOGO_STYLE_NAME => {
                    debug!("Dropping duplicate style {}", style.name);
                }
                _ => rebuilt.push(style),
            }
        }

        if !placed {
            debug!("No Default style present, adding it at the top of the table");
            let custom = std::mem::take(&mut rebuilt);
            rebuilt.extend([self.default_style(), self.marquee_style(), self.logo_style()]);
            rebuilt.extend(custom);
        }

        rebuilt
    }
}

/// Integer percentage of a font size, rounded down
pub fn scaled_size(base: u32, percent: u32) -> u32 {
    base * percent / 100
}
