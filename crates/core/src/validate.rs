//! Input checks run before a mutation is computed.
//!
//! These mirror the inline form validation of the editor: a failing check
//! means the store is never touched.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::types::{Background, BackgroundStyle, Element, ElementKind, Position, Size};

/// Hex colours: `#rgb`, `#rrggbb` or `#rrggbbaa`.
static HEX_COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap()
});

/// Smallest width/height an element may have, in percent of the canvas.
pub const MIN_EXTENT: f64 = 1.0;

/// Largest width/height or coordinate, in percent of the canvas.
pub const MAX_EXTENT: f64 = 100.0;

/// Reject empty or whitespace-only presentation names.
pub fn name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation(
            "presentation name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Reject anything that is not a hex colour.
pub fn color(color: &str) -> Result<()> {
    if HEX_COLOR_REGEX.is_match(color.trim()) {
        Ok(())
    } else {
        Err(Error::Validation(format!("invalid colour: {:?}", color)))
    }
}

/// Width and height must lie in [1, 100].
pub fn size(size: &Size) -> Result<()> {
    for (label, value) in [("width", size.width), ("height", size.height)] {
        if !(MIN_EXTENT..=MAX_EXTENT).contains(&value) {
            return Err(Error::Validation(format!(
                "{} must be between {} and {}, got {}",
                label, MIN_EXTENT, MAX_EXTENT, value
            )));
        }
    }
    Ok(())
}

/// Coordinates must lie in [0, 100].
pub fn position(position: &Position) -> Result<()> {
    for (label, value) in [("x", position.x), ("y", position.y)] {
        if !(0.0..=MAX_EXTENT).contains(&value) {
            return Err(Error::Validation(format!(
                "{} must be between 0 and {}, got {}",
                label, MAX_EXTENT, value
            )));
        }
    }
    Ok(())
}

fn font_size(value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "font size must be positive, got {}",
            value
        )))
    }
}

fn source(src: &str) -> Result<()> {
    if src.trim().is_empty() {
        Err(Error::Validation("media source cannot be empty".to_string()))
    } else {
        Ok(())
    }
}

/// Check an element's geometry and type-specific fields.
pub fn element(element: &Element) -> Result<()> {
    size(&element.size)?;
    position(&element.position)?;

    match &element.kind {
        ElementKind::Text(text) => {
            font_size(text.font_size)?;
            color(&text.color)
        }
        ElementKind::Image(image) => source(&image.src),
        ElementKind::Video(video) => source(&video.src),
        ElementKind::Code(code) => font_size(code.font_size),
    }
}

/// Check the fields of a background that its style makes meaningful.
pub fn background(background: &Background) -> Result<()> {
    match background.style {
        BackgroundStyle::Solid => color(&background.color),
        BackgroundStyle::Gradient => {
            if background.gradient.colors.len() < 2 {
                return Err(Error::Validation(
                    "a gradient needs at least two colours".to_string(),
                ));
            }
            background.gradient.colors.iter().try_for_each(|c| color(c))
        }
        BackgroundStyle::Image => match background.image_source() {
            Some(_) => Ok(()),
            None => Err(Error::Validation(
                "an image background needs an image".to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImageContent, TextContent};

    fn element_with(kind: ElementKind) -> Element {
        Element {
            id: "e".to_string(),
            kind,
            position: Position::default(),
            size: Size::default(),
            layer: 0,
        }
    }

    #[test]
    fn test_name() {
        assert!(name("Q1 Review").is_ok());
        assert!(name("").is_err());
        assert!(name("   \t").is_err());
    }

    #[test]
    fn test_color() {
        assert!(color("#FF5733").is_ok());
        assert!(color("#fff").is_ok());
        assert!(color("#11223344").is_ok());
        assert!(color("FF5733").is_err());
        assert!(color("#GG0000").is_err());
        assert!(color("red").is_err());
    }

    #[test]
    fn test_size_bounds() {
        assert!(size(&Size { width: 1.0, height: 100.0 }).is_ok());
        assert!(size(&Size { width: 0.5, height: 10.0 }).is_err());
        assert!(size(&Size { width: 30.0, height: 101.0 }).is_err());
    }

    #[test]
    fn test_position_bounds() {
        assert!(position(&Position { x: 0.0, y: 100.0 }).is_ok());
        assert!(position(&Position { x: -1.0, y: 0.0 }).is_err());
    }

    #[test]
    fn test_element() {
        assert!(element(&element_with(ElementKind::Text(TextContent::default()))).is_ok());

        let bad_color = ElementKind::Text(TextContent {
            color: "blue".to_string(),
            ..TextContent::default()
        });
        assert!(element(&element_with(bad_color)).is_err());

        let no_src = ElementKind::Image(ImageContent::default());
        assert!(element(&element_with(no_src)).is_err());
    }

    #[test]
    fn test_background() {
        assert!(background(&Background::default()).is_ok());
        assert!(background(&Background::solid("nope")).is_err());
        assert!(background(&Background::gradient(
            "to right",
            vec!["#000".to_string(), "#fff".to_string()]
        ))
        .is_ok());
        assert!(background(&Background::gradient("to right", vec!["#000".to_string()])).is_err());
        assert!(background(&Background::image("")).is_err());
        assert!(background(&Background::image("bg.png")).is_ok());
    }
}
