//! Plain-text rendering of presentations for the terminal.

use presto_core::{
    cursor::effective_transition, BackgroundStyle, Background, Element, ElementKind, Presentation,
    Step, Store,
};

/// Longest run of content shown for an element before it is cut off.
const PREVIEW_CHARS: usize = 40;

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    }
}

/// One line per presentation: id, star, name and slide count.
pub fn presentation_list(store: &Store) -> String {
    if store.is_empty() {
        return "No presentations.\n".to_string();
    }

    store
        .presentations
        .iter()
        .map(|p| {
            format!(
                "{}  {} {} ({} slide{})\n",
                p.id,
                if p.favorited { "*" } else { " " },
                p.name,
                p.slides.len(),
                if p.slides.len() == 1 { "" } else { "s" }
            )
        })
        .collect()
}

/// Short description of a background.
pub fn background(background: &Background) -> String {
    match background.style {
        BackgroundStyle::Solid => format!("solid {}", background.color),
        BackgroundStyle::Gradient => format!(
            "gradient {} [{}]",
            background.gradient.direction,
            background.gradient.colors.join(", ")
        ),
        BackgroundStyle::Image => format!(
            "image {}",
            preview(background.image_source().unwrap_or("(none)"))
        ),
    }
}

/// One-line summary of an element.
pub fn element(element: &Element) -> String {
    let detail = match &element.kind {
        ElementKind::Text(text) => format!(
            "\"{}\" {}em {}",
            preview(&text.content),
            text.font_size,
            text.color
        ),
        ElementKind::Image(image) => format!("{} alt=\"{}\"", preview(&image.src), image.alt),
        ElementKind::Video(video) => format!(
            "{}{}",
            preview(&video.src),
            if video.auto_play { " autoplay" } else { "" }
        ),
        ElementKind::Code(code) => format!("[{}] {}", code.language, preview(&code.code)),
    };

    format!(
        "{:<5} {} at ({}%, {}%) size {}%x{}% layer {}  {}",
        element.kind.type_name(),
        element.id,
        element.position.x,
        element.position.y,
        element.size.width,
        element.size.height,
        element.layer,
        detail
    )
}

/// Full outline of a presentation.
pub fn presentation(presentation: &Presentation) -> String {
    let mut out = format!("{} ({})\n", presentation.name, presentation.id);
    if !presentation.description.is_empty() {
        out.push_str(&format!("  {}\n", presentation.description));
    }
    out.push_str(&format!(
        "  background: {}\n  transition: {}\n  favorited: {}\n",
        background(&presentation.default_background),
        presentation.transition_type,
        presentation.favorited
    ));

    for (idx, slide) in presentation.slides.iter().enumerate() {
        out.push_str(&format!(
            "\n  Slide {} ({})  font {}, {}, transition {}\n",
            idx + 1,
            slide.id,
            slide.font_family,
            background(&slide.background),
            effective_transition(presentation, slide)
        ));
        for element in slide.elements_by_layer() {
            out.push_str(&format!("    {}\n", self::element(element)));
        }
    }

    out
}

/// A playback step as shown by `presto play`.
pub fn step(step: &Step<'_>, count: usize) -> String {
    let mut out = format!(
        "--- [{}/{}] transition: {} ---\n",
        step.number, count, step.transition
    );
    if step.slide.elements.is_empty() {
        out.push_str("  (empty slide)\n");
    }
    for element in step.slide.elements_by_layer() {
        out.push_str(&format!("  {}\n", self::element(element)));
    }
    out
}
