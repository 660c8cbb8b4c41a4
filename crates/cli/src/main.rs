//! CLI tool for editing Presto presentations.

mod render;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use presto_core::{
    Background, Backend, CodeContent, Element, ElementKind, FileBackend, ImageContent, Playback,
    Position, Presentation, PresentationStore, Size, Store, TextContent, TransitionType,
    VideoContent,
};
use presto_http::{ApiConfig, AuthClient, HttpBackend};
use std::path::PathBuf;
use std::time::Duration;

/// Edit Presto presentations stored in a local file or on the Presto API.
#[derive(Parser, Debug)]
#[command(name = "presto")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Local store file (used when no API URL is given)
    #[arg(short, long, env = "PRESTO_FILE", default_value = "presto.json")]
    file: PathBuf,

    /// Base URL of the Presto API
    #[arg(long, env = "PRESTO_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the Presto API
    #[arg(long, env = "PRESTO_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Where an element sits on its slide, in percent of the canvas.
#[derive(ClapArgs, Debug, Clone)]
struct Geometry {
    #[arg(long, default_value_t = 0.0)]
    x: f64,
    #[arg(long, default_value_t = 0.0)]
    y: f64,
    #[arg(long, default_value_t = 30.0)]
    width: f64,
    #[arg(long, default_value_t = 10.0)]
    height: f64,
}

impl Geometry {
    fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }

    fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }
}

/// A background given on the command line. At most one style may be set.
#[derive(ClapArgs, Debug, Clone)]
struct BackgroundArgs {
    /// Solid colour, e.g. #202020
    #[arg(long, conflicts_with_all = ["gradient", "image"])]
    color: Option<String>,

    /// Gradient colour stops, e.g. --gradient '#000' '#fff'
    #[arg(long, num_args = 1.., conflicts_with = "image")]
    gradient: Vec<String>,

    /// Gradient direction
    #[arg(long, default_value = "to right")]
    direction: String,

    /// Image URL or data URL
    #[arg(long)]
    image: Option<String>,
}

impl BackgroundArgs {
    fn to_background(&self) -> Option<Background> {
        if let Some(color) = &self.color {
            Some(Background::solid(color.clone()))
        } else if !self.gradient.is_empty() {
            Some(Background::gradient(
                self.direction.clone(),
                self.gradient.clone(),
            ))
        } else {
            self.image.as_ref().map(|image| Background::image(image.clone()))
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List presentations
    List,

    /// Show a presentation's slides and elements
    Show {
        presentation: String,
        /// Print the raw JSON instead of an outline
        #[arg(long)]
        json: bool,
    },

    /// Create a presentation with one blank slide
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Delete a presentation
    Delete { presentation: String },

    /// Rename a presentation
    Rename { presentation: String, name: String },

    /// Toggle a presentation's favorite flag
    Favorite { presentation: String },

    /// Set a presentation's thumbnail image
    Thumbnail { presentation: String, src: String },

    /// Append a blank slide
    AddSlide { presentation: String },

    /// Delete a slide (by 1-based number or id)
    DeleteSlide { presentation: String, slide: String },

    /// Move a slide from one 1-based position to another
    MoveSlide {
        presentation: String,
        from: usize,
        to: usize,
    },

    /// Change a slide's font, transition or background
    StyleSlide {
        presentation: String,
        slide: String,
        #[arg(long)]
        font: Option<String>,
        #[arg(long)]
        transition: Option<TransitionType>,
        #[command(flatten)]
        background: BackgroundArgs,
    },

    /// Add a text box to a slide
    AddText {
        presentation: String,
        slide: String,
        content: String,
        /// Font size in em
        #[arg(long, default_value_t = 1.0)]
        font_size: f64,
        #[arg(long, default_value = "#000000")]
        color: String,
        #[command(flatten)]
        geometry: Geometry,
    },

    /// Add an image to a slide
    AddImage {
        presentation: String,
        slide: String,
        src: String,
        #[arg(long, default_value = "")]
        alt: String,
        #[command(flatten)]
        geometry: Geometry,
    },

    /// Add a video to a slide
    AddVideo {
        presentation: String,
        slide: String,
        src: String,
        #[arg(long)]
        autoplay: bool,
        #[command(flatten)]
        geometry: Geometry,
    },

    /// Add a code block to a slide, read from a file
    AddCode {
        presentation: String,
        slide: String,
        path: PathBuf,
        #[arg(long, default_value = "plaintext")]
        language: String,
        #[arg(long, default_value_t = 1.0)]
        font_size: f64,
        #[command(flatten)]
        geometry: Geometry,
    },

    /// Move or resize an element
    MoveElement {
        presentation: String,
        slide: String,
        element: String,
        #[arg(long)]
        x: Option<f64>,
        #[arg(long)]
        y: Option<f64>,
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
    },

    /// Delete an element
    DeleteElement {
        presentation: String,
        slide: String,
        element: String,
    },

    /// Set a presentation's default background
    Background {
        presentation: String,
        #[command(flatten)]
        background: BackgroundArgs,
    },

    /// Set a presentation's transition (none, fade, slideLeft, slideRight)
    Transition {
        presentation: String,
        transition: TransitionType,
    },

    /// Play a presentation slide by slide
    Play {
        presentation: String,
        /// 1-based slide to start from (same as the editor's ?slide= parameter)
        #[arg(long)]
        slide: Option<String>,
    },

    /// Create an API account and print its token
    Register {
        email: String,
        password: String,
        name: String,
    },

    /// Log in to the API and print the token
    Login { email: String, password: String },

    /// Invalidate the API token
    Logout,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    run(&args)
}

fn api_config(args: &Args) -> Result<ApiConfig> {
    let url = args
        .api_url
        .as_ref()
        .context("--api-url (or PRESTO_API_URL) is required for this command")?;

    let mut config =
        ApiConfig::new(url.clone()).with_timeout(Duration::from_secs(args.timeout_secs));
    if let Some(token) = &args.token {
        config = config.with_token(token.clone());
    }
    Ok(config)
}

fn open_backend(args: &Args) -> Result<Box<dyn Backend>> {
    if args.api_url.is_some() {
        let config = api_config(args)?;
        log::debug!("Using API at {}", config.base_url);
        Ok(Box::new(HttpBackend::new(config)?))
    } else {
        log::debug!("Using store file {}", args.file.display());
        Ok(Box::new(FileBackend::new(&args.file)))
    }
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Register {
            email,
            password,
            name,
        } => {
            let token = AuthClient::new(api_config(args)?)?.register(email, password, name)?;
            println!("{}", token);
            return Ok(());
        }
        Command::Login { email, password } => {
            let token = AuthClient::new(api_config(args)?)?.login(email, password)?;
            println!("{}", token);
            return Ok(());
        }
        Command::Logout => {
            AuthClient::new(api_config(args)?)?.logout()?;
            return Ok(());
        }
        _ => {}
    }

    let mut store = PresentationStore::new(open_backend(args)?);
    store.load().context("Failed to load presentations")?;

    execute(&mut store, &args.command)
}

/// Find a presentation by id, falling back to an exact name match.
fn resolve_presentation<'a>(store: &'a Store, key: &str) -> Result<&'a Presentation> {
    store
        .presentation(key)
        .or_else(|| store.presentations.iter().find(|p| p.name == key))
        .with_context(|| format!("No presentation with id or name {:?}", key))
}

/// Find a slide by 1-based number or id.
fn resolve_slide(presentation: &Presentation, key: &str) -> Result<String> {
    if let Ok(number) = key.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|idx| presentation.slides.get(idx))
            .map(|s| s.id.clone())
            .with_context(|| {
                format!(
                    "Slide {} out of range (presentation has {})",
                    number,
                    presentation.slides.len()
                )
            });
    }

    presentation
        .slide(key)
        .map(|s| s.id.clone())
        .with_context(|| format!("No slide {:?}", key))
}

/// Resolve a presentation and one of its slides to their ids.
fn resolve_target(store: &Store, presentation: &str, slide: &str) -> Result<(String, String)> {
    let deck = resolve_presentation(store, presentation)?;
    Ok((deck.id.clone(), resolve_slide(deck, slide)?))
}

fn placed(kind: ElementKind, geometry: &Geometry) -> Element {
    let mut element = presto_core::mutation::new_element(kind);
    element.position = geometry.position();
    element.size = geometry.size();
    element
}

fn execute<B: Backend>(store: &mut PresentationStore<B>, command: &Command) -> Result<()> {
    let snapshot = store.snapshot();

    match command {
        Command::List => print!("{}", render::presentation_list(&snapshot)),

        Command::Show { presentation, json } => {
            let deck = resolve_presentation(&snapshot, presentation)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(deck)?);
            } else {
                print!("{}", render::presentation(deck));
            }
        }

        Command::Create { name, description } => {
            let id = store.create_presentation(name, description)?;
            println!("{}", id);
        }

        Command::Delete { presentation } => {
            let id = resolve_presentation(&snapshot, presentation)?.id.clone();
            store.delete_presentation(&id)?;
        }

        Command::Rename { presentation, name } => {
            let id = resolve_presentation(&snapshot, presentation)?.id.clone();
            store.rename_presentation(&id, name)?;
        }

        Command::Favorite { presentation } => {
            let id = resolve_presentation(&snapshot, presentation)?.id.clone();
            let favorited = store.toggle_favorite(&id)?;
            println!("{}", if favorited { "favorited" } else { "unfavorited" });
        }

        Command::Thumbnail { presentation, src } => {
            let mut deck = resolve_presentation(&snapshot, presentation)?.clone();
            deck.thumbnail = src.clone();
            store.update_presentation(deck)?;
        }

        Command::AddSlide { presentation } => {
            let id = resolve_presentation(&snapshot, presentation)?.id.clone();
            match store.add_slide(&id)? {
                Some(slide_id) => println!("{}", slide_id),
                None => bail!("Presentation {} disappeared before the slide was added", id),
            }
        }

        Command::DeleteSlide {
            presentation,
            slide,
        } => {
            let (id, slide_id) = resolve_target(&snapshot, presentation, slide)?;
            store.delete_slide(&id, &slide_id)?;
        }

        Command::MoveSlide {
            presentation,
            from,
            to,
        } => {
            let id = resolve_presentation(&snapshot, presentation)?.id.clone();
            if *from == 0 || *to == 0 {
                bail!("Slide numbers start at 1");
            }
            store.move_slide(&id, from - 1, to - 1)?;
        }

        Command::StyleSlide {
            presentation,
            slide,
            font,
            transition,
            background,
        } => {
            let deck = resolve_presentation(&snapshot, presentation)?;
            let slide_id = resolve_slide(deck, slide)?;
            let mut updated = deck
                .slide(&slide_id)
                .cloned()
                .with_context(|| format!("No slide {:?}", slide))?;

            if let Some(font) = font {
                updated.font_family = font.clone();
            }
            if let Some(transition) = transition {
                updated.transition_type = *transition;
            }
            if let Some(background) = background.to_background() {
                updated.background = background;
            }
            store.update_slide(&deck.id, updated)?;
        }

        Command::AddText {
            presentation,
            slide,
            content,
            font_size,
            color,
            geometry,
        } => {
            let (id, slide_id) = resolve_target(&snapshot, presentation, slide)?;
            let kind = ElementKind::Text(TextContent {
                content: content.clone(),
                font_size: *font_size,
                color: color.clone(),
            });
            println!("{}", store.insert_element(&id, &slide_id, placed(kind, geometry))?);
        }

        Command::AddImage {
            presentation,
            slide,
            src,
            alt,
            geometry,
        } => {
            let (id, slide_id) = resolve_target(&snapshot, presentation, slide)?;
            let kind = ElementKind::Image(ImageContent {
                src: src.clone(),
                alt: alt.clone(),
            });
            println!("{}", store.insert_element(&id, &slide_id, placed(kind, geometry))?);
        }

        Command::AddVideo {
            presentation,
            slide,
            src,
            autoplay,
            geometry,
        } => {
            let (id, slide_id) = resolve_target(&snapshot, presentation, slide)?;
            let kind = ElementKind::Video(VideoContent {
                src: src.clone(),
                auto_play: *autoplay,
            });
            println!("{}", store.insert_element(&id, &slide_id, placed(kind, geometry))?);
        }

        Command::AddCode {
            presentation,
            slide,
            path,
            language,
            font_size,
            geometry,
        } => {
            let (id, slide_id) = resolve_target(&snapshot, presentation, slide)?;
            let code = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let kind = ElementKind::Code(CodeContent {
                code,
                language: language.clone(),
                font_size: *font_size,
            });
            println!("{}", store.insert_element(&id, &slide_id, placed(kind, geometry))?);
        }

        Command::MoveElement {
            presentation,
            slide,
            element,
            x,
            y,
            width,
            height,
        } => {
            let deck = resolve_presentation(&snapshot, presentation)?;
            let slide_id = resolve_slide(deck, slide)?;
            let mut updated = deck
                .slide(&slide_id)
                .and_then(|s| s.element(element))
                .cloned()
                .with_context(|| format!("No element {:?} on slide {}", element, slide))?;

            updated.position.x = x.unwrap_or(updated.position.x);
            updated.position.y = y.unwrap_or(updated.position.y);
            updated.size.width = width.unwrap_or(updated.size.width);
            updated.size.height = height.unwrap_or(updated.size.height);
            store.update_element(&deck.id, &slide_id, updated)?;
        }

        Command::DeleteElement {
            presentation,
            slide,
            element,
        } => {
            let (id, slide_id) = resolve_target(&snapshot, presentation, slide)?;
            store.delete_element(&id, &slide_id, element)?;
        }

        Command::Background {
            presentation,
            background,
        } => {
            let id = resolve_presentation(&snapshot, presentation)?.id.clone();
            let background = background
                .to_background()
                .context("Give one of --color, --gradient or --image")?;
            store.update_default_background(&id, background)?;
        }

        Command::Transition {
            presentation,
            transition,
        } => {
            let id = resolve_presentation(&snapshot, presentation)?.id.clone();
            store.update_transition_type(&id, *transition)?;
        }

        Command::Play {
            presentation,
            slide,
        } => {
            let deck = resolve_presentation(&snapshot, presentation)?;
            let playback = Playback::starting_at(deck, slide.as_deref());
            for step in playback.remaining() {
                print!("{}", render::step(&step, deck.slides.len()));
            }
        }

        Command::Register { .. } | Command::Login { .. } | Command::Logout => {
            bail!("Account commands do not operate on the store")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use presto_core::MemoryBackend;

    fn loaded() -> PresentationStore<MemoryBackend> {
        let mut store = PresentationStore::new(MemoryBackend::new());
        store.load().unwrap();
        store
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_transition_argument() {
        let args = Args::try_parse_from(["presto", "transition", "Deck", "slideLeft"]).unwrap();
        match args.command {
            Command::Transition { transition, .. } => {
                assert_eq!(transition, TransitionType::SlideLeft)
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_background_args_pick_one_style() {
        let args =
            Args::try_parse_from(["presto", "background", "Deck", "--gradient", "#000", "#fff"])
                .unwrap();
        match args.command {
            Command::Background { background, .. } => {
                let bg = background.to_background().unwrap();
                assert_eq!(bg.gradient.colors, vec!["#000", "#fff"]);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Args::try_parse_from([
            "presto",
            "background",
            "Deck",
            "--color",
            "#000",
            "--image",
            "a.png"
        ])
        .is_err());
    }

    #[test]
    fn test_resolve_by_name_and_number() {
        let mut store = loaded();
        let id = store.create_presentation("Q1 Review", "").unwrap();
        let second = store.add_slide(&id).unwrap().unwrap();
        let snapshot = store.snapshot();

        let deck = resolve_presentation(&snapshot, "Q1 Review").unwrap();
        assert_eq!(deck.id, id);
        assert_eq!(resolve_slide(deck, "2").unwrap(), second);
        assert_eq!(resolve_slide(deck, &second).unwrap(), second);
        assert!(resolve_slide(deck, "0").is_err());
        assert!(resolve_slide(deck, "3").is_err());
        assert!(resolve_presentation(&snapshot, "Missing").is_err());
    }

    #[test]
    fn test_execute_add_text_and_move() {
        let mut store = loaded();
        let id = store.create_presentation("Deck", "").unwrap();

        let add = Args::try_parse_from([
            "presto", "add-text", "Deck", "1", "Hello", "--font-size", "2", "--color", "#FF5733",
            "--x", "10",
        ])
        .unwrap();
        execute(&mut store, &add.command).unwrap();

        let snapshot = store.snapshot();
        let element = snapshot.presentation(&id).unwrap().slides[0].elements[0].clone();
        assert_eq!(element.position, Position { x: 10.0, y: 0.0 });
        assert_eq!(element.size, Size::default());

        let move_cmd = Args::try_parse_from([
            "presto",
            "move-element",
            "Deck",
            "1",
            element.id.as_str(),
            "--width",
            "50",
        ])
        .unwrap();
        execute(&mut store, &move_cmd.command).unwrap();

        let snapshot = store.snapshot();
        let moved = &snapshot.presentation(&id).unwrap().slides[0].elements[0];
        assert_eq!(moved.size.width, 50.0);
        assert_eq!(moved.position.x, 10.0);
    }

    #[test]
    fn test_execute_rejects_last_slide_delete() {
        let mut store = loaded();
        store.create_presentation("Deck", "").unwrap();

        let delete = Args::try_parse_from(["presto", "delete-slide", "Deck", "1"]).unwrap();
        let err = execute(&mut store, &delete.command).unwrap_err();
        assert!(err.to_string().contains("delete the presentation instead"));
    }

    #[test]
    fn test_file_backed_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = PresentationStore::new(FileBackend::new(&path));
        store.load().unwrap();
        store.create_presentation("Deck", "").unwrap();

        let mut reopened = PresentationStore::new(FileBackend::new(&path));
        reopened.load().unwrap();
        assert_eq!(reopened.snapshot().len(), 1);
    }
}
