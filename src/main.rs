// main.rs — command line, logging, window and event loop for the room panorama viewer

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use winit::{
    dpi::LogicalSize,
    event::Event,
    event_loop::EventLoop,
    window::WindowBuilder,
};

use room_panorama::app::{image_entry, App};
use room_panorama::renderer::Renderer;
use room_panorama::room::Room;
use room_panorama::source::{BaseUrlResolver, DefaultFetcher};
use room_panorama::ViewerConfig;

#[derive(Parser)]
#[command(name = "room-panorama")]
#[command(about = "360° viewer for a room's panorama images")]
struct Cli {
    /// Room record (JSON) whose panoramas are shown.
    room: Option<PathBuf>,
    /// Fetch the room record from this URL instead.
    #[arg(long, conflicts_with = "room")]
    room_url: Option<String>,
    /// Local panorama image, optionally tagged as PATH#TAG. Repeatable.
    #[arg(long = "image", value_name = "PATH[#TAG]")]
    images: Vec<String>,
    /// Viewer settings (JSON).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Server that relative panorama paths are resolved against.
    #[arg(long)]
    base_url: Option<String>,
    /// UI language (ko, en).
    #[arg(long)]
    lang: Option<String>,
    #[arg(long, default_value_t = 1280)]
    width: u32,
    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn load_config(cli: &Cli) -> Result<ViewerConfig> {
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    room_panorama::i18n::init(room_panorama::i18n::resolve_lang(
        cli.lang.as_deref(),
        &config.lang,
    ));

    let room = match (&cli.room, &cli.room_url) {
        (Some(path), _) => Some(Room::load(path)?),
        (None, Some(url)) => Some(Room::fetch(url, config.load_timeout())?),
        (None, None) => None,
    };

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(room_panorama::i18n::tr("app.title"))
            .with_inner_size(LogicalSize::new(cli.width, cli.height))
            .build(&event_loop)
            .context("failed to create window")?,
    );

    let renderer = pollster::block_on(Renderer::new(Arc::clone(&window)))?;
    let resolver = Arc::new(BaseUrlResolver::from_config(&config));
    let fetcher = Arc::new(DefaultFetcher::from_config(&config));
    let mut app = App::new(Arc::clone(&window), renderer, config, resolver, fetcher);

    match room {
        Some(room) => app.open_room(&room),
        None => {
            let entries = cli.images.iter().map(|arg| image_entry(arg)).collect();
            app.open_entries(entries, None);
        }
    }

    event_loop.run(move |event, _, control_flow| match event {
        Event::WindowEvent { event, .. } => app.handle_window_event(&event, control_flow),
        Event::RedrawRequested(_) => app.redraw(control_flow),
        Event::MainEventsCleared => app.request_redraw(),
        _ => {}
    });
}
