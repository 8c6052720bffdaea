mod api;
mod app;
mod application;
mod config;
mod domain;
mod logging;
mod ui;
mod utils;

use iced::window;

fn main() -> iced::Result {
    logging::init_logging();
    tracing::info!("Starting video downloader {}", env!("CARGO_PKG_VERSION"));

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("Video Link Downloader")
        .window(window::Settings {
            size: iced::Size::new(560.0, 400.0),
            ..Default::default()
        })
        .run()
}
