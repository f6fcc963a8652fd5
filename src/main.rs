mod app;
mod menu;
mod pet;
mod platform;
mod render;

fn main() {
    env_logger::init();
    log::info!("DeskPal starting up");

    if let Err(e) = app::run() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
