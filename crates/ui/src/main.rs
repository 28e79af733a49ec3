mod app;
mod bridge;
mod widgets;

use app::AppState;

fn main() -> iced::Result {
    init_tracing();

    iced::application("Video Caption Editor", AppState::update, AppState::view)
        .subscription(AppState::subscription)
        .window_size((1200.0, 760.0))
        .run_with(AppState::boot)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
