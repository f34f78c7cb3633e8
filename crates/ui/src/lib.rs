mod app;
mod renderer;
mod theme;

pub use app::RoadviewApp;
pub use theme::ThemeMode;
