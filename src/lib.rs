pub mod ops;

mod app;
pub mod commands;
pub mod config;

// Public surface: the checkout App plus its resolved Config
pub use app::App;
pub use config::Config;

// Unit tests assert on plain text, so strip colors up front
#[cfg(test)]
#[ctor::ctor]
fn init_tests() {
    colored::control::set_override(false);
}
