use gemini::config::Config;

/// Loads `.env`, installs the log subscriber and reads the configuration.
pub fn init() -> Config {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    tracing_subscriber::fmt::init();

    Config::from_env().expect("GEMINI_API_KEY not set")
}
