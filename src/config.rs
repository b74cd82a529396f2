use confique::Config as _;
use std::sync::OnceLock;

#[derive(confique::Config)]
pub struct Config {
    /// SQL dialect used to parse query text: `generic`, `postgres`, `mysql` or `sqlite`.
    #[config(env = "QSHAPE_DIALECT", default = "generic")]
    pub dialect: String,
    /// Collapse fully covered tables into `table.*` / `*` after projection edits.
    #[config(env = "QSHAPE_COMPRESS_STARS", default = true)]
    pub compress_stars: bool,
    /// Appended to the value of every LIKE filter.
    #[config(env = "QSHAPE_LIKE_SUFFIX", default = "%")]
    pub like_suffix: String,
}

pub fn config() -> &'static Config {
    static CONFIG: OnceLock<Config> = OnceLock::new();
    CONFIG.get_or_init(|| {
        Config::builder()
            .env()
            .load()
            .expect("Failed to load one or more value configuration from the current environment")
    })
}
