pub(crate) mod config;
pub(crate) mod memo;
pub(crate) mod scrape;
pub(crate) mod systems;
