//! Presentation-layer utilities for server-rendered pages.
//! The loader configuration builder is the stateful core; everything else
//! is a small formatter or renderer around it.

pub mod assets;
pub mod config;
pub mod date;
pub mod html;
pub mod locale;
pub mod logging;
pub mod price;
pub mod text;
pub mod thumbnail;

pub use assets::module_name::parameter_name;
pub use assets::require_config::{
    ModuleEntry, PackageEntry, PackageListShape, RequireConfigBuilder, Shim,
};
pub use config::{AppConfig, ConfigError};
pub use date::{
    move_date, parse_date, parse_offset, parse_zone, DateError, DateFormatter, DateResult, Zone,
};
pub use html::{HtmlError, HtmlRenderer, HtmlResult, SortRequest, StateOptions};
pub use locale::{LocaleConv, LocaleError, LocaleFormatter};
pub use logging::{default_log_level, init_logging, logging_status};
pub use price::{PriceConfig, PriceRounder, RoundMode};
pub use text::{CatalogTranslator, TextError, TranslateOptions, Translator};
pub use thumbnail::{
    ImageFilter, ThumbnailError, ThumbnailGenerator, ThumbnailResult, ThumbnailSpec,
};

/// Returns the crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
