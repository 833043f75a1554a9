#![deny(warnings)]
pub mod knowledge;
pub mod model;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "geoquiz"
    }

    pub const fn tagline() -> &'static str {
        "Think of a country"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "geoquiz");
        assert_eq!(AppInfo::tagline(), "Think of a country");
        assert!(!AppInfo::version().is_empty());
    }
}
