use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Debug,
    Other(String),
}

impl FromStr for Severity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "ERROR" => Self::Error,
            "WARNING" => Self::Warning,
            "INFO" => Self::Info,
            "DEBUG" => Self::Debug,
            _ => Self::Other(s.to_string()),
        })
    }
}

impl Severity {
    pub fn parse(s: &str) -> Self {
        match Self::from_str(s) {
            Ok(sev) => sev,
            Err(never) => match never {},
        }
    }

    pub fn color(&self) -> BadgeColor {
        match self {
            Self::Error => BadgeColor::Red,
            Self::Warning => BadgeColor::Yellow,
            Self::Info => BadgeColor::Blue,
            Self::Debug | Self::Other(_) => BadgeColor::Gray,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("ERROR"),
            Self::Warning => f.write_str("WARNING"),
            Self::Info => f.write_str("INFO"),
            Self::Debug => f.write_str("DEBUG"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Red,
    Yellow,
    Blue,
    Gray,
}

impl BadgeColor {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Red => "badge-red",
            Self::Yellow => "badge-yellow",
            Self::Blue => "badge-blue",
            Self::Gray => "badge-gray",
        }
    }
}

pub fn badge_color(severity: &str) -> BadgeColor {
    Severity::parse(severity).color()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_color_table() {
        assert_eq!(badge_color("ERROR"), BadgeColor::Red);
        assert_eq!(badge_color("WARNING"), BadgeColor::Yellow);
        assert_eq!(badge_color("INFO"), BadgeColor::Blue);
        assert_eq!(badge_color("DEBUG"), BadgeColor::Gray);
        assert_eq!(badge_color("CRITICAL"), BadgeColor::Gray);
        assert_eq!(badge_color(""), BadgeColor::Gray);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(badge_color("error"), BadgeColor::Red);
        assert_eq!(Severity::parse("Warning"), Severity::Warning);
        assert_eq!(Severity::parse("notice").to_string(), "notice");
    }

    #[test]
    fn css_classes() {
        assert_eq!(badge_color("ERROR").css_class(), "badge-red");
        assert_eq!(badge_color("whatever").css_class(), "badge-gray");
    }
}
