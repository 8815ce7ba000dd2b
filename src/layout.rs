//! Page layout configuration for rendered screenplays.
//!
//! Layout is passed explicitly into every render; nothing in the rendered
//! output caches it, so a density change means either a re-render or a
//! class swap on the existing root container.

use std::fmt;

/// Physical page size the preview imitates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    UsLetter,
    A4,
}

impl PageSize {
    /// Class token used on the root pages container.
    pub const fn class_token(self) -> &'static str {
        match self {
            Self::UsLetter => "us-letter",
            Self::A4 => "a4",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "us-letter" | "letter" => Some(Self::UsLetter),
            "a4" => Some(Self::A4),
            _ => None,
        }
    }
}

/// Render density (scale) of the preview, expressed in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Density {
    /// 72 dpi, the documented default.
    #[default]
    Dpi72,
    /// 100 dpi ("larger").
    Dpi100,
    /// 150 dpi ("largest").
    Dpi150,
}

impl Density {
    pub const ALL: [Self; 3] = [Self::Dpi72, Self::Dpi100, Self::Dpi150];

    pub const fn dpi(self) -> u16 {
        match self {
            Self::Dpi72 => 72,
            Self::Dpi100 => 100,
            Self::Dpi150 => 150,
        }
    }

    /// Human label shown next to the setting.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dpi72 => "Default",
            Self::Dpi100 => "Larger",
            Self::Dpi150 => "Largest",
        }
    }

    /// Strict parse of a setting value (`"72"`, `"100"`, `"150"`, optionally
    /// prefixed with `dpi`).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let digits = value.strip_prefix("dpi").unwrap_or(value);
        match digits {
            "72" => Some(Self::Dpi72),
            "100" => Some(Self::Dpi100),
            "150" => Some(Self::Dpi150),
            _ => None,
        }
    }

    /// Lenient parse for user settings: unknown values fall back to the
    /// default instead of failing.
    pub fn from_setting(value: &str) -> Self {
        Self::parse(value).unwrap_or_else(|| {
            tracing::warn!(value, "unrecognized render density, using default 72");
            Self::default()
        })
    }

    /// Class token used on the root pages container, e.g. `dpi72`.
    pub fn class_token(self) -> String {
        format!("dpi{}", self.dpi())
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dpi())
    }
}

/// Layout applied to a render: page size and density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutConfig {
    pub page_size: PageSize,
    pub density: Density,
}

impl LayoutConfig {
    pub const fn new(page_size: PageSize, density: Density) -> Self {
        Self { page_size, density }
    }

    #[must_use]
    pub const fn with_density(mut self, density: Density) -> Self {
        self.density = density;
        self
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Classes for the root pages container, in order.
    pub fn root_classes(&self) -> Vec<String> {
        vec![
            self.page_size.class_token().to_string(),
            self.density.class_token(),
        ]
    }
}
