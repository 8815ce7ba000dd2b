use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::layout::{Density, LayoutConfig, PageSize};
use crate::view::{DEFAULT_SAVE_DELAY_MS, ViewOptions};

const APP_DIR: &str = "fountain-view";
const LOCAL_RC: &str = ".fountainrc";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub perf: bool,
    pub density: Option<Density>,
    pub page_size: Option<PageSize>,
    /// Command line of the external screenplay parser.
    pub parser: Option<String>,
    pub save_delay_ms: Option<u64>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            perf: self.perf || other.perf,
            density: other.density.or(self.density),
            page_size: other.page_size.or(self.page_size),
            parser: other.parser.clone().or_else(|| self.parser.clone()),
            save_delay_ms: other.save_delay_ms.or(self.save_delay_ms),
        }
    }

    pub fn layout(&self) -> LayoutConfig {
        LayoutConfig::new(
            self.page_size.unwrap_or_default(),
            self.density.unwrap_or_default(),
        )
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            layout: self.layout(),
            save_delay_ms: self.save_delay_ms.unwrap_or(DEFAULT_SAVE_DELAY_MS),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR).join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR)
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR).join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR).join("config");
        }
    }

    PathBuf::from(LOCAL_RC)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_RC)
}

/// Global flags unioned with the local override.
///
/// # Errors
/// Returns an error if either file exists but cannot be read.
pub fn load_layered_flags() -> Result<ConfigFlags> {
    let global = load_config_flags(&global_config_path())?;
    let local = load_config_flags(&local_override_path())?;
    Ok(global.union(&local))
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(line_tokens)
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// The parser command line keeps its spaces; every other line splits on
/// whitespace.
fn line_tokens(line: &str) -> Vec<String> {
    if let Some(rest) = line.strip_prefix("--parser ") {
        return vec!["--parser".to_string(), rest.trim().to_string()];
    }
    line.split_whitespace().map(ToOwned::to_owned).collect()
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# fountain-view defaults (saved with --save)".to_string());
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(density) = flags.density {
        lines.push(format!("--density {density}"));
    }
    if let Some(page_size) = flags.page_size {
        lines.push(format!("--page-size {}", page_size.class_token()));
    }
    if let Some(parser) = &flags.parser {
        lines.push(format!("--parser {parser}"));
    }
    if let Some(delay) = flags.save_delay_ms {
        lines.push(format!("--save-delay {delay}"));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        match name {
            "--watch" => flags.watch = true,
            "--perf" => flags.perf = true,
            "--density" | "--page-size" | "--parser" | "--save-delay" => {
                let value = match inline_value {
                    Some(value) => Some(value),
                    None => {
                        let next = tokens.get(i + 1).map(String::as_str);
                        if next.is_some() {
                            i += 1;
                        }
                        next
                    }
                };
                if let Some(value) = value {
                    apply_value(&mut flags, name, value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--density" => flags.density = Some(Density::from_setting(value)),
        "--page-size" => match PageSize::parse(value) {
            Some(page_size) => flags.page_size = Some(page_size),
            None => tracing::warn!(value, "unrecognized page size, ignoring"),
        },
        "--parser" => {
            let value = value.trim();
            if !value.is_empty() {
                flags.parser = Some(value.to_string());
            }
        }
        "--save-delay" => match value.parse() {
            Ok(delay) => flags.save_delay_ms = Some(delay),
            Err(_) => tracing::warn!(value, "save delay is not a number of milliseconds, ignoring"),
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = tokens(&[
            "fountain-view",
            "--watch",
            "--density",
            "150",
            "--page-size=a4",
            "--save-delay",
            "500",
            "--parser=fountain2json",
            "pilot.fountain",
        ]);
        let flags = parse_flag_tokens(&args);
        assert!(flags.watch);
        assert!(!flags.perf);
        assert_eq!(flags.density, Some(Density::Dpi150));
        assert_eq!(flags.page_size, Some(PageSize::A4));
        assert_eq!(flags.save_delay_ms, Some(500));
        assert_eq!(flags.parser.as_deref(), Some("fountain2json"));
    }

    #[test]
    fn test_unrecognized_density_falls_back_to_default() {
        let flags = parse_flag_tokens(&tokens(&["--density", "96"]));
        assert_eq!(flags.density, Some(Density::Dpi72));
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let flags = parse_flag_tokens(&tokens(&["--page-size", "legal", "--save-delay", "soon"]));
        assert_eq!(flags.page_size, None);
        assert_eq!(flags.save_delay_ms, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            watch: true,
            density: Some(Density::Dpi100),
            parser: Some("from-file".into()),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            perf: true,
            density: Some(Density::Dpi150),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.watch);
        assert!(merged.perf);
        assert_eq!(merged.density, Some(Density::Dpi150));
        assert_eq!(merged.parser.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_view_options_defaults() {
        let options = ConfigFlags::default().view_options();
        assert_eq!(options.layout, LayoutConfig::default());
        assert_eq!(options.save_delay_ms, DEFAULT_SAVE_DELAY_MS);

        let flags = ConfigFlags {
            density: Some(Density::Dpi100),
            save_delay_ms: Some(250),
            ..ConfigFlags::default()
        };
        let options = flags.view_options();
        assert_eq!(options.layout.density, Density::Dpi100);
        assert_eq!(options.save_delay_ms, 250);
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".fountainrc");
        let flags = ConfigFlags {
            watch: true,
            perf: true,
            density: Some(Density::Dpi100),
            page_size: Some(PageSize::A4),
            parser: Some("fountain2json --html".into()),
            save_delay_ms: Some(750),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempdir().unwrap();
        let loaded = load_config_flags(&dir.path().join("absent")).unwrap();
        assert_eq!(loaded, ConfigFlags::default());
    }
}
