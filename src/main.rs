//! Fountain View - paginated screenplay previews.
//!
//! # Usage
//!
//! ```bash
//! fountain-view render pilot.fountain -o pilot.html
//! fountain-view --density 150 watch pilot.fountain -o pilot.html
//! fountain-view embed notes.md -o notes.html
//! fountain-view --parser "fountain2json --html" --save render pilot.fountain
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use fountain_view::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_layered_flags, parse_flag_tokens,
    save_config_flags,
};
use fountain_view::inline;
use fountain_view::perf;
use fountain_view::render::{render_new, standalone_html};
use fountain_view::screenplay::{
    CommandParser, PlainTextParser, ScreenplayParser, is_screenplay_path,
};
use fountain_view::store::{DocumentHandle, FileStore};
use fountain_view::watcher::{DEFAULT_DEBOUNCE, DocumentWatcher};
use fountain_view::workspace::Workspace;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Paginated screenplay previews for Fountain documents
#[derive(Parser, Debug)]
#[command(name = "fountain-view", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Render density in dpi (72, 100 or 150)
    #[arg(long, global = true, value_name = "DPI")]
    density: Option<String>,

    /// Page size (us-letter or a4)
    #[arg(long, global = true, value_name = "SIZE")]
    page_size: Option<String>,

    /// External screenplay parser command line
    #[arg(long, global = true, value_name = "COMMAND")]
    parser: Option<String>,

    /// Delay in milliseconds between the last edit and its save
    #[arg(long, global = true, value_name = "MS")]
    save_delay: Option<u64>,

    /// Keep re-rendering when the source file changes
    #[arg(long, global = true)]
    watch: bool,

    /// Report render and save timings
    #[arg(long, global = true)]
    perf: bool,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a screenplay to a standalone HTML page
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Render a markdown document, expanding its fountain code blocks
    Embed {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Re-render a screenplay whenever it changes on disk
    Watch {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        load_layered_flags()?
    };
    let effective = file_flags.union(&cli_flags);
    perf::set_enabled(effective.perf);

    let Some(command) = cli.command else {
        if cli.save || cli.clear {
            return Ok(());
        }
        anyhow::bail!("no command given; try `fountain-view render <FILE>`");
    };

    let parser = build_parser(&effective);
    match command {
        Command::Render { file, output } if effective.watch => {
            let output = output.context("--watch needs an output file (-o)")?;
            run_watch(&file, &output, &effective, parser)
        }
        Command::Render { file, output } => {
            run_render(&file, output.as_deref(), &effective, &*parser)
        }
        Command::Embed { file, output } => run_embed(&file, output.as_deref(), &effective, &*parser),
        Command::Watch { file, output } => run_watch(&file, &output, &effective, parser),
    }
}

fn build_parser(flags: &ConfigFlags) -> Rc<dyn ScreenplayParser> {
    match flags.parser.as_deref().and_then(CommandParser::from_command_line) {
        Some(parser) => {
            tracing::debug!(program = parser.program(), "using external parser");
            Rc::new(parser)
        }
        None => Rc::new(PlainTextParser),
    }
}

fn check_extension(file: &Path) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    if !is_screenplay_path(file) {
        tracing::warn!(file = %file.display(), "file does not have a .fountain extension");
    }
    Ok(())
}

fn page_title(file: &Path) -> String {
    file.file_stem()
        .map_or_else(|| "fountain".to_string(), |s| s.to_string_lossy().into_owned())
}

fn write_output(output: Option<&Path>, html: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, html)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            print!("{html}");
            Ok(())
        }
    }
}

fn run_render(
    file: &Path,
    output: Option<&Path>,
    flags: &ConfigFlags,
    parser: &dyn ScreenplayParser,
) -> Result<()> {
    check_extension(file)?;
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let container = render_new(&text, &flags.layout(), parser)
        .with_context(|| format!("Failed to render {}", file.display()))?;
    write_output(output, &standalone_html(&page_title(file), &container.to_html()))
}

fn run_embed(
    file: &Path,
    output: Option<&Path>,
    flags: &ConfigFlags,
    parser: &dyn ScreenplayParser,
) -> Result<()> {
    let markdown = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let host = inline::render_markdown(&markdown, &flags.layout(), parser)
        .context("Failed to render markdown")?;
    for failure in &host.failures {
        eprintln!(
            "[warn] {}:{}: screenplay block left as code: {}",
            file.display(),
            failure.line,
            failure.error
        );
    }
    write_output(output, &standalone_html(&page_title(file), &host.html))
}

fn run_watch(
    file: &Path,
    output: &Path,
    flags: &ConfigFlags,
    parser: Rc<dyn ScreenplayParser>,
) -> Result<()> {
    check_extension(file)?;
    let started = Instant::now();
    let now_ms = || u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut workspace = Workspace::new(Rc::new(FileStore::new()), parser, flags.view_options());
    let handle = DocumentHandle::new(file);
    let id = workspace
        .open(handle.clone())
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let mut watcher = DocumentWatcher::new(DEFAULT_DEBOUNCE).context("Failed to start file watcher")?;
    watcher
        .watch(&handle)
        .with_context(|| format!("Failed to watch {}", file.display()))?;

    let title = page_title(file);
    let mut last_written = None;
    eprintln!("Watching {} -> {}", file.display(), output.display());
    loop {
        for changed in watcher.take_changed() {
            for (_, err) in workspace.file_changed(&changed, now_ms()) {
                eprintln!("[warn] {err}");
            }
        }
        for (_, err) in workspace.tick(now_ms()) {
            eprintln!("[warn] {err}");
        }

        let view = workspace
            .view(id)
            .context("view closed unexpectedly")?;
        let html = view.preview().to_html();
        if last_written.as_ref() != Some(&html) {
            write_output(Some(output), &standalone_html(&title, &html))?;
            tracing::info!(output = %output.display(), "wrote preview");
            last_written = Some(html);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
