//! Argument parsing and command implementations for the `tokenlayer` binary.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokenlayer::{
    detect_color_mode, ColorMode, ColorSpace, KnownVariables, ResolvedTheme, Resolver, ThemeLayer,
};
use tracing::{debug, info};

/// Resolve layered design-token files into one flat token table.
#[derive(Debug, Parser)]
#[command(name = "tokenlayer", version, about)]
pub struct Cli {
    /// Log each resolution step to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve layers and print the resulting tokens
    Resolve(ResolveArgs),
    /// Check that layers resolve in both light and dark mode
    Check(Inputs),
}

#[derive(Debug, Args)]
pub struct Inputs {
    /// Layer files (YAML or JSON), lowest precedence first
    #[arg(required = true, value_name = "LAYER")]
    pub layers: Vec<PathBuf>,

    /// CSS files declaring the custom properties tokens may reference
    #[arg(long = "vars", value_name = "FILE")]
    pub vars: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub inputs: Inputs,

    /// Color mode to resolve for; omit to use only unscoped layers
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Color function wrapped around color variable references
    #[arg(long, default_value = "hsl")]
    pub color_space: ColorSpace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Light,
    Dark,
    /// Follow the operating system setting
    Auto,
}

impl ModeArg {
    fn resolve(self) -> ColorMode {
        match self {
            ModeArg::Light => ColorMode::Light,
            ModeArg::Dark => ColorMode::Dark,
            ModeArg::Auto => detect_color_mode(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Yaml,
    Css,
}

/// Runs a parsed command and returns what should be printed to stdout.
pub fn run(cli: &Cli) -> Result<String> {
    match &cli.command {
        Command::Resolve(args) => resolve_command(args),
        Command::Check(inputs) => check_command(inputs),
    }
}

fn resolve_command(args: &ResolveArgs) -> Result<String> {
    let layers = load_layers(&args.inputs.layers)?;
    let known = load_vars(&args.inputs.vars)?;

    let mut resolver = Resolver::new(known);
    if let Some(mode) = args.mode {
        let mode = mode.resolve();
        info!(%mode, "resolving for color mode");
        resolver = resolver.with_mode(mode);
    }

    let theme = resolver
        .resolve(&layers)
        .context("failed to resolve theme")?;
    info!(tokens = theme.len(), "resolved theme");

    format_theme(&theme, args.format, args.color_space)
}

fn check_command(inputs: &Inputs) -> Result<String> {
    let layers = load_layers(&inputs.layers)?;
    let known = load_vars(&inputs.vars)?;

    let mut report = String::new();
    for mode in ColorMode::ALL {
        let theme = Resolver::new(known.clone())
            .with_mode(mode)
            .resolve(&layers)
            .with_context(|| format!("theme does not resolve in {} mode", mode))?;
        report.push_str(&format!("{}: ok ({} tokens)\n", mode, theme.len()));
    }
    Ok(report)
}

fn load_layers(paths: &[PathBuf]) -> Result<Vec<ThemeLayer>> {
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| load_layer(index, path))
        .collect()
}

/// Loads the layer at stack position `index`.
fn load_layer(index: usize, path: &Path) -> Result<ThemeLayer> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read layer file {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let layer = if is_json {
        ThemeLayer::from_json(&text)
    } else {
        ThemeLayer::from_yaml(&text)
    }
    .map_err(|e| e.at_layer(index))
    .with_context(|| format!("invalid layer file {}", path.display()))?;

    let layer = match path.file_stem() {
        Some(stem) if layer.name().is_none() => layer.named(stem.to_string_lossy()),
        _ => layer,
    };
    debug!(
        path = %path.display(),
        name = layer.name().unwrap_or_default(),
        tokens = layer.document().len(),
        "loaded layer"
    );
    Ok(layer)
}

fn load_vars(paths: &[PathBuf]) -> Result<KnownVariables> {
    let mut known = KnownVariables::new();
    for path in paths {
        let css = fs::read_to_string(path)
            .with_context(|| format!("failed to read variables file {}", path.display()))?;
        let declared = KnownVariables::from_css(&css)
            .with_context(|| format!("invalid variables file {}", path.display()))?;
        debug!(
            path = %path.display(),
            light = declared.names(ColorMode::Light).len(),
            dark = declared.names(ColorMode::Dark).len(),
            "loaded variables"
        );
        known = known.merge(declared);
    }
    Ok(known)
}

fn format_theme(theme: &ResolvedTheme, format: Format, space: ColorSpace) -> Result<String> {
    let rendered = theme.render(space);
    let output = match format {
        Format::Json => {
            let mut json = serde_json::to_string_pretty(&rendered)?;
            json.push('\n');
            json
        }
        Format::Yaml => serde_yaml::to_string(&rendered)?,
        Format::Css => {
            let selector = match theme.mode() {
                Some(ColorMode::Dark) => ".dark",
                _ => ":root",
            };
            let mut css = format!("{} {{\n", selector);
            let mut names: BTreeMap<String, &str> = BTreeMap::new();
            for (path, value) in &rendered {
                let name = property_name(path);
                if let Some(other) = names.insert(name.clone(), path) {
                    bail!("tokens '{}' and '{}' both map to custom property {}", other, path, name);
                }
                css.push_str(&format!("  {}: {};\n", name, value));
            }
            css.push_str("}\n");
            css
        }
    };
    Ok(output)
}

/// `colors.primary.DEFAULT` -> `--colors-primary`
fn property_name(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('.').collect();
    if segments.len() > 1 && segments.last() == Some(&"DEFAULT") {
        segments.pop();
    }
    format!("--{}", segments.join("-"))
}
