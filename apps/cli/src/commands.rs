//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use orgdocs_core::classify::classify_apex;
use orgdocs_core::pipeline::{PrepareProgress, prepare_prompts};
use orgdocs_discovery::{
    DiscoveryOptions, DiscoveryReporter, TracingReporter, discover_with, is_sfdx_project,
    load_package_directories,
};
use orgdocs_prompts::{PromptResolver, PromptSettings, PromptVariables, TemplateRegistry};
use orgdocs_shared::{
    AppConfig, ArtifactKind, DiscoveredArtifact, OrgDocsError, PackageDirectory, init_config,
    load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// orgdocs: turn Salesforce project metadata into documentation prompts.
#[derive(Parser)]
#[command(
    name = "orgdocs",
    version,
    about = "Discover project-owned Salesforce metadata and build documentation prompts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// List project-owned artifacts of one kind.
    List {
        /// Artifact kind: flow, apex, page, or lwc.
        kind: ArtifactKind,

        /// Project root containing sfdx-project.json (defaults to cwd).
        #[arg(short, long)]
        project: Option<PathBuf>,
    },

    /// Resolve a documentation prompt for every artifact of one kind.
    Prompt {
        /// Artifact kind: flow, apex, page, or lwc.
        kind: ArtifactKind,

        /// Project root containing sfdx-project.json (defaults to cwd).
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Print the prepared prompts as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Render one template with explicit variables.
    Render {
        /// Template id, e.g. PROMPT_DESCRIBE_APEX.
        template: String,

        /// Variable binding, KEY=VALUE (repeatable). `@path` reads the value from a file.
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },

    /// Print the category of an Apex class or trigger.
    Classify {
        /// Path to a .cls or .trigger file.
        file: PathBuf,
    },

    /// List the prompt templates and their required variables.
    Templates,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

fn parse_var(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty variable name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "orgdocs=info",
        1 => "orgdocs=debug",
        _ => "orgdocs=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::List { kind, project } => cmd_list(kind, project.as_deref()).await,
        Command::Prompt {
            kind,
            project,
            json,
        } => cmd_prompt(kind, project.as_deref(), json).await,
        Command::Render { template, vars } => cmd_render(&template, vars),
        Command::Classify { file } => cmd_classify(&file),
        Command::Templates => cmd_templates(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Package directories of the project at `project` (or the cwd).
fn package_dirs(project: Option<&Path>) -> Result<Vec<PackageDirectory>> {
    let root = match project {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|e| eyre!("cannot determine working directory: {e}"))?,
    };

    if !is_sfdx_project(&root) {
        return Err(eyre!(
            "no sfdx-project.json found at '{}': run from a Salesforce DX project or pass --project",
            root.display()
        ));
    }

    Ok(load_package_directories(&root)?)
}

async fn cmd_list(kind: ArtifactKind, project: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let dirs = package_dirs(project)?;
    let opts = DiscoveryOptions::from(&config.discovery);

    info!(%kind, roots = dirs.len(), "listing artifacts");

    match discover_with(kind, &dirs, &opts, &TracingReporter).await {
        Ok(artifacts) => {
            print_artifacts(&artifacts);
            Ok(())
        }
        Err(OrgDocsError::Discovery {
            kind,
            failures,
            recovered,
        }) => {
            print_artifacts(&recovered);
            for failure in &failures {
                eprintln!("  failed: {}: {}", failure.root.display(), failure.message);
            }
            Err(eyre!(
                "{kind} discovery failed for {} package root(s)",
                failures.len()
            ))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_artifacts(artifacts: &[DiscoveredArtifact]) {
    for artifact in artifacts {
        match artifact {
            DiscoveredArtifact::File(path) => println!("{path}"),
            DiscoveredArtifact::Component(c) => println!("{}\t{}", c.name, c.js_file),
        }
    }
}

async fn cmd_prompt(kind: ArtifactKind, project: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config()?;
    let dirs = package_dirs(project)?;
    let opts = DiscoveryOptions::from(&config.discovery);
    let registry = TemplateRegistry::builtin();
    let settings = PromptSettings::from_config(&config, registry);
    let resolver = PromptResolver::from_settings(registry, &settings);

    info!(%kind, language = %settings.language, "preparing prompts");

    let progress = CliProgress::new();
    let result = prepare_prompts(kind, &dirs, &opts, &resolver, &progress, &progress).await;
    progress.finish();
    let batch = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    } else {
        for prepared in &batch.prompts {
            println!("===== {} ({}) =====", prepared.name, prepared.source);
            if let Some(apex_kind) = prepared.apex_kind {
                println!("type: {apex_kind}");
            }
            println!("{}", prepared.prompt);
            println!();
        }
    }

    if !batch.failures.is_empty() {
        for failure in &batch.failures {
            eprintln!("  failed: {}: {}", failure.source, failure.message);
        }
        return Err(eyre!(
            "{} {kind} failure(s); {} prompt(s) prepared",
            batch.failures.len(),
            batch.prompts.len()
        ));
    }

    Ok(())
}

fn cmd_render(template: &str, vars: Vec<(String, String)>) -> Result<()> {
    let config = load_config()?;
    let registry = TemplateRegistry::builtin();
    let settings = PromptSettings::from_config(&config, registry);
    let resolver = PromptResolver::from_settings(registry, &settings);

    let variables = vars
        .into_iter()
        .map(|(key, value)| -> Result<(String, String)> {
            let value = match value.strip_prefix('@') {
                Some(path) => std::fs::read_to_string(path)
                    .map_err(|e| eyre!("cannot read value of {key} from '{path}': {e}"))?,
                None => value,
            };
            Ok((key, value))
        })
        .collect::<Result<PromptVariables>>()?;

    let prompt = resolver.resolve(template, &variables)?;
    println!("{prompt}");
    Ok(())
}

fn cmd_classify(file: &Path) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;
    println!("{}", classify_apex(&source));
    Ok(())
}

fn cmd_templates() -> Result<()> {
    let registry = TemplateRegistry::builtin();
    for id in registry.ids() {
        if let Some(template) = registry.get(id) {
            let languages: Vec<&str> = template.languages().collect();
            println!(
                "{id}\n  variables: {}\n  languages: {}",
                template.variables().join(", "),
                languages.join(", ")
            );
        }
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    let settings = PromptSettings::from_config(&config, TemplateRegistry::builtin());
    println!("# effective prompts language: {}", settings.language);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl PrepareProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn artifact_prepared(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Resolving [{current}/{total}] {name}"));
    }
}

impl DiscoveryReporter for CliProgress {
    fn managed_skipped(&self, kind: ArtifactKind, paths: &[String]) {
        self.spinner
            .suspend(|| TracingReporter.managed_skipped(kind, paths));
    }

    fn root_scanned(&self, kind: ArtifactKind, root: &Path, found: usize) {
        self.spinner.set_message(format!(
            "Scanned {} ({found} {})",
            root.display(),
            kind.plural_label()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_parsing() {
        assert_eq!(
            parse_var("CLASS_NAME=Foo").unwrap(),
            ("CLASS_NAME".to_string(), "Foo".to_string())
        );
        assert_eq!(
            parse_var("ERROR=a=b").unwrap(),
            ("ERROR".to_string(), "a=b".to_string())
        );
        assert!(parse_var("NOVALUE").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn cli_parses_kinds() {
        let cli = Cli::try_parse_from(["orgdocs", "list", "lwc", "--project", "/tmp/p"]).unwrap();
        match cli.command {
            Command::List { kind, project } => {
                assert_eq!(kind, ArtifactKind::Lwc);
                assert_eq!(project, Some(PathBuf::from("/tmp/p")));
            }
            _ => panic!("expected list"),
        }
        assert!(Cli::try_parse_from(["orgdocs", "list", "objects"]).is_err());
    }

    #[test]
    fn cli_collects_render_vars() {
        let cli = Cli::try_parse_from([
            "orgdocs",
            "render",
            "PROMPT_DESCRIBE_APEX",
            "--var",
            "CLASS_NAME=Foo",
            "--var",
            "APEX_CODE=@Foo.cls",
        ])
        .unwrap();
        match cli.command {
            Command::Render { template, vars } => {
                assert_eq!(template, "PROMPT_DESCRIBE_APEX");
                assert_eq!(vars.len(), 2);
                assert_eq!(vars[1].1, "@Foo.cls");
            }
            _ => panic!("expected render"),
        }
    }
}
