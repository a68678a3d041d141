use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "uiforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build firmware assets and generated C sections from a project file.
    Build(BuildArgs),
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for the generated files.
    #[arg(long)]
    out_dir: PathBuf,

    /// Build configuration name; omit to build everything.
    #[arg(long)]
    config: Option<String>,

    /// Sections to emit (repeatable); omit for all sections.
    #[arg(long, value_enum)]
    section: Vec<uiforge::Section>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Build(args) => cmd_build(args),
    }
}

fn read_project_json(path: &Path) -> anyhow::Result<uiforge::Project> {
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    let r = BufReader::new(f);
    let project: uiforge::Project =
        serde_json::from_reader(r).with_context(|| "parse project JSON")?;
    Ok(project)
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let project = read_project_json(&args.in_path)?;

    let config = match &args.config {
        Some(name) => Some(
            project
                .configurations
                .iter()
                .find(|c| &c.name == name)
                .cloned()
                .with_context(|| format!("unknown build configuration '{name}'"))?,
        ),
        None => None,
    };

    let project_dir = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let requested = if args.section.is_empty() {
        None
    } else {
        Some(args.section.as_slice())
    };

    let mut diags = uiforge::Diagnostics::new();
    let artifacts = uiforge::build(&project, project_dir, requested, config.as_ref(), &mut diags)?;

    for diag in diags.entries() {
        let severity = match diag.severity {
            uiforge::Severity::Info => "info",
            uiforge::Severity::Warning => "warning",
            uiforge::Severity::Error => "error",
        };
        match &diag.object {
            Some(object) => eprintln!("{severity}: {} ({object})", diag.message),
            None => eprintln!("{severity}: {}", diag.message),
        }
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let sources: Vec<&str> = artifacts
        .values()
        .map(|artifact| artifact.source.as_str())
        .collect();
    let header_path = args.out_dir.join("assets.h");
    std::fs::write(&header_path, sources.join("\n\n") + "\n")
        .with_context(|| format!("write '{}'", header_path.display()))?;
    eprintln!("wrote {}", header_path.display());

    let binaries = [
        (uiforge::Section::AssetsDef, "assets.bin"),
        (uiforge::Section::AssetsDefCompressed, "assets-compressed.bin"),
    ];
    for (section, file_name) in binaries {
        let Some(artifact) = artifacts.get(&section) else {
            continue;
        };
        if let Some(binary) = &artifact.binary {
            let path = args.out_dir.join(file_name);
            std::fs::write(&path, binary)
                .with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
    }

    if diags.has_errors() {
        anyhow::bail!("build finished with errors");
    }
    Ok(())
}
