//! ArchGenie client.
//!
//! One invocation is one UI session: read parameters, run at most one
//! generation against the backend, normalize and sanitize what comes
//! back, delegate rendering to the Mermaid engine, then apply the
//! requested export actions to the resulting artifact. Only the settings
//! file survives between runs.

mod controller;
mod export;
mod table;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, Result};

use archgenie_client::{Client, EstimateRequest, Provider};
use archgenie_core::{Artifact, GenerationRequest};
use archgenie_mermaid::{sanitize, Renderer};
use controller::{Controller, Status};
use export::{ExportOutcome, Zoom};

#[derive(Parser)]
#[command(
    name = "archgenie",
    version,
    about = "AI-generated cloud architecture diagrams, Terraform, and cost estimates"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an architecture diagram, Terraform, and (where supported) a cost estimate
    Generate(GenerateArgs),
    /// Price existing Terraform or diagram text via the backend estimator
    Estimate(EstimateArgs),
    /// Sanitize and render a local Mermaid file without calling the backend
    Render(RenderArgs),
    /// Manage persisted settings (API key, backend URL, default region)
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Target cloud: azure, aws, or gcp
    #[arg(long, default_value = "azure")]
    provider: String,
    /// Application name fed to the generator
    #[arg(long)]
    app_name: Option<String>,
    /// Extra free-text requirements
    #[arg(long)]
    prompt: Option<String>,
    /// Deployment region hint
    #[arg(long)]
    region: Option<String>,
    /// Display zoom: "fit" or a factor like 1.5; PNG export uses it as its scale
    #[arg(long, default_value = "fit")]
    zoom: String,
    /// Copy the Terraform to the system clipboard
    #[arg(long)]
    copy: bool,
    /// Save the Terraform text
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = export::DEFAULT_TEXT_FILE)]
    save_tf: Option<PathBuf>,
    /// Save the rendered SVG
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = export::DEFAULT_SVG_FILE)]
    save_svg: Option<PathBuf>,
    /// Save a rasterized PNG
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = export::DEFAULT_PNG_FILE)]
    save_png: Option<PathBuf>,
}

#[derive(Args)]
struct EstimateArgs {
    /// Terraform file to price
    #[arg(long, value_name = "FILE")]
    terraform: Option<PathBuf>,
    /// Mermaid diagram file to price
    #[arg(long, value_name = "FILE")]
    diagram: Option<PathBuf>,
    /// Region hint for pricing
    #[arg(long)]
    region: Option<String>,
}

#[derive(Args)]
struct RenderArgs {
    /// Mermaid file to sanitize and render
    input: PathBuf,
    /// Display zoom: "fit" or a factor like 1.5; PNG export uses it as its scale
    #[arg(long, default_value = "fit")]
    zoom: String,
    /// Save the rendered SVG
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = export::DEFAULT_SVG_FILE)]
    save_svg: Option<PathBuf>,
    /// Save a rasterized PNG
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = export::DEFAULT_PNG_FILE)]
    save_png: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Save the backend API key (stored in ~/.archgenie/, trimmed)
    SetKey { key: String },
    /// Save the backend base URL
    SetUrl { url: String },
    /// Save the default region
    SetRegion { region: String },
    /// Show current settings (the key itself is never printed)
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Generate(args) => generate(args).await,
        Commands::Estimate(args) => estimate(args).await,
        Commands::Render(args) => render(args),
        Commands::Config { action } => config(action),
    }
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let provider: Provider = args.provider.parse().map_err(|e: String| eyre!(e))?;
    let zoom: Zoom = args.zoom.parse().map_err(|e: String| eyre!(e))?;
    let settings = archgenie_core::read_settings();

    let mut controller = Controller::new();
    let token = controller.begin();

    // The credential check happens here, before any network call.
    let client = match Client::new(&settings) {
        Ok(client) => client,
        Err(e) => {
            controller.fail(token);
            bail!(e);
        }
    };

    let request = GenerationRequest {
        app_name: args
            .app_name
            .unwrap_or_else(archgenie_core::default_app_name),
        prompt: args.prompt,
        region: args.region.or_else(|| settings.region.clone()),
    };

    eprintln!(
        "Generating {provider} architecture for \"{}\"...",
        request.app_name
    );
    let result = match client.generate(provider, &request).await {
        Ok(result) => result,
        Err(e) => {
            controller.fail(token);
            bail!(e);
        }
    };

    let diagram_source = if result.diagram.trim().is_empty() {
        String::new()
    } else {
        sanitize(&result.diagram)
    };
    let (svg, rendered) = resolve_image(&diagram_source, result.diagram_svg.as_deref());

    controller.complete(
        token,
        diagram_source,
        svg,
        result.terraform,
        result.cost,
        rendered,
    );

    if let Some(artifact) = controller.artifact() {
        if !artifact.diagram_source.is_empty() {
            println!("--- Diagram (mermaid) ---");
            println!("{}", artifact.diagram_source);
            println!();
        }
        if !artifact.terraform.is_empty() {
            println!("--- Terraform ---");
            println!("{}", artifact.terraform);
            println!();
        }
        println!("--- Monthly cost ---");
        println!(
            "{}",
            table::render_cost_panel(artifact.cost.as_ref(), provider.supports_cost())
        );
    }

    let artifact = controller.artifact();
    if args.copy {
        report(export::copy_code(artifact)?);
    }
    if let Some(path) = args.save_tf {
        report(export::export_text(artifact, &path)?);
    }
    if let Some(path) = args.save_svg {
        report(export::export_svg(artifact, &path)?);
    }
    if let Some(path) = args.save_png {
        report(export::export_png(artifact, zoom, &path)?);
    }

    match controller.status() {
        Status::Rendered => eprintln!("Done."),
        Status::Errored => eprintln!("Completed with errors (see above)."),
        _ => {}
    }
    Ok(())
}

async fn estimate(args: EstimateArgs) -> Result<()> {
    let settings = archgenie_core::read_settings();
    let client = Client::new(&settings)?;

    let request = EstimateRequest {
        items: None,
        diagram: read_optional(args.diagram)?,
        terraform: read_optional(args.terraform)?,
        region: args.region.or(settings.region),
    };
    if request.diagram.is_none() && request.terraform.is_none() {
        bail!("nothing to price — pass --terraform and/or --diagram");
    }

    let cost = client.estimate(&request).await?;
    println!("{}", table::render_cost_table(Some(&cost)));
    Ok(())
}

fn render(args: RenderArgs) -> Result<()> {
    let zoom: Zoom = args.zoom.parse().map_err(|e: String| eyre!(e))?;
    let raw = std::fs::read_to_string(&args.input)?;
    let source = sanitize(&raw);
    let (svg, _) = render_diagram(&source);

    println!("{source}");

    let artifact = Artifact {
        diagram_source: source,
        svg,
        terraform: String::new(),
        cost: None,
        generation: 0,
    };
    if let Some(path) = args.save_svg {
        report(export::export_svg(Some(&artifact), &path)?);
    }
    if let Some(path) = args.save_png {
        report(export::export_png(Some(&artifact), zoom, &path)?);
    }
    Ok(())
}

fn config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::SetKey { key } => {
            let mut settings = archgenie_core::read_settings();
            settings.api_key = key;
            archgenie_core::write_settings(&settings).map_err(|e| eyre!(e))?;
            eprintln!("API key saved. This is a development convenience, not secure storage.");
        }
        ConfigAction::SetUrl { url } => {
            let mut settings = archgenie_core::read_settings();
            settings.base_url = url;
            archgenie_core::write_settings(&settings).map_err(|e| eyre!(e))?;
            eprintln!("Backend URL saved.");
        }
        ConfigAction::SetRegion { region } => {
            let mut settings = archgenie_core::read_settings();
            settings.region = Some(region);
            archgenie_core::write_settings(&settings).map_err(|e| eyre!(e))?;
            eprintln!("Default region saved.");
        }
        ConfigAction::Show => {
            let settings = archgenie_core::read_settings();
            println!("base_url: {}", settings.base_url);
            println!("region:   {}", settings.region.as_deref().unwrap_or("-"));
            // Mask the key — only report whether one is set.
            println!(
                "api_key:  {}",
                if settings.has_api_key() { "set" } else { "not set" }
            );
        }
    }
    Ok(())
}

/// Decide the image for a completed generation. A backend-supplied SVG is
/// used as-is; an absent diagram is not a render failure (Terraform-only
/// results complete cleanly); otherwise the local engine renders it.
fn resolve_image(diagram_source: &str, backend_svg: Option<&str>) -> (Option<String>, bool) {
    match backend_svg {
        Some(svg) => (Some(svg.to_string()), true),
        None if diagram_source.trim().is_empty() => (None, true),
        None => render_diagram(diagram_source),
    }
}

/// Render sanitized diagram text, converting every failure into an
/// inline error report (message plus the offending source) instead of a
/// hard stop.
fn render_diagram(source: &str) -> (Option<String>, bool) {
    match Renderer::discover().and_then(|r| r.render_svg(source)) {
        Ok(svg) => (Some(svg), true),
        Err(e) => {
            eprintln!("Diagram render failed: {e}");
            if let Some(src) = e.diagram_source() {
                eprintln!("--- offending source ---");
                eprintln!("{src}");
            }
            (None, false)
        }
    }
}

fn report(outcome: ExportOutcome) {
    match outcome {
        ExportOutcome::Written(path) => eprintln!("Wrote {}", path.display()),
        ExportOutcome::Copied(tool) => eprintln!("Copied code to clipboard via {tool}."),
        // The no-artifact warning was already printed by the export fn.
        ExportOutcome::NoArtifact => {}
        ExportOutcome::Skipped(reason) => eprintln!("Export skipped: {reason}"),
    }
}

fn read_optional(path: Option<PathBuf>) -> Result<Option<String>> {
    match path {
        Some(path) => Ok(Some(std::fs::read_to_string(path)?)),
        None => Ok(None),
    }
}
