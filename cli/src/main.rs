//! propdocx CLI - business proposal generator

mod llm;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use propdocx::{
    render, Brief, DocxRenderer, GenerationOptions, JsonFormat, ProposalOutput, ProposalService,
    RenderOptions, StaticGenerator, StyleRegistry, Template, TextGenerator,
};

use llm::{ChatCompletionsGenerator, DEFAULT_ENDPOINT, DEFAULT_MODEL};

#[derive(Parser)]
#[command(name = "propdocx")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Generate styled DOCX business proposals from a brief", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Template and style settings shared by the rendering commands.
#[derive(clap::Args)]
struct DocumentArgs {
    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// DOCX template (built-in template if not specified)
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Style registry JSON, e.g. {"section": "Heading1"}
    #[arg(long, value_name = "FILE")]
    styles: Option<PathBuf>,

    /// Generation date (YYYY-MM-DD, today if not specified)
    #[arg(long, value_name = "DATE")]
    date: Option<NaiveDate>,

    /// chrono format for date placeholders
    #[arg(long, default_value = render::DEFAULT_DATE_FORMAT)]
    date_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a proposal from a brief using the text-generation service
    Generate {
        /// Brief JSON file
        #[arg(value_name = "BRIEF")]
        brief: PathBuf,

        #[command(flatten)]
        document: DocumentArgs,

        /// API key for the chat-completions endpoint
        #[arg(long, env = "PROPDOCX_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Model name
        #[arg(long, env = "PROPDOCX_MODEL", default_value = DEFAULT_MODEL)]
        model: String,

        /// Base URL of an OpenAI-compatible API
        #[arg(long, env = "PROPDOCX_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Request timeout in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Maximum tokens to generate
        #[arg(long, default_value = "2048")]
        max_tokens: u32,

        /// Sampling temperature
        #[arg(long, default_value = "0.3")]
        temperature: f32,

        /// Also save the generated text next to the document
        #[arg(long)]
        save_text: bool,
    },

    /// Render a proposal from a brief and pre-generated text
    Render {
        /// Brief JSON file
        #[arg(value_name = "BRIEF")]
        brief: PathBuf,

        /// Generated text file
        #[arg(value_name = "TEXT")]
        text: PathBuf,

        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Show the prompt that would be sent for a brief
    Prompt {
        /// Brief JSON file
        #[arg(value_name = "BRIEF")]
        brief: PathBuf,
    },

    /// Segment generated text and print the blocks as JSON
    Blocks {
        /// Generated text file
        #[arg(value_name = "TEXT")]
        text: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Write the built-in template to a file
    Template {
        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = "template.docx")]
        output: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Generate {
            brief,
            document,
            api_key,
            model,
            endpoint,
            timeout,
            max_tokens,
            temperature,
            save_text,
        }) => {
            let options = GenerationOptions::new()
                .with_timeout(Duration::from_secs(timeout))
                .with_max_tokens(max_tokens)
                .with_temperature(temperature);
            cmd_generate(&brief, &document, &endpoint, &api_key, &model, options, save_text)
        }
        Some(Commands::Render {
            brief,
            text,
            document,
        }) => cmd_render(&brief, &text, &document),
        Some(Commands::Prompt { brief }) => cmd_prompt(&brief),
        Some(Commands::Blocks {
            text,
            output,
            compact,
        }) => cmd_blocks(&text, output.as_deref(), compact),
        Some(Commands::Template { output }) => cmd_template(&output),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: propdocx <COMMAND>".yellow());
            println!("       propdocx --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_brief(path: &Path) -> Result<Brief, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)?;
    Ok(Brief::from_json(&json)?)
}

fn build_service<G: TextGenerator>(
    generator: G,
    document: &DocumentArgs,
) -> Result<ProposalService<G>, Box<dyn std::error::Error>> {
    let template = match &document.template {
        Some(path) => Template::from_path(path)?,
        None => Template::builtin(),
    };
    let registry = match &document.styles {
        Some(path) => StyleRegistry::from_json(&fs::read_to_string(path)?)?,
        None => StyleRegistry::default(),
    };
    let options = RenderOptions::new().with_date_format(document.date_format.as_str());
    let renderer = DocxRenderer::new(registry, options)?;

    let mut service = ProposalService::new(generator, template, renderer)?;
    if let Some(date) = document.date {
        service = service.with_generation_date(date);
    }
    Ok(service)
}

fn cmd_generate(
    brief_path: &Path,
    document: &DocumentArgs,
    endpoint: &str,
    api_key: &str,
    model: &str,
    options: GenerationOptions,
    save_text: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let brief = load_brief(brief_path)?;
    let generator = ChatCompletionsGenerator::new(endpoint, api_key, model)?;
    let service = build_service(generator, document)?.with_options(options);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Generating proposal with {}...", service.generator().model()));

    let result = service.generate(&brief);
    pb.finish_and_clear();
    let output = result?;

    let path = write_output(&document.output, &output)?;
    if save_text {
        let text_path = path.with_extension("md");
        fs::write(&text_path, &output.text)?;
        println!("{} {}", "Saved text to".green(), text_path.display());
    }

    Ok(())
}

fn cmd_render(
    brief_path: &Path,
    text_path: &Path,
    document: &DocumentArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let brief = load_brief(brief_path)?;
    let text = fs::read_to_string(text_path)?;

    let service = build_service(StaticGenerator::new(text.as_str()), document)?;
    let output = service.render_text(&brief, &text)?;
    write_output(&document.output, &output)?;

    Ok(())
}

fn write_output(dir: &Path, output: &ProposalOutput) -> Result<PathBuf, Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&output.filename);
    fs::write(&path, &output.bytes)?;

    let stats = &output.stats;
    println!("{} {}", "Saved to".green(), path.display());
    println!("  {} {} headings", "├─".dimmed(), stats.heading_count);
    println!("  {} {} paragraphs", "├─".dimmed(), stats.paragraph_count);
    println!("  {} {} list items", "├─".dimmed(), stats.list_item_count);
    println!("  {} {} tables", "├─".dimmed(), stats.table_count);
    if stats.appended_row_count > 0 {
        println!("  {} {} template table rows", "├─".dimmed(), stats.appended_row_count);
    }
    if stats.raw_count > 0 {
        println!("  {} {} raw blocks", "├─".dimmed(), stats.raw_count.to_string().yellow());
    }
    println!("  {} {} placeholders", "└─".dimmed(), stats.placeholder_count);

    Ok(path)
}

fn cmd_prompt(brief_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let brief = load_brief(brief_path)?;
    let service = ProposalService::new(
        StaticGenerator::default(),
        Template::builtin(),
        DocxRenderer::default(),
    )?;
    println!("{}", service.prompt_for(&brief));
    Ok(())
}

fn cmd_blocks(
    text_path: &Path,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(text_path)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = propdocx::blocks_json(&text, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_template(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = Template::builtin().to_bytes()?;
    fs::write(output, bytes)?;
    println!("{} {}", "Saved to".green(), output.display());
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "propdocx".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Business proposal generator");
    println!();
    println!("License: MIT");
}
