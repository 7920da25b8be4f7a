use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use dfab_outline::SectionTree;
use dfab_server::{build_service, DocFabricServer, ServerConfig};
use dfab_service::DocumentService;
use dfab_types::{DocumentId, DocumentRecord, Tags};
use serde::Serialize;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Config => cmd_config(&config, format),
        Command::Add(args) => cmd_add(&open(&config)?, args, format).await,
        Command::List(args) => cmd_list(&open(&config)?, args, format).await,
        Command::Show(args) => cmd_show(&open(&config)?, args, format).await,
        Command::Cat(args) => cmd_cat(&open(&config)?, args, format).await,
        Command::Outline(args) => cmd_outline(&open(&config)?, args, format).await,
        Command::Original(args) => cmd_original(&open(&config)?, args).await,
        Command::Update(args) => cmd_update(&open(&config)?, args, format).await,
        Command::Rm(args) => cmd_rm(&open(&config)?, args, format).await,
    }
}

/// The same service the server runs, over the configured storage root.
fn open(config: &ServerConfig) -> anyhow::Result<DocumentService> {
    build_service(config)
        .with_context(|| format!("cannot open storage at {}", config.storage_root.display()))
}

/// Defaults, then the config file, then command-line overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(storage) = &cli.storage {
        config.storage_root = storage.clone();
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_id(raw: &str) -> anyhow::Result<DocumentId> {
    DocumentId::parse(raw).with_context(|| format!("invalid document id: {raw}"))
}

/// Parse repeated `key=value` flags.
fn parse_meta(entries: &[String]) -> anyhow::Result<Tags> {
    let mut tags = Tags::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("metadata must be key=value, got {entry:?}");
        };
        if key.trim().is_empty() {
            bail!("metadata key is empty in {entry:?}");
        }
        tags.insert(key.trim().to_string(), value.to_string());
    }
    Ok(tags)
}

/// Content type for a local file, by extension.
fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("md" | "markdown") => "text/markdown",
        Some("txt") => "text/plain",
        Some("html" | "htm") => "text/html",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

struct LocalFile {
    filename: String,
    content_type: String,
    data: Vec<u8>,
}

async fn read_local(path: &Path, content_type: Option<String>) -> anyhow::Result<LocalFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();
    let content_type = content_type.unwrap_or_else(|| guess_content_type(path).to_string());
    Ok(LocalFile {
        filename,
        content_type,
        data,
    })
}

fn print_record(record: &DocumentRecord) {
    println!("{}  {}", record.id.to_string().yellow().bold(), record.filename.bold());
    println!("  Type:    {}", record.content_type.cyan());
    println!("  Size:    {} bytes", record.size_bytes);
    println!("  Created: {}", record.created_at.to_rfc3339());
    println!("  Updated: {}", record.updated_at.to_rfc3339());
    for (key, value) in &record.metadata {
        println!("  {}: {}", key.dimmed(), value);
    }
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address: {bind}"))?;
    }
    config.validate()?;
    println!(
        "DocFabric server on {} (storage: {})",
        config.bind_addr.to_string().bold(),
        config.storage_root.display()
    );
    DocFabricServer::new(config).serve().await?;
    Ok(())
}

fn cmd_config(config: &ServerConfig, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(config),
        OutputFormat::Text => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn cmd_add(
    service: &DocumentService,
    args: AddArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let tags = parse_meta(&args.meta)?;
    let file = read_local(&args.path, args.content_type).await?;
    let tags = (!tags.is_empty()).then_some(tags);
    let record = service
        .create(&file.filename, &file.content_type, &file.data, tags)
        .await?;
    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Text => {
            println!("{} Added {}", "✓".green().bold(), record.filename.bold());
            println!("  Id: {}", record.id.to_string().yellow());
            Ok(())
        }
    }
}

async fn cmd_list(
    service: &DocumentService,
    args: ListArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if !(1..=dfab_types::MAX_PAGE_SIZE).contains(&args.limit) {
        bail!("limit must be between 1 and {}", dfab_types::MAX_PAGE_SIZE);
    }
    let list = service.list(args.limit, args.offset).await?;
    if format == OutputFormat::Json {
        return print_json(&list);
    }
    if list.items.is_empty() {
        println!("No documents.");
        return Ok(());
    }
    for record in &list.items {
        println!(
            "{}  {}  {}  {}",
            record.id.short_id().yellow(),
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.filename.bold(),
            record.content_type.dimmed()
        );
    }
    let shown_to = list.offset + list.items.len();
    println!(
        "{}",
        format!("{}-{} of {}", list.offset + 1, shown_to, list.total).dimmed()
    );
    Ok(())
}

async fn cmd_show(
    service: &DocumentService,
    args: IdArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let record = service.get(&parse_id(&args.id)?).await?;
    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Text => {
            print_record(&record);
            Ok(())
        }
    }
}

async fn cmd_cat(
    service: &DocumentService,
    args: CatArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if args.limit == Some(0) {
        bail!("limit must be at least 1");
    }
    let slice = service
        .read_content(&parse_id(&args.id)?, args.offset, args.limit)
        .await?;
    match format {
        OutputFormat::Json => print_json(&slice),
        OutputFormat::Text => {
            println!("{}", slice.content);
            if slice.is_partial() {
                eprintln!(
                    "{}",
                    format!(
                        "[offset={} length={} total={}]",
                        slice.offset, slice.length, slice.total_length
                    )
                    .dimmed()
                );
            }
            Ok(())
        }
    }
}

async fn cmd_outline(
    service: &DocumentService,
    args: OutlineArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let outline = service.outline(&parse_id(&args.id)?).await?;
    if format == OutputFormat::Json {
        return if args.tree {
            print_json(&SectionTree::build(&outline))
        } else {
            print_json(&outline)
        };
    }
    if outline.is_empty() {
        println!("No headings ({} characters).", outline.total_length);
        return Ok(());
    }
    if args.tree {
        for (depth, section) in SectionTree::build(&outline).iter() {
            println!(
                "{}{}  {}",
                "  ".repeat(depth),
                section.title.bold(),
                format!("@{}+{}", section.offset, section.length).dimmed()
            );
        }
    } else {
        for section in &outline.sections {
            println!(
                "{} {}  {}",
                "#".repeat(section.level as usize).cyan(),
                section.title,
                format!("@{}+{}", section.offset, section.length).dimmed()
            );
        }
    }
    Ok(())
}

async fn cmd_original(service: &DocumentService, args: OriginalArgs) -> anyhow::Result<()> {
    let original = service.read_original(&parse_id(&args.id)?).await?;
    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &original.data)
                .await
                .with_context(|| format!("cannot write {}", path.display()))?;
            eprintln!(
                "{} Wrote {} ({} bytes) to {}",
                "✓".green().bold(),
                original.filename.bold(),
                original.data.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&original.data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn cmd_update(
    service: &DocumentService,
    args: UpdateArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let file = read_local(&args.path, args.content_type).await?;
    let record = service
        .update(&id, &file.filename, &file.content_type, &file.data)
        .await?;
    match format {
        OutputFormat::Json => print_json(&record),
        OutputFormat::Text => {
            println!("{} Updated {}", "✓".green().bold(), record.id.to_string().yellow());
            println!("  File: {} ({} bytes)", record.filename.bold(), record.size_bytes);
            Ok(())
        }
    }
}

async fn cmd_rm(
    service: &DocumentService,
    args: IdArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    service.delete(&id).await?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "deleted": id })),
        OutputFormat::Text => {
            println!("{} Deleted {}", "✓".green().bold(), id.to_string().yellow());
            Ok(())
        }
    }
}
