use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use forge_import::cli::{Cli, Command, FileArgs, TextArgs, UrlArgs, mime_for_filename};
use forge_import::pipeline::Importer;
use forge_import::sink::LocalJsonSink;

/// Client id used for all CLI invocations; the rate limiter keys on it.
const CLI_CLIENT: &str = "cli";

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    forge_import::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let importer = Importer::from_env();
    match cli.command {
        Command::Url(args) => import_url(&importer, args).await.context("url import")?,
        Command::Text(args) => import_text(&importer, args).await.context("text import")?,
        Command::File(args) => import_file(&importer, args).await.context("file import")?,
    }

    Ok(())
}

async fn import_url(importer: &Importer, args: UrlArgs) -> anyhow::Result<()> {
    let options = args.common.import_options();
    let doc = importer
        .import_from_url(CLI_CLIENT, &args.url, &options)
        .await?;
    publish(importer, &doc, &args.common, &options).await
}

async fn import_text(importer: &Importer, args: TextArgs) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("read {}", args.input))?;

    let options = args.common.import_options();
    let doc = importer
        .import_from_text(CLI_CLIENT, &text, args.title.as_deref(), &options)
        .await?;
    publish(importer, &doc, &args.common, &options).await
}

async fn import_file(importer: &Importer, args: FileArgs) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("read {}", args.input))?;
    let filename = std::path::Path::new(&args.input)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(args.input.as_str());
    let mime = args
        .mime
        .as_deref()
        .unwrap_or_else(|| mime_for_filename(filename));

    let options = args.common.import_options();
    let doc = importer
        .import_from_file(CLI_CLIENT, filename, mime, &bytes, &options)
        .await?;
    publish(importer, &doc, &args.common, &options).await
}

async fn publish(
    importer: &Importer,
    doc: &forge_import::model::RawDocument,
    common: &forge_import::cli::CommonArgs,
    options: &forge_import::model::ImportOptions,
) -> anyhow::Result<()> {
    let sink = LocalJsonSink::new(&common.out);
    let record = importer.publish(CLI_CLIENT, doc, options, &sink).await?;
    println!("{}", sink.post_path(&record.slug).display());
    Ok(())
}
