use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import an article from a web page.
    Url(UrlArgs),
    /// Import pasted plain text.
    Text(TextArgs),
    /// Import an uploaded PDF, Word, or text file.
    File(FileArgs),
}

#[derive(Debug, Args)]
pub struct UrlArgs {
    /// Source page URL (must be http/https, non-local).
    #[arg(long)]
    pub url: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct TextArgs {
    /// Path to a UTF-8 text file with the pasted content.
    #[arg(long)]
    pub input: String,

    /// Post title (derived from the first line when omitted).
    #[arg(long)]
    pub title: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct FileArgs {
    /// Path to the document to import.
    #[arg(long)]
    pub input: String,

    /// Declared MIME type (inferred from the extension when omitted).
    #[arg(long)]
    pub mime: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Output directory for the finished post record.
    #[arg(long)]
    pub out: String,

    /// Skip excerpt generation.
    #[arg(long, default_value_t = false)]
    pub no_excerpt: bool,

    /// Skip author detection.
    #[arg(long, default_value_t = false)]
    pub no_author: bool,

    /// Skip image extraction.
    #[arg(long, default_value_t = false)]
    pub no_images: bool,

    /// Skip category suggestion.
    #[arg(long, default_value_t = false)]
    pub no_categories: bool,

    /// Extra instruction appended to the AI prompts. Cannot override the
    /// content-preservation rules.
    #[arg(long)]
    pub prompt: Option<String>,
}

impl CommonArgs {
    pub fn import_options(&self) -> crate::model::ImportOptions {
        crate::model::ImportOptions {
            generate_excerpt: !self.no_excerpt,
            detect_author: !self.no_author,
            extract_images: !self.no_images,
            suggest_categories: !self.no_categories,
            custom_prompt: self.prompt.clone(),
        }
    }
}

/// Best-effort MIME inference for the file command; uploads over HTTP
/// declare their own type.
pub fn mime_for_filename(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "text/plain",
    }
}
