use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use tokio::io::AsyncReadExt;

use recu_core::CurrencyContext;
use recu_extract::{CancelToken, ExtractionConfig, ExtractionRequest, Extractor};

use crate::config::CliConfig;

/// Arguments for the extract command.
#[derive(Args, Debug, Default)]
pub struct ExtractArgs {
    /// Text file to read; stdin when omitted or `-`
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Currency symbol, e.g. "$", "€", "R$"
    #[arg(long)]
    symbol: Option<String>,

    /// ISO 4217 currency code
    #[arg(long)]
    code: Option<String>,

    /// Decimal separator used on the receipt
    #[arg(long)]
    decimal_separator: Option<char>,

    /// Known store name (repeatable)
    #[arg(long = "brand")]
    brands: Vec<String>,

    /// Purchase category (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Treat this day as "today" for the purchase-date window (YYYY-MM-DD)
    #[arg(long)]
    reference_date: Option<NaiveDate>,

    /// Include non-winning candidates in the output
    #[arg(long)]
    audit: bool,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,

    /// Run extractors one after another instead of in parallel
    #[arg(long)]
    sequential: bool,
}

/// Arguments for the config command.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Print as JSON instead of TOML
    #[arg(long)]
    json: bool,
}

pub async fn extract(args: ExtractArgs, file: CliConfig) -> anyhow::Result<()> {
    let text = read_input(args.input.as_ref()).await?;
    let engine = Arc::new(Extractor::new(engine_config(&args, &file)));
    let request = build_request(&args, &file);

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = tokio::task::spawn_blocking(move || engine.extract_cancellable(&text, &request, &cancel))
        .await
        .context("Extraction worker failed")??;

    if result.is_partial() {
        tracing::warn!("Result is partial: input was truncated or a field ran out of time");
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    match &args.output {
        Some(path) => tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

pub fn show_config(args: ConfigArgs, file: CliConfig) -> anyhow::Result<()> {
    let rendered = if args.json {
        serde_json::to_string_pretty(&file)?
    } else {
        toml::to_string_pretty(&file)?
    };
    println!("{rendered}");
    Ok(())
}

async fn read_input(input: Option<&PathBuf>) -> anyhow::Result<String> {
    match input.filter(|p| p.as_os_str() != "-") {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn engine_config(args: &ExtractArgs, file: &CliConfig) -> ExtractionConfig {
    let mut config = file.engine.clone();
    if args.sequential {
        config.parallel = false;
    }
    config
}

/// Flags win over the config file, field by field.
fn currency(args: &ExtractArgs, file: &CliConfig) -> CurrencyContext {
    let base = file.currency.clone().unwrap_or_default();
    CurrencyContext::new(
        args.symbol.clone().unwrap_or_else(|| base.symbol().to_string()),
        args.code.clone().unwrap_or_else(|| base.code().to_string()),
        args.decimal_separator.unwrap_or(base.decimal_separator()),
    )
}

fn build_request(args: &ExtractArgs, file: &CliConfig) -> ExtractionRequest {
    let brands = if args.brands.is_empty() { &file.brands } else { &args.brands };
    let categories = if args.categories.is_empty() { &file.categories } else { &args.categories };
    let mut request = ExtractionRequest::new(currency(args, file))
        .with_brands(brands.iter().cloned())
        .with_categories(categories.iter().cloned())
        .with_audit(args.audit);
    if let Some(date) = args.reference_date {
        request = request.with_reference_date(date);
    }
    request
}
