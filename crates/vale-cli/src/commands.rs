use std::path::PathBuf;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use vale_merge::MergeChain;
use vale_sdk::{Consolidation, Renderer, Status, TextRenderer, ValeConfig, Vales, VoucherRecord};
use vale_types::timestamp;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref(), cli.root.as_ref())?;
    let format = cli.format;
    match cli.command {
        Command::Next => cmd_next(config, format),
        Command::List(args) => cmd_list(config, format, args),
        Command::Show(args) => cmd_show(config, format, args),
        Command::SetStatus(args) => cmd_set_status(config, format, args),
        Command::Reindex => cmd_reindex(config, format),
        Command::Verify => cmd_verify(config, format),
        Command::Consolidate(args) => {
            let format = if args.json { OutputFormat::Json } else { format };
            cmd_consolidate(config, format, args)
        }
        Command::Merge(args) => cmd_merge(config, format, args),
    }
}

fn load_config(path: Option<&PathBuf>, root: Option<&PathBuf>) -> anyhow::Result<ValeConfig> {
    let mut config = match path {
        Some(path) => ValeConfig::load(path)?,
        None => ValeConfig::for_root("."),
    };
    if let Some(root) = root {
        config.registry.root = root.clone();
    }
    Ok(config)
}

fn open(config: ValeConfig) -> anyhow::Result<Vales> {
    let root = config.registry.root.clone();
    Vales::open(config).with_context(|| format!("cannot open registry in {}", root.display()))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_label(status: Status) -> colored::ColoredString {
    match status {
        Status::Pending => status.as_str().yellow(),
        Status::Deducted => status.as_str().green(),
        Status::Voided => status.as_str().red(),
    }
}

fn record_line(record: &VoucherRecord) -> String {
    format!(
        "{}  {:<8}  {}  {:>3} items  {}",
        format!("#{:06}", record.number()).bold(),
        status_label(record.status()),
        timestamp::format(&record.created_at()).dimmed(),
        record.item_count(),
        record.artifact_path()
    )
}

fn cmd_next(config: ValeConfig, format: OutputFormat) -> anyhow::Result<()> {
    let vales = open(config)?;
    let next = vales.next_number()?;
    match format {
        OutputFormat::Json => print_json(&json!({ "next": next })),
        OutputFormat::Text => {
            println!("{}", next);
            Ok(())
        }
    }
}

fn cmd_list(config: ValeConfig, format: OutputFormat, args: ListArgs) -> anyhow::Result<()> {
    let vales = open(config)?;
    let records = vales.list(args.status)?;
    if format == OutputFormat::Json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No vouchers.");
    }
    for record in &records {
        println!("{}", record_line(record));
    }
    Ok(())
}

fn cmd_show(config: ValeConfig, format: OutputFormat, args: ShowArgs) -> anyhow::Result<()> {
    let vales = open(config)?;
    let record = vales
        .find_by_number(args.number)?
        .with_context(|| format!("voucher #{} not found", args.number))?;
    let (items, issue) = match vales.items_of(args.number)? {
        Some(Ok(items)) => (items, None),
        Some(Err(issue)) => (Vec::new(), Some(issue.to_string())),
        None => (Vec::new(), None),
    };
    if format == OutputFormat::Json {
        return print_json(&json!({ "record": record, "items": items, "sidecar_issue": issue }));
    }
    println!("{}", record_line(&record));
    if let Some(sidecar) = record.sidecar_path() {
        println!("  Sidecar: {}", sidecar.dimmed());
    }
    if let Some(issue) = &issue {
        println!("  {} {}", "no structured data:".yellow(), issue);
    } else if items.is_empty() {
        println!("  {}", "no structured data".yellow());
    }
    for item in &items {
        println!("  {}  x{}", item.key(), item.quantity.to_string().bold());
    }
    Ok(())
}

fn cmd_set_status(config: ValeConfig, format: OutputFormat, args: SetStatusArgs) -> anyhow::Result<()> {
    let vales = open(config)?;
    let changed = vales.update_status(&args.numbers, args.status)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "status": args.status, "changed": changed })),
        OutputFormat::Text => {
            println!(
                "{} {} of {} vouchers set to {}",
                "✓".green().bold(),
                changed,
                args.numbers.len(),
                status_label(args.status)
            );
            Ok(())
        }
    }
}

fn cmd_reindex(config: ValeConfig, format: OutputFormat) -> anyhow::Result<()> {
    let vales = open(config)?;
    let report = vales.reindex()?;
    if format == OutputFormat::Json {
        return print_json(&json!({
            "added": report.added_numbers,
            "skipped": report.skipped,
            "orphans": report.orphans,
            "conflicts": report.conflicts,
        }));
    }
    println!(
        "{} Reindex: {} added, {} skipped",
        "✓".green().bold(),
        report.added.to_string().bold(),
        report.skipped
    );
    for orphan in &report.orphans {
        println!("  {} {}", "orphan:".yellow(), orphan);
    }
    for conflict in &report.conflicts {
        println!("  {} {}", "conflict:".red(), conflict);
    }
    Ok(())
}

fn cmd_verify(config: ValeConfig, format: OutputFormat) -> anyhow::Result<()> {
    let vales = open(config)?;
    let report = vales.verify()?;
    if format == OutputFormat::Json {
        return print_json(&json!({
            "dangling": report.dangling,
            "broken_sidecars": report.broken_sidecars,
            "item_count_drift": report.item_count_drift,
        }));
    }
    if report.is_clean() {
        println!("{} Index matches the artifact directory", "✓".green().bold());
        return Ok(());
    }
    for n in &report.dangling {
        println!("  {} #{} artifact missing", "✗".red(), n);
    }
    for n in &report.broken_sidecars {
        println!("  {} #{} sidecar missing or unreadable", "✗".red(), n);
    }
    for (n, cached, actual) in &report.item_count_drift {
        println!("  {} #{} item count {} in index, {} in sidecar", "!".yellow(), n, cached, actual);
    }
    Ok(())
}

fn print_consolidation(consolidation: &Consolidation) {
    for line in &consolidation.lines {
        println!(
            "  {}  x{}  {}",
            line.key,
            line.quantity.to_string().bold(),
            line.origins_label().dimmed()
        );
    }
    for missing in &consolidation.missing_structured {
        println!("  {} #{} {}", "missing:".yellow(), missing.number, missing.reason);
    }
    for n in &consolidation.unknown {
        println!("  {} #{}", "unknown:".red(), n);
    }
}

fn cmd_consolidate(config: ValeConfig, format: OutputFormat, args: ConsolidateArgs) -> anyhow::Result<()> {
    let vales = open(config)?;

    if !args.register {
        let consolidation = vales.consolidate(&args.numbers)?;
        if format == OutputFormat::Json {
            return print_json(&consolidation);
        }
        println!(
            "{} {} vouchers, {} lines, {} units",
            "Consolidated".bold(),
            consolidation.included.len(),
            consolidation.lines.len(),
            consolidation
                .total_quantity()
                .map_or_else(|| "overflowing".to_string(), |total| total.to_string())
        );
        print_consolidation(&consolidation);
        return Ok(());
    }

    let renderer: Option<&dyn Renderer> = match args.render {
        Some(RenderFormat::Text) => Some(&TextRenderer),
        None => None,
    };
    let unified = vales.consolidate_and_register(&args.numbers, renderer)?;
    if format == OutputFormat::Json {
        return print_json(&json!({
            "record": unified.record,
            "consolidation": unified.consolidation,
            "backend": unified.merge.as_ref().map(|m| m.backend.clone()),
        }));
    }
    println!("{} Unified voucher registered", "✓".green().bold());
    println!("  {}", record_line(&unified.record));
    if let Some(merge) = &unified.merge {
        println!("  Merged with: {}", merge.backend.cyan());
    }
    if let Some(consolidation) = &unified.consolidation {
        print_consolidation(consolidation);
    }
    Ok(())
}

fn cmd_merge(config: ValeConfig, format: OutputFormat, args: MergeArgs) -> anyhow::Result<()> {
    let chain = MergeChain::from_config(&config.merge)?;
    let outcome = chain.merge_with_fallback(&args.inputs, &args.output)?;
    if format == OutputFormat::Json {
        return print_json(&json!({
            "output": args.output,
            "backend": outcome.backend,
            "attempts": outcome.attempts,
        }));
    }
    for attempt in outcome.attempts.iter().filter(|a| !a.succeeded) {
        println!(
            "  {} {}: {}",
            "skipped".yellow(),
            attempt.backend,
            attempt.reason.as_deref().unwrap_or("")
        );
    }
    println!(
        "{} Merged {} files into {} with {}",
        "✓".green().bold(),
        args.inputs.len(),
        args.output.display().to_string().bold(),
        outcome.backend.cyan()
    );
    Ok(())
}
