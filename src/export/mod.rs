use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::duplicates::{DuplicateGroup, DuplicateReport, Strategy};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ExportFormat::Text),
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// File name used when the output path is a directory, e.g.
/// `duplicates-oshash.csv`.
pub fn default_file_name(strategy: Strategy, format: ExportFormat) -> String {
    format!("duplicates-{}.{}", strategy.slug(), format.extension())
}

#[derive(Debug, Serialize)]
struct ExportedReport<'r, 'a> {
    strategy: Strategy,
    label: &'static str,
    generated_at: DateTime<Utc>,
    group_count: usize,
    total_grouped_scene_count: usize,
    groups: &'r [DuplicateGroup<'a>],
}

/// Write a report in the given format. Returns the number of group entries
/// written.
pub fn export_report<W: Write>(report: &DuplicateReport<'_>, format: ExportFormat, out: W) -> Result<usize> {
    match format {
        ExportFormat::Text => export_text(report, out)?,
        ExportFormat::Json => export_json(report, out)?,
        ExportFormat::Csv => export_csv(report, out)?,
    }

    Ok(report.total_grouped_scene_count)
}

fn export_json<W: Write>(report: &DuplicateReport<'_>, mut out: W) -> Result<()> {
    let exported = ExportedReport {
        strategy: report.strategy,
        label: report.label(),
        generated_at: Utc::now(),
        group_count: report.group_count,
        total_grouped_scene_count: report.total_grouped_scene_count,
        groups: &report.groups,
    };

    serde_json::to_writer_pretty(&mut out, &exported)?;
    writeln!(out)?;
    Ok(())
}

fn export_csv<W: Write>(report: &DuplicateReport<'_>, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record([
        "group_key",
        "scene_id",
        "title",
        "file_path",
        "file_size",
        "duration",
        "video_codec",
    ])?;

    for group in &report.groups {
        for scene in &group.scenes {
            let file = scene.files.first();
            let size = file.and_then(|f| f.size).map(|v| v.to_string()).unwrap_or_default();
            let duration = file
                .and_then(|f| f.duration)
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default();

            wtr.write_record([
                group.key.as_str(),
                scene.id.as_str(),
                scene.title.as_str(),
                scene.primary_path().unwrap_or(""),
                size.as_str(),
                duration.as_str(),
                file.and_then(|f| f.video_codec.as_deref()).unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

fn export_text<W: Write>(report: &DuplicateReport<'_>, mut out: W) -> Result<()> {
    writeln!(out, "Duplicates by {}", report.label())?;
    writeln!(
        out,
        "{} groups, {} scenes",
        report.group_count, report.total_grouped_scene_count
    )?;

    if report.is_empty() {
        writeln!(out, "No duplicates found.")?;
        return Ok(());
    }

    for group in &report.groups {
        writeln!(out)?;
        writeln!(out, "== {} ({})", group.key, group.len())?;
        for scene in &group.scenes {
            let title: &str = if scene.title.is_empty() { "(untitled)" } else { &scene.title };
            match scene.primary_path() {
                Some(path) => writeln!(out, "  [{}] {}  {}", scene.id, title, path)?,
                None => writeln!(out, "  [{}] {}", scene.id, title)?,
            }
        }
    }

    Ok(())
}
