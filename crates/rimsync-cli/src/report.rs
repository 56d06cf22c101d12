use owo_colors::OwoColorize;
use rimsync_domain::{DiffSummary, FileReport, FileStatus, Issue, PruneReport, RunReport, RunStatus};

use crate::{ui_warn, OutputFormat};

fn status_label(status: FileStatus, use_color: bool) -> String {
    let s = status.as_str();
    if !use_color {
        return s.to_string();
    }
    match status {
        FileStatus::Created => s.green().to_string(),
        FileStatus::Updated => s.yellow().to_string(),
        FileStatus::Unchanged => s.dimmed().to_string(),
        FileStatus::Skipped => s.magenta().to_string(),
    }
}

/// One line per processed file.
pub fn file_line(file: &FileReport, use_color: bool) -> String {
    let mut line = format!(
        "{:<9} {}  ({})",
        status_label(file.status, use_color),
        file.target,
        file.owner
    );
    if file.conflict {
        let tag = match &file.resolution {
            Some(r) => format!(" [conflict: {r}]"),
            None => " [conflict]".to_string(),
        };
        if use_color {
            line.push_str(&tag.red().to_string());
        } else {
            line.push_str(&tag);
        }
    }
    if file.summary.has_changes() {
        line.push_str(&format!("  {}", summary_text(&file.summary)));
    }
    line
}

pub fn summary_text(s: &DiffSummary) -> String {
    let mut text = format!(
        "+{} -{} ={} ~{} placeholders:{}",
        s.added, s.removed, s.unchanged, s.retranslated, s.placeholder_filled
    );
    if s.retained > 0 {
        text.push_str(&format!(" (kept unused: {})", s.retained));
    }
    text
}

pub fn print_issues(issues: &[Issue]) {
    for issue in issues {
        ui_warn!("{}: {} ({})", issue.kind, issue.message, issue.path);
    }
}

fn status_text(status: RunStatus, use_color: bool) -> String {
    let s = status.as_str();
    if !use_color {
        return s.to_string();
    }
    match status {
        RunStatus::Completed => s.green().to_string(),
        RunStatus::CompletedWithErrors => s.yellow().to_string(),
        RunStatus::Cancelled => s.red().to_string(),
    }
}

/// Print a run report. In text mode `files_printed` says whether file
/// lines were already streamed while the run was going.
pub fn print_run(report: &RunReport, format: OutputFormat, use_color: bool, files_printed: bool) -> color_eyre::Result<()> {
    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), report)?;
        println!();
        return Ok(());
    }
    if !files_printed {
        for file in &report.files {
            println!("{}", file_line(file, use_color));
        }
    }
    for orphan in &report.orphans {
        println!("orphan    {orphan}");
    }
    print_issues(&report.issues);
    println!(
        "{}: {} file(s), {}, {} issue(s)",
        status_text(report.status, use_color),
        report.files.len(),
        summary_text(&report.summary),
        report.issues.len()
    );
    Ok(())
}

pub fn print_prune(report: &PruneReport, format: OutputFormat) -> color_eyre::Result<()> {
    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), report)?;
        println!();
        return Ok(());
    }
    for file in &report.files {
        println!("{}  -{} kept {}", file.path, file.removed.len(), file.kept);
        for key in &file.removed {
            println!("    {key}");
        }
    }
    print_issues(&report.issues);
    let verb = if report.dry_run { "would remove" } else { "removed" };
    println!("{verb} {} unused entr(ies) in {} file(s)", report.total_removed, report.files.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(status: FileStatus) -> FileReport {
        FileReport {
            owner: "MyMod:Keyed/Misc.xml".into(),
            mod_id: "MyMod".into(),
            submodule: None,
            category: "Keyed".into(),
            source: "src/Misc.xml".into(),
            target: "out/Misc.xml".into(),
            status,
            existed: false,
            conflict: false,
            resolution: None,
            summary: DiffSummary {
                added: 2,
                ..Default::default()
            },
            changes: Vec::new(),
        }
    }

    #[test]
    fn plain_file_line() {
        let line = file_line(&file(FileStatus::Created), false);
        assert_eq!(line, "created   out/Misc.xml  (MyMod:Keyed/Misc.xml)  +2 -0 =0 ~0 placeholders:0");
    }

    #[test]
    fn conflict_tag_shows_resolution() {
        let mut f = file(FileStatus::Skipped);
        f.conflict = true;
        f.resolution = Some("skip".into());
        f.summary = DiffSummary::default();
        assert!(file_line(&f, false).ends_with("[conflict: skip]"));
    }
}
