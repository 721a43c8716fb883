//! Human-readable output for the hopper CLI.

use chrono::{DateTime, Utc};

use hopper_core::item::short_id as core_short_id;
use hopper_core::skills::{FileAction, InitReport};
use hopper_core::Item;

const SNIPPET_LENGTH: usize = 80;

pub fn short_id(id: &str) -> &str {
    core_short_id(id)
}

pub fn relative_time(then: DateTime<Utc>) -> String {
    relative_time_from(then, Utc::now())
}

pub fn relative_time_from(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let minutes = (end - start).num_minutes();
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {rest}m")
    }
}

/// Description cut to 80 characters with an ellipsis when it was longer.
pub fn snippet(description: &str) -> String {
    if description.chars().count() > SNIPPET_LENGTH {
        let cut: String = description.chars().take(SNIPPET_LENGTH).collect();
        format!("{}...", cut.trim())
    } else {
        description.to_string()
    }
}

pub fn render_item_detail(item: &Item) -> String {
    let mut lines = vec![
        format!("ID:          {}", short_id(&item.id)),
        format!("Title:       {}", item.title),
        format!("Status:      {}", item.status),
        format!("Created:     {}", item.created_at.to_rfc3339()),
    ];
    if let Some(at) = item.claimed_at {
        lines.push(format!("Claimed:     {}", at.to_rfc3339()));
    }
    if let Some(by) = &item.claimed_by {
        lines.push(format!("Claimed by:  {by}"));
    }
    if let Some(at) = item.completed_at {
        lines.push(format!("Completed:   {}", at.to_rfc3339()));
    }
    if let Some(by) = &item.completed_by {
        lines.push(format!("Completed by: {by}"));
    }
    if let Some(at) = item.cancelled_at {
        lines.push(format!("Cancelled:   {}", at.to_rfc3339()));
    }
    if let Some(dir) = &item.working_dir {
        lines.push(format!("Directory:   {dir}"));
    }
    if let Some(reason) = &item.requeue_reason {
        lines.push(format!("Requeue reason: {reason}"));
    }
    if let Some(by) = &item.requeued_by {
        lines.push(format!("Requeued by: {by}"));
    }
    lines.push(String::new());
    lines.push("Description:".to_string());
    lines.push(format!("  {}", item.description));
    if let Some(result) = &item.result {
        lines.push(String::new());
        lines.push("Result:".to_string());
        lines.push(format!("  {result}"));
    }
    lines.join("\n")
}

pub fn render_item_list(items: &[Item]) -> String {
    render_item_list_at(items, Utc::now())
}

pub fn render_item_list_at(items: &[Item], now: DateTime<Utc>) -> String {
    if items.is_empty() {
        return "Queue is empty.".to_string();
    }
    let mut lines = Vec::new();
    for item in items {
        lines.push(format!(
            "  {}  [{}] {} {}",
            item.title,
            item.status,
            short_id(&item.id),
            relative_time_from(item.created_at, now)
        ));
        lines.push(format!("    {}", snippet(&item.description)));
        lines.push(String::new());
    }
    lines.join("\n")
}

pub fn render_init_report(report: &InitReport) -> String {
    let mut lines = vec![format!("\nHopper v{} skill files\n", report.version)];
    for file in &report.files {
        let (icon, label) = match file.action {
            FileAction::Created => ("+", "Created"),
            FileAction::Updated => ("~", "Updated"),
            FileAction::UpToDate => ("=", "Up to date"),
        };
        lines.push(format!("  {icon} {} ({label})", file.path));
    }
    lines.push(format!("\n{}", report.summary()));
    lines.join("\n")
}
