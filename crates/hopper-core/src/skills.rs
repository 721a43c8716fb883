//! Installs the agent skill documents shipped with hopper into a project.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

const COORDINATOR_SKILL_MARKDOWN: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../skills/hopper-coordinator/SKILL.md"
));
const WORKER_SKILL_MARKDOWN: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../skills/hopper-worker/SKILL.md"
));

#[derive(Debug, Clone, Copy)]
pub struct SkillFile {
    pub relative_path: &'static str,
    pub content: &'static str,
}

pub fn embedded_skill_files() -> [SkillFile; 2] {
    [
        SkillFile {
            relative_path: ".claude/skills/hopper-coordinator/SKILL.md",
            content: COORDINATOR_SKILL_MARKDOWN,
        },
        SkillFile {
            relative_path: ".claude/skills/hopper-worker/SKILL.md",
            content: WORKER_SKILL_MARKDOWN,
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileAction {
    Created,
    Updated,
    UpToDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    pub path: String,
    pub action: FileAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub success: bool,
    pub message: String,
    pub version: String,
    pub files: Vec<FileResult>,
}

impl InitReport {
    fn count(&self, action: FileAction) -> usize {
        self.files.iter().filter(|file| file.action == action).count()
    }

    /// e.g. "1 created, 1 up to date"
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        let created = self.count(FileAction::Created);
        let updated = self.count(FileAction::Updated);
        let up_to_date = self.count(FileAction::UpToDate);
        if created > 0 {
            parts.push(format!("{created} created"));
        }
        if updated > 0 {
            parts.push(format!("{updated} updated"));
        }
        if up_to_date > 0 {
            parts.push(format!("{up_to_date} up to date"));
        }
        parts.join(", ")
    }
}

/// Insert `hopper-version: <version>` just before the closing front-matter fence.
pub fn stamp_version(content: &str, version: &str) -> String {
    match content.get(1..).and_then(|rest| rest.find("\n---")) {
        Some(offset) => {
            let closing = offset + 1;
            format!(
                "{}\nhopper-version: {}{}",
                &content[..closing],
                version,
                &content[closing..]
            )
        }
        None => content.to_string(),
    }
}

/// Remove version stamps, including the older `<!-- hopper vX -->` first line.
pub fn strip_version_info(content: &str) -> String {
    let mut body = content;
    if body.starts_with("<!-- hopper v") {
        if let Some(newline) = body.find('\n') {
            body = &body[newline + 1..];
        }
    }
    let re = Regex::new(r"\nhopper-version: [^\n]+").expect("regex");
    re.replace_all(body, "").to_string()
}

pub fn install_skills(project_dir: &Path, version: &str) -> Result<InitReport> {
    let mut files = Vec::new();
    for skill in embedded_skill_files() {
        let path: PathBuf = project_dir.join(skill.relative_path);
        let stamped = stamp_version(skill.content, version);
        let action = if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            write_skill(&path, &stamped)?;
            FileAction::Created
        } else {
            let existing = fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?;
            if strip_version_info(&existing) == skill.content {
                if existing != stamped {
                    write_skill(&path, &stamped)?;
                }
                FileAction::UpToDate
            } else {
                write_skill(&path, &stamped)?;
                FileAction::Updated
            }
        };
        files.push(FileResult {
            path: skill.relative_path.to_string(),
            action,
        });
    }

    let mut report = InitReport {
        success: true,
        message: String::new(),
        version: version.to_string(),
        files,
    };
    report.message = format!("Skill files installed: {}", report.summary());
    Ok(report)
}

fn write_skill(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOC: &str = "---\nname: demo\n---\n\nBody\n";

    #[test]
    fn stamp_inserts_version_into_front_matter() {
        assert_eq!(
            stamp_version(DOC, "1.2.3"),
            "---\nname: demo\nhopper-version: 1.2.3\n---\n\nBody\n"
        );
        assert_eq!(stamp_version("no front matter", "1.2.3"), "no front matter");
    }

    #[test]
    fn strip_removes_new_and_legacy_stamps() {
        assert_eq!(strip_version_info(&stamp_version(DOC, "9.9.9")), DOC);
        let legacy = format!("<!-- hopper v0.1.0 -->\n{DOC}");
        assert_eq!(strip_version_info(&legacy), DOC);
    }

    #[test]
    fn install_creates_then_reports_up_to_date() {
        let temp = TempDir::new().expect("tempdir");
        let first = install_skills(temp.path(), "0.3.1").expect("install");
        assert!(first.files.iter().all(|f| f.action == FileAction::Created));
        assert_eq!(first.summary(), "2 created");

        let installed = temp
            .path()
            .join(".claude/skills/hopper-worker/SKILL.md");
        let text = fs::read_to_string(&installed).expect("read");
        assert!(text.contains("hopper-version: 0.3.1"));

        let second = install_skills(temp.path(), "0.4.0").expect("reinstall");
        assert!(second.files.iter().all(|f| f.action == FileAction::UpToDate));
        let text = fs::read_to_string(&installed).expect("read");
        assert!(text.contains("hopper-version: 0.4.0"));
    }

    #[test]
    fn install_overwrites_edited_files() {
        let temp = TempDir::new().expect("tempdir");
        install_skills(temp.path(), "0.3.1").expect("install");
        let path = temp
            .path()
            .join(".claude/skills/hopper-coordinator/SKILL.md");
        fs::write(&path, "locally edited\n").expect("edit");

        let report = install_skills(temp.path(), "0.3.1").expect("reinstall");
        assert_eq!(report.summary(), "1 updated, 1 up to date");
        assert_eq!(report.message, "Skill files installed: 1 updated, 1 up to date");
    }
}
