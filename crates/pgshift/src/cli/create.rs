use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use console::style;
use pgshift_core::error::ShiftError;
use pgshift_runtime::migrations::{DOWN_FILE, UP_FILE};

use super::template::{render, DOWN_TEMPLATE, UP_TEMPLATE};
use super::Context;

/// Scaffold a new migration directory.
#[derive(Parser)]
pub struct CreateCommand {
    /// Short description, e.g. `add users table`.
    #[arg(required = true, num_args = 1..)]
    pub name: Vec<String>,
}

impl CreateCommand {
    pub fn execute(self, ctx: &Context) -> Result<ExitCode> {
        ctx.store().ensure_exists()?;

        let dir = create_migration(&ctx.migrations_dir, &self.name.join(" "), Utc::now())?;
        let name = dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        println!();
        println!("  {} Created migration {}", style("✓").green(), style(name).cyan());
        println!("    {}", style(dir.join(UP_FILE).display()).dim());
        println!("    {}", style(dir.join(DOWN_FILE).display()).dim());
        println!();
        println!("  Edit up.sql, then run {}", style("pgshift up").cyan());
        println!();

        Ok(ExitCode::SUCCESS)
    }
}

/// Lower snake case: runs of non-alphanumerics become one `_`.
pub fn normalize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

/// Create `<root>/<YYYYMMDDHHMMSS>_<slug>/` with templated up and down scripts.
pub fn create_migration(root: &Path, raw_name: &str, now: DateTime<Utc>) -> Result<PathBuf> {
    let slug = normalize_slug(raw_name);
    if slug.is_empty() {
        return Err(ShiftError::InvalidArgument(format!(
            "Migration name '{}' has no letters or digits",
            raw_name
        ))
        .into());
    }

    let name = format!("{}_{}", now.format("%Y%m%d%H%M%S"), slug);
    let dir = root.join(&name);
    if dir.exists() {
        bail!("Migration already exists: {}", dir.display());
    }

    std::fs::create_dir(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let created = now.to_rfc3339();
    let vars = crate::template_vars!("name" => name.as_str(), "created" => created.as_str());
    std::fs::write(dir.join(UP_FILE), render(UP_TEMPLATE, &vars))?;
    std::fs::write(dir.join(DOWN_FILE), render(DOWN_TEMPLATE, &vars))?;

    Ok(dir)
}
