use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::NewsItem;

pub struct BriefingGenerator;

impl BriefingGenerator {
    fn format_date(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Title line, summary body, then every item as "title (source) — url"
    pub fn generate(summary: &str, items: &[NewsItem], date: NaiveDate) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "# Briefing Diário de Tecnologia — {}\n\n",
            Self::format_date(date)
        ));
        md.push_str(summary);
        md.push_str("\n\n");

        md.push_str("\n## Links das fontes\n");
        for item in items {
            md.push_str(&format!("\n- {}", item.link_line()));
        }
        md.push('\n');

        md
    }

    pub fn email_subject(date: NaiveDate) -> String {
        format!("Briefing Tech — {}", Self::format_date(date))
    }

    pub fn filename(date: NaiveDate) -> String {
        format!("briefing-{}.md", Self::format_date(date))
    }

    pub fn save(content: &str, output_dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;

        let filepath = output_dir.join(Self::filename(date));
        fs::write(&filepath, content).context("Failed to write briefing file")?;

        Ok(filepath)
    }
}
