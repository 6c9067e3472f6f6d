use std::fmt;
use std::path::PathBuf;

use qapps_client::CollectionStats;
use qapps_export::ExportFormat;

/// Totals and artifacts of a finished run, printed to stdout
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub region: String,
    pub account_id: Option<String>,
    pub applications: usize,
    pub stats: CollectionStats,
    /// Sum of `user_count` over items with usage metadata
    pub total_users: i64,
    pub rows: usize,
    pub written: Vec<(ExportFormat, PathBuf)>,
    pub warnings: Vec<String>,
}

impl RunSummary {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Q Apps export summary")?;
        writeln!(f, "{}", "=".repeat(40))?;
        writeln!(
            f,
            "Account:              {}",
            self.account_id.as_deref().unwrap_or("unknown")
        )?;
        writeln!(f, "Region:               {}", self.region)?;
        writeln!(f, "Applications:         {}", self.applications)?;
        writeln!(f, "Q Apps:               {}", self.stats.items)?;
        writeln!(f, "  with detail:        {}", self.stats.with_detail)?;
        writeln!(f, "  summary only:       {}", self.stats.summary_only)?;
        writeln!(f, "Total users:          {}", self.total_users)?;
        writeln!(f, "Rows exported:        {}", self.rows)?;

        if self.stats.auth_denied > 0 {
            writeln!(
                f,
                "\n{} Q App(s) restrict usage details to their own users; those rows carry summary fields only.",
                self.stats.auth_denied
            )?;
        }

        writeln!(f, "\nFiles:")?;
        for (format, path) in &self.written {
            writeln!(f, "  {:<5} {}", format.to_string(), path.display())?;
        }

        if self.has_warnings() {
            writeln!(f, "\nWarnings ({}):", self.warnings.len())?;
            for warning in &self.warnings {
                writeln!(f, "  - {}", warning)?;
            }
        }
        Ok(())
    }
}
