//! Colored output helpers for CLI
//!
//! Status lines for the batch commands. The interactive chat loop writes
//! plain text so that it stays readable when piped.

use owo_colors::OwoColorize;

use crate::pipeline::PipelineReport;
use crate::scraper::ScrapeOutcome;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the one-line groundwork banner
    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n  {} {}\n",
                "groundwork".bright_cyan().bold(),
                version.dimmed()
            );
        } else {
            println!("\n  groundwork {}\n", version);
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a step message (for multi-step commands)
    pub fn step(&self, step_num: u32, total: u32, message: &str) {
        if self.colored {
            println!(
                "  {} {}",
                format!("[{}/{}]", step_num, total).dimmed(),
                message.bright_white()
            );
        } else {
            println!("  [{}/{}] {}", step_num, total, message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Per-subject scrape result, followed by the summary line.
    pub fn scrape_summary(&self, outcomes: &[ScrapeOutcome]) {
        for outcome in outcomes {
            self.header(&format!("Subject: {}", outcome.subject));
            match &outcome.result {
                Ok(page) => {
                    self.kv("Resolved page", &page.title);
                    self.kv("URL", &page.url);
                    self.kv("Saved text to", &page.path.display().to_string());
                }
                Err(e) => self.error(&e.to_string()),
            }
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        let summary = format!(
            "Scrape summary: {} succeeded, {} failed.",
            outcomes.len() - failed,
            failed
        );
        println!();
        if failed == 0 {
            self.success(&summary);
        } else {
            self.warning(&summary);
        }
    }

    pub fn pipeline_report(&self, report: &PipelineReport, db_path: &str) {
        self.success(&format!(
            "Ingested {} chunks from {} documents",
            report.ingested, report.documents
        ));
        self.kv("Model", &report.model);
        self.kv("Dimensions", &report.embedding_dim.to_string());
        self.kv("Database", db_path);
    }
}
