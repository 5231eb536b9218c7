use console::style;

use crate::pipeline::GenerationReport;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Key/value line inside a section
    pub fn field(&self, key: &str, value: &str) {
        println!("  {:<14} {}", style(key).dim(), value);
    }

    pub fn report(&self, report: &GenerationReport, list_files: bool) {
        self.section("Generation");
        self.field("Run", &report.run_id);
        self.field("Format", &report.format.to_string());
        self.field("Source sets", &report.source_sets.join(", "));
        self.field("Pages", &report.pages.to_string());
        self.field("Files", &report.files.len().to_string());
        self.field(
            "Duration",
            &format!(
                "{}ms",
                (report.finished_at - report.started_at).num_milliseconds()
            ),
        );

        if list_files {
            self.section("Files");
            for file in &report.files {
                println!(
                    "  {} {}",
                    file.path,
                    style(format!("({} bytes, {})", file.bytes, &file.sha256[..12])).dim()
                );
            }
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
