//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Application identity
pub mod app {
    pub const NAME: &str = "weavedoc";

    /// Prefix of configuration environment variables
    pub const ENV_PREFIX: &str = "WEAVEDOC_";

    /// Project-level configuration directory
    pub const PROJECT_DIR: &str = ".weavedoc";
}

/// Names of the bundled plugins
pub mod plugins {
    /// Declares the pipeline points; always loaded
    pub const CORE: &str = "core";

    /// Default implementations of every pipeline stage
    pub const BASE: &str = "base";

    /// In-memory output writer
    pub const DRY_RUN: &str = "dry-run";
}

/// Generation pipeline tuning
pub mod pipeline {
    /// Maximum source sets translated at once
    pub const TRANSLATION_CONCURRENCY: usize = 4;

    /// Maximum files written at once
    pub const WRITE_CONCURRENCY: usize = 16;
}

/// Static resources installed next to HTML pages
pub mod resources {
    pub const STYLE_PATH: &str = "styles/style.css";

    pub const SCRIPT_PATH: &str = "scripts/navigation.js";

    pub const STYLE: &str = r#"body { font-family: sans-serif; margin: 0 auto; max-width: 960px; }
nav ul { list-style: none; padding-left: 1em; }
pre.signature { background: #f5f5f5; padding: 0.5em; }
.source-sets { color: #777; font-size: 0.8em; }
"#;

    pub const SCRIPT: &str = r#"document.addEventListener("DOMContentLoaded", () => {
  for (const link of document.querySelectorAll("nav a")) {
    if (link.href === window.location.href) link.classList.add("active");
  }
});
"#;
}
