use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;

pub const CONFIG_TEMPLATE: &str = r#"# qn configuration
#
# Every setting is optional; the values below are the defaults.
# Environment variables override this file, e.g. QN_SERVER__PORT=9000.

default_topic = "AI Agents"

# ── Provider ─────────────────────────────────────────────────────
# Any OpenAI-compatible /chat/completions endpoint. The default points
# at a local Ollama.

[provider]
# api_key = "sk-..."              # or set OPENAI_API_KEY env var
base_url = "http://localhost:11434/v1"
model = "llama3.1"
# temperature = 0.7

# [provider.parameters]
# keep_alive = "5m"

# ── Search ───────────────────────────────────────────────────────

[search]
max_results = 3
timeout_secs = 15
safe_search = false
# region = "us-en"

# ── Pipeline ─────────────────────────────────────────────────────

[pipeline]
# Pass search hits through the searcher prompt before synthesis.
refine_search = false

# ── Web page ─────────────────────────────────────────────────────

[server]
host = "127.0.0.1"
port = 3000

# ── Agents ───────────────────────────────────────────────────────
# Override the built-in prompts: searcher, synthesizer, summarizer.

# [agents.summarizer]
# instructions = "Summarize in three sentences."
# model = "qwen3"
# temperature = 0.2
"#;

pub fn run() -> Result<()> {
    let config_path = Config::config_path()?;

    if config_path.exists() {
        println!("Existing config file found:");
        println!("  {}", config_path.display());
        print!("\nOverwrite? (The existing file will be backed up) [y/N] ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Setup cancelled.");
            return Ok(());
        }
    }

    if let Some(backup) = write_template(&config_path)? {
        println!("  Backed up to {}", backup.display());
    }
    println!("Created {}", config_path.display());

    println!("\nNext steps:");
    println!("  1. Start Ollama:       ollama pull llama3.1 && ollama serve");
    println!("  2. Open the web page:  qn serve");
    println!("  3. Or run once:        qn run \"AI Agents\"");

    Ok(())
}

/// Write the template to `path`, backing up any existing file first.
/// Returns the backup path when one was made.
pub fn write_template(path: &Path) -> Result<Option<PathBuf>> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    }

    let backup = if path.exists() {
        Some(backup_file(path)?)
    } else {
        None
    };

    std::fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(backup)
}

/// Move a file to <name>.bak, appending a timestamp if .bak already exists.
fn backup_file(path: &Path) -> Result<PathBuf> {
    let mut backup = path.with_extension("toml.bak");

    if backup.exists() {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        backup = path.with_extension(format!("toml.bak.{}", timestamp));
    }

    std::fs::rename(path, &backup).with_context(|| {
        format!("Failed to back up {} to {}", path.display(), backup.display())
    })?;

    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_valid_config() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.default_topic, "AI Agents");
        assert_eq!(config.provider.model, "llama3.1");
        assert_eq!(config.search.max_results, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_write_template_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qn").join("config.toml");

        let backup = write_template(&path).unwrap();
        assert!(backup.is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }

    #[test]
    fn test_write_template_backs_up_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_topic = \"Mine\"\n").unwrap();

        let backup = write_template(&path).unwrap().unwrap();
        assert_eq!(backup, dir.path().join("config.toml.bak"));
        assert_eq!(
            std::fs::read_to_string(&backup).unwrap(),
            "default_topic = \"Mine\"\n"
        );

        // a second run keeps the first backup and adds a timestamped one
        let second = write_template(&path).unwrap().unwrap();
        assert_ne!(second, backup);
        assert!(backup.exists());
        assert!(second.exists());
    }
}
