//! Documentation, configuration and directory layout checks.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use super::{CheckContext, CheckOutcome, ProjectCheck};
use crate::error::{Error, Result};

const CONFIG_DIR: &str = "config";
const README: &str = "README.md";

/// Probe file written to confirm a directory accepts writes.
const WRITE_PROBE: &str = ".aprs-pi-write-probe";

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Expected station config files, when present, are regular files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigurationFiles;

#[async_trait]
impl ProjectCheck for ConfigurationFiles {
    fn name(&self) -> &'static str {
        "configuration-files"
    }

    fn description(&self) -> &'static str {
        "direwolf and beacon config files are regular files"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let config_dir = ctx.path(CONFIG_DIR);
        if !exists(&config_dir).await {
            return CheckOutcome::Passed;
        }

        let mut problems = Vec::new();
        for name in &ctx.config().config_files {
            if let Ok(meta) = tokio::fs::metadata(config_dir.join(name)).await {
                if !meta.is_file() {
                    problems.push(format!("Configuration file {name} is not a regular file"));
                }
            }
        }
        CheckOutcome::from_problems(problems)
    }
}

/// Every required document exists and has real content.
#[derive(Debug, Clone, Copy, Default)]
pub struct Documentation;

#[async_trait]
impl ProjectCheck for Documentation {
    fn name(&self) -> &'static str {
        "documentation"
    }

    fn description(&self) -> &'static str {
        "required documentation exists and is not empty"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let min_len = ctx.config().min_doc_length;
        let mut problems = Vec::new();

        for doc in &ctx.config().required_docs {
            match tokio::fs::read_to_string(ctx.path(doc)).await {
                Ok(content) if content.trim().chars().count() > min_len => {}
                Ok(_) => problems.push(format!(
                    "Documentation {doc} appears to be empty or too short"
                )),
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    problems.push(format!("Required documentation {doc} not found"));
                }
                Err(err) => problems.push(format!("cannot read {doc}: {err}")),
            }
        }
        CheckOutcome::from_problems(problems)
    }
}

/// The dashboard has its entry page and a complete script.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebInterface;

#[async_trait]
impl ProjectCheck for WebInterface {
    fn name(&self) -> &'static str {
        "web-interface"
    }

    fn description(&self) -> &'static str {
        "web dashboard has index.html and a complete dashboard.js"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let web = ctx.path("web");
        if !exists(&web).await {
            return CheckOutcome::Passed;
        }

        let mut problems = Vec::new();
        if !exists(&web.join("index.html")).await {
            problems.push("Web interface index.html not found".to_string());
        }
        if let Ok(script) = tokio::fs::read_to_string(web.join("js").join("dashboard.js")).await {
            if !script.contains("class") {
                problems.push("JavaScript file appears to be incomplete".to_string());
            }
        }
        CheckOutcome::from_problems(problems)
    }
}

/// A runtime directory exists (creating it if needed) and is writable.
#[derive(Debug, Clone, Copy)]
pub struct WritableDirectory {
    name: &'static str,
    description: &'static str,
    dir: &'static str,
    label: &'static str,
}

impl WritableDirectory {
    /// The `logs/` directory.
    #[must_use]
    pub fn logs() -> Self {
        Self {
            name: "log-directory",
            description: "logs/ exists and is writable",
            dir: "logs",
            label: "Logs",
        }
    }

    /// The `data/` directory.
    #[must_use]
    pub fn data() -> Self {
        Self {
            name: "data-directory",
            description: "data/ exists and is writable",
            dir: "data",
            label: "Data",
        }
    }

    async fn ensure_dir(path: &Path) -> Result<()> {
        if !exists(path).await {
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|source| Error::DirectoryCreate {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        Ok(())
    }

    async fn is_writable(path: &Path) -> bool {
        let probe = path.join(WRITE_PROBE);
        match tokio::fs::write(&probe, b"").await {
            Ok(()) => {
                let _ = tokio::fs::remove_file(&probe).await;
                true
            }
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ProjectCheck for WritableDirectory {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        let path = ctx.path(self.dir);
        if let Err(err) = Self::ensure_dir(&path).await {
            return CheckOutcome::failed(err.to_string());
        }
        let is_dir = tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir());
        if !is_dir {
            return CheckOutcome::failed(format!("{} directory is not a directory", self.label));
        }
        if !Self::is_writable(&path).await {
            return CheckOutcome::failed(format!("{} directory is not writable", self.label));
        }
        CheckOutcome::Passed
    }
}

fn markdown_link() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").expect("valid link regex"))
}

/// Markdown links in README.md have text and a target.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadmeLinks;

impl ReadmeLinks {
    /// Check markdown text, reporting 1-based line numbers.
    #[must_use]
    pub fn check_content(content: &str) -> CheckOutcome {
        let mut problems = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            for caps in markdown_link().captures_iter(line) {
                if caps[1].trim().is_empty() {
                    problems.push(format!("Empty link text at line {}", idx + 1));
                }
                if caps[2].trim().is_empty() {
                    problems.push(format!("Empty link URL at line {}", idx + 1));
                }
            }
        }
        CheckOutcome::from_problems(problems)
    }
}

#[async_trait]
impl ProjectCheck for ReadmeLinks {
    fn name(&self) -> &'static str {
        "readme-links"
    }

    fn description(&self) -> &'static str {
        "README.md links have text and a URL"
    }

    async fn run(&self, ctx: &CheckContext) -> CheckOutcome {
        match tokio::fs::read_to_string(ctx.path(README)).await {
            Ok(content) => Self::check_content(&content),
            // Missing docs are reported by `documentation`
            Err(_) => CheckOutcome::Passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChecksConfig;
    use std::fs;
    use tempfile::TempDir;

    fn ctx(dir: &TempDir) -> CheckContext {
        CheckContext::new(dir.path(), ChecksConfig::default())
    }

    fn long_doc() -> String {
        "Station notes. ".repeat(10)
    }

    #[tokio::test]
    async fn test_documentation_complete() {
        let dir = TempDir::new().unwrap();
        for doc in &ChecksConfig::default().required_docs {
            fs::write(dir.path().join(doc), long_doc()).unwrap();
        }
        assert_eq!(Documentation.run(&ctx(&dir)).await, CheckOutcome::Passed);
    }

    #[tokio::test]
    async fn test_documentation_missing_and_short() {
        let dir = TempDir::new().unwrap();
        for doc in &ChecksConfig::default().required_docs {
            fs::write(dir.path().join(doc), long_doc()).unwrap();
        }
        fs::remove_file(dir.path().join("SETUP_GUIDE.md")).unwrap();
        fs::write(dir.path().join("CONTRIBUTING.md"), "   TODO   \n").unwrap();

        let CheckOutcome::Failed { message } = Documentation.run(&ctx(&dir)).await else {
            panic!("expected failure");
        };
        assert!(message.contains("Required documentation SETUP_GUIDE.md not found"));
        assert!(message.contains("Documentation CONTRIBUTING.md appears to be empty or too short"));
        assert!(!message.contains("README.md"));
    }

    #[tokio::test]
    async fn test_documentation_length_is_strict() {
        let dir = TempDir::new().unwrap();
        let config = ChecksConfig {
            required_docs: vec!["README.md".to_string()],
            ..ChecksConfig::default()
        };
        fs::write(dir.path().join("README.md"), "x".repeat(100)).unwrap();
        let ctx = CheckContext::new(dir.path(), config);
        assert!(Documentation.run(&ctx).await.is_failure());

        fs::write(dir.path().join("README.md"), "x".repeat(101)).unwrap();
        assert_eq!(Documentation.run(&ctx).await, CheckOutcome::Passed);
    }

    #[tokio::test]
    async fn test_configuration_files() {
        let dir = TempDir::new().unwrap();
        assert_eq!(ConfigurationFiles.run(&ctx(&dir)).await, CheckOutcome::Passed);

        let config = dir.path().join(CONFIG_DIR);
        fs::create_dir(&config).unwrap();
        fs::write(config.join("direwolf.conf"), "MYCALL N0CALL\n").unwrap();
        assert_eq!(ConfigurationFiles.run(&ctx(&dir)).await, CheckOutcome::Passed);

        fs::create_dir(config.join("beacon.conf")).unwrap();
        assert_eq!(
            ConfigurationFiles.run(&ctx(&dir)).await,
            CheckOutcome::failed("Configuration file beacon.conf is not a regular file")
        );
    }

    #[tokio::test]
    async fn test_web_interface() {
        let dir = TempDir::new().unwrap();
        assert_eq!(WebInterface.run(&ctx(&dir)).await, CheckOutcome::Passed);

        let js = dir.path().join("web").join("js");
        fs::create_dir_all(&js).unwrap();
        fs::write(js.join("dashboard.js"), "const x = 1;\n").unwrap();
        assert_eq!(
            WebInterface.run(&ctx(&dir)).await,
            CheckOutcome::failed(
                "Web interface index.html not found; JavaScript file appears to be incomplete"
            )
        );

        fs::write(dir.path().join("web").join("index.html"), "<html></html>").unwrap();
        fs::write(js.join("dashboard.js"), "class Dashboard {}\n").unwrap();
        assert_eq!(WebInterface.run(&ctx(&dir)).await, CheckOutcome::Passed);
    }

    #[tokio::test]
    async fn test_writable_directory_created() {
        let dir = TempDir::new().unwrap();
        let check = WritableDirectory::logs();
        assert_eq!(check.name(), "log-directory");
        assert_eq!(check.run(&ctx(&dir)).await, CheckOutcome::Passed);
        assert!(dir.path().join("logs").is_dir());
        assert!(!dir.path().join("logs").join(WRITE_PROBE).exists());
    }

    #[tokio::test]
    async fn test_writable_directory_is_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data"), "not a dir").unwrap();
        assert_eq!(
            WritableDirectory::data().run(&ctx(&dir)).await,
            CheckOutcome::failed("Data directory is not a directory")
        );
    }

    #[test]
    fn test_readme_links() {
        let content = "# Station\n\nSee [setup](SETUP_GUIDE.md) and [API](API_DOCUMENTATION.md).\n";
        assert_eq!(ReadmeLinks::check_content(content), CheckOutcome::Passed);

        let content = "intro\n[ ](docs.md)\n[docs]()\n";
        assert_eq!(
            ReadmeLinks::check_content(content),
            CheckOutcome::failed("Empty link text at line 2; Empty link URL at line 3")
        );
    }

    #[tokio::test]
    async fn test_readme_links_without_readme() {
        let dir = TempDir::new().unwrap();
        assert_eq!(ReadmeLinks.run(&ctx(&dir)).await, CheckOutcome::Passed);
    }
}
