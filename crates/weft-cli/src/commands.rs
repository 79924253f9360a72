//! The analyze command.

use std::io::Write;
use std::path::{Component, Path};
use std::time::Instant;

use tracing::{debug, info};
use weft_analyzer::{Analyzer, Document};
use weft_core::FsLoader;

use crate::cli::Cli;
use crate::config::CliConfig;
use crate::error::{CliError, Result};
use crate::output::Metadata;
use crate::ui;

/// Run the CLI: analyze, then print the metadata JSON on stdout.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = CliConfig::load(&cli)?;
    if !config.root().is_dir() {
        return Err(CliError::RootNotFound(config.root().to_path_buf()));
    }
    debug!(root = %config.root().display(), "Loaded configuration");

    let loader = FsLoader::new(config.root()).with_ignored_dirs(
        config
            .exclude_dirs
            .iter()
            .chain(&config.component_dirs)
            .cloned(),
    );
    let analyzer = Analyzer::builder()
        .loader(loader)
        .config(config.analyzer_config())
        .build();
    let options = config.query_options();
    let started = Instant::now();

    let json = if cli.files.is_empty() {
        let package = analyzer.analyze_package().await?;
        info!(documents = package.len(), "Analyzed package");
        let metadata = Metadata::collect(
            package.get_features(options),
            package.get_warnings(options),
            &config.filter_dirs,
        );
        finish(&cli, &config, &metadata, started)?
    } else {
        let documents = analyze_files(&analyzer, config.root(), &cli.files).await?;
        info!(documents = documents.len(), "Analyzed files");
        let metadata = Metadata::collect(
            documents
                .iter()
                .flat_map(|document| document.get_features(options)),
            documents
                .iter()
                .flat_map(|document| document.get_warnings(options)),
            &config.filter_dirs,
        );
        finish(&cli, &config, &metadata, started)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    stdout.flush()?;
    Ok(())
}

fn finish(cli: &Cli, config: &CliConfig, metadata: &Metadata<'_>, started: Instant) -> Result<String> {
    if !cli.quiet {
        ui::print_summary(metadata, started.elapsed());
    }
    Ok(metadata.to_json(config.pretty)?)
}

async fn analyze_files(analyzer: &Analyzer, root: &Path, files: &[String]) -> Result<Vec<Document>> {
    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        let url = package_path(root, file)?;
        debug!(file = %file, url = %url, "Analyzing file");
        documents.push(analyzer.analyze(&url).await?);
    }
    Ok(documents)
}

/// The package-relative URL for a file argument.
///
/// Relative arguments are taken relative to the root; absolute ones must lie
/// inside it.
pub fn package_path(root: &Path, file: &str) -> Result<String> {
    let path = Path::new(file);
    let relative = if path.is_absolute() {
        let root = root.canonicalize()?;
        let path = path.canonicalize().map_err(|_| {
            CliError::InvalidArgument(format!("{file} does not exist"))
        })?;
        path.strip_prefix(&root)
            .map_err(|_| {
                CliError::InvalidArgument(format!(
                    "{file} is outside the package root {}",
                    root.display()
                ))
            })?
            .to_path_buf()
    } else {
        path.to_path_buf()
    };

    let segments: Vec<String> = relative
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_paths_pass_through() {
        let root = Path::new("pkg");
        assert_eq!(package_path(root, "src/app.js").unwrap(), "src/app.js");
        assert_eq!(package_path(root, "./src/app.js").unwrap(), "src/app.js");
    }

    #[test]
    fn test_absolute_paths_inside_root() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src")).unwrap();
        std::fs::write(temp.path().join("src/app.js"), "").unwrap();

        let file = temp.path().join("src/app.js");
        assert_eq!(
            package_path(temp.path(), file.to_str().unwrap()).unwrap(),
            "src/app.js"
        );
    }

    #[test]
    fn test_absolute_paths_outside_root() {
        let root = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        std::fs::write(other.path().join("x.js"), "").unwrap();

        let file = other.path().join("x.js");
        let error = package_path(root.path(), file.to_str().unwrap()).unwrap_err();
        assert!(matches!(error, CliError::InvalidArgument(_)));
    }
}
