//! `unpress convert` command implementation.

use std::path::PathBuf;

use clap::Args;

use unpress_config::{CliSettings, Config};
use unpress_export::ExportReader;
use unpress_site::{ItemIndex, SiteError, SiteWriter, SkipReason, WriteOutcome};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Directory containing WordPress XML export files (overrides config).
    #[arg(short, long)]
    export_dir: Option<PathBuf>,

    /// Output directory for the generated site tree (overrides config).
    #[arg(short, long)]
    build_dir: Option<PathBuf>,

    /// Target markup format: markdown or html (overrides config).
    #[arg(long)]
    target_format: Option<String>,

    /// Download referenced images next to the output.
    #[arg(long)]
    download_images: bool,

    /// Path to configuration file (default: auto-discover unpress.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ConvertArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            export_dir: self.export_dir.clone(),
            build_dir: self.build_dir.clone(),
            target_format: self.target_format.clone(),
            download_images: self.download_images.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let reader = ExportReader::new(&config.taxonomies, &config.body)?;
        let mut writer = SiteWriter::new(&config)?;

        let pattern = config.input_resolved.export_dir.join("*.xml");
        let pattern = pattern.to_string_lossy();
        output.info(&format!("Looking for export files matching {pattern}"));

        let mut files = 0usize;
        let mut written = 0usize;
        let mut skipped = 0usize;
        let mut failed_files = 0usize;

        for entry in glob::glob(&pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    output.warning(&format!("Unreadable export path: {e}"));
                    continue;
                }
            };

            output.info(&format!("Reading {}", path.display()));
            let export = match reader.read_file(&path) {
                Ok(export) => export,
                Err(e) => {
                    output.error(&format!("Failed to parse {}: {e}", path.display()));
                    failed_files += 1;
                    continue;
                }
            };
            files += 1;

            let index = ItemIndex::new(&export.items);
            for item in &export.items {
                match writer.write_item(item, &export.header, &index) {
                    Ok(WriteOutcome::Written(_)) => {
                        written += 1;
                        output.dot();
                    }
                    Ok(WriteOutcome::Skipped(SkipReason::UnknownType)) => {
                        skipped += 1;
                        output.newline();
                        output.warning(&format!(
                            "Unknown item type \"{}\" on \"{}\"",
                            item.post_type, item.title
                        ));
                    }
                    Ok(WriteOutcome::Skipped(_)) => skipped += 1,
                    Err(e @ SiteError::InvalidWpId { .. }) => {
                        output.newline();
                        output.error(&format!("{e}; aborting this export file"));
                        break;
                    }
                    Err(e) => {
                        skipped += 1;
                        output.newline();
                        output.warning(&format!("Skipping \"{}\": {e}", item.title));
                    }
                }
            }
            output.newline();
        }

        output.success(&format!(
            "Processed {files} export file(s): {written} item(s) written, {skipped} skipped"
        ));

        if failed_files > 0 {
            return Err(CliError::FailedExports(failed_files));
        }
        Ok(())
    }
}
