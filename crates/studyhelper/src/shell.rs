//! Interactive loop: read a file, preview it, optionally ask the LLM for a
//! study guide, and save results.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use tracing::{debug, info};

use studyhelper_agent::{StudyHelper, StudyResult};
use studyhelper_config::OutputConfig;
use studyhelper_extract::ExtractionStatus;

/// Shell state.
pub struct Shell {
    helper: StudyHelper,
    output: OutputConfig,
    editor: Editor<(), DefaultHistory>,
}

impl Shell {
    pub fn new(helper: StudyHelper, output: OutputConfig) -> Result<Self> {
        let config = Config::builder().auto_add_history(false).build();
        let editor = Editor::with_config(config)?;

        Ok(Self {
            helper,
            output,
            editor,
        })
    }

    /// Run until the user is done, declines to continue, or closes input.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let Some(path) = self.read_line("Enter the path to your PDF or DOCX file: ")? else {
                break;
            };
            if path.is_empty() {
                println!("No file path provided. Exiting...");
                break;
            }

            let extraction = match studyhelper_extract::read_file(&path) {
                Ok(extraction) => extraction,
                Err(e) => {
                    println!("Error reading file: {e}");
                    return Ok(());
                }
            };
            for warning in &extraction.warnings {
                print_warning(warning);
            }
            if let ExtractionStatus::Partial { ref failed_pages } = extraction.status {
                debug!(?failed_pages, "Continuing with partial text");
                print_warning(&format!(
                    "{} page(s) could not be read; continuing with the rest.",
                    failed_pages.len()
                ));
            }

            println!("\nGenerating document preview...\n");
            let preview = self.helper.process(&extraction.text, false).await;
            print_preview(&preview);

            if let Some(content) = preview.content() {
                match self.confirm("\nSave preview to file (y/n): ")? {
                    Some(true) => self.save(content, &self.output.preview_file),
                    Some(false) => {}
                    None => break,
                }
            }

            let Some(generate) = self.confirm("\nGenerate full study guide using AI? (y/n): ")?
            else {
                break;
            };
            if generate {
                let guide = self.helper.process(&extraction.text, true).await;

                println!("\n{}\n", heading("---Study Guide Output---"));
                match guide.content() {
                    Some(content) => {
                        println!("{content}");
                        match self.confirm("\nSave full study guide to file (y/n): ")? {
                            Some(true) => self.save(content, &self.output.guide_file),
                            Some(false) => {}
                            None => break,
                        }
                    }
                    None => {
                        println!(
                            "Cannot generate study guide: {}",
                            guide.error_message().unwrap_or_default()
                        );
                    }
                }
            }

            if self.confirm("\nProcess another file? (y/n): ")? != Some(true) {
                break;
            }
        }

        info!("Shell exiting");
        Ok(())
    }

    /// Prompt for a line. `None` means the user closed input (Ctrl-D) or
    /// interrupted (Ctrl-C).
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line.trim().to_string())),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!();
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Ask a yes/no question. Only "y" (any case) counts as yes.
    fn confirm(&mut self, prompt: &str) -> Result<Option<bool>> {
        Ok(self
            .read_line(prompt)?
            .map(|answer| answer.eq_ignore_ascii_case("y")))
    }

    fn save(&self, content: &str, filename: &str) {
        if let Err(e) = save_output(content, filename) {
            println!("{}", style(format!("{e:#}")).red());
        }
    }
}

/// Write `content` to `filename` (relative to the working directory),
/// replacing any existing file.
pub fn save_output(content: &str, filename: &str) -> Result<PathBuf> {
    let path = Path::new(filename).to_path_buf();
    std::fs::write(&path, content).with_context(|| format!("Failed to save {filename}"))?;
    println!("Saved to {filename}");
    info!(path = %path.display(), bytes = content.len(), "Saved output");
    Ok(path)
}

fn print_preview(preview: &StudyResult) {
    match preview {
        StudyResult::Preview {
            content,
            summary,
            key_concepts,
            mock_schedule,
        } => {
            println!("\n{}\n", heading("---Document Preview---"));
            println!("{content}");

            println!("\n{}\n", heading("---Summary---"));
            println!("{summary}");

            println!("\n{}\n", heading("--- Key Concepts ---"));
            for (idx, point) in key_concepts.iter().enumerate() {
                println!("{}.{}", idx + 1, point);
            }

            println!("\n{}\n", heading("--- Suggested Study Schedule ---"));
            println!("{mock_schedule}");
        }
        StudyResult::Guide { content } => println!("{content}"),
        StudyResult::Error { error } => {
            println!("{}", style(format!("Cannot generate preview: {error}")).red());
        }
    }
}

fn heading(text: &str) -> console::StyledObject<&str> {
    style(text).bold()
}

/// Print a warning line in yellow.
pub fn print_warning(message: &str) {
    println!("{}", style(message).yellow());
}
