//! One pipeline run in the terminal, printing each stage as it is committed.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use qn_core::{NewsState, PipelineRunner, RunPhase};

/// Prints stage outputs once each, in pipeline order, as they appear.
#[derive(Debug, Default)]
pub struct StagePrinter {
    raw: bool,
    synthesized: bool,
    summary: bool,
    error: bool,
}

impl StagePrinter {
    pub fn show(&mut self, state: &NewsState, out: &mut impl Write) -> std::io::Result<()> {
        if !self.raw && !state.raw_result.is_empty() {
            self.raw = true;
            section(out, "Search results", &state.raw_result)?;
        }
        if !self.synthesized && !state.synthesized_result.is_empty() {
            self.synthesized = true;
            section(out, "Synthesis", &state.synthesized_result)?;
        }
        if !self.summary && !state.final_summary.is_empty() {
            self.summary = true;
            section(out, "📝 News Summary", &state.final_summary)?;
        }
        if !self.error && !state.error_message.is_empty() {
            self.error = true;
            writeln!(out, "\n{}", state.error_message)?;
        }
        out.flush()
    }
}

fn section(out: &mut impl Write, title: &str, body: &str) -> std::io::Result<()> {
    writeln!(out, "\n── {} ──\n{}", title, body)
}

/// Run the pipeline for `topic`, streaming stage output to stdout.
pub async fn run(runner: Arc<PipelineRunner>, topic: String) -> Result<RunPhase> {
    let mut rx = runner.store().subscribe();
    let mut printer = StagePrinter::default();
    let mut stdout = std::io::stdout();

    println!("Processing news for \"{}\"...", topic);

    let mut task = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.run(topic).await })
    };

    let result = loop {
        tokio::select! {
            result = &mut task => break result,
            changed = rx.changed() => {
                if changed.is_err() {
                    break (&mut task).await;
                }
                let state = rx.borrow_and_update().clone();
                debug!(revision = state.revision, phase = %state.phase(), "Store updated");
                printer.show(&state, &mut stdout)?;
            }
        }
    };

    printer.show(&runner.store().snapshot(), &mut stdout)?;

    let phase = result.context("Pipeline task panicked")??;
    Ok(phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qn_core::testing::{MockGenerator, MockSearch};
    use qn_core::{Error, SearchHit, TopicStore};

    fn render(printer: &mut StagePrinter, state: &NewsState) -> String {
        let mut out = Vec::new();
        printer.show(state, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_printer_prints_each_stage_once() {
        let mut printer = StagePrinter::default();
        let mut state = NewsState::default();
        state.is_running = true;
        state.raw_result = "Title: A".into();

        let first = render(&mut printer, &state);
        assert!(first.contains("── Search results ──\nTitle: A"));

        state.synthesized_result = "synthesis".into();
        let second = render(&mut printer, &state);
        assert!(!second.contains("Search results"));
        assert!(second.contains("── Synthesis ──\nsynthesis"));

        state.final_summary = "summary".into();
        state.is_running = false;
        let third = render(&mut printer, &state);
        assert!(third.contains("📝 News Summary"));
        assert!(render(&mut printer, &state).is_empty());
    }

    #[test]
    fn test_printer_shows_error() {
        let mut printer = StagePrinter::default();
        let mut state = NewsState::default();
        state.error_message = "An error occurred: Network error: down".into();
        let out = render(&mut printer, &state);
        assert_eq!(out, "\nAn error occurred: Network error: down\n");
    }

    #[tokio::test]
    async fn test_run_completes() {
        let search = Arc::new(MockSearch::new());
        search.queue_hits(vec![SearchHit::new("A", "https://a.example", "about a")]);
        let generator = Arc::new(MockGenerator::new());
        generator.queue_ok("synthesis");
        generator.queue_ok("summary");
        let runner = PipelineRunner::new(
            TopicStore::default(),
            search,
            generator,
            qn_agents::default_presets(),
        );

        let phase = run(Arc::new(runner), "AI Agents".into()).await.unwrap();
        assert_eq!(phase, RunPhase::Completed);
    }

    #[tokio::test]
    async fn test_run_reports_failure() {
        let search = Arc::new(MockSearch::new());
        search.queue_error(Error::network("offline"));
        let runner = PipelineRunner::new(
            TopicStore::default(),
            search,
            Arc::new(MockGenerator::new()),
            qn_agents::default_presets(),
        );

        let runner = Arc::new(runner);
        let phase = run(Arc::clone(&runner), "AI Agents".into()).await.unwrap();
        assert_eq!(phase, RunPhase::Failed);
        assert_eq!(
            runner.store().snapshot().error_message,
            "An error occurred: Network error: offline"
        );
    }
}
