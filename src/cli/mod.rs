// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// Every subcommand converts its args into an application
// config, runs one use case from Layer 2 and prints what it
// returned. Nothing here touches files or models directly.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{BuildIndexArgs, Commands, TrainArgs};

use crate::application::{
    evaluate_use_case::EvaluateUseCase,
    index_use_case::{self, IndexSummary},
    inspect_use_case::InspectUseCase,
    serve_use_case::ServeUseCase,
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "multimodal-pipeline",
    version = "0.1.0",
    about = "Index text, audio and video data, then train, evaluate and serve a text classifier."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::IndexText(args) => {
                print_indexed("text", &index_use_case::index_text(&args.into())?);
                Ok(())
            }
            Commands::IndexAudio(args) => {
                print_indexed("audio", &index_use_case::index_audio(&args.into())?);
                Ok(())
            }
            Commands::IndexVideo(args) => {
                print_indexed("video", &index_use_case::index_video(&args.into())?);
                Ok(())
            }
            Commands::BuildIndex(args) => run_build_index(args),
            Commands::Inspect(args) => {
                println!("{}", InspectUseCase::new(args.into()).execute()?);
                Ok(())
            }
            Commands::Train(args) => run_train(args),
            Commands::Evaluate(args) => {
                let outcome = EvaluateUseCase::new(args.into()).execute()?;
                println!("\nEvaluated {} held-out samples\n", outcome.test_rows);
                println!("{}", outcome.report);
                println!("Confusion matrix:\n{}", outcome.confusion);
                Ok(())
            }
            Commands::Serve(args) => ServeUseCase::new(args.into()).execute(),
        }
    }
}

fn print_indexed(kind: &str, summary: &IndexSummary) {
    println!("Indexed {} {} samples → {}", summary.rows, kind, summary.output.display());
}

fn run_build_index(args: BuildIndexArgs) -> Result<()> {
    let summary = index_use_case::build_unified(&args.data_dir)?;

    let mut counts: Vec<_> = summary.counts.iter().collect();
    counts.sort();
    println!("Unified index: {} rows → {}", summary.rows, summary.output.display());
    for (modality, n) in counts {
        println!("  {modality:<6} {n}");
    }
    println!("Unlabeled rows: {}", summary.unlabeled);
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training from manifests in: {}", args.data_dir.display());
    let checkpoint_dir = args.checkpoint_dir.clone();

    let history = TrainUseCase::new(args.into()).execute()?;
    if let Some(last) = history.last() {
        println!("Final epoch {} loss: {:.4}", last.epoch, last.train_loss);
    }
    println!("Training complete. Checkpoints saved to '{}'.", checkpoint_dir.display());
    Ok(())
}
