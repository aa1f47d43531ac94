//! Minimal CLI: load a definitions document → dump synthesized models
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::schema::Document;
use crate::synth::{self, Options};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// resolve schema definitions and dump the synthesized type models as JSON
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// synthesize models and print them as pretty JSON
    Dump(DumpArgs),
}

#[derive(Args, Debug, Clone)]
struct DumpArgs {
    /// input definitions document (.json)
    #[arg(short, long)]
    input: PathBuf,

    /// synthesize only the named definitions (default: all, in document order)
    #[arg(long = "model")]
    model: Vec<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Dump(args) => args.run(),
        }
    }
}

impl DumpArgs {
    fn run(&self) -> anyhow::Result<()> {
        let source = std::fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read {}", self.input.display()))?;
        let document: Document = from_str_with_path(&source)
            .with_context(|| format!("failed to parse {}", self.input.display()))?;

        let options = Options::default();
        let models = if self.model.is_empty() {
            synth::synthesize_document(&document, &options)?
        } else {
            let mut out = Vec::new();
            for name in &self.model {
                let (model, discovered) = synth::synthesize(&document, name, &options)?;
                out.push(model);
                out.extend(discovered);
            }
            out
        };

        let rendered = serde_json::to_string_pretty(&models)?;
        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(out, &rendered)?;
            }
            None => println!("{rendered}"),
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: serde::de::DeserializeOwned>(src: &str) -> anyhow::Result<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(anyhow::anyhow!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}
