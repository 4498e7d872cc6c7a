//! One-time setup wizard: build an agent persona and register it with Ollama.
//!
//! Prompts for identity fields, substitutes them into `Modelfile-template`,
//! and runs `ollama create`.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rpp_assistant::modelfile::{create_model, write_modelfile, AgentIdentity};

#[derive(Parser)]
#[command(name = "setup_agent")]
#[command(about = "Create a customized RPP agent model for Ollama", long_about = None)]
struct Cli {
    /// Modelfile template path
    #[arg(long, default_value = "Modelfile-template")]
    template: PathBuf,

    /// Output path for the generated Modelfile
    #[arg(long, default_value = "Modelfile-generated")]
    output: PathBuf,

    /// Only write the Modelfile, skip `ollama create`
    #[arg(long, default_value_t = false)]
    skip_create: bool,
}

fn ask(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    println!("Buat identitas model Ollama baru:");
    let identity = AgentIdentity {
        model_name: AgentIdentity::sanitize_model_name(&ask("Nama model baru (tanpa spasi): ")?),
        base_model: ask("Base model (contoh: deepseek-r1:1.5b): ")?,
        agent_type: ask("Tipe agen (contoh: guru, Asisten Pendidikan): ")?,
        agent_name: ask("Nama agen (contoh: Raka, Sinta): ")?,
        user_name: ask("Nama pengguna (kamu): ")?,
        agent_relation: ask("Hubungan agen ke pengguna (contoh: Pembimbing RPP): ")?,
        agent_attitude: ask("Sikap agen (contoh: Ramah dan profesional): ")?,
    };

    write_modelfile(&identity, &cli.template, &cli.output)
        .context("failed to write Modelfile")?;

    if cli.skip_create {
        println!("Modelfile ditulis ke {}", cli.output.display());
        return Ok(());
    }

    println!(
        "Membuat model '{}' dari '{}'...",
        identity.model_name, identity.base_model
    );
    create_model(&identity.model_name, &cli.output)?;

    println!(
        "Model '{}' berhasil dibuat. Jalankan dengan: ollama run {}",
        identity.model_name, identity.model_name
    );
    Ok(())
}
