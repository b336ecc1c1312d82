//! `rallycoach chat`: interactive or single-message coaching.

use std::io::Write;
use std::path::Path;

use rallycoach_engine::ChatEngine;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// The terminal always talks to one session.
pub const CLI_SESSION_ID: &str = "cli";

const GREETING: &str = "Greetings! I am your Tennis Guru. I specialize in helping you improve your mental game on the court. How can I help you today?";
const GOODBYE: &str = "Goodbye! Keep practicing and improving your game! Always believe in yourself.";

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    // Local servers such as ollama run without a key
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    TOGETHER_API_KEY   = '...'   (default provider)");
        eprintln!("    OPENAI_API_KEY     = 'sk-...'");
        eprintln!("    RALLYCOACH_API_KEY = '...'   (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", config_location(config_path));
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let engine = rallycoach_gateway::build_engine(&config).await?;

    if let Some(msg) = message {
        let msg = msg.trim();
        if msg.is_empty() {
            return Err("No message provided".into());
        }
        eprint!("  Thinking...");
        let response = engine.handle_turn(CLI_SESSION_ID, msg).await;
        eprint!("\r              \r");
        println!("{response}");
        return Ok(());
    }

    println!();
    println!("  {GREETING}");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.chat_model);
    println!("  Type '/reset' to start over, 'exit' or Ctrl+C to quit.");
    println!();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    tokio::select! {
        result = chat_loop(&engine, stdin, &mut stdout) => result?,
        _ = tokio::signal::ctrl_c() => {}
    }

    println!();
    println!("  {GOODBYE}");
    println!();

    Ok(())
}

/// Read questions line by line until EOF or an exit command.
pub async fn chat_loop<R, W>(engine: &ChatEngine, reader: R, out: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();

    write!(out, "  You > ")?;
    out.flush()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();

        match line {
            "" => {}
            "exit" | "quit" | "/exit" | "/quit" | ":q" => break,
            "/reset" => {
                engine.reset_session(CLI_SESSION_ID).await;
                writeln!(out, "  (conversation reset)")?;
            }
            question => {
                let response = engine.handle_turn(CLI_SESSION_ID, question).await;
                writeln!(out)?;
                for line in response.lines() {
                    writeln!(out, "  Coach > {line}")?;
                }
                writeln!(out)?;
            }
        }

        write!(out, "  You > ")?;
        out.flush()?;
    }

    Ok(())
}

fn config_location(path: Option<&Path>) -> String {
    path.map(Path::to_path_buf)
        .unwrap_or_else(rallycoach_config::AppConfig::config_path)
        .display()
        .to_string()
}
