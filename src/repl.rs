//! Interactive chat over a loaded document
//!
//! `pdfrag chat <pdf>` loads the document once, then answers each line typed
//! at the prompt. Lines starting with `/` are commands.

use anyhow::Result;
use colored::*;
use std::io::{self, BufRead, Write};

use crate::llm::LLMProvider;
use crate::session::{Answer, Session};
use crate::SearchResult;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Characters of chunk text shown in result listings
const PREVIEW_CHARS: usize = 150;

/// Command definition with name and description
struct Command {
    name: &'static str,
    description: &'static str,
}

const COMMANDS: &[Command] = &[
    Command { name: "/search", description: "Show the closest chunks without answering" },
    Command { name: "/sources", description: "Chunks behind the last answer" },
    Command { name: "/info", description: "Show document info" },
    Command { name: "/clear", description: "Clear screen" },
    Command { name: "/help", description: "Show this help" },
    Command { name: "/exit", description: "Exit" },
];

/// A parsed line of input
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Empty,
    Question(&'a str),
    Command { name: String, args: &'a str },
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if !line.starts_with('/') {
        return Input::Question(line);
    }
    let mut parts = line.splitn(2, ' ');
    let name = parts.next().unwrap_or_default().to_lowercase();
    let args = parts.next().map(str::trim).unwrap_or("");
    Input::Command { name, args }
}

/// Print the welcome banner
fn print_banner(session: &Session) {
    let document = session.document();
    println!();
    println!("  {} v{}", "pdfrag".green().bold(), VERSION);
    println!(
        "  {}  {}",
        document.source.white(),
        format!("({} pages, {} chunks)", document.page_count, document.chunks().len()).dimmed()
    );
    println!();
    println!("  Ask a question, or type {} for commands.", "/help".yellow());
    println!();
}

/// Run the chat loop until EOF or /exit
pub async fn run_chat(session: &Session, generator: &dyn LLMProvider) -> Result<()> {
    print_banner(session);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut last_answer: Option<Answer> = None;

    loop {
        print!("{} ", ">".green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Question(question) => match session.ask(question, generator).await {
                Ok(answer) => {
                    print_answer(&answer);
                    last_answer = Some(answer);
                }
                Err(e) => println!("{} {:#}", "Error:".red().bold(), e),
            },
            Input::Command { name, args } => {
                let should_exit = handle_command(&name, args, session, last_answer.as_ref())?;
                if should_exit {
                    println!("{}", "Goodbye!".cyan());
                    break;
                }
            }
        }

        println!();
    }

    Ok(())
}

/// Handle slash commands. Returns true if should exit.
fn handle_command(
    cmd: &str,
    args: &str,
    session: &Session,
    last_answer: Option<&Answer>,
) -> Result<bool> {
    match cmd {
        "/exit" | "/quit" | "/q" => {
            return Ok(true);
        }
        "/help" | "/h" | "/?" => {
            println!("{}", "Commands:".green().bold());
            println!();
            println!("  {}  {}", format!("{:<12}", "<question>").dimmed(), "Answer from the document (default)".white());
            for cmd in COMMANDS {
                println!("  {}  {}", format!("{:<12}", cmd.name).dimmed(), cmd.description.white());
            }
        }
        "/clear" => {
            print!("\x1B[2J\x1B[1;1H");
            io::stdout().flush()?;
        }
        "/search" | "/s" => {
            if args.is_empty() {
                println!("{}", "Usage: /search <query>".yellow());
            } else {
                match session.retrieve(args, session.top_k()) {
                    Ok(results) => print_results(&results),
                    Err(e) => println!("{} {:#}", "Error:".red().bold(), e),
                }
            }
        }
        "/sources" => match last_answer {
            Some(answer) => print_results(&answer.sources),
            None => println!("{}", "No question asked yet.".yellow()),
        },
        "/info" => {
            let document = session.document();
            println!("{}", "Document".green().bold());
            println!();
            println!("  Source:    {}", document.source.white());
            println!("  Pages:     {}", document.page_count.to_string().white());
            println!("  Sentences: {}", document.sentences().len().to_string().white());
            println!("  Chunks:    {}", document.chunks().len().to_string().white());
            println!("  Top k:     {}", session.top_k().to_string().white());
        }
        _ => {
            println!("{} Unknown command: {}", "Error:".red().bold(), cmd);
            println!("Type {} for available commands.", "/help".yellow());
        }
    }

    Ok(false)
}

/// Print an answer with the chunks it drew on
pub fn print_answer(answer: &Answer) {
    println!("{}", answer.answer.trim().white());
    println!();
    println!(
        "  {}",
        format!(
            "{} sources, {} prompt + {} completion tokens",
            answer.sources.len(),
            answer.usage.prompt_tokens,
            answer.usage.completion_tokens
        )
        .dimmed()
    );
}

/// Print retrieved chunks, closest first
pub fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("{}", "No results found.".yellow());
        return;
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "  {}. {} {}",
            (i + 1).to_string().cyan().bold(),
            format!("[{:.3}]", result.distance).dimmed(),
            format!("chunk #{}", result.chunk_index).white().bold()
        );
        println!("     {}", preview(&result.content, PREVIEW_CHARS));
    }
}

/// First `max` characters of `text`, with an ellipsis when cut
fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
