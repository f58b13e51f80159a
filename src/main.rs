use anyhow::Result;
use solace::backend::{HttpAnswerClient, DEFAULT_ENDPOINT};
use solace::content::{TipCycle, QUICK_REPLIES};
use solace::format::{format_message, Segment, Span};
use solace::session::Owner;
use solace::{ConversationSession, Platform, Timings};
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solace=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let endpoint = std::env::var("SOLACE_ANSWER_URL")
        .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    info!(%endpoint, "Starting Solace wellness companion");

    let backend = HttpAnswerClient::new(endpoint);
    let mut session = ConversationSession::new(
        Platform::headless(),
        backend,
        Timings::default(),
        Instant::now(),
    );
    let mut tips = TipCycle::new();

    println!("Solace - your mental wellness companion.");
    println!("Type a question, a quick-reply number, 'tip' for a wellness tip, or 'quit'.");
    print_quick_replies();

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let entry = line.trim();
        match entry {
            "" => continue,
            "quit" | "exit" => break,
            "tip" => {
                println!("Tip: {}", tips.advance());
                continue;
            }
            _ => {}
        }

        // Quick-reply numbers stand in for their full prompt text
        let question = match entry.parse::<usize>() {
            Ok(n) if (1..=QUICK_REPLIES.len()).contains(&n) => QUICK_REPLIES[n - 1],
            _ => entry,
        };

        if let Err(err) = session.submit(question, Instant::now()) {
            println!("[!] {}", err.user_message());
            continue;
        }

        println!("Thinking...");
        while session.is_busy() {
            session.pump(Instant::now());
            std::thread::sleep(Duration::from_millis(25));
        }
        session.pump(Instant::now());

        if let Some(err) = session.error_message() {
            println!("[!] {}", err);
            session.dismiss_error();
        } else if let Some(answer) = session
            .messages()
            .last()
            .filter(|m| m.owner == Owner::Assistant)
        {
            print_answer(&answer.text);
        }
    }

    session.shutdown();
    info!("Session closed");
    Ok(())
}

fn print_quick_replies() {
    println!("Quick replies:");
    for (i, reply) in QUICK_REPLIES.iter().enumerate() {
        println!("  {}. {}", i + 1, reply);
    }
}

fn print_answer(text: &str) {
    for segment in format_message(text) {
        match segment {
            Segment::Paragraph(spans) => println!("{}", flatten(&spans)),
            Segment::Bullet(spans) => println!("  - {}", flatten(&spans)),
        }
    }
}

fn flatten(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(s) | Span::Bold(s) | Span::Italic(s) => s.as_str(),
        })
        .collect()
}
