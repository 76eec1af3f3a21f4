use clap::{Parser, Subcommand};
use ll1_tutor::{
    Analysis, DerivationSession, Generator, GeneratorConfig, ParseState, PredictiveParser,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Step-by-step LL(1) parsing tutor
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the grammar and its parsing table
    Table,

    /// Analyse a sentence and print every step of the parser
    Parse {
        #[arg(help = "Sentence over the grammar's alphabet")]
        sentence: String,

        /// Print the trace as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate random sentences of bounded length
    Generate {
        /// Number of sentences to generate
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Longest sentence to generate
        #[arg(long)]
        max_length: Option<usize>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// JSON file with generator settings
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Also run the parser on every generated sentence
        #[arg(long)]
        check: bool,
    },

    /// Build a derivation by choosing production numbers in order
    Derive {
        #[arg(help = "Production numbers (starting at 0) for each expansion")]
        choices: Vec<usize>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<bool, Box<dyn std::error::Error>> {
    let parser = PredictiveParser::standard()?;

    match command {
        Commands::Table => {
            println!("Grammar:\n{}", parser.grammar());
            println!("Parsing table:\n{}", parser.table());
            Ok(true)
        }
        Commands::Parse { sentence, json } => {
            let analysis = parser.parse(&sentence)?;
            if json {
                println!("{}", serde_json::to_string_pretty(analysis.trace())?);
            } else {
                print_trace(&analysis);
            }
            Ok(analysis.state().is_accepted())
        }
        Commands::Generate {
            count,
            max_length,
            seed,
            config,
            check,
        } => {
            let mut settings = match config {
                Some(path) => GeneratorConfig::from_json_file(&path)?,
                None => GeneratorConfig::default(),
            };
            if let Some(max_length) = max_length {
                settings.max_length = max_length;
            }
            if seed.is_some() {
                settings.seed = seed;
            }

            let mut generator = Generator::new(parser.grammar(), settings);
            let mut all_accepted = true;
            for i in 0..count {
                let generated = generator.generate()?;
                let note = if generated.fallback { "  (fallback)" } else { "" };
                println!("{}. {}{}", i + 1, generated.sentence, note);

                if check {
                    let state = parser.parse(&generated.sentence)?.state().clone();
                    println!("   {}", describe(&state));
                    all_accepted &= state.is_accepted();
                }
            }
            if generator.fallbacks() > 0 {
                println!("\n{} of {} used the fallback", generator.fallbacks(), count);
            }
            Ok(all_accepted)
        }
        Commands::Derive { choices } => {
            let mut session = DerivationSession::new(parser.grammar());
            println!("    {}", session);
            for index in choices {
                let production = session.apply(index)?;
                println!("=>  {}    ({})", session, production);
            }

            match session.sentence() {
                Some(sentence) => {
                    println!("\nComplete: {}", sentence);
                    Ok(true)
                }
                None => {
                    let options: Vec<String> = session
                        .available_productions()
                        .iter()
                        .enumerate()
                        .map(|(i, p)| format!("{}: {}", i, p))
                        .collect();
                    println!("\nNext choices: {}", options.join(", "));
                    Ok(true)
                }
            }
        }
    }
}

fn print_trace(analysis: &Analysis<'_>) {
    println!("{:>4}  {:<20} {:>16}  Action", "Step", "Stack", "Input");
    for step in analysis.trace() {
        println!(
            "{:>4}  {:<20} {:>16}  {}",
            step.number,
            step.stack_string(),
            step.remaining,
            step.action
        );
    }
    println!("\n{}", describe(analysis.state()));
}

fn describe(state: &ParseState) -> String {
    match state {
        ParseState::Accepted { steps } => format!("accepted in {} steps", steps),
        ParseState::Running => "running".to_string(),
        rejected => match rejected.rejection() {
            Some(e) => format!("rejected: {}", e),
            None => "rejected".to_string(),
        },
    }
}
