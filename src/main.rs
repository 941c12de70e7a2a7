use std::{io::Write, path::PathBuf, process::ExitCode};

use clap::Parser;
use litereader::{
    config::Config,
    executor::{QueryExecutor, QueryOutput},
    planner::CommandParser,
    storage::pager::Pager,
    types::error::DatabaseError,
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Read-only query tool for SQLite database files
#[derive(Parser, Debug)]
#[command(name = "litereader", version, about)]
struct Args {
    /// Path to the database file
    database: PathBuf,

    /// Command to run: .dbinfo, .tables or a SELECT statement.
    /// Starts an interactive shell when omitted.
    command: Vec<String>,

    /// Separator between projected columns
    #[arg(short = 's', long, default_value = "|", env = "LITEREADER_SEPARATOR")]
    separator: String,

    /// Shell history file
    #[arg(long, value_name = "FILE", env = "LITEREADER_HISTORY")]
    history: Option<PathBuf>,

    /// Do not load or save shell history
    #[arg(long)]
    no_history: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn to_config(&self) -> Config {
        let mut config = Config::new(&self.database)
            .with_separator(self.separator.clone())
            .verbose(self.verbose);
        if self.no_history {
            config = config.with_history_file(None);
        } else if let Some(history) = &self.history {
            config = config.with_history_file(Some(history.clone()));
        }
        config
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_command(
    executor: &mut QueryExecutor,
    parser: &CommandParser,
    input: &str,
) -> Result<QueryOutput, DatabaseError> {
    let command = parser.parse(input)?;
    executor.execute(&command)
}

fn print_output(output: &QueryOutput) {
    match output {
        QueryOutput::Rows(rows) if rows.is_empty() => {}
        output => println!("{}", output),
    }
}

fn read_multiline_command(rl: &mut DefaultEditor) -> rustyline::Result<String> {
    let mut input = String::new();
    let mut prompt = "litereader> ";

    loop {
        let line = rl.readline(prompt)?;
        let trimmed_line = line.trim_end();

        // A trailing backslash continues the command on the next line
        if let Some(line_without_backslash) = trimmed_line.strip_suffix('\\') {
            input.push_str(line_without_backslash);
            input.push(' ');
            prompt = "       ...> ";
        } else {
            input.push_str(trimmed_line);
            break;
        }
    }

    Ok(input)
}

/// Handle one line of shell input. Returns `false` when the shell should exit.
fn process_command(executor: &mut QueryExecutor, parser: &CommandParser, command: &str) -> bool {
    let cmd = command.trim();

    match cmd.to_lowercase().as_str() {
        "exit" | "quit" | "q" | ".exit" | ".quit" => {
            return false;
        }
        "help" | "h" | ".help" => {
            println!(
                r#"
Available commands:
  .dbinfo                                    - Show page size and schema entry count
  .tables                                    - List tables
  SELECT COUNT(*) FROM <table>               - Count rows
  SELECT <cols> FROM <table> [WHERE c = v]   - Project columns with an optional filter
  help, h                                    - Show this help message
  clear                                      - Clear the screen
  exit, quit, q                              - Leave the shell

Use '\' at the end of a line for multiline input.
Use Up/Down arrows to navigate command history.
"#
            );
        }
        "clear" => {
            print!("\x1B[2J\x1B[1;1H");
            let _ = std::io::stdout().flush();
        }
        "" => {}
        _ => match run_command(executor, parser, cmd) {
            Ok(output) => print_output(&output),
            Err(e) => eprintln!("Error: {}", e),
        },
    }

    true
}

fn run_shell(executor: &mut QueryExecutor, config: &Config) -> rustyline::Result<()> {
    let parser = CommandParser::new();
    let mut rl = DefaultEditor::new()?;
    if let Some(history) = &config.history_file {
        if let Err(e) = rl.load_history(history) {
            debug!("No history loaded from {}: {}", history.display(), e);
        }
    }

    println!(
        "litereader {} - connected to {}",
        env!("CARGO_PKG_VERSION"),
        config.database.display()
    );
    println!("Enter \"help\" for usage hints.");

    loop {
        match read_multiline_command(&mut rl) {
            Ok(input) => {
                let command = input.trim().to_string();
                if command.is_empty() {
                    continue;
                }
                rl.add_history_entry(&command)?;
                if !process_command(executor, &parser, &command) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    if let Some(history) = &config.history_file {
        rl.save_history(history)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.to_config();
    init_tracing(&config);

    let pager = match Pager::open(&config.database) {
        Ok(pager) => pager,
        Err(e) => {
            eprintln!("Error: cannot open {}: {}", config.database.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let mut executor = QueryExecutor::new(pager).with_separator(config.separator.clone());

    if !args.command.is_empty() {
        let parser = CommandParser::new();
        return match run_command(&mut executor, &parser, &args.command.join(" ")) {
            Ok(output) => {
                print_output(&output);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match run_shell(&mut executor, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
