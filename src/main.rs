// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::Parser;

use student_registry::cli::{Cli, Command, ConfigCommand, FindCommand, SubmitCommand, TuiCommand};
use student_registry::{init_logging, Config, Registration, Registry, Verbosity};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let tui = match &cli.command {
        None => Some(TuiCommand::default()),
        Some(Command::Tui(cmd)) => Some(TuiCommand {
            log_file: cmd.log_file.clone(),
        }),
        Some(_) => None,
    };

    // The terminal UI owns the screen, so logs go to a file or nowhere
    match &tui {
        Some(cmd) if cmd.log_file.is_some() => {
            init_logging(cli.verbosity(), cmd.log_file.as_deref());
        }
        Some(_) => init_logging(Verbosity::Quiet, None),
        None => init_logging(cli.verbosity(), None),
    }

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    if tui.is_some() {
        return run_ui_mode(&config);
    }

    let registry = Registry::from_config(&config);

    match cli.command {
        Some(Command::Submit(cmd)) => run_submit(&registry, &cmd),
        Some(Command::Find(cmd)) => run_find(&registry, &cmd),
        Some(Command::List(cmd)) => run_list(&registry, cmd.json),
        Some(Command::NextId) => {
            println!("{}", registry.next_identifier()?);
            Ok(())
        }
        Some(Command::Config(cmd)) => run_config(&config, cmd),
        Some(Command::Tui(_)) | None => Ok(()),
    }
}

fn run_submit(registry: &Registry, cmd: &SubmitCommand) -> Result<()> {
    let submission = registry.submit(&cmd.to_form())?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&submission)?);
    } else {
        println!("✓ Registered {} ({})", submission.record.id, submission.record.name);
        println!("✓ PDF generated: {}", submission.document.display());
    }
    Ok(())
}

fn run_find(registry: &Registry, cmd: &FindCommand) -> Result<()> {
    let record = registry.lookup(&cmd.key)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_details(&record);
    }

    if cmd.pdf {
        let path = registry.render_document(&record)?;
        println!("✓ PDF generated: {}", path.display());
    }
    Ok(())
}

fn print_details(record: &Registration) {
    println!("Student Details - {}", record.id);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (label, value) in record.display_fields() {
        let mut lines = value.lines();
        println!("{:<16} {}", format!("{label}:"), lines.next().unwrap_or(""));
        for more in lines {
            println!("{:<16} {}", "", more);
        }
    }
    match record.photo_path() {
        Some(path) if path.is_file() => println!("{:<16} {}", "Photo:", path.display()),
        _ => println!("No Photo Available"),
    }
}

fn run_list(registry: &Registry, json: bool) -> Result<()> {
    let records = registry.records()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No registrations yet.");
        return Ok(());
    }

    println!("{:<10} {:<30} {:<12} {}", "Reg No", "Name", "Mobile", "Course");
    for record in &records {
        println!(
            "{:<10} {:<30} {:<12} {}",
            record.id, record.name, record.mobile, record.course
        );
    }
    println!("\n{} registration(s)", records.len());
    Ok(())
}

fn run_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Registrations:  {}", config.registrations_path().display());
                println!("  Output dir:     {}", config.output_dir().display());
                println!();
                println!("[Institution]");
                println!("  Name:           {}", config.institution.name);
                println!("  Logo:           {}", config.institution.logo_path.display());
                println!();
                println!("[Choices]");
                println!("  Cities:         {}", config.choices.cities.len());
                println!("  States:         {}", config.choices.states.len());
                println!("  Courses:        {}", config.choices.courses.len());
                println!();
                println!("[Server]");
                println!("  Bind:           {}", config.server.bind);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    let registry = Registry::from_config(config);
    let mut app = ui::App::new(registry, config.choices.clone());
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the CLI: student-registry submit --help");
    std::process::exit(1);
}
