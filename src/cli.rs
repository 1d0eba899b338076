// Command line - arguments for the student-registry binary
// Without a subcommand the terminal UI is started.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::logging::Verbosity;
use crate::record::RegistrationForm;

/// student-registry - Register students and print their registration forms
#[derive(Debug, Parser)]
#[command(name = "student-registry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute (terminal UI when omitted)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the interactive registration form
    Tui(TuiCommand),

    /// Register a student from the command line
    Submit(SubmitCommand),

    /// Look a student up by registration number or mobile
    Find(FindCommand),

    /// List every stored registration
    List(ListCommand),

    /// Print the registration number the next student will get
    NextId,

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Default, Args)]
pub struct TuiCommand {
    /// Write logs to this file while the UI is running
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Submit command arguments. Only name, mobile and aadhaar are required
/// by the registry; the rest default to empty.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub mobile: String,

    #[arg(long)]
    pub aadhaar: String,

    #[arg(long, default_value = "")]
    pub father_name: String,

    #[arg(long, default_value = "")]
    pub mother_name: String,

    /// Date of birth, DD-MM-YYYY
    #[arg(long, default_value = "")]
    pub dob: String,

    #[arg(long, default_value = "")]
    pub address: String,

    #[arg(long, default_value = "")]
    pub city: String,

    #[arg(long, default_value = "")]
    pub state: String,

    #[arg(long, default_value = "")]
    pub pin: String,

    #[arg(long, default_value = "")]
    pub course: String,

    /// Path to the student's photo
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl SubmitCommand {
    pub fn to_form(&self) -> RegistrationForm {
        RegistrationForm {
            name: self.name.clone(),
            father_name: self.father_name.clone(),
            mother_name: self.mother_name.clone(),
            dob: self.dob.clone(),
            mobile: self.mobile.clone(),
            aadhaar: self.aadhaar.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            pin: self.pin.clone(),
            course: self.course.clone(),
            photo: self
                .photo
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Args)]
pub struct FindCommand {
    /// Registration number (e.g. REG001) or mobile number
    pub key: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Also generate the PDF for the record found
    #[arg(long)]
    pub pdf: bool,
}

#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the default configuration file path
    Path,
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["student-registry"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_parse_tui_with_log_file() {
        let cli =
            Cli::try_parse_from(["student-registry", "tui", "--log-file", "/tmp/reg.log"]).unwrap();
        match cli.command {
            Some(Command::Tui(cmd)) => {
                assert_eq!(cmd.log_file, Some(PathBuf::from("/tmp/reg.log")));
            }
            other => panic!("expected tui, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_submit() {
        let cli = Cli::try_parse_from([
            "student-registry",
            "submit",
            "--name",
            "Asha",
            "--mobile",
            "9999999999",
            "--aadhaar",
            "123412341234",
            "--course",
            "Tally",
            "--photo",
            "/photos/asha.jpg",
        ])
        .unwrap();

        let Some(Command::Submit(cmd)) = cli.command else {
            panic!("expected submit");
        };
        let form = cmd.to_form();
        assert_eq!(form.name, "Asha");
        assert_eq!(form.course, "Tally");
        assert_eq!(form.photo, "/photos/asha.jpg");
        assert_eq!(form.city, "");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_submit_requires_name() {
        let result = Cli::try_parse_from([
            "student-registry",
            "submit",
            "--mobile",
            "9999999999",
            "--aadhaar",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_find() {
        let cli = Cli::try_parse_from(["student-registry", "find", "REG001", "--pdf"]).unwrap();
        match cli.command {
            Some(Command::Find(cmd)) => {
                assert_eq!(cmd.key, "REG001");
                assert!(cmd.pdf);
                assert!(!cmd.json);
            }
            other => panic!("expected find, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_show() {
        let cli = Cli::try_parse_from(["student-registry", "config", "show", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand::Show { json: true }))
        ));
    }

    #[test]
    fn test_global_flags() {
        let cli =
            Cli::try_parse_from(["student-registry", "-vv", "-c", "/etc/reg.toml", "next-id"])
                .unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Trace);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/reg.toml")));
        assert!(matches!(cli.command, Some(Command::NextId)));

        let quiet = Cli::try_parse_from(["student-registry", "list", "-q"]).unwrap();
        assert_eq!(quiet.verbosity(), Verbosity::Quiet);
    }
}
