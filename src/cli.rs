use clap::Parser;
use std::path::PathBuf;

/// Edit, export and save trainer workouts from the command line
#[derive(Parser, Debug, Clone)]
#[command(name = "trainer-workout", version, about, long_about = None)]
pub struct Cli {
    /// Saved workout payload to start from
    #[arg(short, long)]
    pub draft: Option<PathBuf>,

    /// JSON array of editing commands to apply in order
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Ask the AI agent run for a workout instead of starting empty
    #[arg(long, conflicts_with = "draft")]
    pub suggest: Option<String>,

    /// Search the catalog and add the best match (repeatable)
    #[arg(long = "find", value_name = "TEXT")]
    pub find: Vec<String>,

    /// Workout name
    #[arg(long)]
    pub name: Option<String>,

    /// Client the workout is for
    #[arg(long)]
    pub client: Option<u64>,

    /// Write the resulting payload to this file
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Export one row per set to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Save the workout to the backend
    #[arg(long)]
    pub send: bool,

    /// Assign the workout to several clients (comma separated ids)
    #[arg(long, value_delimiter = ',', requires = "send")]
    pub clients: Vec<u64>,

    /// Backend base URL
    #[arg(long, env = "TRAINER_API_URL")]
    pub api_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["trainer-workout"]);
        assert!(cli.draft.is_none());
        assert!(cli.script.is_none());
        assert!(!cli.send);
        assert!(cli.clients.is_empty());
        assert!(cli.find.is_empty());
    }

    #[test]
    fn test_cli_with_args() {
        let cli = Cli::parse_from([
            "trainer-workout",
            "--draft",
            "push.json",
            "--script",
            "edits.json",
            "--send",
            "--clients",
            "3,5,8",
            "--find",
            "bench",
            "--find",
            "pull up",
        ]);
        assert_eq!(cli.find, vec!["bench", "pull up"]);
        assert_eq!(cli.draft, Some(PathBuf::from("push.json")));
        assert_eq!(cli.script, Some(PathBuf::from("edits.json")));
        assert!(cli.send);
        assert_eq!(cli.clients, vec![3, 5, 8]);
    }

    #[test]
    fn test_clients_require_send() {
        assert!(Cli::try_parse_from(["trainer-workout", "--clients", "1"]).is_err());
        assert!(
            Cli::try_parse_from(["trainer-workout", "--draft", "a.json", "--suggest", "legs"])
                .is_err()
        );
    }
}
