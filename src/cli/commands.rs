use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the server (database, operator token and VAPID key pair)
    Init {
        /// Data directory for the database and key files
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Create a new access token
    Create {
        /// Data directory for the database and key files
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Reader id attached to subscriptions made with this token
        #[arg(long, conflicts_with = "admin")]
        user_id: Option<String>,

        /// Create an operator token (may broadcast)
        #[arg(long)]
        admin: bool,

        /// Token expiration in days (omit for no expiration)
        #[arg(long)]
        expires_days: Option<i64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List access tokens
    List {
        /// Data directory for the database and key files
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revoke an access token
    Revoke {
        /// Data directory for the database and key files
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Token ID to revoke
        #[arg(long)]
        token_id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,

        /// Fail instead of prompting
        #[arg(long)]
        non_interactive: bool,
    },
}

#[derive(Subcommand)]
pub enum VapidCommands {
    /// Print the application server public key
    Show {
        /// Data directory for the database and key files
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct BroadcastArgs {
    /// Alert text
    #[arg(long)]
    pub body: String,

    /// Notification title
    #[arg(long)]
    pub title: Option<String>,

    /// Page opened when the notification is clicked
    #[arg(long)]
    pub url: Option<String>,

    /// Notification icon
    #[arg(long)]
    pub icon: Option<String>,

    /// Server base URL
    #[arg(long, env = "HERALD_SERVER", default_value = "http://127.0.0.1:8080")]
    pub server: String,

    /// Operator token
    #[arg(long, env = "HERALD_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Fail instead of prompting
    #[arg(long)]
    pub non_interactive: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
