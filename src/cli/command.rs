use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::storage::DEFAULT_DATA_DIR;

#[derive(Parser, Debug)]
#[command(name = "rusty-phonebook", version, about = "Simple Phonebook")]
pub struct Cli {
    /// Storage choice (memory, fs, remote, postgres) are available
    #[arg(long, env = "STORAGE_CHOICE", default_value_t = String::from("fs"))]
    pub storage_choice: String,

    /// Base directory for the fs storage
    #[arg(long, env = "DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Base url of the remote document store
    #[arg(long, env = "REMOTE_STORAGE_URL")]
    pub remote_url: Option<String>,

    /// API key appended to remote requests
    #[arg(long, env = "REMOTE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Connection string for the postgres storage
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommand and their flags
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new contact
    Add {
        /// Where to store the contact (generated when omitted)
        #[arg(long)]
        location: Option<String>,

        #[command(flatten)]
        contact: ContactArgs,
    },
    /// Show the contact stored at a location
    Get {
        #[arg(long)]
        location: String,

        /// Print the contact as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the contact stored at a location.
    /// Fields left out are stored empty, not kept
    Update {
        #[arg(long)]
        location: String,

        #[command(flatten)]
        contact: ContactArgs,
    },
    /// Delete the contact stored at a location
    Delete {
        #[arg(long)]
        location: String,
    },
    /// Walk one contact through add, get, update and delete
    Demo {
        #[arg(long, default_value = "contacts/johndoe.json")]
        location: String,
    },
}

#[derive(Args, Debug)]
pub struct ContactArgs {
    /// Contact name
    #[arg(long)]
    pub name: String,

    /// Contact phone number
    #[arg(long)]
    pub phone: String,

    /// Contact email address
    #[arg(long)]
    pub email: Option<String>,

    /// Contact postal address
    #[arg(long)]
    pub address: Option<String>,
}
