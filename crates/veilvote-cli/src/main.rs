//! VeilVote CLI
//!
//! Drives the full encrypted-vote flow against a local mock deployment
//! persisted as JSON: create a deployment, cast or update votes as named
//! voters, inspect stored handles, and reveal one's own vote.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use veilvote_backend::{
    owner_from_label, registry_from_label, MockFheBackend, MockSigner, SystemClock,
};
use veilvote_client::VoterSession;
use veilvote_registry::{InMemoryHandleStore, VoteRegistry};
use veilvote_runtime::{CiphertextHandle, OwnerAddress, RegistryId};

#[derive(Parser)]
#[command(name = "veilvote")]
#[command(about = "Cast and reveal encrypted votes against a local mock deployment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new deployment state file
    Init {
        /// Deployment label (determines the registry instance id)
        #[arg(short, long, default_value = "veilvote-dao")]
        label: String,

        /// Path of the state file to create
        #[arg(short, long, default_value = "veilvote.json")]
        state: PathBuf,

        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Encrypt an eye choice and cast it as the voter's current vote
    Cast {
        /// Voter name
        #[arg(short, long)]
        voter: String,

        /// Eye identifier to vote for (32-bit unsigned)
        #[arg(short, long)]
        eye: u32,

        /// Path to the state file
        #[arg(short, long, default_value = "veilvote.json")]
        state: PathBuf,
    },

    /// Show who has voted and their stored ciphertext handles
    Status {
        /// Restrict to one voter
        #[arg(short, long)]
        voter: Option<String>,

        /// Path to the state file
        #[arg(short, long, default_value = "veilvote.json")]
        state: PathBuf,
    },

    /// Decrypt and print the voter's own stored vote
    Reveal {
        /// Voter name
        #[arg(short, long)]
        voter: String,

        /// Path to the state file
        #[arg(short, long, default_value = "veilvote.json")]
        state: PathBuf,
    },
}

/// Whole mock deployment: registry instance, backend ciphertexts and keys,
/// the handle ledger, and the name -> address book for named voters.
#[derive(Serialize, Deserialize)]
struct DeploymentState {
    registry_id: RegistryId,
    backend: MockFheBackend,
    votes: InMemoryHandleStore,
    voters: BTreeMap<String, OwnerAddress>,
}

impl DeploymentState {
    fn new(label: &str) -> Self {
        Self {
            registry_id: registry_from_label(label),
            backend: MockFheBackend::new(),
            votes: InMemoryHandleStore::new(),
            voters: BTreeMap::new(),
        }
    }

    fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse state file {}", path.display()))
    }

    fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("Failed to serialize state")?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write state file {}", path.display()))
    }

    /// Address for a named voter, registering the name on first use.
    fn voter(&mut self, name: &str) -> OwnerAddress {
        *self
            .voters
            .entry(name.to_string())
            .or_insert_with(|| owner_from_label(name))
    }

    fn registry(&self) -> VoteRegistry<InMemoryHandleStore, MockFheBackend> {
        VoteRegistry::new(self.registry_id, self.votes.clone(), self.backend.clone())
    }

    fn session(
        &self,
        owner: OwnerAddress,
    ) -> VoterSession<MockFheBackend, MockSigner, SystemClock> {
        VoterSession::new(self.backend.clone(), self.backend.signer_for(owner), SystemClock)
    }
}

fn cmd_init(path: &Path, label: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("State file {} already exists (use --force to overwrite)", path.display());
    }
    let state = DeploymentState::new(label);
    state.save(path)?;
    println!("Created deployment '{label}' with registry {}", state.registry_id);
    println!("State written to {}", path.display());
    Ok(())
}

fn cmd_cast(path: &Path, voter: &str, eye: u32) -> Result<CiphertextHandle> {
    let mut state = DeploymentState::load(path)?;
    let owner = state.voter(voter);
    let registry = state.registry();

    let session = state.session(owner);
    let handle = session
        .cast_vote(&registry, eye)
        .with_context(|| format!("Vote by '{voter}' was rejected"))?;

    state.save(path)?;
    println!("{}", session.status());
    println!("Stored handle for {voter} ({owner}): {handle}");
    Ok(handle)
}

fn cmd_status(path: &Path, voter: Option<&str>) -> Result<()> {
    let state = DeploymentState::load(path)?;
    let registry = state.registry();

    let selected: Vec<(&String, &OwnerAddress)> = match voter {
        Some(name) => match state.voters.get_key_value(name) {
            Some(pair) => vec![pair],
            None => bail!("Unknown voter '{name}'"),
        },
        None => state.voters.iter().collect(),
    };

    println!("Registry {}", state.registry_id);
    if selected.is_empty() {
        println!("No registered voters");
    }
    for (name, owner) in selected {
        let handle = registry.get_encrypted_vote(*owner)?;
        if handle.is_empty() {
            println!("{name} ({owner}): no vote");
        } else {
            println!("{name} ({owner}): voted, handle {handle}");
        }
    }
    Ok(())
}

fn cmd_reveal(path: &Path, voter: &str) -> Result<Option<u64>> {
    let mut state = DeploymentState::load(path)?;
    let owner = state.voter(voter);
    let registry = state.registry();

    let session = state.session(owner);
    let revealed = session
        .reveal_vote(&registry)
        .with_context(|| format!("Decryption for '{voter}' failed"))?;

    match revealed {
        Some(value) => println!("{voter} voted for eye ID {value}"),
        None => println!("{voter} has not voted"),
    }
    Ok(revealed)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Init { label, state, force } => cmd_init(&state, &label, force),
        Commands::Cast { voter, eye, state } => cmd_cast(&state, &voter, eye).map(|_| ()),
        Commands::Status { voter, state } => cmd_status(&state, voter.as_deref()),
        Commands::Reveal { voter, state } => cmd_reveal(&state, &voter).map(|_| ()),
    }
}
