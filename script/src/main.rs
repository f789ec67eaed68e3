//! Operator CLI for the shielded pool.
//!
//! Subcommands:
//!   self-test      - Check keccak256 and Poseidon against known vectors
//!   note           - Generate a note and print its commitment / nullifier hash
//!   parse-note     - Decode a compact note string
//!   ciphertext     - Compute a v2b amount ciphertext
//!   decrypt        - Recover an amount from a v2b ciphertext
//!   next-root      - Single-leaf root combiner
//!   init           - Create the pool state file
//!   mint           - Credit test tokens to an account
//!   deposit        - Approve and deposit a commitment
//!   register-root  - Register a Merkle root (admin only)
//!   request        - Build a withdrawal request with a development proof
//!   verify         - Run a request's proof through a verifier
//!   withdraw       - Submit a withdrawal request
//!   status         - Print ledger summary

use alloy_primitives::{Address, B256, U256};
use anyhow::{bail, ensure, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shielded_pool::{
    default_genesis_root, DigestVerifier, MemoryToken, ShieldedPool, TracingEventSink, Verifier,
    WithdrawalRequest,
};
use shielded_pool_lib::{
    advance_root, generate_note, recipient_field, AmountCipher, Field, Note, WithdrawPublicInputs,
};
use shielded_pool_script::{setup_logger, CliConfig, OnchainVerifier, StateFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "shielded-pool")]
#[command(about = "Operator CLI for the shielded pool ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VerifierKind {
    /// keccak256(abi.encodePacked(publicInputs)) development oracle
    Digest,
    /// IVerifier contract at VERIFIER_ADDRESS via RPC_URL
    Onchain,
}

#[derive(Subcommand)]
enum Commands {
    /// Check keccak256 and Poseidon against known vectors
    SelfTest,
    /// Generate a note
    Note {
        /// Token amount the note carries
        #[arg(long)]
        value: U256,
        /// Note secret (random if omitted)
        #[arg(long)]
        secret: Option<Field>,
        /// Nullifier seed (random if omitted)
        #[arg(long)]
        nullifier_seed: Option<Field>,
        /// Also write the note JSON here
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Decode a compact note string
    ParseNote { note: Note },
    /// Compute the v2b ciphertext of an amount
    Ciphertext {
        #[arg(long)]
        amount: U256,
        #[arg(long)]
        nullifier: B256,
        #[arg(long)]
        recipient: Address,
        /// Salt override (default: POOL_SALT or keccak256("ShieldedPool.v2b"))
        #[arg(long)]
        salt: Option<B256>,
    },
    /// Recover the amount from a v2b ciphertext
    Decrypt {
        #[arg(long)]
        ciphertext: B256,
        #[arg(long)]
        nullifier: B256,
        #[arg(long)]
        recipient: Address,
        #[arg(long)]
        salt: Option<B256>,
    },
    /// nextRoot = keccak256((root ^ commitment) mod 2^253)
    NextRoot {
        /// Defaults to the state file's current root, else the genesis root
        #[arg(long)]
        root: Option<B256>,
        #[arg(long)]
        commitment: B256,
    },
    /// Create the state file
    Init {
        /// Account holding pooled funds in the token book
        #[arg(long)]
        pool_address: Address,
        /// Overwrite an existing state file
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// Credit tokens to an account
    Mint {
        #[arg(long)]
        to: Address,
        #[arg(long)]
        amount: U256,
    },
    /// Approve the pool and deposit a commitment
    Deposit {
        #[arg(long)]
        from: Address,
        /// Compact note; supplies commitment and amount
        #[arg(long, conflicts_with = "commitment")]
        note: Option<Note>,
        #[arg(long)]
        commitment: Option<B256>,
        /// Required with --commitment; overrides the note value otherwise
        #[arg(long)]
        amount: Option<U256>,
    },
    /// Register a Merkle root
    RegisterRoot {
        #[arg(long)]
        root: B256,
        /// Defaults to POOL_ADMIN / the state file's admin
        #[arg(long)]
        caller: Option<Address>,
    },
    /// Build a withdrawal request with a development digest proof
    Request {
        #[arg(long)]
        note: Note,
        #[arg(long)]
        recipient: Address,
        /// Defaults to the current root
        #[arg(long)]
        root: Option<B256>,
        /// Path to write the request JSON
        #[arg(long)]
        output: PathBuf,
    },
    /// Check a request's proof without touching the ledger
    Verify {
        #[arg(long)]
        request: PathBuf,
        #[arg(long, value_enum, default_value = "digest")]
        verifier: VerifierKind,
    },
    /// Submit a withdrawal request
    Withdraw {
        #[arg(long)]
        request: PathBuf,
        /// Relayer submitting the request
        #[arg(long)]
        caller: Address,
        #[arg(long, value_enum, default_value = "digest")]
        verifier: VerifierKind,
    },
    /// Print the ledger summary
    Status,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_logger();
    let cli = Cli::parse();
    let config = CliConfig::from_env()?;

    match cli.command {
        Commands::SelfTest => {
            shielded_pool_lib::self_test()?;
            println!("[self-test] keccak256 and poseidon match the circuit vectors");
        }
        Commands::Note {
            value,
            secret,
            nullifier_seed,
            output,
        } => {
            let secret = secret.unwrap_or_else(|| Field::random(&mut rand::thread_rng()));
            let generated = generate_note(value, secret, nullifier_seed)?;
            let json = serde_json::to_string_pretty(&generated)?;
            println!("{json}");
            println!("[note] {}", generated.note);
            if let Some(path) = output {
                std::fs::write(&path, &json)?;
                println!("[note] Written to {}", path.display());
            }
        }
        Commands::ParseNote { note } => {
            let generated = note.derive()?;
            println!("{}", serde_json::to_string_pretty(&generated)?);
        }
        Commands::Ciphertext {
            amount,
            nullifier,
            recipient,
            salt,
        } => {
            let cipher = AmountCipher::new(salt.unwrap_or(config.salt));
            let ct = cipher.encrypt(amount, &nullifier, &recipient_field(recipient));
            println!("{ct}");
        }
        Commands::Decrypt {
            ciphertext,
            nullifier,
            recipient,
            salt,
        } => {
            let cipher = AmountCipher::new(salt.unwrap_or(config.salt));
            let amount = cipher.decrypt(&ciphertext, &nullifier, &recipient_field(recipient));
            println!("{amount}");
        }
        Commands::NextRoot { root, commitment } => {
            let root = match root {
                Some(root) => root,
                None => match StateFile::load(&config.state_path) {
                    Ok(state) => state.ledger.current_root,
                    Err(_) => default_genesis_root(),
                },
            };
            println!("{}", advance_root(&root, &commitment));
        }
        Commands::Init {
            pool_address,
            force,
        } => init(&config, pool_address, force)?,
        Commands::Mint { to, amount } => {
            let mut state = StateFile::load(&config.state_path)?;
            let (pool, token) = state.open(DigestVerifier)?;
            token.mint(to, amount);
            state.update(&pool);
            state.save(&config.state_path)?;
            println!("[mint] {to} balance: {}", token.balance_of(to));
        }
        Commands::Deposit {
            from,
            note,
            commitment,
            amount,
        } => {
            let (commitment, amount) = match (note, commitment) {
                (Some(note), _) => (note.commitment()?, amount.unwrap_or_else(|| note.amount())),
                (None, Some(commitment)) => (
                    commitment,
                    amount.context("--amount is required with --commitment")?,
                ),
                (None, None) => bail!("one of --note or --commitment is required"),
            };

            let mut state = StateFile::load(&config.state_path)?;
            let (pool, token) = state.open(DigestVerifier)?;
            token.approve(from, token.pool_address(), amount);
            let receipt = pool.deposit(from, commitment, amount)?;
            state.update(&pool);
            state.save(&config.state_path)?;
            println!("[deposit] commitment: {}", receipt.commitment);
            println!("[deposit] leaf index: {}", receipt.leaf_index);
            println!("[deposit] current root: {}", receipt.root);
        }
        Commands::RegisterRoot { root, caller } => {
            let mut state = StateFile::load(&config.state_path)?;
            let caller = caller.or(config.admin).unwrap_or(state.admin);
            let (pool, _) = state.open(DigestVerifier)?;
            let added = pool.register_root(caller, root)?;
            state.update(&pool);
            state.save(&config.state_path)?;
            if added {
                println!("[register-root] {root} is now current");
            } else {
                println!("[register-root] {root} was already known");
            }
        }
        Commands::Request {
            note,
            recipient,
            root,
            output,
        } => {
            let state = StateFile::load(&config.state_path)?;
            let root = root.unwrap_or(state.ledger.current_root);
            let nullifier_hash = note.nullifier_hash()?;
            let inputs = WithdrawPublicInputs::new(nullifier_hash, note.amount(), root, recipient).encode();
            let proof = DigestVerifier::prove(&inputs);
            let ciphertext = AmountCipher::new(state.salt).encrypt(
                note.amount(),
                &nullifier_hash,
                &recipient_field(recipient),
            );
            let request = WithdrawalRequest::new(proof, inputs).with_ciphertext(ciphertext);
            std::fs::write(&output, serde_json::to_string_pretty(&request)?)?;
            println!("[request] nullifier hash: {nullifier_hash}");
            println!("[request] ciphertext: {ciphertext}");
            println!("[request] Written to {}", output.display());
        }
        Commands::Verify { request, verifier } => {
            let request = read_request(&request)?;
            let verifier = make_verifier(verifier, &config)?;
            let ok = verifier.verify(&request.proof, &request.public_inputs)?;
            println!("[verify] {}", if ok { "valid" } else { "invalid" });
            ensure!(ok, "proof rejected by verifier");
        }
        Commands::Withdraw {
            request,
            caller,
            verifier,
        } => {
            let request = read_request(&request)?;
            let mut state = StateFile::load(&config.state_path)?;
            let (pool, token) = state.open(make_verifier(verifier, &config)?)?;
            let receipt = pool.withdraw(caller, &request)?;
            state.update(&pool);
            state.save(&config.state_path)?;
            println!("[withdraw] paid {} to {}", receipt.value, receipt.recipient);
            println!("[withdraw] recipient balance: {}", token.balance_of(receipt.recipient));
        }
        Commands::Status => {
            let state = StateFile::load(&config.state_path)?;
            let token = MemoryToken::from_snapshot(state.token.clone());
            println!("State file:    {}", config.state_path.display());
            println!("Admin:         {}", state.admin);
            println!("Root policy:   {:?}", state.config.root_policy);
            println!("Current root:  {}", state.ledger.current_root);
            println!("Known roots:   {}", state.ledger.roots.len());
            println!("Commitments:   {}", state.ledger.commitments.len());
            println!("Spent:         {}", state.ledger.nullifiers.len());
            println!("Pool balance:  {}", token.balance_of(token.pool_address()));
        }
    }

    Ok(())
}

fn init(config: &CliConfig, pool_address: Address, force: bool) -> Result<()> {
    let path = &config.state_path;
    if path.exists() && !force {
        bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    let admin = config.require_admin()?;
    let pool_config = config.pool_config();
    let token = Arc::new(MemoryToken::new(pool_address));
    let pool = ShieldedPool::new(pool_config.clone(), DigestVerifier, token.clone(), TracingEventSink, admin)?;
    let state = StateFile {
        config: pool_config,
        admin,
        salt: config.salt,
        ledger: pool.snapshot(),
        token: token.snapshot(),
    };
    state.save(path)?;
    info!(path = %path.display(), %admin, "state file created");
    println!("[init] genesis root: {}", state.ledger.current_root);
    println!("[init] State written to {}", path.display());
    Ok(())
}

fn read_request(path: &Path) -> Result<WithdrawalRequest> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}

fn make_verifier(kind: VerifierKind, config: &CliConfig) -> Result<Arc<dyn Verifier>> {
    match kind {
        VerifierKind::Digest => Ok(Arc::new(DigestVerifier)),
        VerifierKind::Onchain => {
            let (url, address) = config.require_onchain()?;
            Ok(Arc::new(OnchainVerifier::connect(&url, address)?))
        }
    }
}
