//! eepack: Command-line tool for packing and unpacking files.
//!
//! Keys live in a key directory (`<user>.pub`, `<user>.key`). Packed
//! metadata is written next to the cipher as `<cipher>.meta.json`.

use clap::{Parser, Subcommand};
use eepack_core::{Context, Metadata, Packing, PathName, UserName};
use eepack_crypto::format::{decode_wrapped_keys, encode_wrapped_keys};
use eepack_crypto::{generate_key_pair, registry, KeyDirectory};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "eepack")]
#[command(author, version, about = "End-to-end packing with elliptic-curve keys")]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding `<user>.pub` and `<user>.key` files
    #[arg(long, global = true, env = "EEPACK_KEY_DIR", default_value = "keys")]
    key_dir: PathBuf,

    /// Packing variant (ee.p256 or ee.p521)
    #[arg(long, global = true, env = "EEPACK_PACKING", default_value = "ee.p256")]
    packing: Packing,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key pair and store it in the key directory
    Keygen {
        /// User to generate keys for
        #[arg(short, long, env = "EEPACK_USER")]
        user: UserName,
    },

    /// Encrypt and sign a file for its owner and readers
    Pack {
        /// Owner of the packed file
        #[arg(short, long, env = "EEPACK_USER")]
        user: UserName,

        /// Path name the blob is stored under (must be owned by --user)
        #[arg(long)]
        path: PathName,

        /// Input file to pack
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the cipher blob
        #[arg(short, long)]
        output: PathBuf,

        /// Additional readers (can specify multiple)
        #[arg(short, long, num_args = 1..)]
        reader: Vec<UserName>,
    },

    /// Verify and decrypt a packed file
    Unpack {
        /// User unpacking the file
        #[arg(short, long, env = "EEPACK_USER")]
        user: UserName,

        /// Path name the blob was packed under
        #[arg(long)]
        path: PathName,

        /// Cipher blob to unpack
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the plaintext
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the readers of a packed file
    Readers {
        /// Cipher blob whose metadata to read
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG overrides the default of warnings only.
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let keys = KeyDirectory::new(cli.key_dir);

    match cli.command {
        Commands::Keygen { user } => {
            cmd_keygen(&keys, cli.packing, &user).await?;
        }
        Commands::Pack {
            user,
            path,
            input,
            output,
            reader,
        } => {
            cmd_pack(keys, cli.packing, user, &path, &input, &output, reader).await?;
        }
        Commands::Unpack {
            user,
            path,
            input,
            output,
        } => {
            cmd_unpack(keys, cli.packing, user, &path, &input, &output).await?;
        }
        Commands::Readers { input } => {
            cmd_readers(&input).await?;
        }
    }

    Ok(())
}

/// `<blob>.meta.json`
fn meta_path(blob: &Path) -> PathBuf {
    let mut name = OsString::from(blob.as_os_str());
    name.push(".meta.json");
    PathBuf::from(name)
}

async fn context_for(
    keys: KeyDirectory,
    packing: Packing,
    user: UserName,
) -> Result<Context, Box<dyn std::error::Error>> {
    let key_pair = keys.load_key_pair(&user).await?;
    Ok(Context::new(user, key_pair, packing, Arc::new(keys)))
}

async fn cmd_keygen(
    keys: &KeyDirectory,
    packing: Packing,
    user: &UserName,
) -> Result<(), Box<dyn std::error::Error>> {
    let key_pair = generate_key_pair(packing);
    keys.save_key_pair(user, &key_pair).await?;

    let output = serde_json::json!({
        "user": user,
        "packing": packing.to_string(),
        "key_dir": keys.root().to_string_lossy(),
        "public_key": key_pair.public.as_str(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn cmd_pack(
    keys: KeyDirectory,
    packing: Packing,
    user: UserName,
    path: &PathName,
    input_path: &Path,
    output_path: &Path,
    readers: Vec<UserName>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = context_for(keys, packing, user).await?;
    let packer = registry::lookup(packing);

    let plaintext = tokio::fs::read(input_path).await?;
    let mut meta = Metadata::with_readers(readers);
    let mut cipher = vec![0u8; packer.pack_len(&ctx, plaintext.len(), &meta, path)];
    let n = packer
        .pack(&ctx, &mut cipher, &plaintext, &mut meta, path)
        .await?;
    cipher.truncate(n);

    tokio::fs::write(output_path, &cipher).await?;
    let meta_file = meta_path(output_path);
    tokio::fs::write(&meta_file, serde_json::to_vec_pretty(&meta)?).await?;

    let output = serde_json::json!({
        "path": path.as_str(),
        "input": input_path.to_string_lossy(),
        "output": output_path.to_string_lossy(),
        "metadata": meta_file.to_string_lossy(),
        "input_size": plaintext.len(),
        "output_size": cipher.len(),
        "readers": meta.readers,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn cmd_unpack(
    keys: KeyDirectory,
    packing: Packing,
    user: UserName,
    path: &PathName,
    input_path: &Path,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = context_for(keys, packing, user).await?;
    let packer = registry::lookup(packing);

    let cipher = tokio::fs::read(input_path).await?;
    let meta: Metadata = serde_json::from_slice(&tokio::fs::read(meta_path(input_path)).await?)?;

    let mut clear = vec![0u8; packer.unpack_len(&ctx, cipher.len(), &meta)];
    let n = packer
        .unpack(&ctx, &mut clear, &cipher, &meta, path)
        .await?;
    clear.truncate(n);

    tokio::fs::write(output_path, &clear).await?;

    let output = serde_json::json!({
        "path": path.as_str(),
        "input": input_path.to_string_lossy(),
        "output": output_path.to_string_lossy(),
        "input_size": cipher.len(),
        "output_size": clear.len(),
        "owner": path.user(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn cmd_readers(input_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let meta: Metadata = serde_json::from_slice(&tokio::fs::read(meta_path(input_path)).await?)?;

    let readers: Vec<&str> = meta.readers.iter().map(|u| u.as_str()).collect();

    // Round-trip through the signed encoding: rejects duplicate entries and
    // lists the wrapped keys in canonical order.
    let canonical = decode_wrapped_keys(&encode_wrapped_keys(&meta.wrapped_keys)?)?;
    let wrapped_for: Vec<String> = canonical.iter().map(|k| k.user.to_string()).collect();

    let output = serde_json::json!({
        "file": input_path.to_string_lossy(),
        "readers": readers,
        "count": readers.len(),
        "wrapped_for": wrapped_for,
        "consistent": meta.readers_match_wrapped_keys(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
