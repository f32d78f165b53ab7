//! Mint a client token for local development, signed the way the identity
//! provider signs them.

use clap::Parser;
use services::services::identity::{IdentityVerifier, Role};

#[derive(Parser, Debug)]
#[command(name = "issue-token", about = "Mint a development bearer token")]
struct Args {
    /// Client id placed in the `sub` claim
    #[arg(long)]
    sub: String,

    #[arg(long)]
    email: String,

    /// `client` or `admin`
    #[arg(long, default_value = "client")]
    role: Role,

    #[arg(long, env = "BOOKING_JWT_SECRET")]
    secret: String,

    #[arg(long, default_value_t = 60)]
    ttl_minutes: i64,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let verifier = IdentityVerifier::new(&args.secret, args.ttl_minutes);
    let token = verifier.issue(&args.sub, &args.email, args.role)?;
    println!("{token}");
    Ok(())
}
