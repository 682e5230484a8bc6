//! Generate an RSA key pair for token signing.
//!
//! Prints `JWT_PRIVATE_KEY` and `JWT_PUBLIC_KEY` lines with newlines
//! escaped, ready to paste into an environment file.
//!
//! Usage: `keygen [BITS]` (default 2048)

use warden_auth_core::{KeyPair, MIN_KEY_BITS};

fn main() -> anyhow::Result<()> {
    let bits = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("key size must be a number of bits, got {arg:?}"))?,
        None => MIN_KEY_BITS,
    };

    let keys = KeyPair::generate(bits)?;
    println!("JWT_PRIVATE_KEY=\"{}\"", escape(&keys.private_key_pem()?));
    println!("JWT_PUBLIC_KEY=\"{}\"", escape(&keys.public_key_pem()?));
    Ok(())
}

fn escape(pem: &str) -> String {
    pem.trim_end().replace('\n', "\\n")
}
