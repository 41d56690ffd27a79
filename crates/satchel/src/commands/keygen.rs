//! Keygen command - mint session identifiers.
//!
//! Useful for seeding test fixtures or checking that the host has a working
//! entropy source.

use anyhow::Result;
use clap::Args;

use super::Context;

/// Arguments for the keygen command.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Number of identifiers to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,
}

/// Run the keygen command.
pub async fn run(args: KeygenArgs, ctx: &Context) -> Result<()> {
    let ids = (0..args.count)
        .map(|_| satchel_session::generate_id())
        .collect::<satchel_session::Result<Vec<_>>>()?;

    if ctx.json_output {
        println!("{}", serde_json::to_string(&ids)?);
    } else {
        for id in &ids {
            println!("{}", id);
        }
    }

    Ok(())
}
