//! # Accounts Command Implementation
//!
//! Checks every roster login against GitLab and warns about the ones without
//! an account, typically students who never signed in.

use anyhow::Result;
use clap::Args;

use teachers_gitlab::output::emoji;
use teachers_gitlab::roster::lookup_users;

use super::common::{GlobalArgs, RosterArgs};

/// List roster logins that have no GitLab account
#[derive(Args, Debug)]
pub struct AccountsArgs {
    #[command(flatten)]
    pub roster: RosterArgs,

    /// Print total, not-found and ok counts at the end.
    #[arg(long)]
    pub show_summary: bool,
}

/// Execute the `accounts` command.
pub fn execute(args: AccountsArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let client = global.client()?;
    let session = global.session(&client)?;

    let mut total = 0usize;
    let mut missing = 0usize;
    for user in lookup_users(session, args.roster.open()?, false) {
        let user = user?;
        total += 1;
        if user.account.is_none() {
            log::warn!("User {} not found.", user.login());
            missing += 1;
        }
    }

    if args.show_summary {
        println!(
            "{} Total: {}, Not-found: {}, Ok: {}",
            emoji(&out, "👥", "[ACCOUNTS]"),
            total,
            missing,
            total - missing
        );
    }
    Ok(())
}
