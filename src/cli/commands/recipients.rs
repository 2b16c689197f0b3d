//! Recipients command implementation.

use anyhow::Result;

use super::{Session, parse_issue, print_json};
use crate::cli::RecipientsArgs;
use crate::config::CliOverrides;
use crate::format::format_recipients;

/// Execute the recipients command.
///
/// `--permission` is folded into the settings as an override, so the
/// session's notifiable permission is the one to resolve against.
///
/// # Errors
///
/// Returns an error if the issue does not exist or membership data cannot
/// be read.
pub fn execute(overrides: &CliOverrides, args: &RecipientsArgs, json: bool) -> Result<()> {
    let session = Session::open(overrides)?;
    let issue_id = parse_issue(&args.issue)?;
    let permission = session.manager.options().notifiable_permission.clone();

    let recipients = session
        .manager
        .resolve_notification_recipients(issue_id, &permission)?;
    if json {
        print_json(&recipients)
    } else {
        println!("{}", format_recipients(&recipients));
        Ok(())
    }
}
