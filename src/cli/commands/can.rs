//! Can command implementation.

use anyhow::Result;
use multiprojects_lib::model::Action;

use super::{Session, parse_issue, parse_user, print_json};
use crate::cli::CanArgs;
use crate::config::CliOverrides;
use crate::format::AccessReport;

/// Execute the can command. Prints `yes` or `no`; a denial is not an error.
///
/// # Errors
///
/// Returns an error if the workspace cannot be opened or arguments are invalid.
pub fn execute(overrides: &CliOverrides, args: &CanArgs, json: bool) -> Result<()> {
    let session = Session::open(overrides)?;
    let user_id = parse_user(&args.user)?;
    let issue_id = parse_issue(&args.issue)?;
    let action: Action = args.action.parse()?;

    let allowed = session.manager.can_perform(user_id, issue_id, action);
    if json {
        print_json(&AccessReport {
            user_id,
            issue_id,
            action,
            allowed,
        })
    } else {
        println!("{}", if allowed { "yes" } else { "no" });
        Ok(())
    }
}
