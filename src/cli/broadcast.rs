use serde_json::json;

use crate::push::BroadcastReport;

use super::commands::BroadcastArgs;
use super::http_client::ApiClient;
use super::prompt::confirm_action;

pub fn run_broadcast(args: BroadcastArgs) -> anyhow::Result<()> {
    if args.body.trim().is_empty() {
        anyhow::bail!("--body cannot be empty");
    }

    let client = ApiClient::new(&args.server, &args.token)?;

    let confirmed = confirm_action(
        &format!("Send this alert to every subscriber of {}?", client.base_url()),
        args.yes,
        args.non_interactive,
    )?;
    if !confirmed {
        println!("Cancelled.");
        return Ok(());
    }

    let report: BroadcastReport = client.post(
        "/admin/broadcast",
        &json!({
            "title": args.title,
            "body": args.body,
            "url": args.url,
            "icon": args.icon,
        }),
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("Broadcast sent to {} subscription(s):", report.attempted);
    println!("  delivered  {}", report.delivered);
    println!("  pruned     {}", report.pruned);
    println!("  failed     {}", report.failed);
    println!();

    Ok(())
}
