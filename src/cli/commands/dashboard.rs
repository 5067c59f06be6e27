use serde_json::{json, Value};

use crate::api::dashboard;
use crate::api::Freshness;
use crate::cli::{Context, OutputFormat, Screen};
use crate::permissions::Action;

pub async fn handle(ctx: &mut Context) -> anyhow::Result<()> {
    ctx.authorize(Screen::DASHBOARD, Action::Read, "the dashboard")?;

    let counts = dashboard::counts(&ctx.client, &mut ctx.store).await;

    let rows: Vec<Value> = counts
        .iter()
        .map(|(card, count)| {
            let interactive = card.is_interactive(ctx.store.permissions(), &ctx.policy);
            match count {
                Ok(count) => json!({
                    "card": card,
                    "title": card.title(),
                    "count": count.count,
                    "freshness": count.freshness,
                    "interactive": interactive,
                }),
                Err(e) => json!({
                    "card": card,
                    "title": card.title(),
                    "error": e.to_string(),
                    "interactive": interactive,
                }),
            }
        })
        .collect();

    match ctx.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "cards": rows }))?),
        OutputFormat::Text => {
            for (card, count) in &counts {
                match count {
                    Ok(count) => println!(
                        "{:<20} {:>6}{}",
                        card.title(),
                        count.count,
                        if count.freshness == Freshness::Cached { "  (cached)" } else { "" }
                    ),
                    Err(e) => println!("{:<20} {:>6}  ({})", card.title(), "-", e),
                }
            }
        }
    }

    if counts.iter().all(|(_, count)| count.is_err()) {
        return Err(anyhow::anyhow!("Could not load any dashboard card"));
    }
    Ok(())
}
