//! Dashboard cards: total, approved, disapproved and exited visitors.

use serde::Serialize;
use serde_json::Value;

use super::{visitors, with_cache_fallback, Freshness};
use crate::client::ResourceClient;
use crate::error::ClientError;
use crate::permissions::{Action, DefaultPolicy, PermissionSet};
use crate::store::{CacheKey, StateStore};

pub const DASHBOARD_MODULE: &str = "Dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Card {
    Total,
    Approved,
    Disapproved,
    Exit,
}

impl Card {
    pub const ALL: [Card; 4] = [Card::Total, Card::Approved, Card::Disapproved, Card::Exit];

    /// Permission module gating the card. Absent records inherit `Dashboard`.
    pub fn module(&self) -> &'static str {
        match self {
            Card::Total => "TotalVisitors",
            Card::Approved => "ApprovedPasses",
            Card::Disapproved => "DisapprovedPasses",
            Card::Exit => "TotalExitPasses",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Card::Total => "Total Visitors",
            Card::Approved => "Approved Passes",
            Card::Disapproved => "Disapproved Passes",
            Card::Exit => "Total Exit Passes",
        }
    }

    fn cache_key(&self) -> CacheKey {
        match self {
            Card::Total => CacheKey::AllVisitors,
            Card::Approved => CacheKey::ApprovedVisitors,
            Card::Disapproved => CacheKey::DisapprovedVisitors,
            Card::Exit => CacheKey::ExitVisitors,
        }
    }

    pub fn matches(&self, visitor: &Value) -> bool {
        match self {
            Card::Total => true,
            Card::Approved => visitor.get("isApproved") == Some(&Value::Bool(true)),
            Card::Disapproved => visitor.get("isApproved") == Some(&Value::Bool(false)),
            Card::Exit => visitor.get("exit") == Some(&Value::Bool(true)),
        }
    }

    /// A card opens its detail list only with read plus some write capability.
    pub fn is_interactive(&self, permissions: &PermissionSet, policy: &DefaultPolicy) -> bool {
        let can = |action| permissions.can_with_fallback(self.module(), &[DASHBOARD_MODULE], action, policy);
        can(Action::Read) && (can(Action::Create) || can(Action::Update) || can(Action::Delete))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CardCount {
    pub card: Card,
    pub count: usize,
    pub freshness: Freshness,
}

async fn fetch_card(client: &ResourceClient, card: Card) -> Result<Vec<Value>, ClientError> {
    let visitors = visitors::fetch_all(client).await?;
    Ok(visitors.into_iter().filter(|v| card.matches(v)).collect())
}

/// Count every card. The four fetches run concurrently and independently, so
/// each card may reflect a different moment. A card whose fetch fails uses its
/// cached list; with no cache either, its error is returned in place.
pub async fn counts(
    client: &ResourceClient,
    store: &mut StateStore,
) -> Vec<(Card, Result<CardCount, ClientError>)> {
    let (total, approved, disapproved, exit) = tokio::join!(
        fetch_card(client, Card::Total),
        fetch_card(client, Card::Approved),
        fetch_card(client, Card::Disapproved),
        fetch_card(client, Card::Exit),
    );

    [total, approved, disapproved, exit]
        .into_iter()
        .zip(Card::ALL)
        .map(|(fetched, card)| {
            let count = with_cache_fallback(store, card.cache_key(), fetched).map(|(items, freshness)| {
                CardCount {
                    card,
                    // Cached lists are re-filtered in case they predate a status change
                    count: items.iter().filter(|v| card.matches(v)).count(),
                    freshness,
                }
            });
            (card, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{Capabilities, PermissionRecord};
    use serde_json::json;

    #[test]
    fn test_card_filters() {
        let approved = json!({ "isApproved": true });
        let disapproved = json!({ "isApproved": false, "exit": true });
        let pending = json!({ "isApproved": null });

        assert!(Card::Approved.matches(&approved));
        assert!(!Card::Approved.matches(&pending));
        assert!(Card::Disapproved.matches(&disapproved));
        assert!(!Card::Disapproved.matches(&pending));
        assert!(Card::Exit.matches(&disapproved));
        assert!(Card::Total.matches(&pending));
    }

    #[test]
    fn test_cards_inherit_dashboard_record() {
        let policy = DefaultPolicy::fail_closed();
        let set = PermissionSet::new(vec![
            PermissionRecord::uniform(DASHBOARD_MODULE, true),
            PermissionRecord {
                name: "ApprovedPasses".into(),
                can_read: true,
                ..PermissionRecord::uniform("ApprovedPasses", false)
            },
        ]);

        assert!(Card::Total.is_interactive(&set, &policy));
        assert!(!Card::Approved.is_interactive(&set, &policy));
        assert!(!Card::Total.is_interactive(&PermissionSet::default(), &policy));

        let open = DefaultPolicy::fail_closed().with_module("TotalVisitors", Capabilities::ALL);
        assert!(Card::Total.is_interactive(&PermissionSet::default(), &open));
    }
}
