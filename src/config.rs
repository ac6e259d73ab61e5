use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::billing::models::Tier;

/// Secret used for JWT verification. Must be set via the `JWT_SECRET` env variable.
pub static JWT_SECRET: Lazy<String> =
    Lazy::new(|| std::env::var("JWT_SECRET").expect("JWT_SECRET must be set"));

/// Address the HTTP server should bind to. Defaults to `0.0.0.0`.
pub static BIND_ADDRESS: Lazy<String> =
    Lazy::new(|| std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()));

/// Port the HTTP server should listen on. Defaults to `3000`.
pub static BIND_PORT: Lazy<u16> = Lazy::new(|| {
    std::env::var("BIND_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000)
});

/// When set to a truthy value, allows the application to continue running even if database
/// migrations fail. Defaults to `false`.
pub static ALLOW_MIGRATION_FAILURE: Lazy<bool> = Lazy::new(|| {
    std::env::var("ALLOW_MIGRATION_FAILURE")
        .ok()
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            matches!(normalized.as_str(), "1" | "true" | "yes")
        })
        .unwrap_or(false)
});

/// key: billing-config -> stripe credentials
pub static STRIPE_SECRET_KEY: Lazy<Option<String>> =
    Lazy::new(|| read_optional_env("STRIPE_SECRET_KEY"));

/// Shared secret for webhook signature verification. Deliveries are rejected
/// outright when it is missing, so a misconfigured deployment cannot apply
/// unverified events.
pub static STRIPE_WEBHOOK_SECRET: Lazy<Option<String>> =
    Lazy::new(|| read_optional_env("STRIPE_WEBHOOK_SECRET"));

/// Base URL of the Stripe API. Overridable for tests.
pub static STRIPE_API_BASE: Lazy<String> = Lazy::new(|| {
    read_optional_env("STRIPE_API_BASE").unwrap_or_else(|| "https://api.stripe.com".to_string())
});

/// key: billing-config -> price-id to tier mapping
///
/// Built once at startup from `STRIPE_PRICE_PRO` / `STRIPE_PRICE_TEAM`.
/// Unset or empty entries are skipped so an empty string can never collide
/// with a real price id; price ids with no mapping resolve to the free tier.
#[derive(Debug, Clone, Default)]
pub struct PriceTierMap {
    entries: HashMap<String, Tier>,
}

impl PriceTierMap {
    pub fn from_entries(entries: impl IntoIterator<Item = (Option<String>, Tier)>) -> Self {
        let entries = entries
            .into_iter()
            .filter_map(|(price_id, tier)| {
                let price_id = price_id?.trim().to_string();
                if price_id.is_empty() {
                    None
                } else {
                    Some((price_id, tier))
                }
            })
            .collect();
        Self { entries }
    }

    pub fn from_env() -> Self {
        Self::from_entries([
            (read_optional_env("STRIPE_PRICE_PRO"), Tier::Pro),
            (read_optional_env("STRIPE_PRICE_TEAM"), Tier::Team),
        ])
    }

    pub fn tier_for_price(&self, price_id: &str) -> Tier {
        self.entries.get(price_id).copied().unwrap_or(Tier::Free)
    }
}

pub static PRICE_TIER_MAP: Lazy<PriceTierMap> = Lazy::new(PriceTierMap::from_env);

fn read_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_price_entries_are_skipped() {
        let map = PriceTierMap::from_entries([
            (Some("price_pro".to_string()), Tier::Pro),
            (Some("  ".to_string()), Tier::Team),
            (None, Tier::Team),
        ]);

        assert_eq!(map.tier_for_price("price_pro"), Tier::Pro);
        assert_eq!(map.tier_for_price(""), Tier::Free);
        assert_eq!(map.tier_for_price("  "), Tier::Free);
    }

    #[test]
    fn unmapped_price_ids_resolve_to_free() {
        let map = PriceTierMap::from_entries([(Some("price_team".to_string()), Tier::Team)]);

        assert_eq!(map.tier_for_price("price_team"), Tier::Team);
        assert_eq!(map.tier_for_price("price_unknown"), Tier::Free);
    }
}
