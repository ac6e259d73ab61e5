/// Purchasable credit amounts and their price in cents. Larger amounts are
/// discounted, so price is always looked up, never computed per unit.
pub const CREDIT_CATALOG: &[(i32, i64)] = &[(50, 500), (175, 1500), (400, 3000), (750, 5000)];

pub fn price_for_credits(credits: i32) -> Option<i64> {
    CREDIT_CATALOG
        .iter()
        .find(|(amount, _)| *amount == credits)
        .map(|(_, cents)| *cents)
}

pub fn catalog_options() -> String {
    CREDIT_CATALOG
        .iter()
        .map(|(amount, _)| amount.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
