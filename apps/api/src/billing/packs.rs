//! The fixed credit-pack catalog. Prices are cents, currency is EUR.

pub const CURRENCY: &str = "eur";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditPack {
    pub id: &'static str,
    pub name: &'static str,
    pub price_cents: i64,
    pub credits: i32,
}

pub const PACKS: [CreditPack; 3] = [
    CreditPack {
        id: "starter",
        name: "Starter",
        price_cents: 900,
        credits: 100,
    },
    CreditPack {
        id: "pro",
        name: "Pro",
        price_cents: 2400,
        credits: 350,
    },
    CreditPack {
        id: "power",
        name: "Power",
        price_cents: 4900,
        credits: 900,
    },
];

pub fn find_pack(id: &str) -> Option<&'static CreditPack> {
    PACKS.iter().find(|pack| pack.id == id)
}
