//! Order assembly: cart math, combo validation, and the WhatsApp
//! handoff message.
//!
//! There is no order database. A finished order becomes a preformatted
//! text plus a wa.me link; the kitchen's phone is the system of record.
//! Prices are integer shillings throughout, so totals are exact. Unit
//! prices and quantities arrive as `u32`; every computed amount runs in
//! `u64` and clamps at the ceiling instead of wrapping, so even a
//! hostile cart cannot produce a small wrong total.

use chrono::{DateTime, Utc};
use chrono_tz::Africa::Kampala;
use serde::{Deserialize, Serialize};

use crate::config::DeliveryConfig;
use crate::geo::format_distance_km;
use crate::tiers::DeliveryQuote;

// ─── Menu structure ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Main,
    Side,
    Drink,
    Extra,
}

impl ItemCategory {
    fn label(self) -> &'static str {
        match self {
            ItemCategory::Main => "main",
            ItemCategory::Side => "side",
            ItemCategory::Drink => "drink",
            ItemCategory::Extra => "extra",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub item: String,
    pub category: ItemCategory,
    /// UGX per unit.
    pub unit_price: u32,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CartLine {
    /// Exact in `u64`; a `u32` product can overflow on request-supplied
    /// quantities.
    pub fn line_total(&self) -> u64 {
        u64::from(self.unit_price) * u64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn subtotal(&self) -> u64 {
        self.lines
            .iter()
            .fold(0u64, |acc, line| acc.saturating_add(line.line_total()))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ─── Combos ─────────────────────────────────────────────────────────────────

/// A fixed-price bundle and the component counts it must contain.
/// Extras ride along at their own prices and are never counted.
#[derive(Debug, Clone, Copy)]
pub struct Combo {
    pub name: &'static str,
    pub mains: u32,
    pub sides: u32,
    pub drinks: u32,
    /// Bundle price in UGX, replacing the component prices.
    pub price: u32,
}

pub const COMBOS: &[Combo] = &[
    Combo {
        name: "Lunch Deal",
        mains: 1,
        sides: 1,
        drinks: 1,
        price: 22_000,
    },
    Combo {
        name: "Date Night",
        mains: 2,
        sides: 1,
        drinks: 2,
        price: 48_000,
    },
    Combo {
        name: "Family Feast",
        mains: 3,
        sides: 3,
        drinks: 4,
        price: 85_000,
    },
];

pub fn combo_by_name(name: &str) -> Option<&'static Combo> {
    COMBOS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// One way a cart misses its combo's required counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComboViolation {
    pub category: ItemCategory,
    pub required: u32,
    pub found: u32,
}

impl std::fmt::Display for ComboViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "needs exactly {} {} item(s), cart has {}",
            self.required,
            self.category.label(),
            self.found
        )
    }
}

/// Check a cart against a combo's exact component counts.
pub fn validate_combo(combo: &Combo, cart: &Cart) -> Vec<ComboViolation> {
    // Saturating: an absurd quantity reads as "far too many", which is
    // a violation either way.
    let count = |category: ItemCategory| -> u32 {
        cart.lines
            .iter()
            .filter(|l| l.category == category)
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    };
    let mut violations = Vec::new();
    for (category, required) in [
        (ItemCategory::Main, combo.mains),
        (ItemCategory::Side, combo.sides),
        (ItemCategory::Drink, combo.drinks),
    ] {
        let found = count(category);
        if found != required {
            violations.push(ComboViolation {
                category,
                required,
                found,
            });
        }
    }
    violations
}

// ─── Composition ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Where to deliver, as the customer described it.
    pub address_label: String,
}

/// The finished handoff: message text, the wa.me link carrying it, and
/// the grand total in UGX.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderMessage {
    pub text: String,
    pub whatsapp_url: String,
    pub total: u64,
}

/// Build the WhatsApp handoff for an order.
///
/// A valid `combo` replaces its component prices with the bundle price;
/// the caller runs [`validate_combo`] first. A non-deliverable quote
/// produces a pickup order with no fee line.
pub fn compose_order(
    config: &DeliveryConfig,
    cart: &Cart,
    combo: Option<&Combo>,
    quote: &DeliveryQuote,
    customer: &CustomerDetails,
) -> OrderMessage {
    compose_order_at(config, cart, combo, quote, customer, Utc::now())
}

/// Same as [`compose_order`] with an explicit timestamp, so tests can
/// pin the clock.
pub fn compose_order_at(
    config: &DeliveryConfig,
    cart: &Cart,
    combo: Option<&Combo>,
    quote: &DeliveryQuote,
    customer: &CustomerDetails,
    when: DateTime<Utc>,
) -> OrderMessage {
    let subtotal = match combo {
        Some(bundle) => cart
            .lines
            .iter()
            .filter(|l| l.category == ItemCategory::Extra)
            .fold(u64::from(bundle.price), |acc, l| {
                acc.saturating_add(l.line_total())
            }),
        None => cart.subtotal(),
    };
    let total = subtotal.saturating_add(u64::from(quote.fee));

    let local = when.with_timezone(&Kampala);
    let mut text = String::new();
    text.push_str(&format!("*{} order*\n", config.kitchen_name));
    text.push_str(&format!("{}\n\n", local.format("%d %b %Y, %H:%M EAT")));

    if let Some(bundle) = combo {
        text.push_str(&format!(
            "Combo: {} (UGX {})\n",
            bundle.name,
            format_ugx(u64::from(bundle.price))
        ));
    }
    for line in &cart.lines {
        // Combo components are covered by the bundle price.
        let priced = combo.is_none() || line.category == ItemCategory::Extra;
        if priced {
            text.push_str(&format!(
                "{}x {} = UGX {}\n",
                line.quantity,
                line.item,
                format_ugx(line.line_total())
            ));
        } else {
            text.push_str(&format!("{}x {}\n", line.quantity, line.item));
        }
        if let Some(note) = &line.note {
            text.push_str(&format!("   note: {note}\n"));
        }
    }

    text.push('\n');
    text.push_str(&format!("Subtotal: UGX {}\n", format_ugx(subtotal)));
    if quote.deliverable {
        text.push_str(&format!(
            "Delivery ({}): UGX {}\n",
            delivery_detail(quote),
            format_ugx(u64::from(quote.fee))
        ));
    } else {
        text.push_str("Delivery: not available for this address, order set for pickup\n");
    }
    text.push_str(&format!("Total: UGX {}\n", format_ugx(total)));
    if let Some(window) = quote.window_label() {
        text.push_str(&format!("Window: {window}\n"));
    }

    text.push('\n');
    if quote.deliverable {
        text.push_str(&format!("Deliver to: {}\n", customer.address_label));
    } else {
        text.push_str(&format!("Pickup at: {}\n", config.kitchen_name));
    }
    text.push_str(&format!("Name: {}\n", customer.name));
    if let Some(phone) = &customer.phone {
        text.push_str(&format!("Phone: {phone}\n"));
    }

    let whatsapp_url = format!(
        "https://wa.me/{}?text={}",
        config.whatsapp_number,
        percent_encode(&text)
    );
    OrderMessage {
        text,
        whatsapp_url,
        total,
    }
}

// "Kololo, 2.5 km", "2.5 km", or just the zone name when no distance
// was computed.
fn delivery_detail(quote: &DeliveryQuote) -> String {
    let distance = quote
        .distance_km
        .is_finite()
        .then(|| format_distance_km(quote.distance_km));
    match (&quote.zone, distance) {
        (Some(zone), Some(d)) => format!("{zone}, {d}"),
        (Some(zone), None) => zone.clone(),
        (None, Some(d)) => d,
        (None, None) => "quoted".to_string(),
    }
}

/// Thousands-grouped shilling amount: 58000 renders as "58,000".
pub fn format_ugx(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// Percent-encode for a URL query value. Byte-wise over the UTF-8
// encoding, so multi-byte characters survive.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn line(item: &str, category: ItemCategory, unit_price: u32, quantity: u32) -> CartLine {
        CartLine {
            item: item.to_string(),
            category,
            unit_price,
            quantity,
            note: None,
        }
    }

    fn sample_cart() -> Cart {
        Cart {
            lines: vec![
                line("Chicken Luwombo", ItemCategory::Main, 25_000, 2),
                line("Chapati", ItemCategory::Side, 2_000, 2),
                line("Stoney Tangawizi", ItemCategory::Drink, 3_000, 2),
            ],
        }
    }

    fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "Achen J".to_string(),
            phone: Some("256700111222".to_string()),
            address_label: "Kololo Hill, Kampala".to_string(),
        }
    }

    #[test]
    fn test_subtotal_multiplies_quantities() {
        assert_eq!(sample_cart().subtotal(), 60_000);
        assert_eq!(Cart::default().subtotal(), 0);
        assert!(Cart::default().is_empty());
        assert!(!sample_cart().is_empty());
    }

    #[test]
    fn test_totals_stay_exact_past_the_u32_range() {
        // 25,000 x 200,000 = 5,000,000,000, beyond what u32 can hold.
        let cart = Cart {
            lines: vec![
                line("Chicken Luwombo", ItemCategory::Main, 25_000, 200_000),
                line("Chapati", ItemCategory::Side, 2_000, 1),
            ],
        };
        assert_eq!(cart.lines[0].line_total(), 5_000_000_000);
        assert_eq!(cart.subtotal(), 5_000_002_000);

        let config = DeliveryConfig::default();
        let quote = DeliveryQuote::from_zone("Kololo", 5_000, "15-25 mins", 2.5);
        let msg = compose_order(&config, &cart, None, &quote, &customer());
        assert_eq!(msg.total, 5_000_007_000);
        assert!(msg.text.contains("Total: UGX 5,000,007,000"));
    }

    #[test]
    fn test_absurd_carts_clamp_instead_of_wrapping() {
        let cart = Cart {
            lines: vec![
                line("Chicken Luwombo", ItemCategory::Main, u32::MAX, u32::MAX),
                line("Goat Muchomo", ItemCategory::Main, u32::MAX, u32::MAX),
            ],
        };
        assert_eq!(cart.subtotal(), u64::MAX);

        let config = DeliveryConfig::default();
        let quote = DeliveryQuote::from_zone("Kololo", 5_000, "15-25 mins", 2.5);
        let msg = compose_order(&config, &cart, None, &quote, &customer());
        assert_eq!(msg.total, u64::MAX);

        let combo = combo_by_name("Lunch Deal").unwrap();
        let violations = validate_combo(combo, &cart);
        assert!(violations.contains(&ComboViolation {
            category: ItemCategory::Main,
            required: 1,
            found: u32::MAX,
        }));
    }

    #[test]
    fn test_combo_with_exact_counts_passes() {
        let combo = combo_by_name("date night").unwrap();
        let cart = Cart {
            lines: vec![
                line("Chicken Luwombo", ItemCategory::Main, 25_000, 2),
                line("Chapati", ItemCategory::Side, 2_000, 1),
                line("Stoney Tangawizi", ItemCategory::Drink, 3_000, 2),
                line("Extra Greens", ItemCategory::Extra, 3_000, 1),
            ],
        };
        assert!(validate_combo(combo, &cart).is_empty());
    }

    #[test]
    fn test_combo_reports_each_wrong_count() {
        let combo = combo_by_name("Lunch Deal").unwrap();
        let cart = Cart {
            lines: vec![line("Chicken Luwombo", ItemCategory::Main, 25_000, 2)],
        };
        let violations = validate_combo(combo, &cart);
        assert_eq!(violations.len(), 3);
        assert!(violations.contains(&ComboViolation {
            category: ItemCategory::Main,
            required: 1,
            found: 2,
        }));
        assert!(violations.contains(&ComboViolation {
            category: ItemCategory::Drink,
            required: 1,
            found: 0,
        }));
    }

    #[test]
    fn test_unknown_combo_name_is_none() {
        assert!(combo_by_name("Mega Deal").is_none());
    }

    #[test]
    fn test_deliverable_order_totals_fee_and_lists_window() {
        let config = DeliveryConfig::default();
        let quote = DeliveryQuote::from_zone("Kololo", 5_000, "15-25 mins", 2.48);
        let when = Utc.with_ymd_and_hms(2026, 8, 25, 10, 45, 0).unwrap();
        let msg = compose_order_at(&config, &sample_cart(), None, &quote, &customer(), when);

        assert_eq!(msg.total, 65_000);
        assert!(msg.text.contains("Delivery (Kololo, 2.5 km): UGX 5,000"));
        assert!(msg.text.contains("Total: UGX 65,000"));
        assert!(msg.text.contains("Window: 15-25 mins"));
        assert!(msg.text.contains("Deliver to: Kololo Hill, Kampala"));
        // Kampala is UTC+3 year-round.
        assert!(msg.text.contains("25 Aug 2026, 13:45 EAT"));
    }

    #[test]
    fn test_non_deliverable_order_becomes_pickup() {
        let config = DeliveryConfig::default();
        let quote = DeliveryQuote::not_deliverable(34.7);
        let msg = compose_order(&config, &sample_cart(), None, &quote, &customer());

        assert_eq!(msg.total, 60_000);
        assert!(msg.text.contains("order set for pickup"));
        assert!(msg.text.contains("Pickup at: Boda Bites"));
        assert!(!msg.text.contains("Window:"));
    }

    #[test]
    fn test_combo_pricing_replaces_component_prices() {
        let config = DeliveryConfig::default();
        let combo = combo_by_name("Lunch Deal").unwrap();
        let cart = Cart {
            lines: vec![
                line("Chicken Luwombo", ItemCategory::Main, 25_000, 1),
                line("Chapati", ItemCategory::Side, 2_000, 1),
                line("Passion Juice", ItemCategory::Drink, 4_000, 1),
                line("Extra Greens", ItemCategory::Extra, 3_000, 1),
            ],
        };
        let quote = DeliveryQuote::not_deliverable(f64::NAN);
        let msg = compose_order(&config, &cart, Some(combo), &quote, &customer());

        // Bundle 22,000 plus the extra at 3,000.
        assert_eq!(msg.total, 25_000);
        assert!(msg.text.contains("Combo: Lunch Deal (UGX 22,000)"));
        assert!(msg.text.contains("1x Chapati\n"));
        assert!(msg.text.contains("1x Extra Greens = UGX 3,000"));
    }

    #[test]
    fn test_whatsapp_url_is_fully_encoded() {
        let config = DeliveryConfig::default();
        let quote = DeliveryQuote::from_zone("Kololo", 5_000, "15-25 mins", 2.5);
        let msg = compose_order(&config, &sample_cart(), None, &quote, &customer());

        assert!(msg
            .whatsapp_url
            .starts_with("https://wa.me/256772345678?text="));
        let query = msg.whatsapp_url.split_once("?text=").unwrap().1;
        assert!(!query.contains(' '));
        assert!(!query.contains('\n'));
        assert!(query.contains("%2A")); // the leading asterisk
        assert!(query.contains("%0A")); // newlines
    }

    #[test]
    fn test_percent_encoding_handles_multibyte() {
        // é is 0xC3 0xA9 in UTF-8.
        assert_eq!(percent_encode("café"), "caf%C3%A9");
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("ok-_.~"), "ok-_.~");
    }

    #[test]
    fn test_ugx_grouping() {
        assert_eq!(format_ugx(0), "0");
        assert_eq!(format_ugx(999), "999");
        assert_eq!(format_ugx(5_000), "5,000");
        assert_eq!(format_ugx(58_000), "58,000");
        assert_eq!(format_ugx(1_250_000), "1,250,000");
    }

    #[test]
    fn test_note_lines_are_carried_through() {
        let config = DeliveryConfig::default();
        let mut cart = sample_cart();
        cart.lines[0].note = Some("extra groundnut sauce".to_string());
        let quote = DeliveryQuote::from_zone("Kololo", 5_000, "15-25 mins", 2.5);
        let msg = compose_order(&config, &cart, None, &quote, &customer());
        assert!(msg.text.contains("   note: extra groundnut sauce"));
    }
}
