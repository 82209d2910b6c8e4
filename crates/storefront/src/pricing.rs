//! Order pricing: subtotal, shipping, tax, and reward milestones.
//!
//! [`compute_summary`] is a pure function of the cart lines and the
//! pricing configuration. It holds no state and performs no I/O, so the
//! cart page, the checkout message, and the CLI all derive their numbers
//! from the same place.

use kirana_core::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;

/// A spend-threshold reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Subtotal at which the reward unlocks.
    pub amount: Price,
    /// Customer-facing reward label.
    pub label: String,
}

/// Pricing rules for the storefront.
///
/// Milestones are kept sorted ascending by amount so unlock checks and
/// next-target lookups are a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingConfig {
    free_shipping_threshold: Price,
    flat_shipping_fee: Price,
    tax_rate: Decimal,
    milestones: Vec<Milestone>,
}

impl PricingConfig {
    /// Build a config, sorting milestones ascending by unlock amount.
    #[must_use]
    pub fn new(
        free_shipping_threshold: Price,
        flat_shipping_fee: Price,
        tax_rate: Decimal,
        mut milestones: Vec<Milestone>,
    ) -> Self {
        milestones.sort_by_key(|m| m.amount);
        Self {
            free_shipping_threshold,
            flat_shipping_fee,
            tax_rate,
            milestones,
        }
    }

    /// Subtotal above which shipping is free.
    #[must_use]
    pub const fn free_shipping_threshold(&self) -> Price {
        self.free_shipping_threshold
    }

    /// Shipping fee charged below the free-shipping threshold.
    #[must_use]
    pub const fn flat_shipping_fee(&self) -> Price {
        self.flat_shipping_fee
    }

    /// Tax rate applied to the subtotal, as a fraction.
    #[must_use]
    pub const fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Reward milestones, ascending by unlock amount.
    #[must_use]
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self::new(
            Price::from_rupees(500),
            Price::from_rupees(50),
            Decimal::new(5, 2), // 5%
            default_milestones(),
        )
    }
}

/// The stock reward ladder used when none is configured.
#[must_use]
pub fn default_milestones() -> Vec<Milestone> {
    vec![
        Milestone {
            amount: Price::from_rupees(999),
            label: "Free cotton tote bag".to_owned(),
        },
        Milestone {
            amount: Price::from_rupees(1999),
            label: "Free steel water bottle".to_owned(),
        },
        Milestone {
            amount: Price::from_rupees(4999),
            label: "Free jute shopping hamper".to_owned(),
        },
    ]
}

/// The next milestone still locked at the current subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneTarget {
    /// Customer-facing reward label.
    pub label: String,
    /// Subtotal at which it unlocks.
    pub amount: Price,
    /// Additional spend needed to unlock it.
    pub remaining: Price,
}

/// Everything the cart page, checkout, and CLI need to show about money.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingSummary {
    /// Sum of unit price times quantity across all lines.
    pub subtotal: Price,
    /// Zero above the free-shipping threshold, the flat fee otherwise.
    pub shipping: Price,
    /// Subtotal times the tax rate.
    pub tax: Price,
    /// Subtotal plus shipping plus tax.
    pub total: Price,
    /// Labels of every milestone at or below the subtotal, ascending.
    pub unlocked_rewards: Vec<String>,
    /// First milestone past the subtotal, if any remain.
    pub next_milestone: Option<MilestoneTarget>,
    /// Subtotal over the final milestone amount, clamped to `0..=1`.
    pub milestone_progress: Decimal,
    /// Spend still needed for free shipping, zero once reached.
    pub free_shipping_remaining: Price,
    /// Subtotal over the free-shipping threshold, clamped to `0..=1`.
    pub free_shipping_progress: Decimal,
}

/// Price a cart.
///
/// Shipping is free only when the subtotal strictly exceeds the
/// threshold. Milestones unlock at their amount (`>=`) and never re-lock
/// for a higher subtotal.
#[must_use]
pub fn compute_summary(lines: &[CartLine], config: &PricingConfig) -> PricingSummary {
    let subtotal: Price = lines.iter().map(CartLine::line_subtotal).sum();

    let shipping = if subtotal > config.free_shipping_threshold {
        Price::zero()
    } else {
        config.flat_shipping_fee
    };
    let tax = Price::new(subtotal.amount() * config.tax_rate);
    let total = subtotal + shipping + tax;

    let unlocked_rewards: Vec<String> = config
        .milestones
        .iter()
        .filter(|m| subtotal >= m.amount)
        .map(|m| m.label.clone())
        .collect();

    let next_milestone = config
        .milestones
        .iter()
        .find(|m| subtotal < m.amount)
        .map(|m| MilestoneTarget {
            label: m.label.clone(),
            amount: m.amount,
            remaining: m.amount.saturating_sub(subtotal),
        });

    let milestone_progress = config.milestones.last().map_or(Decimal::ONE, |last| {
        ratio_clamped(subtotal.amount(), last.amount.amount())
    });

    PricingSummary {
        subtotal,
        shipping,
        tax,
        total,
        unlocked_rewards,
        next_milestone,
        milestone_progress,
        free_shipping_remaining: config.free_shipping_threshold.saturating_sub(subtotal),
        free_shipping_progress: ratio_clamped(
            subtotal.amount(),
            config.free_shipping_threshold.amount(),
        ),
    }
}

/// `value / target` clamped to `0..=1`; a zero target counts as complete.
fn ratio_clamped(value: Decimal, target: Decimal) -> Decimal {
    if target.is_zero() {
        return Decimal::ONE;
    }
    (value / target).clamp(Decimal::ZERO, Decimal::ONE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kirana_core::ProductId;

    use super::*;

    fn line(id: &str, rupees: i64, quantity: u32) -> CartLine {
        CartLine {
            id: ProductId::from(id),
            name: format!("Product {id}"),
            price: Price::from_rupees(rupees),
            image: crate::cart::FALLBACK_IMAGE.to_owned(),
            quantity,
        }
    }

    fn config_with_milestones(milestones: Vec<Milestone>) -> PricingConfig {
        PricingConfig::new(
            Price::from_rupees(500),
            Price::from_rupees(50),
            Decimal::new(5, 2),
            milestones,
        )
    }

    #[test]
    fn test_subtotal_sums_price_times_quantity() {
        let lines = [line("a", 100, 2), line("b", 250, 1)];
        let summary = compute_summary(&lines, &PricingConfig::default());
        assert_eq!(summary.subtotal, Price::from_rupees(450));
    }

    #[test]
    fn test_summary_is_order_independent() {
        let config = PricingConfig::default();
        let forward = [line("a", 100, 2), line("b", 250, 1), line("c", 65, 3)];
        let reversed = [line("c", 65, 3), line("b", 250, 1), line("a", 100, 2)];
        assert_eq!(
            compute_summary(&forward, &config),
            compute_summary(&reversed, &config)
        );
    }

    #[test]
    fn test_increasing_quantity_never_decreases_totals() {
        let config = PricingConfig::default();
        let before = compute_summary(&[line("a", 120, 2)], &config);
        let after = compute_summary(&[line("a", 120, 3)], &config);
        assert!(after.subtotal >= before.subtotal);
        assert!(after.tax >= before.tax);
        assert!(after.total >= before.total);
    }

    #[test]
    fn test_shipping_free_above_threshold() {
        let summary = compute_summary(&[line("a", 600, 1)], &PricingConfig::default());
        assert_eq!(summary.shipping, Price::zero());
    }

    #[test]
    fn test_shipping_charged_below_threshold() {
        let summary = compute_summary(&[line("a", 400, 1)], &PricingConfig::default());
        assert_eq!(summary.shipping, Price::from_rupees(50));
    }

    #[test]
    fn test_shipping_charged_at_exact_threshold() {
        // Free shipping requires strictly more than the threshold
        let summary = compute_summary(&[line("a", 500, 1)], &PricingConfig::default());
        assert_eq!(summary.shipping, Price::from_rupees(50));
        assert_eq!(summary.free_shipping_remaining, Price::zero());
    }

    #[test]
    fn test_tax_and_total() {
        let summary = compute_summary(&[line("a", 600, 1)], &PricingConfig::default());
        assert_eq!(summary.tax, Price::from_rupees(30));
        assert_eq!(summary.total, Price::from_rupees(630));
    }

    #[test]
    fn test_empty_cart_still_prices() {
        let summary = compute_summary(&[], &PricingConfig::default());
        assert_eq!(summary.subtotal, Price::zero());
        assert_eq!(summary.shipping, Price::from_rupees(50));
        assert_eq!(summary.tax, Price::zero());
        assert_eq!(summary.total, Price::from_rupees(50));
    }

    #[test]
    fn test_milestones_unlock_at_amount() {
        let config = config_with_milestones(vec![
            Milestone {
                amount: Price::from_rupees(4999),
                label: "A".to_owned(),
            },
            Milestone {
                amount: Price::from_rupees(7999),
                label: "B".to_owned(),
            },
        ]);

        let at_5000 = compute_summary(&[line("a", 5000, 1)], &config);
        assert_eq!(at_5000.unlocked_rewards, vec!["A".to_owned()]);
        let next = at_5000.next_milestone.unwrap();
        assert_eq!(next.label, "B");
        assert_eq!(next.remaining, Price::from_rupees(2999));

        let at_8000 = compute_summary(&[line("a", 8000, 1)], &config);
        assert_eq!(
            at_8000.unlocked_rewards,
            vec!["A".to_owned(), "B".to_owned()]
        );
        assert!(at_8000.next_milestone.is_none());
    }

    #[test]
    fn test_milestone_unlocks_at_exact_amount() {
        let config = config_with_milestones(vec![Milestone {
            amount: Price::from_rupees(4999),
            label: "A".to_owned(),
        }]);
        let summary = compute_summary(&[line("a", 4999, 1)], &config);
        assert_eq!(summary.unlocked_rewards, vec!["A".to_owned()]);
        assert!(summary.next_milestone.is_none());
    }

    #[test]
    fn test_milestone_progress_is_fraction_of_final() {
        let config = config_with_milestones(vec![
            Milestone {
                amount: Price::from_rupees(4000),
                label: "A".to_owned(),
            },
            Milestone {
                amount: Price::from_rupees(8000),
                label: "B".to_owned(),
            },
        ]);

        let summary = compute_summary(&[line("a", 2000, 1)], &config);
        assert_eq!(summary.milestone_progress, Decimal::new(25, 2));

        let past = compute_summary(&[line("a", 9000, 1)], &config);
        assert_eq!(past.milestone_progress, Decimal::ONE);
    }

    #[test]
    fn test_milestones_sorted_on_construction() {
        let config = config_with_milestones(vec![
            Milestone {
                amount: Price::from_rupees(7999),
                label: "B".to_owned(),
            },
            Milestone {
                amount: Price::from_rupees(4999),
                label: "A".to_owned(),
            },
        ]);
        let amounts: Vec<Price> = config.milestones().iter().map(|m| m.amount).collect();
        assert_eq!(
            amounts,
            vec![Price::from_rupees(4999), Price::from_rupees(7999)]
        );

        // Unlock order follows the sorted ladder
        let summary = compute_summary(&[line("a", 8000, 1)], &config);
        assert_eq!(
            summary.unlocked_rewards,
            vec!["A".to_owned(), "B".to_owned()]
        );
    }

    #[test]
    fn test_no_milestones_reports_complete_progress() {
        let config = config_with_milestones(Vec::new());
        let summary = compute_summary(&[line("a", 100, 1)], &config);
        assert!(summary.unlocked_rewards.is_empty());
        assert!(summary.next_milestone.is_none());
        assert_eq!(summary.milestone_progress, Decimal::ONE);
    }

    #[test]
    fn test_free_shipping_progress() {
        let summary = compute_summary(&[line("a", 400, 1)], &PricingConfig::default());
        assert_eq!(summary.free_shipping_remaining, Price::from_rupees(100));
        assert_eq!(summary.free_shipping_progress, Decimal::new(8, 1));
    }
}
