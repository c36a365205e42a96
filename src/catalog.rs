//! Static model catalog: capability class and price table.
//!
//! One immutable in-code table maps every supported model identifier to
//! its capability class, price rates, and context window, so no call-site
//! ever branches on model-name strings. Prices are USD per 1K tokens.
//! Models priced at a flat per-token rate carry equal prompt and
//! completion rates.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{CapabilityClass, ModelSpec, PriceRates};

struct Entry {
    id: &'static str,
    capability: CapabilityClass,
    prompt_per_1k: Decimal,
    completion_per_1k: Decimal,
    context_window: u32,
}

impl Entry {
    fn to_spec(&self) -> ModelSpec {
        ModelSpec {
            id: self.id.to_string(),
            capability: self.capability,
            rates: PriceRates {
                prompt_per_1k: self.prompt_per_1k,
                completion_per_1k: self.completion_per_1k,
            },
            context_window: self.context_window,
        }
    }
}

static CATALOG: &[Entry] = &[
    Entry {
        id: "gpt-4",
        capability: CapabilityClass::Standard,
        prompt_per_1k: dec!(0.03),
        completion_per_1k: dec!(0.06),
        context_window: 8000,
    },
    Entry {
        id: "gpt-3.5-turbo",
        capability: CapabilityClass::Standard,
        prompt_per_1k: dec!(0.002),
        completion_per_1k: dec!(0.002),
        context_window: 4096,
    },
    Entry {
        id: "gpt-5-nano-2025-08-07",
        capability: CapabilityClass::RestrictedParameters,
        prompt_per_1k: dec!(0.02),
        completion_per_1k: dec!(0.02),
        context_window: 4000,
    },
    Entry {
        id: "gpt-4o-mini",
        capability: CapabilityClass::Standard,
        prompt_per_1k: dec!(0.001),
        completion_per_1k: dec!(0.001),
        context_window: 8000,
    },
    Entry {
        id: "gpt-3.5-turbo-16k",
        capability: CapabilityClass::Standard,
        prompt_per_1k: dec!(0.001),
        completion_per_1k: dec!(0.001),
        context_window: 16000,
    },
];

/// Look up a model by its exact identifier.
/// Unknown identifiers return `None`; they are never passed through.
pub fn lookup(model_id: &str) -> Option<ModelSpec> {
    CATALOG.iter().find(|e| e.id == model_id).map(Entry::to_spec)
}

/// The full lineup, in catalog order.
pub fn default_lineup() -> Vec<ModelSpec> {
    CATALOG.iter().map(Entry::to_spec).collect()
}

/// All supported model identifiers, in catalog order.
pub fn known_ids() -> Vec<&'static str> {
    CATALOG.iter().map(|e| e.id).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_five_models() {
        assert_eq!(known_ids().len(), 5);
        assert_eq!(default_lineup().len(), 5);
    }

    #[test]
    fn test_lookup_known_models() {
        for id in known_ids() {
            let spec = lookup(id).unwrap();
            assert_eq!(spec.id, id);
        }
    }

    #[test]
    fn test_lookup_unknown_model() {
        assert!(lookup("gpt-7-maxi").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_only_gpt5_family_is_restricted() {
        for spec in default_lineup() {
            if spec.id.starts_with("gpt-5") {
                assert!(spec.is_restricted(), "{} should be restricted", spec.id);
            } else {
                assert!(!spec.is_restricted(), "{} should be standard", spec.id);
            }
        }
    }

    #[test]
    fn test_gpt4_rates() {
        let spec = lookup("gpt-4").unwrap();
        assert_eq!(spec.rates.prompt_per_1k, dec!(0.03));
        assert_eq!(spec.rates.completion_per_1k, dec!(0.06));
        assert_eq!(spec.context_window, 8000);
    }

    #[test]
    fn test_flat_rate_models_have_equal_rates() {
        for id in ["gpt-3.5-turbo", "gpt-5-nano-2025-08-07", "gpt-4o-mini", "gpt-3.5-turbo-16k"] {
            let spec = lookup(id).unwrap();
            assert_eq!(
                spec.rates.prompt_per_1k, spec.rates.completion_per_1k,
                "{id} is flat-priced"
            );
        }
    }

    #[test]
    fn test_default_lineup_order_is_stable() {
        let ids: Vec<String> = default_lineup().into_iter().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![
                "gpt-4",
                "gpt-3.5-turbo",
                "gpt-5-nano-2025-08-07",
                "gpt-4o-mini",
                "gpt-3.5-turbo-16k",
            ]
        );
    }
}
