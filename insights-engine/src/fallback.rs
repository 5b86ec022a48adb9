//! Illustrative distributions served when a chart would otherwise be blank.
//! Always wrapped in `Dataset::Placeholder`.

use insights_core::{CategoryBucket, Dataset, RiskTier};

const HRSN_ILLUSTRATION: [(&str, usize); 5] = [
    ("Housing Instability", 35),
    ("Food Insecurity", 28),
    ("Transportation Barriers", 22),
    ("Financial Strain", 18),
    ("Social Isolation", 12),
];

const RISK_ILLUSTRATION: [(RiskTier, usize); 6] = [
    (RiskTier::NoRisk, 20),
    (RiskTier::Low, 30),
    (RiskTier::LowMedium, 20),
    (RiskTier::Medium, 15),
    (RiskTier::MediumHigh, 10),
    (RiskTier::High, 5),
];

const ILLUSTRATIVE_POPULATION: usize = 100;

pub fn hrsn_indicators() -> Dataset {
    log::warn!("no HRSN data available; serving placeholder distribution");
    Dataset::Placeholder(
        HRSN_ILLUSTRATION
            .into_iter()
            .map(|(label, count)| CategoryBucket::new(label, count, ILLUSTRATIVE_POPULATION))
            .collect(),
    )
}

pub fn risk_tiers() -> Dataset {
    log::warn!("no patient data available; serving placeholder risk distribution");
    Dataset::Placeholder(
        RISK_ILLUSTRATION
            .into_iter()
            .map(|(tier, count)| CategoryBucket::new(tier.label(), count, ILLUSTRATIVE_POPULATION))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_flagged() {
        assert!(hrsn_indicators().is_placeholder());
        assert_eq!(hrsn_indicators().buckets().len(), 5);

        let risk = risk_tiers();
        assert!(risk.is_placeholder());
        let labels: Vec<_> = risk.buckets().iter().map(|b| b.id.as_str()).collect();
        let expected: Vec<_> = RiskTier::ALL.into_iter().map(RiskTier::label).collect();
        assert_eq!(labels, expected);
        assert_eq!(risk.total_count(), ILLUSTRATIVE_POPULATION);
    }
}
