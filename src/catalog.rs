use serde::{Deserialize, Serialize};

/// A gated feature: what it is called, and how much of it the free tier gets.
///
/// `free_limit == 0` means premium-only; non-premium users never pass the
/// access check for such a feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatedFeature {
    pub id: String,
    pub name: String,
    pub description: String,
    pub free_limit: u32,
    pub premium_benefit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCatalog {
    features: Vec<GatedFeature>,
}

impl FeatureCatalog {
    pub fn new(features: Vec<GatedFeature>) -> Self {
        Self { features }
    }

    pub fn get(&self, id: &str) -> Option<&GatedFeature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GatedFeature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanInterval {
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "3 months")]
    Quarter,
    #[serde(rename = "year")]
    Year,
}

impl PlanInterval {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanInterval::Month => "month",
            PlanInterval::Quarter => "3 months",
            PlanInterval::Year => "year",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "month" => Some(PlanInterval::Month),
            "3 months" => Some(PlanInterval::Quarter),
            "year" => Some(PlanInterval::Year),
            _ => None,
        }
    }

    /// Fixed day counts, not calendar-accurate.
    pub fn days(self) -> i64 {
        match self {
            PlanInterval::Month => 30,
            PlanInterval::Quarter => 90,
            PlanInterval::Year => 365,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub interval: PlanInterval,
    pub description: String,
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    pub fn get(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plan> {
        self.plans.iter()
    }
}

/// Both catalogs bundled so they travel together into the evaluator.
/// Injected at construction; never module-level state.
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub features: FeatureCatalog,
    pub plans: PlanCatalog,
}

impl Catalogs {
    /// The built-in German-market catalog the product ships with.
    pub fn builtin() -> Self {
        let features = FeatureCatalog::new(vec![
            GatedFeature {
                id: "unlimited_likes".into(),
                name: "Unbegrenzte Likes".into(),
                description: "5 Likes pro Tag kostenlos".into(),
                free_limit: 5,
                premium_benefit: "Unbegrenzt liken, so oft du willst".into(),
            },
            GatedFeature {
                id: "see_who_liked_you".into(),
                name: "Wer mag dich?".into(),
                description: "Sieh sofort, wer dich geliked hat".into(),
                free_limit: 0,
                premium_benefit: "Alle Likes auf einen Blick".into(),
            },
            GatedFeature {
                id: "advanced_filters".into(),
                name: "Erweiterte Filter".into(),
                description: "3 Filter-Suchen pro Tag kostenlos".into(),
                free_limit: 3,
                premium_benefit: "Unbegrenzte Filter-Suchen".into(),
            },
            GatedFeature {
                id: "profile_boost".into(),
                name: "Profil-Boost".into(),
                description: "1 Boost pro Tag kostenlos".into(),
                free_limit: 1,
                premium_benefit: "Täglich mehrfach boosten".into(),
            },
            GatedFeature {
                id: "read_receipts".into(),
                name: "Lesebestätigungen".into(),
                description: "Sieh, wann deine Nachrichten gelesen wurden".into(),
                free_limit: 0,
                premium_benefit: "Lesebestätigungen für alle Chats".into(),
            },
        ]);

        let plans = PlanCatalog::new(vec![
            Plan {
                id: "premium_monthly".into(),
                name: "Premium Monat".into(),
                price: 9.99,
                currency: "EUR".into(),
                interval: PlanInterval::Month,
                description: "Voller Zugriff, monatlich kündbar".into(),
                features: vec![
                    "Unbegrenzte Likes".into(),
                    "Wer mag dich?".into(),
                    "Erweiterte Filter".into(),
                    "Profil-Boost".into(),
                    "Lesebestätigungen".into(),
                ],
                savings: None,
            },
            Plan {
                id: "premium_quarterly".into(),
                name: "Premium 3 Monate".into(),
                price: 24.99,
                currency: "EUR".into(),
                interval: PlanInterval::Quarter,
                description: "Voller Zugriff, 3 Monate im Paket".into(),
                features: vec![
                    "Alle Premium-Funktionen".into(),
                    "Spare gegenüber dem Monatsabo".into(),
                ],
                savings: Some(4.98),
            },
            Plan {
                id: "premium_yearly".into(),
                name: "Premium Jahr".into(),
                price: 79.99,
                currency: "EUR".into(),
                interval: PlanInterval::Year,
                description: "Voller Zugriff, bester Preis".into(),
                features: vec![
                    "Alle Premium-Funktionen".into(),
                    "Über 30% günstiger".into(),
                ],
                savings: Some(39.89),
            },
        ]);

        Self { features, plans }
    }
}
