//! Label vocabulary offered to the model.

use std::sync::Arc;

/// Garment descriptors, grouped loosely by occasion, length, neckline, sleeve,
/// pattern, silhouette and garment type. Order is preserved in the prompt.
#[rustfmt::skip]
pub const DRESS_LABELS: &[&str] = &[
    "formal", "semi-formal", "party", "cocktail", "evening", "work/office",
    "wedding guest", "beach/resort", "mini", "knee-length", "midi", "tea-length", "maxi",
    "floor-length", "v-neck", "round neck", "scoop neck", "square neck", "sweetheart",
    "halter neck", "strapless", "off-the-shoulder", "one-shoulder", "boat neck", "cowl neck",
    "high neck", "sleeveless", "spaghetti strap", "cap sleeve", "short sleeve", "3/4 sleeve",
    "long sleeve", "puff sleeve", "bell sleeve", "bishop sleeve", "flutter sleeve", "cold shoulder",
    "solid", "floral", "striped", "polka dot", "plaid", "animal print", "geometric", "paisley",
    "abstract", "embroidered", "loose", "relaxed", "flowy", "fitted", "bodycon", "a-line", "straight",
    "sweater", "skirt", "shirt dress", "tunic dress", "top", "pants", "bridal", "saree", "tie neck",
    "summer dress", "checked", "eyelet", "elastic waist", "fit-and-flare", "boho", "kurta", "printed",
];

/// Immutable, ordered label list shared by all requests.
#[derive(Debug, Clone)]
pub struct LabelSet {
    labels: Arc<[String]>,
}

impl LabelSet {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Labels joined with `", "`, in their original order.
    pub fn joined(&self) -> String {
        self.labels.join(", ")
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::new(DRESS_LABELS.iter().copied())
    }
}
