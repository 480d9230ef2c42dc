use crate::domain::work_item::WorkItem;

/// Deterministic, stateless policy deciding whether a work item needs human
/// sign-off before execution.
#[derive(Debug, Clone)]
pub struct ApprovalGate {
    keywords: Vec<String>,
}

impl ApprovalGate {
    pub fn new(keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
        }
    }

    /// Case-insensitive substring match over the item body. No keyword hit
    /// means the item may proceed straight to Done.
    pub fn requires_approval(&self, item: &WorkItem) -> bool {
        let body = item.body.to_lowercase();
        self.keywords.iter().any(|k| body.contains(k.as_str()))
    }
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::new(["email", "send", "payment", "post", "linkedin"])
    }
}
