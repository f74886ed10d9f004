use std::collections::HashSet;

use crate::types::{ImageId, ImageItem};

/// Identifiers already shown this session, kept in the order they arrived.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    order: Vec<ImageId>,
    index: HashSet<ImageId>,
}

impl SeenSet {
    pub fn from_ids(ids: impl IntoIterator<Item = ImageId>) -> Self {
        let mut seen = Self::default();
        for id in ids {
            seen.admit(id);
        }
        seen
    }

    /// Returns true if `id` was not seen before
    pub fn admit(&mut self, id: ImageId) -> bool {
        if self.index.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    /// Admit every unseen id in `items`, returning the admitted ones.
    pub fn filter_new(&mut self, items: &[ImageItem]) -> Vec<ImageId> {
        items
            .iter()
            .map(|item| item.id)
            .filter(|&id| self.admit(id))
            .collect()
    }

    pub fn ids(&self) -> &[ImageId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Value of the `exclude` query parameter
    pub fn exclude_param(&self) -> String {
        self.order
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(ids: &[ImageId]) -> Vec<ImageItem> {
        ids.iter().map(|&id| ImageItem::with_id(id)).collect()
    }

    #[test]
    fn seeded_ids_are_collapsed() {
        let seen = SeenSet::from_ids([1, 2, 2, 3, 1]);
        assert_eq!(seen.ids(), &[1, 2, 3]);
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn filter_new_admits_only_unseen() {
        let mut seen = SeenSet::from_ids([1, 2, 3]);
        let admitted = seen.filter_new(&items(&[3, 4, 5]));
        assert_eq!(admitted, vec![4, 5]);
        assert_eq!(seen.ids(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn second_pass_admits_nothing() {
        let mut seen = SeenSet::default();
        assert_eq!(seen.filter_new(&items(&[7, 8])), vec![7, 8]);
        assert!(seen.filter_new(&items(&[7, 8])).is_empty());
    }

    #[test]
    fn repeats_within_one_response_are_admitted_once() {
        let mut seen = SeenSet::default();
        assert_eq!(seen.filter_new(&items(&[9, 9, 10, 9])), vec![9, 10]);
    }

    #[test]
    fn exclude_param_is_comma_joined() {
        assert_eq!(SeenSet::from_ids([1, 2, 3]).exclude_param(), "1,2,3");
        assert_eq!(SeenSet::default().exclude_param(), "");
    }
}
