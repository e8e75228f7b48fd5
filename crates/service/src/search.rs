use crate::entity::EntityKind;

/// Records where `term` (case-insensitive) is a substring of any of the
/// kind's search fields. An empty term keeps everything. This is the list
/// views' filtering, kept free of UI state.
pub fn filter_by_term<K: EntityKind>(items: &[K::Model], term: &str) -> Vec<K::Model> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|model| {
            K::search_fields(model)
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}
