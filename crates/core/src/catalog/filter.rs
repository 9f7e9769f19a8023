use crate::domain::item::{Item, SurfaceAffinity, SurfacePreference};

/// Keeps the items suited to `surface`, preserving order.
///
/// An item is kept when its affinity label appears in the preference label, when it is a
/// universal ball, or when the user asked for universal use. When nothing survives, the input
/// comes back unchanged.
pub fn filter_by_surface(items: &[Item], surface: SurfacePreference) -> Vec<Item> {
    let wanted = surface.label().to_lowercase();
    let matched = items
        .iter()
        .filter(|item| {
            wanted.contains(&item.surface.label().to_lowercase())
                || item.surface == SurfaceAffinity::Universal
                || surface == SurfacePreference::Universal
        })
        .cloned()
        .collect::<Vec<_>>();

    if matched.is_empty() {
        items.to_vec()
    } else {
        matched
    }
}
