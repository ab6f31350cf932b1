/// Chart order of the size sweep models.
pub const CANONICAL_MODELS: &[&str] = &[
    "circle",
    "boids2d",
    "game_of_life",
    "sugarscape",
    "ants",
    "predator_prey",
];

/// Chart order of the thread scaling models.
pub const CANONICAL_SCALING_MODELS: &[&str] = &[
    "circle",
    "boids2d_flockers",
    "game_of_life",
    "sugarscape",
    "ants",
    "predator_prey",
];

/// Curve order within a size sweep panel.
pub const CANONICAL_BACKENDS: &[&str] = &["mason", "mason2", "dmason", "flame", "flamegpu", "c"];

/// Put `items` named in `canonical` first, in canonical order, followed by everything else in the
/// order it was given.
pub fn ordered<T>(items: impl IntoIterator<Item = T>, canonical: &[&str]) -> Vec<T>
where
    T: AsRef<str>,
{
    ordered_by(items, canonical, |item| item.as_ref())
}

/// [ordered] for items whose name is found with `name`.
pub fn ordered_by<T, F>(items: impl IntoIterator<Item = T>, canonical: &[&str], name: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let (mut known, others): (Vec<T>, Vec<T>) = items
        .into_iter()
        .partition(|item| canonical.contains(&name(item)));

    // Stable, so duplicates keep their relative order
    known.sort_by_key(|item| canonical.iter().position(|c| *c == name(item)));
    known.extend(others);
    known
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_should_put_canonical_models_first() {
        let models = ordered(["predator_prey", "circle"], CANONICAL_MODELS);

        assert_eq!(models, vec!["circle", "predator_prey"]);
    }

    #[test]
    fn test_should_keep_unknown_items_in_given_order() {
        let models = ordered(
            ["zombies", "ants", "flocking", "circle", "traffic"],
            CANONICAL_MODELS,
        );

        assert_eq!(models, vec!["circle", "ants", "zombies", "flocking", "traffic"]);
    }

    #[test]
    fn test_should_order_backends() {
        let backends = ordered(
            vec!["c".to_string(), "flamegpu".to_string(), "mason".to_string()],
            CANONICAL_BACKENDS,
        );

        assert_eq!(backends, vec!["mason", "flamegpu", "c"]);
    }

    #[test]
    fn test_should_handle_empty_input() {
        let items: Vec<&str> = ordered(Vec::<&str>::new(), CANONICAL_MODELS);

        assert!(items.is_empty());
    }
}
