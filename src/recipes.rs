use crate::household::{Audience, Recipe};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Picks one eligible recipe per meal slot.
///
/// Selection is a uniform random pick among eligible candidates, so callers
/// must not assume repeatability. The random source is injected so tests can
/// pin the outcome with a seeded or mock generator.
pub struct RecipeSelector<R = StdRng> {
    rng: R,
}

impl RecipeSelector<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RecipeSelector<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Active recipes in `category` whose audience is `audience` or `all`,
    /// in the order given.
    pub fn eligible<'a>(
        recipes: &'a [Recipe],
        category: &str,
        audience: &Audience,
    ) -> Vec<&'a Recipe> {
        recipes
            .iter()
            .filter(|recipe| {
                recipe.active && recipe.category == category && recipe.audience.admits(audience)
            })
            .collect()
    }

    pub fn select(
        &mut self,
        recipes: &[Recipe],
        category: &str,
        audience: &Audience,
    ) -> Option<Recipe> {
        let candidates = Self::eligible(recipes, category, audience);
        candidates
            .choose(&mut self.rng)
            .map(|recipe| (*recipe).clone())
    }
}
