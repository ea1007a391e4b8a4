pub trait DiceLimits {
    fn min(&self) -> i64;
    fn max(&self) -> i64;
    fn avg(&self) -> i64;
}

use crate::dice_types::{DiceTerm, DiceType};

impl DiceLimits for DiceType {
    fn min(&self) -> i64 {
        match self {
            DiceType::Number(_) => 1,
            DiceType::Fudge => -1,
        }
    }

    fn max(&self) -> i64 {
        match self {
            DiceType::Number(faces) => (*faces).into(),
            DiceType::Fudge => 1,
        }
    }

    fn avg(&self) -> i64 {
        (self.min() + self.max()) / 2
    }
}

// explosions are intentionally ignored here, limits describe the plain dice
impl DiceLimits for DiceTerm {
    fn min(&self) -> i64 {
        kept_dice(self) * self.dice.min()
    }

    fn max(&self) -> i64 {
        kept_dice(self) * self.dice.max()
    }

    fn avg(&self) -> i64 {
        kept_dice(self) * (self.dice.min() + self.dice.max()) / 2
    }
}

fn kept_dice(term: &DiceTerm) -> i64 {
    match term.selector {
        Some((_, keep)) => keep.min(term.throws).into(),
        None => term.throws.into(),
    }
}
