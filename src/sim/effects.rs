//! Challenge outcome dispatch table

use serde::{Deserialize, Serialize};

use super::challenge::{ChallengeKind, Outcome, Side};

/// A gameplay consequence of a resolved challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Jump,
    Slide,
    /// Sidestep towards the given side
    Dodge(Side),
    /// Return to the lane held before the last dodge
    ReverseDodge,
    Look(Side),
    TiltDown,
    ShootEnemy(Side),
    EnemyRush(Side),
}

/// Effects triggered by `kind` resolving with `outcome`
pub fn effects_for(kind: ChallengeKind, outcome: Outcome) -> &'static [Effect] {
    use ChallengeKind::*;
    match (kind, outcome) {
        (Jump, Outcome::Success) => &[Effect::Jump, Effect::TiltDown],
        (Slide, Outcome::Success) => &[Effect::Slide],
        (DodgeRight, Outcome::Success) => &[Effect::Dodge(Side::Right), Effect::Look(Side::Left)],
        (DodgeLeft, Outcome::Success) => &[Effect::Dodge(Side::Left), Effect::Look(Side::Right)],
        (CombatLeft, Outcome::Success) => &[Effect::Look(Side::Left), Effect::ShootEnemy(Side::Left)],
        (CombatRight, Outcome::Success) => {
            &[Effect::Look(Side::Right), Effect::ShootEnemy(Side::Right)]
        }
        (CombatLeft, Outcome::Failure) => &[Effect::Look(Side::Left), Effect::EnemyRush(Side::Left)],
        (CombatRight, Outcome::Failure) => {
            &[Effect::Look(Side::Right), Effect::EnemyRush(Side::Right)]
        }
        // Missed parkour is punished by the hazard itself
        (_, Outcome::Failure) | (_, Outcome::Cancelled) => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [ChallengeKind; 6] = [
        ChallengeKind::Jump,
        ChallengeKind::Slide,
        ChallengeKind::DodgeLeft,
        ChallengeKind::DodgeRight,
        ChallengeKind::CombatLeft,
        ChallengeKind::CombatRight,
    ];

    #[test]
    fn test_parkour_success_effects() {
        assert_eq!(
            effects_for(ChallengeKind::Jump, Outcome::Success),
            &[Effect::Jump, Effect::TiltDown]
        );
        assert_eq!(
            effects_for(ChallengeKind::DodgeRight, Outcome::Success),
            &[Effect::Dodge(Side::Right), Effect::Look(Side::Left)]
        );
        assert_eq!(
            effects_for(ChallengeKind::DodgeLeft, Outcome::Success),
            &[Effect::Dodge(Side::Left), Effect::Look(Side::Right)]
        );
    }

    #[test]
    fn test_combat_outcomes_look_at_the_enemy() {
        for side in [Side::Left, Side::Right] {
            let kind = ChallengeKind::combat(side);
            assert_eq!(
                effects_for(kind, Outcome::Success),
                &[Effect::Look(side), Effect::ShootEnemy(side)]
            );
            assert_eq!(
                effects_for(kind, Outcome::Failure),
                &[Effect::Look(side), Effect::EnemyRush(side)]
            );
        }
    }

    #[test]
    fn test_cancel_and_parkour_failure_do_nothing() {
        for kind in ALL_KINDS {
            assert!(effects_for(kind, Outcome::Cancelled).is_empty());
        }
        for kind in ChallengeKind::PARKOUR {
            assert!(effects_for(kind, Outcome::Failure).is_empty());
        }
    }
}
