//! Combat resolver: this cycle's attack against the garrison, plus hero upkeep.

use crate::production::unlocked_multiplier;
use crate::{Constants, DefenseStance, Event, GameState, HeroStatus, NotificationKind, TechEffect};

fn defense_multiplier(effect: &TechEffect) -> Option<f64> {
    match effect {
        TechEffect::Defense { multiplier } => Some(*multiplier),
        _ => None,
    }
}

/// Soldiers (with weapon and armor techs) plus a ready hero. Fortify and Sally
/// Forth scale the sum and floor it to whole points; Standard keeps fractions.
pub fn defense_power(state: &GameState, constants: &Constants) -> f64 {
    let mut defense = f64::from(state.population.soldiers)
        * constants.defense_per_soldier
        * unlocked_multiplier(state, defense_multiplier);
    if state.hero.status == HeroStatus::Ready {
        defense += state.hero.might;
    }
    match state.stance {
        DefenseStance::Standard => defense,
        DefenseStance::Fortify => (defense * constants.fortify_defense_multiplier).floor(),
        DefenseStance::SallyForth => (defense * constants.sally_defense_multiplier).floor(),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn resolve_combat(
    mut state: GameState,
    constants: &Constants,
    events: &mut Vec<crate::EventEnvelope>,
) -> GameState {
    let cycle = state.cycle;
    let capacity = constants.event_log_capacity;
    let attack = state.threat_strength.floor();
    let defense = defense_power(&state, constants);

    if state.stance == DefenseStance::SallyForth {
        let lost = (f64::from(state.population.soldiers) * constants.sally_attrition_rate).floor();
        if lost > 0.0 {
            state.population.total = (state.population.total - lost).max(0.0);
            crate::push_log(
                &mut state.event_log,
                capacity,
                format!("Sallying forth cost {lost} soldiers!"),
            );
            events.push(crate::emit(
                &mut state.counters,
                cycle,
                Event::SallyCasualties { lost: lost as u32 },
            ));
        }
    }

    let damage = (attack - defense).max(0.0);
    tracing::debug!(cycle, attack, defense, damage, "combat resolved");

    if damage > 0.0 {
        state.structure_health = (state.structure_health - damage).max(0.0);
        crate::push_log(
            &mut state.event_log,
            capacity,
            format!("The enemy attacked! The walls took {damage} damage."),
        );
        crate::notify(
            &mut state,
            NotificationKind::Attack,
            "UNDER ATTACK",
            format!("The walls took {damage} damage from the assault."),
        );
        events.push(crate::emit(
            &mut state.counters,
            cycle,
            Event::WallsDamaged { damage },
        ));
        return state;
    }

    crate::push_log(
        &mut state.event_log,
        capacity,
        "The defenders held the line!".to_string(),
    );
    events.push(crate::emit(&mut state.counters, cycle, Event::AttackRepelled));

    let hero = &mut state.hero;
    hero.xp += constants.hero_xp_per_defense;
    if hero.xp >= f64::from(hero.level) * constants.hero_xp_per_level {
        hero.level += 1;
        hero.might += constants.hero_might_per_level;
        hero.xp = 0.0;
        let level = hero.level;
        crate::push_log(
            &mut state.event_log,
            capacity,
            format!("The commander reached level {level}!"),
        );
        events.push(crate::emit(
            &mut state.counters,
            cycle,
            Event::HeroLeveledUp { level },
        ));
    }
    state
}

/// Tick the hero cooldown; a recovering hero returns to duty once it expires.
pub(crate) fn recover_hero(mut state: GameState, constants: &Constants) -> GameState {
    state.hero.cooldown = state.hero.cooldown.saturating_sub(1);
    if state.hero.cooldown == 0 && state.hero.status == HeroStatus::Recovering {
        state.hero.status = HeroStatus::Ready;
        crate::push_log(
            &mut state.event_log,
            constants.event_log_capacity,
            "The commander has returned to the walls.".to_string(),
        );
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{base_content, base_state};
    use crate::TechId;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn defense_counts_soldiers_and_ready_hero() {
        let content = base_content();
        let state = base_state(&content);
        // 3 soldiers * 2 + might 10
        assert!(close(defense_power(&state, &content.constants), 16.0));
    }

    #[test]
    fn recovering_hero_adds_nothing() {
        let content = base_content();
        let mut state = base_state(&content);
        state.hero.status = HeroStatus::Recovering;
        assert!(close(defense_power(&state, &content.constants), 6.0));
    }

    #[test]
    fn weapon_and_armor_compound_before_stance() {
        let content = base_content();
        let mut state = base_state(&content);
        state.population.soldiers = 10;
        state.hero.status = HeroStatus::Recovering;
        state.techs.get_mut(&TechId::SteelWeapons).unwrap().unlocked = true;
        state.techs.get_mut(&TechId::IronArmor).unwrap().unlocked = true;
        // 10 * 2 * 1.25 * 1.2 = 30
        assert!(close(defense_power(&state, &content.constants), 30.0));
        state.stance = DefenseStance::Fortify;
        assert!(close(defense_power(&state, &content.constants), 45.0));
        state.stance = DefenseStance::SallyForth;
        assert!(close(defense_power(&state, &content.constants), 60.0));
    }

    #[test]
    fn fractional_defense_is_floored() {
        let content = base_content();
        let mut state = base_state(&content);
        state.population.soldiers = 1;
        state.hero.status = HeroStatus::Recovering;
        state.techs.get_mut(&TechId::SteelWeapons).unwrap().unlocked = true;
        state.stance = DefenseStance::Fortify;
        // 1 * 2 * 1.25 * 1.5 = 3.75
        assert!(close(defense_power(&state, &content.constants), 3.0));
    }

    #[test]
    fn standard_stance_keeps_fractional_defense() {
        let content = base_content();
        let mut state = base_state(&content);
        state.population.soldiers = 3;
        state.techs.get_mut(&TechId::SteelWeapons).unwrap().unlocked = true;
        state.threat_strength = 18.0;
        // 3 * 2 * 1.25 + 10 = 17.5
        assert!(close(defense_power(&state, &content.constants), 17.5));

        let mut events = Vec::new();
        let next = resolve_combat(state, &content.constants, &mut events);
        assert!(close(next.structure_health, 99.5));
        assert!(events
            .iter()
            .any(|e| matches!(e.event, Event::WallsDamaged { damage } if close(damage, 0.5))));
    }

    #[test]
    fn breach_damages_structure_and_notifies() {
        let content = base_content();
        let mut state = base_state(&content);
        state.threat_strength = 40.9;
        let mut events = Vec::new();
        let next = resolve_combat(state, &content.constants, &mut events);
        // attack floor(40.9) = 40, defense 16
        assert!(close(next.structure_health, 76.0));
        assert_eq!(next.notifications.len(), 1);
        assert_eq!(next.notifications[0].kind, NotificationKind::Attack);
        assert!(close(next.hero.xp, 0.0));
        assert!(events
            .iter()
            .any(|e| matches!(e.event, Event::WallsDamaged { damage } if close(damage, 24.0))));
    }

    #[test]
    fn structure_clamps_at_zero() {
        let content = base_content();
        let mut state = base_state(&content);
        state.threat_strength = 500.0;
        let next = resolve_combat(state, &content.constants, &mut Vec::new());
        assert!(close(next.structure_health, 0.0));
    }

    #[test]
    fn repelled_attack_awards_xp_and_levels_hero() {
        let content = base_content();
        let mut state = base_state(&content);
        state.hero.xp = 90.0;
        let mut events = Vec::new();
        let next = resolve_combat(state, &content.constants, &mut events);
        assert_eq!(next.hero.level, 2);
        assert!(close(next.hero.might, 15.0));
        assert!(close(next.hero.xp, 0.0));
        assert!(events
            .iter()
            .any(|e| matches!(e.event, Event::HeroLeveledUp { level: 2 })));
        assert!(close(next.structure_health, 100.0));
    }

    #[test]
    fn sally_forth_costs_soldiers_from_total() {
        let content = base_content();
        let mut state = base_state(&content);
        state.population.total = 200.0;
        state.population.soldiers = 60;
        state.stance = DefenseStance::SallyForth;
        let mut events = Vec::new();
        let next = resolve_combat(state, &content.constants, &mut events);
        assert!(close(next.population.total, 197.0));
        assert!(events
            .iter()
            .any(|e| matches!(e.event, Event::SallyCasualties { lost: 3 })));
    }

    #[test]
    fn small_sally_has_no_casualties() {
        let content = base_content();
        let mut state = base_state(&content);
        state.stance = DefenseStance::SallyForth;
        let next = resolve_combat(state, &content.constants, &mut Vec::new());
        assert!(close(next.population.total, 10.0));
    }

    #[test]
    fn hero_recovers_when_cooldown_expires() {
        let content = base_content();
        let mut state = base_state(&content);
        state.hero.status = HeroStatus::Recovering;
        state.hero.cooldown = 2;
        let state = recover_hero(state, &content.constants);
        assert_eq!(state.hero.status, HeroStatus::Recovering);
        let state = recover_hero(state, &content.constants);
        assert_eq!(state.hero.status, HeroStatus::Ready);
        assert_eq!(state.hero.cooldown, 0);
    }
}
