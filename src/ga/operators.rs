//! Genetic operators on defense schedules.
//!
//! An individual is a [`Schedule`] whose i-th defense always derives from
//! the i-th template, so operators work position-wise.
//!
//! | Operator | Behavior |
//! |----------|----------|
//! | Selection | Tournament of [`TOURNAMENT_SIZE`], drawn with replacement |
//! | Crossover | One-point cut in `[1, len - 1]`, children swap tails |
//! | Mutation | Per defense: redraw start, independently reassign room |
//! | Point mutation | One random defense: redraw its start or its room |
//!
//! Pre-set rooms and starts are mutated like any other gene unless the
//! problem pins them ([`DefenseProblem::with_pinned_presets`]).

use rand::Rng;

use super::problem::DefenseProblem;
use crate::models::Schedule;

/// Individuals drawn per tournament.
pub const TOURNAMENT_SIZE: usize = 3;

/// Tournament selection.
///
/// Fitness is recomputed for every draw. Ties keep the earlier draw.
/// Returns `None` for an empty population.
pub fn tournament_select<'a, F, R>(
    population: &'a [Schedule],
    fitness: F,
    rng: &mut R,
) -> Option<&'a Schedule>
where
    F: Fn(&Schedule) -> f64,
    R: Rng + ?Sized,
{
    if population.is_empty() {
        return None;
    }

    let mut best: Option<(&Schedule, f64)> = None;
    for _ in 0..TOURNAMENT_SIZE {
        let candidate = &population[rng.random_range(0..population.len())];
        let score = fitness(candidate);
        match best {
            Some((_, s)) if s >= score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(s, _)| s)
}

/// One-point crossover.
///
/// With probability `rate` (and at least two defenses) the children are
/// `a[..cut] + b[cut..]` and `b[..cut] + a[cut..]`; otherwise copies of
/// the parents.
pub fn one_point_crossover<R: Rng + ?Sized>(
    a: &Schedule,
    b: &Schedule,
    rate: f64,
    rng: &mut R,
) -> (Schedule, Schedule) {
    let len = a.len().min(b.len());
    if rng.random::<f64>() >= rate || len < 2 {
        return (a.clone(), b.clone());
    }

    let cut = rng.random_range(1..len);
    let child1 = a.defenses[..cut]
        .iter()
        .chain(&b.defenses[cut..])
        .cloned()
        .collect();
    let child2 = b.defenses[..cut]
        .iter()
        .chain(&a.defenses[cut..])
        .cloned()
        .collect();
    (Schedule::new(child1), Schedule::new(child2))
}

/// Mutates `schedule` in place.
///
/// Each defense independently gets a new start with probability `rate`
/// and a new room with probability `rate`. Pinned genes are skipped.
pub fn mutate<R: Rng + ?Sized>(
    schedule: &mut Schedule,
    problem: &DefenseProblem,
    rate: f64,
    rng: &mut R,
) {
    for (idx, defense) in schedule.defenses.iter_mut().enumerate() {
        if rng.random_bool(rate) && !problem.is_start_pinned(idx) {
            defense.start = Some(problem.random_start(rng));
        }
        if rng.random_bool(rate) && !problem.is_room_pinned(idx) {
            if let Some(room) = problem.random_room(rng) {
                defense.room = Some(room);
            }
        }
    }
}

/// Redraws one gene of one uniformly chosen defense.
///
/// Used where the caller has already decided that this individual mutates.
/// A pinned gene leaves the schedule unchanged.
pub fn point_mutate<R: Rng + ?Sized>(schedule: &mut Schedule, problem: &DefenseProblem, rng: &mut R) {
    if schedule.is_empty() {
        return;
    }
    let idx = rng.random_range(0..schedule.len());
    if rng.random_bool(0.5) {
        if !problem.is_start_pinned(idx) {
            schedule.defenses[idx].start = Some(problem.random_start(rng));
        }
    } else if !problem.is_room_pinned(idx) {
        if let Some(room) = problem.random_room(rng) {
            schedule.defenses[idx].room = Some(room);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Defense, TimeSlot, Unavailability};
    use crate::slots::SlotPolicy;
    use chrono::{NaiveDate, NaiveDateTime};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 17)
            .and_then(|d| d.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn defense(id: &str, h: u32, room: &str) -> Defense {
        Defense::new(id, "")
            .with_supervisor(format!("{id}-s"))
            .with_reviewer(format!("{id}-r"))
            .with_president(format!("{id}-p"))
            .with_room(room)
            .with_start(at(h))
    }

    fn problem(templates: Vec<Defense>) -> DefenseProblem {
        DefenseProblem::new(
            templates,
            vec!["R1".into(), "R2".into()],
            TimeSlot::new(at(8), at(17)).unwrap(),
            SlotPolicy::default(),
            Unavailability::new(),
            Unavailability::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let pop: Vec<Schedule> = (0..5)
            .map(|i| Schedule::new(vec![defense(&format!("D{i}"), 8, "R1")]))
            .collect();
        // Fitness: position in the population.
        let score = |s: &Schedule| {
            pop.iter()
                .position(|p| p == s)
                .map_or(0.0, |i| i as f64)
        };
        let mut rng = SmallRng::seed_from_u64(42);
        let mut picks = [0usize; 5];
        for _ in 0..500 {
            let chosen = tournament_select(&pop, score, &mut rng).unwrap();
            picks[pop.iter().position(|p| p == chosen).unwrap()] += 1;
        }
        assert!(picks[4] > picks[0]);
        assert!(tournament_select(&[], score, &mut rng).is_none());
    }

    #[test]
    fn test_crossover_swaps_tails() {
        let a = Schedule::new(vec![
            defense("D1", 8, "R1"),
            defense("D2", 8, "R1"),
            defense("D3", 8, "R1"),
        ]);
        let b = Schedule::new(vec![
            defense("D1", 9, "R2"),
            defense("D2", 9, "R2"),
            defense("D3", 9, "R2"),
        ]);
        let mut rng = SmallRng::seed_from_u64(3);
        let (c1, c2) = one_point_crossover(&a, &b, 1.0, &mut rng);

        assert_eq!(c1.len(), 3);
        assert_eq!(c1.defenses[0], a.defenses[0]);
        assert_eq!(c1.defenses[2], b.defenses[2]);
        assert_eq!(c2.defenses[0], b.defenses[0]);
        assert_eq!(c2.defenses[2], a.defenses[2]);
        // Ids stay aligned with positions.
        for (i, d) in c1.defenses.iter().enumerate() {
            assert_eq!(d.id, format!("D{}", i + 1));
        }
    }

    #[test]
    fn test_crossover_rate_zero_copies() {
        let a = Schedule::new(vec![defense("D1", 8, "R1"), defense("D2", 8, "R1")]);
        let b = Schedule::new(vec![defense("D1", 9, "R2"), defense("D2", 9, "R2")]);
        let mut rng = SmallRng::seed_from_u64(0);
        let (c1, c2) = one_point_crossover(&a, &b, 0.0, &mut rng);
        assert_eq!(c1, a);
        assert_eq!(c2, b);

        let single = Schedule::new(vec![defense("D1", 8, "R1")]);
        let other = Schedule::new(vec![defense("D1", 9, "R2")]);
        let (s1, _) = one_point_crossover(&single, &other, 1.0, &mut rng);
        assert_eq!(s1, single);
    }

    #[test]
    fn test_mutate_moves_preset_genes() {
        let preset = defense("D1", 8, "R1");
        let p = problem(vec![preset.clone()]);
        let mut rng = SmallRng::seed_from_u64(5);
        let mut s = p.random_schedule(&mut rng);
        assert_eq!(s.defenses[0], preset);

        let mut moved = false;
        for _ in 0..20 {
            mutate(&mut s, &p, 1.0, &mut rng);
            let d = &s.defenses[0];
            moved |= d.start != preset.start || d.room != preset.room;
            assert!(p.policy().is_allowed_start(d.start.unwrap()));
        }
        assert!(moved);
    }

    #[test]
    fn test_mutate_respects_pinned_presets() {
        let free = Defense::new("D1", "")
            .with_supervisor("A")
            .with_reviewer("B")
            .with_president("C");
        let pinned = defense("D2", 8, "R1");
        let p = problem(vec![free, pinned.clone()]).with_pinned_presets(true);
        let mut rng = SmallRng::seed_from_u64(5);
        let mut s = p.random_schedule(&mut rng);

        for _ in 0..20 {
            mutate(&mut s, &p, 1.0, &mut rng);
            point_mutate(&mut s, &p, &mut rng);
            assert_eq!(s.defenses[1], pinned);
            let start = s.defenses[0].start.unwrap();
            assert!(p.policy().is_allowed_start(start));
        }
    }

    #[test]
    fn test_point_mutate_touches_one_defense() {
        let p = problem(vec![defense("D1", 8, "R1"), defense("D2", 9, "R1")]);
        let mut rng = SmallRng::seed_from_u64(8);
        for _ in 0..50 {
            let before = p.random_schedule(&mut rng);
            let mut after = before.clone();
            point_mutate(&mut after, &p, &mut rng);
            let changed = before
                .defenses
                .iter()
                .zip(&after.defenses)
                .filter(|(a, b)| a != b)
                .count();
            assert!(changed <= 1);
        }
    }
}
