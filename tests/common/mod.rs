//! Seeded synthetic pitching data shared by the integration tests

#![allow(dead_code)]

use era_shrinkage::{PlayerIdentity, PlayerSeasonRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Knuth's Poisson sampler (fine for the means used here, < 200).
pub fn poisson(rng: &mut StdRng, mean: f64) -> u32 {
    let limit = (-mean).exp();
    let mut k = 0;
    let mut p: f64 = rng.gen();
    while p > limit {
        k += 1;
        p *= rng.gen::<f64>();
    }
    k
}

/// `players` pitchers with a true per-inning rate in [0.3, 0.6]:
/// one debut season of 1 to 60 innings, then 3 to 8 seasons of 50 to 200
/// innings each.
pub fn synthetic_seasons(players: usize, seed: u64) -> Vec<PlayerSeasonRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::new();
    for p in 0..players {
        let id = format!("syn{p:04}");
        let lambda: f64 = rng.gen_range(0.3..0.6);
        let debut: i32 = rng.gen_range(1950..1990);

        let outs: u32 = rng.gen_range(3..=180);
        let er = poisson(&mut rng, lambda * f64::from(outs) / 3.0);
        rows.push(PlayerSeasonRecord::new(id.clone(), debut, er, outs));

        let later: i32 = rng.gen_range(3..=8);
        for year in 1..=later {
            let outs: u32 = rng.gen_range(150..=600);
            let er = poisson(&mut rng, lambda * f64::from(outs) / 3.0);
            rows.push(PlayerSeasonRecord::new(id.clone(), debut + year, er, outs));
        }
    }
    rows
}

/// Identities for the ids produced by [`synthetic_seasons`].
pub fn synthetic_people(players: usize) -> Vec<PlayerIdentity> {
    (0..players)
        .map(|p| PlayerIdentity::new(format!("syn{p:04}"), "Pitcher", format!("No{p}")))
        .collect()
}
