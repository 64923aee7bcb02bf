//! Solver configuration: resource caps and tuning knobs.
//!
//! Every field has a default equal to the constants the game shipped with, and
//! every struct is `#[serde(default)]` so a JSON file only needs to name what it
//! overrides.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverConfig {
    /// Visited-set growth cap for the exhaustive searches
    pub max_nodes: usize,
    /// Seed for the randomized solvers; `None` draws from the OS
    pub seed: Option<u64>,
    pub annealing: AnnealingConfig,
    pub hill_climb: HillClimbConfig,
    pub bee_colony: BeeColonyConfig,
    pub planner: PlannerConfig,
    pub active: ActiveConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_nodes: 1_000_000,
            seed: None,
            annealing: AnnealingConfig::default(),
            hill_climb: HillClimbConfig::default(),
            bee_colony: BeeColonyConfig::default(),
            planner: PlannerConfig::default(),
            active: ActiveConfig::default(),
        }
    }
}

impl SolverConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnealingConfig {
    pub max_iterations: usize,
    pub initial_temperature: f64,
    pub cooling_rate: f64,
    /// Below this the walk restarts from the initial state
    pub min_temperature: f64,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            initial_temperature: 1.0,
            cooling_rate: 0.995,
            min_temperature: 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HillClimbConfig {
    pub restarts: usize,
    pub iterations_per_restart: usize,
}

impl Default for HillClimbConfig {
    fn default() -> Self {
        Self {
            restarts: 10,
            iterations_per_restart: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BeeColonyConfig {
    /// Number of food sources (one employed bee each)
    pub bees: usize,
    pub max_cycles: usize,
    /// Non-improving trials before a source is abandoned
    pub limit: usize,
    pub min_path_len: usize,
    pub max_path_len: usize,
}

impl Default for BeeColonyConfig {
    fn default() -> Self {
        Self {
            bees: 50,
            max_cycles: 200,
            limit: 10,
            min_path_len: 10,
            max_path_len: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlannerConfig {
    /// Cap on the candidate worlds of the initial belief state
    pub max_worlds: usize,
    pub max_depth: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_worlds: 50,
            max_depth: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActiveConfig {
    pub max_worlds: usize,
    pub max_tests: usize,
    /// Surviving world count at or below which every world is solved directly
    pub direct_solve_threshold: usize,
}

impl Default for ActiveConfig {
    fn default() -> Self {
        Self {
            max_worlds: 50,
            max_tests: 50,
            direct_solve_threshold: 5,
        }
    }
}
