//! Arena - owns the snakes and food of one session and resolves ticks

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::collision::{check_collisions, CollisionEvent};
use super::direction::Direction;
use super::food::FoodSupply;
use super::location::{Grid, Location};
use super::snake::Snake;

/// Identifier of a player (and of the snake it controls)
pub type PlayerId = String;

/// How a session decides it is over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// One human against the AI. Ends when the human's snake dies.
    #[default]
    #[serde(rename = "singleplayer")]
    SinglePlayer,
    /// Two humans. Ends when at most one snake is left.
    #[serde(rename = "multiplayer")]
    TwoPlayer,
}

impl GameMode {
    /// Snakes needed before the arena can tick
    pub fn required_players(self) -> usize {
        match self {
            // The host plus the AI
            GameMode::SinglePlayer => 2,
            // Host and guest
            GameMode::TwoPlayer => 2,
        }
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "singleplayer" | "single" => Ok(GameMode::SinglePlayer),
            "multiplayer" | "two_player" | "twoplayer" => Ok(GameMode::TwoPlayer),
            other => Err(format!("unknown game mode '{other}'")),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::SinglePlayer => f.write_str("singleplayer"),
            GameMode::TwoPlayer => f.write_str("multiplayer"),
        }
    }
}

/// Per-snake part of an [`ArenaSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnakeSnapshot {
    pub id: PlayerId,
    pub body: Vec<Location>,
    pub color: String,
    pub score: u32,
    pub alive: bool,
}

/// Read-only view of an arena, handed to renderers and notifiers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArenaSnapshot {
    pub grid_size: i32,
    pub mode: GameMode,
    /// Snakes in join order
    pub snakes: Vec<SnakeSnapshot>,
    pub food: Vec<Location>,
    pub terminal: bool,
    pub winner: Option<PlayerId>,
    pub tick: u64,
}

impl ArenaSnapshot {
    /// Look up a snake by player id
    pub fn snake(&self, id: &str) -> Option<&SnakeSnapshot> {
        self.snakes.iter().find(|s| s.id == id)
    }
}

/// What happened during one call to [`Arena::update`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Food eaten this tick, in snake join order
    pub eaten: Vec<(PlayerId, Location)>,
    /// Snakes that died this tick
    pub deaths: Vec<CollisionEvent>,
    /// Whether this tick ended the game
    pub finished: bool,
}

/// Game state for a single session
pub struct Arena {
    grid: Grid,
    mode: GameMode,
    initial_growth: u32,
    /// Snakes in join order
    snakes: Vec<(PlayerId, Snake)>,
    /// Player id -> position in `snakes`
    index: HashMap<PlayerId, usize>,
    food: FoodSupply,
    terminal: bool,
    winner: Option<PlayerId>,
    tick: u64,
    rng: StdRng,
}

impl Arena {
    /// Create an empty arena with one food item
    pub fn new(grid_size: u32, mode: GameMode, initial_growth: u32) -> Self {
        Self::with_rng(grid_size, mode, initial_growth, StdRng::from_entropy())
    }

    /// Create an arena with deterministic food placement
    pub fn with_seed(grid_size: u32, mode: GameMode, initial_growth: u32, seed: u64) -> Self {
        Self::with_rng(grid_size, mode, initial_growth, StdRng::seed_from_u64(seed))
    }

    fn with_rng(grid_size: u32, mode: GameMode, initial_growth: u32, rng: StdRng) -> Self {
        let mut arena = Self {
            grid: Grid::new(grid_size),
            mode,
            initial_growth,
            snakes: Vec::new(),
            index: HashMap::new(),
            food: FoodSupply::new(),
            terminal: false,
            winner: None,
            tick: 0,
            rng,
        };
        arena.spawn_food();
        arena
    }

    /// Add a snake for `id`. The first joins at the upper-left quarter point,
    /// later ones at the lower-right. An existing id is replaced in place.
    pub fn add_player(&mut self, id: impl Into<PlayerId>, color: impl Into<String>) {
        let start = if self.snakes.is_empty() {
            self.grid.quarter_point(1)
        } else {
            self.grid.quarter_point(3)
        };
        let snake = Snake::new(start, color, self.initial_growth);
        self.insert_snake(id, snake);
    }

    /// Insert a prepared snake, keeping join order. Replaces an existing id in place.
    pub fn insert_snake(&mut self, id: impl Into<PlayerId>, snake: Snake) {
        let id = id.into();
        match self.index.get(&id) {
            Some(&slot) => self.snakes[slot].1 = snake,
            None => {
                self.index.insert(id.clone(), self.snakes.len());
                self.snakes.push((id, snake));
            }
        }
    }

    /// Spawn one food item on a random empty cell. Leaves the food untouched
    /// when no cell is free.
    pub fn spawn_food(&mut self) -> Option<Location> {
        let occupied: HashSet<Location> = self
            .snakes
            .iter()
            .filter(|(_, s)| s.is_alive())
            .flat_map(|(_, s)| s.body().iter().copied())
            .collect();

        self.food.spawn(&self.grid, &occupied, &mut self.rng)
    }

    /// Put food on a specific cell
    pub fn place_food(&mut self, loc: Location) -> bool {
        let loc = self.grid.wrap(loc);
        self.food.place(loc)
    }

    /// Remove every food item
    pub fn clear_food(&mut self) {
        self.food = FoodSupply::new();
    }

    /// Queue a direction change for a living snake. Unknown ids, dead snakes,
    /// reversals and input after the game ended are ignored.
    pub fn handle_input(&mut self, id: &str, direction: Direction) -> bool {
        if self.terminal {
            return false;
        }
        match self.snake_mut(id) {
            Some(snake) if snake.is_alive() => snake.change_direction(direction),
            _ => false,
        }
    }

    /// Advance the game by one tick
    pub fn update(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.terminal {
            return outcome;
        }

        self.tick += 1;

        for (_, snake) in self.snakes.iter_mut() {
            snake.move_forward(&self.grid);
        }

        // Join order decides who gets a contested food cell
        for slot in 0..self.snakes.len() {
            let (id, snake) = &mut self.snakes[slot];
            if !snake.is_alive() {
                continue;
            }
            let head = snake.head();
            if self.food.take(head) {
                snake.grow();
                outcome.eaten.push((id.clone(), head));
                self.spawn_food();
            }
        }

        let deaths = check_collisions(&self.snakes);
        for event in &deaths {
            if let Some(snake) = self.snake_mut(&event.victim_id) {
                snake.kill();
            }
        }
        outcome.deaths = deaths;

        self.check_finished();
        outcome.finished = self.terminal;
        outcome
    }

    fn check_finished(&mut self) {
        let alive: Vec<&PlayerId> = self
            .snakes
            .iter()
            .filter(|(_, s)| s.is_alive())
            .map(|(id, _)| id)
            .collect();

        if alive.is_empty() {
            self.terminal = true;
            self.winner = None;
            return;
        }

        match self.mode {
            GameMode::TwoPlayer => {
                if alive.len() == 1 {
                    self.winner = Some(alive[0].clone());
                    self.terminal = true;
                }
            }
            GameMode::SinglePlayer => {
                let human_alive = self
                    .snakes
                    .first()
                    .map(|(_, s)| s.is_alive())
                    .unwrap_or(false);
                if !human_alive {
                    self.terminal = true;
                }
            }
        }
    }

    /// End the game without touching winner or alive flags
    pub fn force_stop(&mut self) {
        self.terminal = true;
    }

    /// Read-only snapshot of the current state
    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot {
            grid_size: self.grid.size(),
            mode: self.mode,
            snakes: self
                .snakes
                .iter()
                .map(|(id, snake)| SnakeSnapshot {
                    id: id.clone(),
                    body: snake.body().iter().copied().collect(),
                    color: snake.color.clone(),
                    score: snake.score(),
                    alive: snake.is_alive(),
                })
                .collect(),
            food: self.food.cells().to_vec(),
            terminal: self.terminal,
            winner: self.winner.clone(),
            tick: self.tick,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Look up a snake by player id
    pub fn snake(&self, id: &str) -> Option<&Snake> {
        self.index.get(id).map(|&slot| &self.snakes[slot].1)
    }

    fn snake_mut(&mut self, id: &str) -> Option<&mut Snake> {
        let slot = *self.index.get(id)?;
        Some(&mut self.snakes[slot].1)
    }

    /// Snakes in join order
    pub fn snakes(&self) -> impl Iterator<Item = (&PlayerId, &Snake)> {
        self.snakes.iter().map(|(id, snake)| (id, snake))
    }

    /// The player whose death ends a single-player game
    pub fn primary_player(&self) -> Option<&PlayerId> {
        self.snakes.first().map(|(id, _)| id)
    }

    pub fn player_count(&self) -> usize {
        self.snakes.len()
    }

    /// Whether enough snakes have joined to start ticking
    pub fn is_ready(&self) -> bool {
        self.snakes.len() >= self.mode.required_players()
    }

    pub fn food(&self) -> &[Location] {
        self.food.cells()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }
}
