//! AI opponent
//!
//! The controller reads the arena through shared references only and picks a
//! direction for one snake per tick. Nothing is planned across ticks.

pub mod search;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::{Arena, Direction, Location, PlayerId, Snake};

use search::{find_path, step_direction};

/// Player id used for the AI snake in single-player sessions
pub const AI_PLAYER_ID: &str = "ai";

/// Chance of an unguided turn on easy
const EASY_RANDOM_CHANCE: f64 = 0.3;

/// Chance of an unguided turn on medium
const MEDIUM_RANDOM_CHANCE: f64 = 0.1;

/// AI strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Heads for food, often wanders off
    Easy,
    /// Heads for food while dodging immediate collisions
    #[default]
    Medium,
    /// Follows a shortest path to food
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => f.write_str("easy"),
            Difficulty::Medium => f.write_str("medium"),
            Difficulty::Hard => f.write_str("hard"),
        }
    }
}

/// Chooses directions for one AI-controlled snake
pub struct AiController {
    snake_id: PlayerId,
    difficulty: Difficulty,
    rng: StdRng,
}

impl AiController {
    pub fn new(snake_id: impl Into<PlayerId>, difficulty: Difficulty) -> Self {
        Self {
            snake_id: snake_id.into(),
            difficulty,
            rng: StdRng::from_entropy(),
        }
    }

    /// Controller with reproducible random choices
    pub fn with_seed(snake_id: impl Into<PlayerId>, difficulty: Difficulty, seed: u64) -> Self {
        Self {
            snake_id: snake_id.into(),
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn snake_id(&self) -> &str {
        &self.snake_id
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Pick the next direction. `None` when the snake is gone or dead.
    pub fn decide(&mut self, arena: &Arena) -> Option<Direction> {
        let snake = arena.snake(&self.snake_id).filter(|s| s.is_alive())?;

        let direction = match self.difficulty {
            Difficulty::Easy => self.easy_move(arena, snake),
            Difficulty::Medium => self.medium_move(arena, snake),
            Difficulty::Hard => self.hard_move(arena, snake),
        };
        Some(direction)
    }

    fn easy_move(&mut self, arena: &Arena, snake: &Snake) -> Direction {
        if self.rng.gen_bool(EASY_RANDOM_CHANCE) {
            return self.random_turn(snake);
        }
        move_towards_food(arena, snake)
    }

    fn medium_move(&mut self, arena: &Arena, snake: &Snake) -> Direction {
        if self.rng.gen_bool(MEDIUM_RANDOM_CHANCE) {
            return self.random_turn(snake);
        }
        self.safe_move_towards_food(arena, snake)
    }

    fn hard_move(&mut self, arena: &Arena, snake: &Snake) -> Direction {
        let grid = arena.grid();
        let head = snake.head();

        if let Some(food) = nearest_food(arena, head) {
            let blocked = self.obstacles(arena);
            let path = find_path(grid, head, food, &blocked);
            if path.len() >= 2 {
                if let Some(direction) = step_direction(grid, head, path[1]) {
                    return direction;
                }
            }
        }

        // No random turn on this fallback
        self.safe_move_towards_food(arena, snake)
    }

    /// Any non-reversing direction, safe or not
    fn random_turn(&mut self, snake: &Snake) -> Direction {
        snake
            .direction()
            .turns()
            .choose(&mut self.rng)
            .unwrap_or(snake.direction())
    }

    fn safe_move_towards_food(&mut self, arena: &Arena, snake: &Snake) -> Direction {
        let grid = arena.grid();
        let head = snake.head();
        let hazards = self.obstacles(arena);

        let safe: Vec<Direction> = snake
            .direction()
            .turns()
            .filter(|d| !hazards.contains(&grid.adjacent(head, *d)))
            .collect();

        if safe.is_empty() {
            return snake.direction();
        }

        match nearest_food(arena, head) {
            // First direction in enumeration order wins ties
            Some(food) => safe
                .iter()
                .copied()
                .min_by_key(|d| grid.toroidal_distance(grid.adjacent(head, *d), food))
                .unwrap_or(snake.direction()),
            None => safe
                .iter()
                .copied()
                .choose(&mut self.rng)
                .unwrap_or(snake.direction()),
        }
    }

    /// Every living snake's cells. Our own tail is left out when it is about
    /// to move away (no growth pending).
    fn obstacles(&self, arena: &Arena) -> HashSet<Location> {
        let mut blocked = HashSet::new();
        for (id, other) in arena.snakes().filter(|(_, s)| s.is_alive()) {
            let cells = other.body().iter().copied();
            if *id == self.snake_id && other.growth_pending() == 0 {
                blocked.extend(cells.take(other.len() - 1));
            } else {
                blocked.extend(cells);
            }
        }
        blocked
    }
}

/// Closest food by wrap-around distance; the earliest spawned wins ties
fn nearest_food(arena: &Arena, from: Location) -> Option<Location> {
    let grid = arena.grid();
    arena
        .food()
        .iter()
        .copied()
        .min_by_key(|food| grid.toroidal_distance(from, *food))
}

/// One greedy step toward the nearest food, ignoring obstacles.
///
/// The larger axis offset wins, vertical on a tie. A step that would reverse
/// the snake keeps the current direction instead.
fn move_towards_food(arena: &Arena, snake: &Snake) -> Direction {
    let head = snake.head();
    let Some(food) = nearest_food(arena, head) else {
        return snake.direction();
    };

    let half = arena.grid().size() / 2;
    let mut dx = food.x - head.x;
    let mut dy = food.y - head.y;
    if dx.abs() > half {
        dx = -dx;
    }
    if dy.abs() > half {
        dy = -dy;
    }

    let wanted = if dx.abs() > dy.abs() {
        if dx > 0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    };

    if snake.direction().is_opposite(wanted) {
        snake.direction()
    } else {
        wanted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameMode;

    fn snake(cells: &[(i32, i32)], direction: Direction) -> Snake {
        Snake::from_body(
            cells.iter().map(|(x, y)| Location::new(*x, *y)),
            direction,
            "#0000FF",
        )
        .unwrap()
    }

    fn arena_with(ai: Snake, food: &[(i32, i32)]) -> Arena {
        let mut arena = Arena::with_seed(20, GameMode::SinglePlayer, 3, 5);
        arena.clear_food();
        arena.insert_snake("player", snake(&[(0, 0)], Direction::Right));
        arena.insert_snake(AI_PLAYER_ID, ai);
        for (x, y) in food {
            arena.place_food(Location::new(*x, *y));
        }
        arena
    }

    #[test]
    fn test_parse_difficulty() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("impossible".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn test_dead_or_missing_snake_has_no_move() {
        let mut ai_snake = snake(&[(10, 10)], Direction::Right);
        ai_snake.kill();
        let arena = arena_with(ai_snake, &[(12, 10)]);

        let mut dead = AiController::with_seed(AI_PLAYER_ID, Difficulty::Hard, 1);
        assert_eq!(dead.decide(&arena), None);

        let mut missing = AiController::with_seed("ghost", Difficulty::Easy, 1);
        assert_eq!(missing.decide(&arena), None);
    }

    #[test]
    fn test_greedy_step_prefers_larger_axis() {
        let ai = snake(&[(10, 10)], Direction::Right);
        let arena = arena_with(ai, &[(13, 15)]);
        let snake = arena.snake(AI_PLAYER_ID).unwrap();
        assert_eq!(move_towards_food(&arena, snake), Direction::Down);
    }

    #[test]
    fn test_greedy_step_tie_goes_vertical() {
        let ai = snake(&[(10, 10)], Direction::Right);
        let arena = arena_with(ai, &[(12, 8)]);
        let snake = arena.snake(AI_PLAYER_ID).unwrap();
        assert_eq!(move_towards_food(&arena, snake), Direction::Up);
    }

    #[test]
    fn test_greedy_step_wraps_around() {
        let ai = snake(&[(1, 10)], Direction::Up);
        // Food is 3 cells to the left across the edge
        let arena = arena_with(ai, &[(18, 10)]);
        let snake = arena.snake(AI_PLAYER_ID).unwrap();
        assert_eq!(move_towards_food(&arena, snake), Direction::Left);
    }

    #[test]
    fn test_greedy_step_never_reverses() {
        let ai = snake(&[(10, 10), (9, 10)], Direction::Right);
        let arena = arena_with(ai, &[(5, 10)]);
        let snake = arena.snake(AI_PLAYER_ID).unwrap();
        assert_eq!(move_towards_food(&arena, snake), Direction::Right);
    }

    #[test]
    fn test_easy_never_reverses() {
        let ai = snake(&[(10, 10), (9, 10)], Direction::Right);
        let arena = arena_with(ai, &[(5, 10)]);
        let mut controller = AiController::with_seed(AI_PLAYER_ID, Difficulty::Easy, 3);
        for _ in 0..200 {
            assert_ne!(controller.decide(&arena), Some(Direction::Left));
        }
    }

    #[test]
    fn test_safe_move_avoids_bodies_and_picks_closest() {
        // Going right or down is blocked by the player; up leads to food
        let ai = snake(&[(10, 10), (9, 10)], Direction::Right);
        let mut arena = arena_with(ai, &[(10, 2)]);
        arena.insert_snake(
            "player",
            snake(&[(11, 10), (11, 11), (10, 11)], Direction::Left),
        );

        let mut controller = AiController::with_seed(AI_PLAYER_ID, Difficulty::Medium, 0);
        let snake = arena.snake(AI_PLAYER_ID).unwrap();
        assert_eq!(
            controller.safe_move_towards_food(&arena, snake),
            Direction::Up
        );
    }

    #[test]
    fn test_safe_move_tie_uses_enumeration_order() {
        // Food straight ahead two cells
        let ai = snake(&[(10, 10), (9, 10)], Direction::Right);
        let mut arena = arena_with(ai, &[(10, 15)]);
        arena.clear_food();
        arena.place_food(Location::new(12, 10));
        let mut controller = AiController::with_seed(AI_PLAYER_ID, Difficulty::Medium, 0);
        let snake = arena.snake(AI_PLAYER_ID).unwrap();
        assert_eq!(
            controller.safe_move_towards_food(&arena, snake),
            Direction::Right
        );

        // Food directly behind: all three turns tie, up comes first
        arena.clear_food();
        arena.place_food(Location::new(5, 10));
        let snake = arena.snake(AI_PLAYER_ID).unwrap();
        assert_eq!(
            controller.safe_move_towards_food(&arena, snake),
            Direction::Up
        );
    }

    #[test]
    fn test_safe_move_without_options_keeps_direction() {
        let ai = snake(&[(10, 10), (9, 10)], Direction::Right);
        let mut arena = arena_with(ai, &[(3, 3)]);
        arena.insert_snake(
            "player",
            snake(&[(11, 10), (10, 9), (10, 11)], Direction::Left),
        );
        let mut controller = AiController::with_seed(AI_PLAYER_ID, Difficulty::Medium, 0);
        let snake = arena.snake(AI_PLAYER_ID).unwrap();
        assert_eq!(
            controller.safe_move_towards_food(&arena, snake),
            Direction::Right
        );
    }

    #[test]
    fn test_hard_without_path_takes_safe_move() {
        // Food at (15,15) is boxed in by the player's body
        let ai = snake(&[(10, 10)], Direction::Right);
        let mut arena = arena_with(ai, &[(15, 15)]);
        let ring = [
            (14, 14),
            (15, 14),
            (16, 14),
            (16, 15),
            (16, 16),
            (15, 16),
            (14, 16),
            (14, 15),
        ];
        arena.insert_snake("player", snake(&ring, Direction::Up));

        // Down and right both end 9 steps away; down is enumerated first
        for seed in 0..300 {
            let mut controller = AiController::with_seed(AI_PLAYER_ID, Difficulty::Hard, seed);
            assert_eq!(controller.decide(&arena), Some(Direction::Down), "seed {seed}");
        }
    }

    #[test]
    fn test_own_tail_is_free_only_without_growth() {
        // Curled snake whose tail sits just above the head
        let cells = [(10, 10), (9, 10), (9, 9), (10, 9)];
        let ai = snake(&cells, Direction::Right);
        let arena = arena_with(ai, &[]);
        let controller = AiController::with_seed(AI_PLAYER_ID, Difficulty::Medium, 0);
        let blocked = controller.obstacles(&arena);
        assert!(!blocked.contains(&Location::new(10, 9)));
        assert!(blocked.contains(&Location::new(9, 9)));

        let mut growing = snake(&cells, Direction::Right);
        growing.grow();
        let arena = arena_with(growing, &[]);
        let blocked = controller.obstacles(&arena);
        assert!(blocked.contains(&Location::new(10, 9)));
    }

    #[test]
    fn test_hard_follows_path_around_obstacle() {
        // A wall of player body sits between the AI and the food
        let ai = snake(&[(10, 10), (9, 10)], Direction::Right);
        let mut arena = arena_with(ai, &[(12, 10)]);
        arena.insert_snake(
            "player",
            snake(&[(11, 9), (11, 10), (11, 11)], Direction::Up),
        );

        let mut controller = AiController::with_seed(AI_PLAYER_ID, Difficulty::Hard, 0);
        let direction = controller.decide(&arena).unwrap();
        assert!(matches!(direction, Direction::Up | Direction::Down));
    }

    #[test]
    fn test_hard_reaches_food_on_open_board() {
        let mut arena = Arena::with_seed(12, GameMode::SinglePlayer, 0, 11);
        arena.clear_food();
        arena.insert_snake("player", snake(&[(0, 0)], Direction::Down));
        arena.insert_snake(AI_PLAYER_ID, snake(&[(3, 3), (2, 3)], Direction::Right));
        arena.place_food(Location::new(7, 8));

        let mut controller = AiController::with_seed(AI_PLAYER_ID, Difficulty::Hard, 0);
        for _ in 0..9 {
            if let Some(direction) = controller.decide(&arena) {
                arena.handle_input(AI_PLAYER_ID, direction);
            }
            arena.update();
            if arena.snake(AI_PLAYER_ID).unwrap().score() == 1 {
                break;
            }
        }
        assert_eq!(arena.snake(AI_PLAYER_ID).unwrap().score(), 1);
    }
}
