//! Collision detection logic

use super::arena::PlayerId;
use super::snake::Snake;

/// Result of a collision check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionEvent {
    /// ID of the snake that died
    pub victim_id: PlayerId,
    /// Snake whose body was hit, `None` for self-collision
    pub killer_id: Option<PlayerId>,
}

/// Check every living snake against itself and every other living snake.
///
/// All checks read the same post-move positions; nothing is killed here, so a
/// snake that dies this tick still counts as an obstacle for the others.
/// At most one event is reported per victim.
pub fn check_collisions(snakes: &[(PlayerId, Snake)]) -> Vec<CollisionEvent> {
    let mut events = Vec::new();

    for (id_a, snake_a) in snakes.iter().filter(|(_, s)| s.is_alive()) {
        if snake_a.collides_with_self() {
            events.push(CollisionEvent {
                victim_id: id_a.clone(),
                killer_id: None,
            });
            continue;
        }

        let killer = snakes
            .iter()
            .filter(|(id_b, snake_b)| id_b != id_a && snake_b.is_alive())
            .find(|(_, snake_b)| snake_a.collides_with(snake_b));

        if let Some((id_b, _)) = killer {
            events.push(CollisionEvent {
                victim_id: id_a.clone(),
                killer_id: Some(id_b.clone()),
            });
        }
    }

    events
}
