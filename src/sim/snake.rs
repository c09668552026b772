//! The player's snake
//!
//! Head is the front of the body. Direction changes are buffered and only
//! committed on the next advance, so two quick turns can't fold the snake
//! back onto itself within one tick.

use std::collections::VecDeque;

use glam::IVec2;
use rand::Rng;
use rand::seq::SliceRandom;

use super::grid::{self, Direction};
use crate::consts::MIN_SNAKE_LEN;

/// Result of moving the snake one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Cell the head moved (or tried to move) into
    pub head: IVec2,
    /// Head left the board on a no-wrap level; body was not touched
    pub crashed: bool,
}

#[derive(Debug, Clone)]
pub struct Snake {
    pub body: VecDeque<IVec2>,
    pub direction: Direction,
    pub next_direction: Direction,
    /// Deferred tail growth, one segment per future advance
    pub grow_pending: u32,
}

impl Snake {
    /// Three segments in a row ending at `head`, facing right
    pub fn new(head: IVec2) -> Self {
        let body = (0..MIN_SNAKE_LEN as i32)
            .map(|i| IVec2::new(head.x - i, head.y))
            .collect();
        Self {
            body,
            direction: Direction::Right,
            next_direction: Direction::Right,
            grow_pending: 0,
        }
    }

    pub fn head(&self) -> IVec2 {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn occupies(&self, cell: IVec2) -> bool {
        self.body.contains(&cell)
    }

    /// Buffer a turn for the next tick. Exact reversal is rejected.
    pub fn set_direction(&mut self, dir: Direction) -> bool {
        if dir == self.direction.opposite() {
            return false;
        }
        self.next_direction = dir;
        true
    }

    /// Commit the buffered direction and step the head one cell.
    ///
    /// With `wrap_disabled` a head leaving the board reports a crash and the
    /// body stays where it was; otherwise the head wraps around.
    pub fn advance(&mut self, wrap_disabled: bool) -> MoveOutcome {
        self.direction = self.next_direction;
        let mut head = self.head() + self.direction.delta();

        if wrap_disabled {
            if !grid::in_bounds(head) {
                return MoveOutcome {
                    head,
                    crashed: true,
                };
            }
        } else {
            head = grid::wrap(head);
        }

        self.body.push_front(head);
        if self.grow_pending > 0 {
            self.grow_pending -= 1;
        } else {
            self.body.pop_back();
        }

        MoveOutcome {
            head,
            crashed: false,
        }
    }

    /// Head overlaps its own body or a wall
    pub fn check_collision(&self, walls: &[IVec2]) -> bool {
        let head = self.head();
        self.body.iter().skip(1).any(|&part| part == head) || walls.contains(&head)
    }

    pub fn grow(&mut self) {
        self.grow_pending += 1;
    }

    /// Cut up to `amount` tail segments, keeping at least MIN_SNAKE_LEN
    pub fn shorten(&mut self, amount: usize) {
        let max_cut = self.body.len().saturating_sub(MIN_SNAKE_LEN);
        let cut = amount.min(max_cut);
        self.body.truncate(self.body.len() - cut);
    }

    /// Drop the head added by the last advance (shield rollback)
    pub fn undo_move(&mut self) {
        self.body.pop_front();
    }

    /// Turn toward a random free neighbouring cell.
    ///
    /// A neighbour is free when it is on the board and holds no body segment
    /// or wall. If every neighbour is blocked the direction is kept as is and
    /// the next tick collides normally.
    pub fn bounce<R: Rng>(&mut self, walls: &[IVec2], rng: &mut R) -> Option<Direction> {
        let Some(&head) = self.body.front() else {
            return None;
        };

        let mut moves = Direction::ALL;
        moves.shuffle(rng);

        let safe = moves.into_iter().find(|dir| {
            let cell = head + dir.delta();
            grid::in_bounds(cell) && !self.occupies(cell) && !walls.contains(&cell)
        })?;

        self.direction = safe;
        self.next_direction = safe;
        Some(safe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TILE_COUNT;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Up),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Right),
        ]
    }

    #[test]
    fn test_new_snake_layout() {
        let snake = Snake::new(IVec2::new(10, 10));
        assert_eq!(
            snake.body,
            VecDeque::from(vec![
                IVec2::new(10, 10),
                IVec2::new(9, 10),
                IVec2::new(8, 10)
            ])
        );
        assert_eq!(snake.direction, Direction::Right);
    }

    #[test]
    fn test_turn_applies_next_tick_only() {
        let mut snake = Snake::new(IVec2::new(10, 10));
        assert!(snake.set_direction(Direction::Up));
        assert_eq!(snake.direction, Direction::Right);
        snake.advance(false);
        assert_eq!(snake.direction, Direction::Up);
        assert_eq!(snake.head(), IVec2::new(10, 9));
    }

    #[test]
    fn test_wraps_when_allowed() {
        let mut snake = Snake::new(IVec2::new(TILE_COUNT - 1, 4));
        let outcome = snake.advance(false);
        assert!(!outcome.crashed);
        assert_eq!(snake.head(), IVec2::new(0, 4));
    }

    #[test]
    fn test_crash_leaves_body_untouched() {
        let mut snake = Snake::new(IVec2::new(TILE_COUNT - 1, 4));
        let before = snake.body.clone();
        let outcome = snake.advance(true);
        assert!(outcome.crashed);
        assert_eq!(outcome.head, IVec2::new(TILE_COUNT, 4));
        assert_eq!(snake.body, before);
    }

    #[test]
    fn test_collision_with_self_and_walls() {
        let mut snake = Snake::new(IVec2::new(5, 5));
        assert!(!snake.check_collision(&[]));
        assert!(snake.check_collision(&[IVec2::new(5, 5)]));

        snake.body = VecDeque::from(vec![
            IVec2::new(5, 5),
            IVec2::new(5, 6),
            IVec2::new(6, 6),
            IVec2::new(6, 5),
            IVec2::new(5, 5),
        ]);
        assert!(snake.check_collision(&[]));
    }

    #[test]
    fn test_undo_move_drops_head() {
        let mut snake = Snake::new(IVec2::new(5, 5));
        snake.grow();
        snake.advance(false);
        snake.undo_move();
        assert_eq!(snake.head(), IVec2::new(5, 5));
        assert_eq!(snake.len(), 3);
    }

    #[test]
    fn test_bounce_picks_free_in_bounds_neighbour() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..20 {
            let mut snake = Snake::new(IVec2::new(10, 0));
            let walls = [IVec2::new(10, 1)];
            let dir = snake.bounce(&walls, &mut rng);
            // Up leaves the board, Down is a wall, Left is the body
            assert_eq!(dir, Some(Direction::Right));
            assert_eq!(snake.direction, Direction::Right);
            assert_eq!(snake.next_direction, Direction::Right);
        }
    }

    #[test]
    fn test_bounce_boxed_in_keeps_direction() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut snake = Snake::new(IVec2::new(10, 10));
        snake.set_direction(Direction::Up);
        let walls = [
            IVec2::new(10, 9),
            IVec2::new(10, 11),
            IVec2::new(11, 10),
        ];
        assert_eq!(snake.bounce(&walls, &mut rng), None);
        assert_eq!(snake.direction, Direction::Right);
        assert_eq!(snake.next_direction, Direction::Up);
    }

    proptest! {
        #[test]
        fn prop_reversal_is_rejected(current in direction_strategy(), turn in direction_strategy()) {
            let mut snake = Snake::new(IVec2::new(10, 10));
            snake.direction = current;
            snake.next_direction = current;
            let accepted = snake.set_direction(turn);
            if turn == current.opposite() {
                prop_assert!(!accepted);
                prop_assert_eq!(snake.next_direction, current);
            } else {
                prop_assert!(accepted);
                prop_assert_eq!(snake.next_direction, turn);
            }
        }

        #[test]
        fn prop_advance_shifts_or_crashes(
            x in 0..TILE_COUNT,
            y in 0..TILE_COUNT,
            dir in direction_strategy(),
            wrap_disabled in any::<bool>(),
        ) {
            let mut snake = Snake::new(IVec2::new(x, y));
            snake.direction = dir;
            snake.next_direction = dir;
            let before = snake.body.clone();

            let outcome = snake.advance(wrap_disabled);
            if outcome.crashed {
                prop_assert!(wrap_disabled);
                prop_assert_eq!(&snake.body, &before);
            } else {
                prop_assert_eq!(snake.head(), grid::wrap(before[0] + dir.delta()));
                prop_assert_eq!(snake.len(), before.len());
                for i in 1..snake.len() {
                    prop_assert_eq!(snake.body[i], before[i - 1]);
                }
            }
        }

        #[test]
        fn prop_grow_adds_exactly_one(ticks in 1usize..40) {
            let mut snake = Snake::new(IVec2::new(10, 10));
            snake.grow();
            for _ in 0..ticks {
                snake.advance(false);
            }
            prop_assert_eq!(snake.len(), 4);
            prop_assert_eq!(snake.grow_pending, 0);
        }

        #[test]
        fn prop_shorten_respects_minimum(extra in 0usize..12, amount in 0usize..20) {
            let mut snake = Snake::new(IVec2::new(10, 10));
            snake.grow_pending = extra as u32;
            for _ in 0..extra {
                snake.advance(false);
            }
            let before = snake.len();
            snake.shorten(amount);
            prop_assert!(snake.len() >= MIN_SNAKE_LEN);
            prop_assert_eq!(snake.len(), before.saturating_sub(amount).max(MIN_SNAKE_LEN));
        }
    }
}
