/// Game-state management
///
/// The data model lives in `game_state`, the transition rules in `machine`.
/// All mutation happens on the consumer thread; everything workers see is a
/// value copy.
pub mod game_state;
pub mod machine;

pub use game_state::{GameSnapshot, GameState, Mode, RuleFired, SensorEvent};
pub use machine::GameStateMachine;
