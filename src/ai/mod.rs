pub mod greedy;

pub use greedy::{COMPUTER_TOKEN, ComputerTurns, choose_computer_move, take_computer_turns};
