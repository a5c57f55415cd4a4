//! Line based operator console on stdin. Operators can force any registered
//! phase (most importantly `abort`), query the mission status and shut the
//! lander down.

mod operator;
#[cfg(test)]
mod tests;

pub use operator::OperatorConsole;
